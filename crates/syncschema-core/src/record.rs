//! Record shapes and their derived JSON Schema

use serde::{Deserialize, Serialize};

use crate::json_schema::{JsonSchema, JsonType, SchemaDescribable, DRAFT_07};

/// Portable field type for record shapes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean type
    Bool,

    /// Integer type (any precision)
    Int,

    /// Floating point (any precision)
    Float,

    /// Decimal with precision and scale
    Decimal {
        precision: Option<u16>,
        scale: Option<u16>,
    },

    /// String/text type
    String,

    /// Date (no time component)
    Date,

    /// Timestamp (with time component)
    Timestamp,

    /// Arbitrary JSON value
    Json,

    /// Nested record with named fields
    Struct {
        fields: Vec<Field>,
    },

    /// Array type
    Array {
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Create an array of the given element type
    pub fn array_of(element_type: FieldType) -> Self {
        Self::Array {
            element_type: Box::new(element_type),
        }
    }

    /// JSON Schema for a value of this type
    pub fn to_json_schema(&self) -> JsonSchema {
        match self {
            Self::Bool => JsonSchema::of_type(JsonType::Boolean),
            Self::Int => JsonSchema::of_type(JsonType::Integer),
            Self::Float | Self::Decimal { .. } => JsonSchema::of_type(JsonType::Number),
            Self::String => JsonSchema::of_type(JsonType::String),
            Self::Date => JsonSchema::of_type(JsonType::String).with_format("date"),
            Self::Timestamp => JsonSchema::of_type(JsonType::String).with_format("date-time"),
            Self::Json => JsonSchema::default(),
            Self::Struct { fields } => object_schema(fields),
            Self::Array { element_type } => JsonSchema::array_of(element_type.to_json_schema()),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "BOOL"),
            Self::Int => write!(f, "INT"),
            Self::Float => write!(f, "FLOAT"),
            Self::Decimal { precision, scale } => {
                match (precision, scale) {
                    (Some(p), Some(s)) => write!(f, "DECIMAL({}, {})", p, s),
                    (Some(p), None) => write!(f, "DECIMAL({})", p),
                    _ => write!(f, "DECIMAL"),
                }
            }
            Self::String => write!(f, "STRING"),
            Self::Date => write!(f, "DATE"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Json => write!(f, "JSON"),
            Self::Struct { .. } => write!(f, "STRUCT"),
            Self::Array { element_type } => write!(f, "ARRAY<{}>", element_type),
        }
    }
}

/// A named field in a record shape
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name, as it appears in emitted records
    pub name: String,

    /// Field type
    pub field_type: FieldType,

    /// Whether the field may be null (nullable fields are not required)
    #[serde(default)]
    pub nullable: bool,
}

impl Field {
    /// Create a new non-nullable field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    fn to_json_schema(&self) -> JsonSchema {
        let schema = self.field_type.to_json_schema();
        if self.nullable {
            schema.nullable()
        } else {
            schema
        }
    }
}

/// An ordered collection of fields describing one emitted record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordShape {
    /// Ordered list of fields
    pub fields: Vec<Field>,
}

impl RecordShape {
    /// Create a new empty shape
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create a shape from fields
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Append a non-nullable field
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(Field::new(name, field_type));
        self
    }

    /// Append a nullable field
    pub fn optional_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(Field::new(name, field_type).with_nullable(true));
        self
    }

    /// Find a field by name
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get field names
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl SchemaDescribable for RecordShape {
    fn json_schema(&self) -> JsonSchema {
        object_schema(&self.fields).with_draft(DRAFT_07)
    }
}

fn object_schema(fields: &[Field]) -> JsonSchema {
    fields
        .iter()
        .fold(JsonSchema::object(), |schema, field| {
            schema.with_property(field.name.clone(), field.to_json_schema(), !field.nullable)
        })
        .with_keyword("additionalProperties", false)
}
