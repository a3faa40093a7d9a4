//! JSON Schema documents for public schema output shapes
//!
//! A schema is kept as the raw JSON mapping it was given, so user-supplied
//! schemas are emitted exactly as written. Builders cover the subset derived
//! schemas need; accessors read the keywords the contract layer inspects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::InvalidPublicSchemaError;

/// Draft used for schemas derived by this crate
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Primitive JSON Schema types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Array,
    Object,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A JSON Schema document (or subschema) as a JSON mapping
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSchema(Map<String, Value>);

impl JsonSchema {
    /// Create a schema constrained to a single type
    pub fn of_type(json_type: JsonType) -> Self {
        Self::default().with_keyword("type", json_type.as_str())
    }

    /// Create an empty object schema
    pub fn object() -> Self {
        Self::of_type(JsonType::Object)
            .with_keyword("properties", Map::new())
            .with_keyword("required", Vec::<Value>::new())
    }

    /// Create an array schema with the given element schema
    pub fn array_of(items: JsonSchema) -> Self {
        Self::of_type(JsonType::Array).with_keyword("items", items)
    }

    /// Wrap a raw JSON mapping
    ///
    /// The value must be a JSON object; its contents are kept untouched.
    pub fn from_value(value: Value) -> Result<Self, InvalidPublicSchemaError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(InvalidPublicSchemaError::new(format!(
                "Output schema must be a JSON object, got {}",
                value_kind(&other)
            ))),
        }
    }

    /// Set a keyword, replacing any previous value
    pub fn with_keyword(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(keyword.into(), value.into());
        self
    }

    /// Add a property, marking it required when `required` is set
    pub fn with_property(mut self, name: impl Into<String>, schema: JsonSchema, required: bool) -> Self {
        let name = name.into();

        if required {
            let list = self
                .0
                .entry("required")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = list {
                list.push(Value::String(name.clone()));
            }
        }

        let properties = self
            .0
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(properties) = properties {
            properties.insert(name, schema.into());
        }

        self
    }

    /// Set the `format` keyword
    pub fn with_format(self, format: impl Into<String>) -> Self {
        let format: String = format.into();
        self.with_keyword("format", format)
    }

    /// Set the `$schema` keyword
    pub fn with_draft(self, draft: impl Into<String>) -> Self {
        let draft: String = draft.into();
        self.with_keyword("$schema", draft)
    }

    /// Allow `null` in addition to the current type
    pub fn nullable(mut self) -> Self {
        let null = Value::String(JsonType::Null.as_str().to_string());

        let widened = match self.0.get("type") {
            Some(Value::String(t)) if t.as_str() != JsonType::Null.as_str() => {
                Some(Value::Array(vec![Value::String(t.clone()), null]))
            }
            Some(Value::Array(types)) if !types.contains(&null) => {
                let mut types = types.clone();
                types.push(null);
                Some(Value::Array(types))
            }
            // Unconstrained schemas already admit null
            _ => None,
        };

        if let Some(widened) = widened {
            self.0.insert("type".to_string(), widened);
        }
        self
    }

    /// Raw value of a keyword
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.0.get(keyword)
    }

    /// Declared top-level properties, when `properties` is a mapping
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    /// Names of the declared top-level properties
    pub fn property_names(&self) -> Vec<&str> {
        self.properties()
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Check whether a top-level property is declared
    pub fn has_property(&self, name: &str) -> bool {
        self.properties().is_some_and(|props| props.contains_key(name))
    }

    /// Names listed under `required`, in order
    pub fn required(&self) -> Vec<&str> {
        self.0
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert to a plain JSON mapping
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for JsonSchema {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<JsonSchema> for Value {
    fn from(schema: JsonSchema) -> Self {
        Value::Object(schema.0)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Capability of producing a JSON Schema describing one's own shape
///
/// A raw [`JsonSchema`] describes itself verbatim. Record types implement this
/// to derive the schema of the records a public schema emits.
pub trait SchemaDescribable {
    fn json_schema(&self) -> JsonSchema;
}

impl SchemaDescribable for JsonSchema {
    fn json_schema(&self) -> JsonSchema {
        self.clone()
    }
}

impl<T: SchemaDescribable + ?Sized> SchemaDescribable for &T {
    fn json_schema(&self) -> JsonSchema {
        (**self).json_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn raw_schema_round_trips_verbatim() {
        let raw = json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "minimum": 1 },
                "tags": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["id"],
            "x-owner": "accounts"
        });

        let schema = JsonSchema::from_value(raw.clone()).unwrap();
        assert_eq!(schema.to_value(), raw);
        assert_eq!(schema.get("x-owner"), Some(&json!("accounts")));
    }

    #[test]
    fn boolean_subschemas_tuple_items_and_nulls_survive() {
        let raw = json!({
            "properties": {
                "meta": true,
                "never": false,
                "pair": {
                    "type": "array",
                    "items": [{ "type": "string" }, { "type": "integer" }],
                    "additionalItems": false
                }
            },
            "additionalProperties": { "not": true },
            "description": null,
            "default": null
        });

        let schema = JsonSchema::from_value(raw.clone()).unwrap();
        assert_eq!(schema.to_value(), raw);
        assert_eq!(schema.get("description"), Some(&Value::Null));

        let text = serde_json::to_string(&schema).unwrap();
        let parsed: JsonSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn non_object_value_is_rejected() {
        let err = JsonSchema::from_value(json!(["id", "name"])).unwrap_err();
        assert_eq!(err.message, "Output schema must be a JSON object, got an array");

        assert!(serde_json::from_str::<JsonSchema>("true").is_err());
    }

    #[test]
    fn builder_tracks_required_order() {
        let schema = JsonSchema::object()
            .with_property("name", JsonSchema::of_type(JsonType::String), true)
            .with_property("id", JsonSchema::of_type(JsonType::Integer), true)
            .with_property("note", JsonSchema::of_type(JsonType::String), false);

        assert_eq!(schema.required(), vec!["name", "id"]);
        assert_eq!(schema.property_names(), vec!["id", "name", "note"]);
        assert!(schema.has_property("note"));
        assert!(!schema.has_property("missing"));
    }

    #[test]
    fn accessors_tolerate_unusual_shapes() {
        let schema = JsonSchema::from_value(json!({ "properties": true, "required": "id" })).unwrap();
        assert!(schema.property_names().is_empty());
        assert!(schema.required().is_empty());

        let empty = JsonSchema::default();
        assert!(empty.properties().is_none());
        assert_eq!(empty.to_value(), json!({}));
    }

    #[test]
    fn nullable_widens_type() {
        let schema = JsonSchema::of_type(JsonType::Integer).nullable();
        assert_eq!(schema.to_value(), json!({ "type": ["integer", "null"] }));

        // applying twice is a no-op
        let again = schema.clone().nullable();
        assert_eq!(again, schema);

        assert_eq!(JsonSchema::default().nullable(), JsonSchema::default());
    }
}
