//! Public schemas: data a source data store exposes for synchronization
//!
//! A public schema pairs an output record shape with the SQL transformations
//! that turn source-table change events into records of that shape.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ContractError, InvalidPublicSchemaError, TransformationError};
use crate::json_schema::{JsonSchema, SchemaDescribable};

/// Schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Originating data store of a public schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Slug of the data store that holds the source tables
    pub data_store_slug: String,
}

impl Source {
    pub fn new(data_store_slug: impl Into<String>) -> Self {
        Self {
            data_store_slug: data_store_slug.into(),
        }
    }
}

/// Database change event a transformation reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostgresOperation {
    Insert,
    Update,
    Delete,
}

impl PostgresOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PostgresOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single (operation, table, SQL) transformation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostgresTransformation {
    /// Change event this transformation handles
    pub operation: PostgresOperation,

    /// Source table the event originates from
    pub table: String,

    /// Parameterized query producing the output record (`:name` placeholders)
    pub sql: String,
}

impl PostgresTransformation {
    pub fn new(operation: PostgresOperation, table: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
            sql: sql.into(),
        }
    }
}

/// Authoring-level operation, expanded into one or more [`PostgresOperation`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformationOperation {
    /// Insert and update events share one read query
    InsertOrUpdate,

    Delete,
}

impl TransformationOperation {
    /// Change events covered by this operation, in emission order
    pub fn expand(&self) -> &'static [PostgresOperation] {
        match self {
            Self::InsertOrUpdate => &[PostgresOperation::Insert, PostgresOperation::Update],
            Self::Delete => &[PostgresOperation::Delete],
        }
    }
}

impl FromStr for TransformationOperation {
    type Err = TransformationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "insertOrUpdate" => Ok(Self::InsertOrUpdate),
            "delete" => Ok(Self::Delete),
            other => Err(TransformationError::InvalidOperation(other.to_string())),
        }
    }
}

/// Kind of public schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicSchemaType {
    #[default]
    Postgres,
}

/// Public schema configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSchemaConfig {
    pub public_schema_type: PublicSchemaType,

    /// Ordered transformations; must not be empty
    pub transformations: Vec<PostgresTransformation>,
}

impl PublicSchemaConfig {
    /// Create a Postgres config from a list of transformations
    pub fn postgres(transformations: Vec<PostgresTransformation>) -> Self {
        Self {
            public_schema_type: PublicSchemaType::Postgres,
            transformations,
        }
    }
}

/// Serializable public schema descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSchemaData {
    pub name: String,
    pub source: Source,
    pub output_schema: JsonSchema,
    pub version: Version,
    pub config: PublicSchemaConfig,
}

impl PublicSchemaData {
    /// Validate this descriptor with the same rules as [`create_public_schema`]
    pub fn validate(&self) -> Result<(), InvalidPublicSchemaError> {
        validate_public_schema(&self.name, &self.source, &self.config)
    }

    /// Convert to a plain JSON mapping
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serialize to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Expand an authoring operation into Postgres transformations
///
/// `"insertOrUpdate"` yields an `insert` and an `update` entry sharing the
/// same table and SQL; `"delete"` yields a single `delete` entry.
pub fn create_postgres_public_schema_transformation(
    operation: &str,
    table: impl Into<String>,
    sql: impl Into<String>,
) -> Result<Vec<PostgresTransformation>, TransformationError> {
    let operation = operation.parse::<TransformationOperation>()?;
    Ok(postgres_transformations(operation, table, sql))
}

/// Typed form of [`create_postgres_public_schema_transformation`]
pub fn postgres_transformations(
    operation: TransformationOperation,
    table: impl Into<String>,
    sql: impl Into<String>,
) -> Vec<PostgresTransformation> {
    let table = table.into();
    let sql = sql.into();

    operation
        .expand()
        .iter()
        .map(|op| PostgresTransformation::new(*op, table.clone(), sql.clone()))
        .collect()
}

/// Check the structural rules of a public schema
///
/// The output schema is not inspected; any JSON mapping is accepted as-is.
pub fn validate_public_schema(
    name: &str,
    source: &Source,
    config: &PublicSchemaConfig,
) -> Result<(), InvalidPublicSchemaError> {
    if config.transformations.is_empty() {
        return Err(InvalidPublicSchemaError::new(
            "Public schema must have at least one transformation",
        ));
    }
    if name.is_empty() {
        return Err(InvalidPublicSchemaError::new("Public schema name cannot be empty"));
    }
    if source.data_store_slug.is_empty() {
        return Err(InvalidPublicSchemaError::new("Source data store slug cannot be empty"));
    }
    for (index, transformation) in config.transformations.iter().enumerate() {
        if transformation.table.is_empty() {
            return Err(InvalidPublicSchemaError::new(format!(
                "Transformation {} ({}) must name a table",
                index, transformation.operation
            )));
        }
        if transformation.sql.is_empty() {
            return Err(InvalidPublicSchemaError::new(format!(
                "Transformation {} ({}) on table '{}' must have SQL",
                index, transformation.operation, transformation.table
            )));
        }
    }

    Ok(())
}

/// Create a validated public schema descriptor
///
/// The output schema is taken from `output_schema`'s own description: a raw
/// [`JsonSchema`] is used verbatim, a record type contributes its derived schema.
pub fn create_public_schema<S>(
    name: impl Into<String>,
    source: Source,
    output_schema: &S,
    version: Version,
    config: PublicSchemaConfig,
) -> Result<PublicSchemaData, InvalidPublicSchemaError>
where
    S: SchemaDescribable + ?Sized,
{
    let name = name.into();
    let output_schema = output_schema.json_schema();

    validate_public_schema(&name, &source, &config)?;

    tracing::debug!(
        name = %name,
        version = %version,
        transformations = config.transformations.len(),
        "created public schema"
    );

    Ok(PublicSchemaData {
        name,
        source,
        output_schema,
        version,
        config,
    })
}

/// Parse and validate a public schema descriptor from JSON
pub fn deserialize_public_schema(json: &str) -> Result<PublicSchemaData, ContractError> {
    let data: PublicSchemaData =
        serde_json::from_str(json).map_err(|e| ContractError::ParseError(e.to_string()))?;
    data.validate()?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_schema::JsonType;
    use crate::record::{FieldType, RecordShape};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ACCOUNT_SQL: &str = "SELECT id, email FROM account WHERE id = :id";

    fn account_schema() -> JsonSchema {
        JsonSchema::from_value(json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "email": { "type": "string" }
            },
            "required": ["id", "email"]
        }))
        .unwrap()
    }

    fn account_config() -> PublicSchemaConfig {
        PublicSchemaConfig::postgres(
            create_postgres_public_schema_transformation("insertOrUpdate", "account", ACCOUNT_SQL)
                .unwrap(),
        )
    }

    #[test]
    fn insert_or_update_expands_to_insert_then_update() {
        let transformations =
            create_postgres_public_schema_transformation("insertOrUpdate", "t", "SQL").unwrap();

        assert_eq!(
            transformations,
            vec![
                PostgresTransformation::new(PostgresOperation::Insert, "t", "SQL"),
                PostgresTransformation::new(PostgresOperation::Update, "t", "SQL"),
            ]
        );
    }

    #[test]
    fn delete_expands_to_single_entry() {
        let transformations =
            create_postgres_public_schema_transformation("delete", "t", "SQL").unwrap();

        assert_eq!(
            transformations,
            vec![PostgresTransformation::new(PostgresOperation::Delete, "t", "SQL")]
        );
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = create_postgres_public_schema_transformation("bogus", "t", "SQL").unwrap_err();
        assert_eq!(err, TransformationError::InvalidOperation("bogus".to_string()));
        assert_eq!(err.to_string(), "Invalid operation: bogus");
    }

    #[test]
    fn transformation_serializes_lowercase_operation() {
        let value = serde_json::to_value(PostgresTransformation::new(
            PostgresOperation::Update,
            "account",
            ACCOUNT_SQL,
        ))
        .unwrap();

        assert_eq!(
            value,
            json!({ "operation": "update", "table": "account", "sql": ACCOUNT_SQL })
        );
    }

    #[test]
    fn raw_output_schema_used_verbatim() {
        let raw = account_schema();
        let schema = create_public_schema(
            "account",
            Source::new("main-db"),
            &raw,
            Version::new(1, 0),
            account_config(),
        )
        .unwrap();

        assert_eq!(schema.output_schema, raw);
    }

    #[test]
    fn any_raw_mapping_is_accepted_unchanged() {
        let raws = [
            json!({}),
            json!({ "type": "string" }),
            json!({
                "type": "object",
                "properties": {
                    "meta": true,
                    "pair": { "type": "array", "items": [{ "type": "string" }, { "type": "integer" }] }
                },
                "description": null
            }),
        ];

        for raw in raws {
            let schema = create_public_schema(
                "account",
                Source::new("main-db"),
                &JsonSchema::from_value(raw.clone()).unwrap(),
                Version::new(1, 0),
                account_config(),
            )
            .unwrap();

            assert_eq!(schema.to_value().unwrap()["outputSchema"], raw);
            let parsed = deserialize_public_schema(&schema.to_json().unwrap()).unwrap();
            assert_eq!(parsed.output_schema.to_value(), raw);
        }
    }

    #[test]
    fn derived_output_schema_matches_record_shape() {
        let shape = RecordShape::new()
            .field("id", FieldType::Int)
            .field("email", FieldType::String);

        let schema = create_public_schema(
            "account",
            Source::new("main-db"),
            &shape,
            Version::new(1, 0),
            account_config(),
        )
        .unwrap();

        assert_eq!(schema.output_schema, shape.json_schema());
    }

    #[test]
    fn empty_transformations_always_rejected() {
        // even with every other field invalid, the transformation check wins
        let err = create_public_schema(
            "",
            Source::new(""),
            &JsonSchema::of_type(JsonType::String),
            Version::new(0, 0),
            PublicSchemaConfig::postgres(Vec::new()),
        )
        .unwrap_err();

        assert_eq!(err.message, "Public schema must have at least one transformation");
    }

    #[test]
    fn structural_fields_are_validated() {
        let empty_name = create_public_schema(
            "",
            Source::new("main-db"),
            &account_schema(),
            Version::new(1, 0),
            account_config(),
        );
        assert!(empty_name.is_err());

        let empty_slug = create_public_schema(
            "account",
            Source::new(""),
            &account_schema(),
            Version::new(1, 0),
            account_config(),
        );
        assert!(empty_slug.is_err());

        let empty_sql = create_public_schema(
            "account",
            Source::new("main-db"),
            &account_schema(),
            Version::new(1, 0),
            PublicSchemaConfig::postgres(postgres_transformations(
                TransformationOperation::Delete,
                "account",
                "",
            )),
        )
        .unwrap_err();
        assert!(empty_sql.message.contains("must have SQL"));
    }

    #[test]
    fn descriptor_serializes_camel_case_keys() {
        let schema = create_public_schema(
            "account",
            Source::new("main-db"),
            &account_schema(),
            Version::new(2, 1),
            account_config(),
        )
        .unwrap();

        let value = schema.to_value().unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["config", "name", "outputSchema", "source", "version"]);
        assert_eq!(value["source"], json!({ "dataStoreSlug": "main-db" }));
        assert_eq!(value["version"], json!({ "major": 2, "minor": 1 }));
        assert_eq!(value["config"]["publicSchemaType"], json!("postgres"));
    }

    #[test]
    fn deserialize_revalidates() {
        let schema = create_public_schema(
            "account",
            Source::new("main-db"),
            &account_schema(),
            Version::new(1, 0),
            account_config(),
        )
        .unwrap();

        let parsed = deserialize_public_schema(&schema.to_json().unwrap()).unwrap();
        assert_eq!(parsed, schema);

        let mut broken = schema.to_value().unwrap();
        broken["config"]["transformations"] = json!([]);
        let err = deserialize_public_schema(&broken.to_string()).unwrap_err();
        assert!(matches!(err, ContractError::InvalidPublicSchema(_)));

        let err = deserialize_public_schema("{\"name\": \"account\"}").unwrap_err();
        assert!(matches!(err, ContractError::ParseError(_)));
    }
}
