//! Consumer schemas: how a destination data store ingests a public schema

use serde::{Deserialize, Serialize};

use crate::error::{ContractError, InvalidConsumerSchemaError};

/// Reference to a specific major version of a public schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSchemaReference {
    pub name: String,
    pub major_version: u32,
}

impl PublicSchemaReference {
    pub fn new(name: impl Into<String>, major_version: u32) -> Self {
        Self {
            name: name.into(),
            major_version,
        }
    }
}

impl std::fmt::Display for PublicSchemaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@v{}", self.name, self.major_version)
    }
}

/// A public schema defined in another manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceManifestRef {
    /// Slug of the manifest that defines the public schema
    pub manifest_slug: String,

    pub public_schema: PublicSchemaReference,
}

impl SourceManifestRef {
    pub fn new(manifest_slug: impl Into<String>, public_schema: PublicSchemaReference) -> Self {
        Self {
            manifest_slug: manifest_slug.into(),
            public_schema,
        }
    }
}

/// Kind of consumer schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerSchemaType {
    #[default]
    Postgres,
}

/// Consumer schema configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSchemaConfig {
    pub consumer_schema_type: ConsumerSchemaType,

    /// Data store the records are written to
    pub destination_data_store_slug: String,

    /// Upsert statement, parameterized by public schema fields
    pub sql: String,

    /// Statement run for delete events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_sql: Option<String>,
}

impl ConsumerSchemaConfig {
    /// Create a Postgres consumer config without a delete statement
    pub fn postgres(destination_data_store_slug: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            consumer_schema_type: ConsumerSchemaType::Postgres,
            destination_data_store_slug: destination_data_store_slug.into(),
            sql: sql.into(),
            delete_sql: None,
        }
    }

    /// Set the delete statement
    pub fn with_delete_sql(mut self, delete_sql: impl Into<String>) -> Self {
        self.delete_sql = Some(delete_sql.into());
        self
    }
}

/// Serializable consumer schema descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSchemaData {
    pub name: String,
    pub source_manifest_slug: String,
    pub public_schema: PublicSchemaReference,

    /// Path to the file that defines this schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_file: Option<String>,

    pub config: ConsumerSchemaConfig,
}

impl ConsumerSchemaData {
    /// The public schema this consumer reads from
    pub fn source(&self) -> SourceManifestRef {
        SourceManifestRef::new(self.source_manifest_slug.clone(), self.public_schema.clone())
    }

    /// Validate this descriptor with the same rules as [`create_consumer_schema`]
    pub fn validate(&self) -> Result<(), InvalidConsumerSchemaError> {
        validate_consumer_schema(&self.source(), &self.config, self.definition_file.as_deref())
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

/// Check the required consumer schema fields
///
/// `delete_sql` and `definition_file` are optional and never checked.
pub fn validate_consumer_schema(
    source: &SourceManifestRef,
    config: &ConsumerSchemaConfig,
    _definition_file: Option<&str>,
) -> Result<(), InvalidConsumerSchemaError> {
    if source.manifest_slug.is_empty() {
        return Err(InvalidConsumerSchemaError::new("Source manifest slug cannot be empty"));
    }
    if source.public_schema.name.is_empty() {
        return Err(InvalidConsumerSchemaError::new("Public schema name cannot be empty"));
    }
    if config.destination_data_store_slug.is_empty() {
        return Err(InvalidConsumerSchemaError::new(
            "Destination data store slug cannot be empty",
        ));
    }
    if config.sql.is_empty() {
        return Err(InvalidConsumerSchemaError::new(
            "Consumer schema must have a SQL transformation",
        ));
    }

    Ok(())
}

/// Create a validated consumer schema descriptor
///
/// An empty `delete_sql` is treated as absent.
pub fn create_consumer_schema(
    name: impl Into<String>,
    source: SourceManifestRef,
    mut config: ConsumerSchemaConfig,
    definition_file: Option<String>,
) -> Result<ConsumerSchemaData, InvalidConsumerSchemaError> {
    validate_consumer_schema(&source, &config, definition_file.as_deref())?;

    if config.delete_sql.as_deref() == Some("") {
        config.delete_sql = None;
    }

    let name = name.into();
    tracing::debug!(
        name = %name,
        source = %source.manifest_slug,
        public_schema = %source.public_schema,
        "created consumer schema"
    );

    Ok(ConsumerSchemaData {
        name,
        source_manifest_slug: source.manifest_slug,
        public_schema: source.public_schema,
        definition_file,
        config,
    })
}

/// Parse and validate a consumer schema descriptor from JSON
pub fn deserialize_consumer_schema(json: &str) -> Result<ConsumerSchemaData, ContractError> {
    let data: ConsumerSchemaData =
        serde_json::from_str(json).map_err(|e| ContractError::ParseError(e.to_string()))?;
    data.validate()?;
    Ok(data)
}
