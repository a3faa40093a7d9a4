//! Sync manifest files
//!
//! A manifest collects the public and consumer schemas governed by one
//! service, keyed by a workspace-unique slug.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use syncschema_core::{ConsumerSchemaData, ContractError, PublicSchemaData};
use walkdir::WalkDir;

/// File name manifests are stored under
pub const MANIFEST_FILE_NAME: &str = "syncschema-manifest.json";

/// Current manifest file format version
pub const MANIFEST_VERSION: u32 = 0;

/// Connection-specific settings of a data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreConfig {
    /// Kind of connection, e.g. `postgres`
    pub connection_type: String,

    /// Remaining settings (replication slot, publication, tables)
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl DataStoreConfig {
    pub fn new(connection_type: impl Into<String>) -> Self {
        Self {
            connection_type: connection_type.into(),
            options: Map::new(),
        }
    }
}

/// A data store declared by a manifest, addressed by its connection slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    pub connection_slug: String,

    /// Required when public schemas read from this store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<DataStoreConfig>,
}

impl DataStore {
    pub fn new(connection_slug: impl Into<String>) -> Self {
        Self {
            connection_slug: connection_slug.into(),
            config: None,
        }
    }

    pub fn with_config(mut self, config: DataStoreConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// sync manifest structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncManifest {
    /// Unique identifier; hyphens and alphanumerics only
    pub slug: String,

    /// Version of the manifest file format
    pub manifest_version: u32,

    /// Data stores schemas may read from or write to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_stores: Vec<DataStore>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub public_schemas: Vec<PublicSchemaData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumer_schemas: Vec<ConsumerSchemaData>,

    /// Relative paths of nested manifests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<String>,
}

impl SyncManifest {
    /// Create an empty manifest
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            manifest_version: MANIFEST_VERSION,
            data_stores: Vec::new(),
            public_schemas: Vec::new(),
            consumer_schemas: Vec::new(),
            workspaces: Vec::new(),
        }
    }

    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string, validating every schema it contains
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        let manifest: SyncManifest = serde_json::from_str(json)
            .map_err(|e| ManifestError::ParseError(e.to_string()))?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Check every schema with the factory validation rules
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.slug.is_empty() {
            return Err(ManifestError::InvalidSlug(self.slug.clone()));
        }
        if !self.slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ManifestError::InvalidSlug(self.slug.clone()));
        }

        for schema in &self.public_schemas {
            schema
                .validate()
                .map_err(|e| ManifestError::InvalidSchema(schema.name.clone(), e.into()))?;
        }
        for schema in &self.consumer_schemas {
            schema
                .validate()
                .map_err(|e| ManifestError::InvalidSchema(schema.name.clone(), e.into()))?;
        }

        Ok(())
    }

    /// Add a public schema, replacing any existing one with the same name and major version
    pub fn add_public_schema(&mut self, schema: PublicSchemaData) {
        let existing = self.public_schemas.iter_mut().find(|s| {
            s.name == schema.name && s.version.major == schema.version.major
        });

        match existing {
            Some(slot) => {
                tracing::debug!(
                    name = %schema.name,
                    from = %slot.version,
                    to = %schema.version,
                    "replacing public schema"
                );
                *slot = schema;
            }
            None => self.public_schemas.push(schema),
        }
    }

    /// Add a consumer schema, replacing any existing one with the same name
    pub fn add_consumer_schema(&mut self, schema: ConsumerSchemaData) {
        match self.consumer_schemas.iter_mut().find(|s| s.name == schema.name) {
            Some(slot) => *slot = schema,
            None => self.consumer_schemas.push(schema),
        }
    }

    /// Add a data store, replacing any existing one with the same connection slug
    pub fn add_data_store(&mut self, data_store: DataStore) {
        match self
            .data_stores
            .iter_mut()
            .find(|ds| ds.connection_slug == data_store.connection_slug)
        {
            Some(slot) => *slot = data_store,
            None => self.data_stores.push(data_store),
        }
    }

    /// Find a declared data store by connection slug
    pub fn find_data_store(&self, connection_slug: &str) -> Option<&DataStore> {
        self.data_stores
            .iter()
            .find(|ds| ds.connection_slug == connection_slug)
    }

    /// Find a public schema by name and major version
    pub fn find_public_schema(&self, name: &str, major_version: u32) -> Option<&PublicSchemaData> {
        self.public_schemas
            .iter()
            .find(|s| s.name == name && s.version.major == major_version)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ManifestError> {
        let json = self
            .to_json()
            .map_err(|e| ManifestError::SerializeError(e.to_string()))?;

        std::fs::write(path, json)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))
    }
}

/// A manifest together with the file it was loaded from
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestWithPath {
    pub manifest: SyncManifest,
    pub path: Option<PathBuf>,
}

impl ManifestWithPath {
    pub fn new(manifest: SyncManifest, path: Option<PathBuf>) -> Self {
        Self { manifest, path }
    }

    /// Load a manifest and remember its path
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        Ok(Self::new(SyncManifest::from_file(path)?, Some(path.to_path_buf())))
    }

    pub fn path_string(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.display().to_string())
    }
}

impl From<SyncManifest> for ManifestWithPath {
    fn from(manifest: SyncManifest) -> Self {
        Self::new(manifest, None)
    }
}

/// Find every manifest file under `root`, sorted by path
///
/// A file path is returned as-is.
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry
            .map_err(|e| ManifestError::IoError(root.display().to_string(), e.to_string()))?;

        if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE_NAME {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Manifest loading errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),

    #[error("Failed to serialize manifest: {0}")]
    SerializeError(String),

    #[error("Invalid manifest slug '{0}': use hyphens and alphanumeric characters only")]
    InvalidSlug(String),

    #[error("Schema '{0}' is invalid: {1}")]
    InvalidSchema(String, ContractError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use syncschema_core::{
        create_consumer_schema, create_postgres_public_schema_transformation, create_public_schema,
        ConsumerSchemaConfig, FieldType, PublicSchemaConfig, PublicSchemaReference, RecordShape,
        Source, SourceManifestRef, Version,
    };

    fn account(version: Version) -> PublicSchemaData {
        create_public_schema(
            "account",
            Source::new("main-db"),
            &RecordShape::new().field("id", FieldType::Int),
            version,
            PublicSchemaConfig::postgres(
                create_postgres_public_schema_transformation(
                    "insertOrUpdate",
                    "account",
                    "SELECT id FROM account WHERE id = :id",
                )
                .unwrap(),
            ),
        )
        .unwrap()
    }

    #[test]
    fn empty_manifest_omits_collections() {
        let json = SyncManifest::new("accounts").to_json().unwrap();
        assert!(json.contains("\"manifestVersion\": 0"));
        assert!(!json.contains("publicSchemas"));
        assert!(!json.contains("dataStores"));
        assert!(!json.contains("workspaces"));
    }

    #[test]
    fn minor_version_bump_replaces_schema() {
        let mut manifest = SyncManifest::new("accounts");
        manifest.add_public_schema(account(Version::new(1, 0)));
        manifest.add_public_schema(account(Version::new(1, 1)));
        manifest.add_public_schema(account(Version::new(2, 0)));

        assert_eq!(manifest.public_schemas.len(), 2);
        assert_eq!(
            manifest.find_public_schema("account", 1).map(|s| s.version),
            Some(Version::new(1, 1))
        );
        assert!(manifest.find_public_schema("account", 3).is_none());
    }

    #[test]
    fn consumer_schema_replaced_by_name() {
        let consumer = |sql: &str| {
            create_consumer_schema(
                "account-copy",
                SourceManifestRef::new("accounts", PublicSchemaReference::new("account", 1)),
                ConsumerSchemaConfig::postgres("replica", sql),
                None,
            )
            .unwrap()
        };

        let mut manifest = SyncManifest::new("replica");
        manifest.add_consumer_schema(consumer("INSERT INTO a (id) VALUES (:id)"));
        manifest.add_consumer_schema(consumer("INSERT INTO b (id) VALUES (:id)"));

        assert_eq!(manifest.consumer_schemas.len(), 1);
        assert!(manifest.consumer_schemas[0].config.sql.contains("INTO b"));
    }

    #[test]
    fn parse_round_trip() {
        let mut manifest = SyncManifest::new("accounts");
        manifest.add_public_schema(account(Version::new(1, 0)));

        let parsed = SyncManifest::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn data_stores_parse_with_and_without_config() {
        let manifest = SyncManifest::from_str(
            r#"{
                "slug": "accounts",
                "manifestVersion": 0,
                "dataStores": [
                    {
                        "connectionSlug": "accounts-db",
                        "config": { "connectionType": "postgres", "slotName": "sync_slot", "publicationName": "sync_pub" }
                    },
                    { "connectionSlug": "cache" }
                ]
            }"#,
        )
        .unwrap();

        let source = manifest.find_data_store("accounts-db").unwrap();
        let config = source.config.as_ref().unwrap();
        assert_eq!(config.connection_type, "postgres");
        assert_eq!(config.options["slotName"], serde_json::json!("sync_slot"));
        assert!(manifest.find_data_store("cache").unwrap().config.is_none());

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"publicationName\": \"sync_pub\""));
        assert_eq!(SyncManifest::from_str(&json).unwrap(), manifest);
    }

    #[test]
    fn data_store_replaced_by_connection_slug() {
        let mut manifest = SyncManifest::new("accounts");
        manifest.add_data_store(DataStore::new("accounts-db"));
        manifest.add_data_store(DataStore::new("accounts-db").with_config(DataStoreConfig::new("postgres")));

        assert_eq!(manifest.data_stores.len(), 1);
        assert!(manifest.data_stores[0].config.is_some());
        assert!(manifest.find_data_store("other").is_none());
    }

    #[test]
    fn invalid_slug_rejected() {
        let err = SyncManifest::from_str(r#"{ "slug": "has spaces", "manifestVersion": 0 }"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidSlug(_)));
    }

    #[test]
    fn invalid_schema_rejected() {
        let mut manifest = SyncManifest::new("accounts");
        let mut schema = account(Version::new(1, 0));
        schema.config.transformations.clear();
        manifest.public_schemas.push(schema);

        let err = SyncManifest::from_str(&manifest.to_json().unwrap()).unwrap_err();
        match err {
            ManifestError::InvalidSchema(name, _) => assert_eq!(name, "account"),
            other => panic!("Expected InvalidSchema, got {:?}", other),
        }
    }
}
