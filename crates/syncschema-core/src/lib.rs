//! syncschema core
//!
//! Declarative contracts for data synchronization: public schemas describe
//! what a source data store exposes, consumer schemas describe how a
//! destination ingests it. Every factory validates its input and returns a
//! serializable descriptor.

pub mod config;
pub mod consumer_schema;
pub mod diagnostic;
pub mod error;
pub mod json_schema;
pub mod public_schema;
pub mod record;
pub mod report;

pub use config::{Config, ConfigError, SeverityThreshold, CONFIG_FILE_NAME};
pub use consumer_schema::{
    create_consumer_schema, deserialize_consumer_schema, validate_consumer_schema,
    ConsumerSchemaConfig, ConsumerSchemaData, ConsumerSchemaType, PublicSchemaReference,
    SourceManifestRef,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Hint, Location, Severity};
pub use error::{ContractError, InvalidConsumerSchemaError, InvalidPublicSchemaError, TransformationError};
pub use json_schema::{JsonSchema, JsonType, SchemaDescribable, DRAFT_07};
pub use public_schema::{
    create_postgres_public_schema_transformation, create_public_schema, deserialize_public_schema,
    postgres_transformations, validate_public_schema, PostgresOperation, PostgresTransformation,
    PublicSchemaConfig, PublicSchemaData, PublicSchemaType, Source, TransformationOperation, Version,
};
pub use record::{Field, FieldType, RecordShape};
pub use report::{ExternalReference, ReferencedBy, Report, ReportSummary, ReportVersion};
