//! Contract validation errors

/// A public schema failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvalidPublicSchemaError {
    pub message: String,
}

impl InvalidPublicSchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A consumer schema failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvalidConsumerSchemaError {
    pub message: String,
}

impl InvalidConsumerSchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Transformation expansion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformationError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Any failure produced while building or loading a contract
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Invalid public schema: {0}")]
    InvalidPublicSchema(#[from] InvalidPublicSchemaError),

    #[error("Invalid consumer schema: {0}")]
    InvalidConsumerSchema(#[from] InvalidConsumerSchemaError),

    #[error(transparent)]
    Transformation(#[from] TransformationError),

    #[error("Failed to parse schema JSON: {0}")]
    ParseError(String),
}
