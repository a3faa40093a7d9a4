//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Manifest identity
    /// Two manifests share the same slug
    DuplicateManifestSlug,

    /// The same public schema name and version is defined more than once
    DuplicatePublicSchema,

    // Data stores
    /// A schema names a data store no manifest declares
    DataStoreNotFound,

    /// A public schema reads from a data store declared without a configuration
    DataStoreMissingConfig,

    // Cross-manifest references
    /// A consumer schema references a manifest outside the verified set
    ManifestNotFound,

    /// The referenced manifest has no public schema with that name
    PublicSchemaNotFound,

    /// The referenced public schema exists, but not at the requested major version
    VersionMismatch,

    // SQL templates
    /// A SQL placeholder does not name a field of the public schema output
    UnknownPlaceholder,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateManifestSlug => "DUPLICATE_MANIFEST_SLUG",
            Self::DuplicatePublicSchema => "DUPLICATE_PUBLIC_SCHEMA",
            Self::DataStoreNotFound => "DATA_STORE_NOT_FOUND",
            Self::DataStoreMissingConfig => "DATA_STORE_MISSING_CONFIG",
            Self::ManifestNotFound => "MANIFEST_NOT_FOUND",
            Self::PublicSchemaNotFound => "PUBLIC_SCHEMA_NOT_FOUND",
            Self::VersionMismatch => "VERSION_MISMATCH",
            Self::UnknownPlaceholder => "UNKNOWN_PLACEHOLDER",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; the verifier never emits it, severity overrides can demote to it
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - blocking issue that should fail CI
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Where in a manifest a diagnostic applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Slug of the manifest
    pub manifest_slug: String,

    /// Manifest file path, when loaded from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<String>,

    /// Field path inside the manifest, e.g. `consumerSchemas[0].sql`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Location {
    /// Create a new location with just a manifest slug
    pub fn new(manifest_slug: impl Into<String>) -> Self {
        Self {
            manifest_slug: manifest_slug.into(),
            manifest_path: None,
            context: None,
        }
    }

    /// Set the manifest file path
    pub fn with_path(mut self, path: Option<impl Into<String>>) -> Self {
        self.manifest_path = path.map(Into::into);
        self
    }

    /// Set the field context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.manifest_path {
            Some(path) => write!(f, "{} ({})", self.manifest_slug, path)?,
            None => write!(f, "{}", self.manifest_slug)?,
        }
        if let Some(context) = &self.context {
            write!(f, " at {}", context)?;
        }
        Ok(())
    }
}

/// Suggested remedy for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Location in the manifest (best-effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<Hint>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            hint: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the hint
    pub fn with_hint(mut self, message: impl Into<String>, suggestions: Option<String>) -> Self {
        self.hint = Some(Hint {
            message: message.into(),
            suggestions,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
