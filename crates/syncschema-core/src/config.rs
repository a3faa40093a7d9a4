//! Configuration schema (syncschema.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "syncschema.toml";

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }

    /// Rewrite diagnostic severities according to the overrides
    pub fn apply(&self, diagnostics: &mut [Diagnostic]) {
        for diag in diagnostics {
            diag.severity = self.get_severity(diag.code, diag.severity);
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Manifest files or directories to verify when none are given on the command line
    #[serde(default = "default_manifest_paths")]
    pub manifest_paths: Vec<PathBuf>,

    /// Report consumer references to manifests outside the verified set as errors
    #[serde(default)]
    pub check_external_references: bool,

    /// Cross-check consumer SQL placeholders against public schema fields
    #[serde(default = "default_true")]
    pub check_placeholders: bool,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_manifest_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_paths: default_manifest_paths(),
            check_external_references: false,
            check_placeholders: true,
            severity: SeverityThreshold::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Manifest paths resolved against the project root
    pub fn resolved_manifest_paths(&self) -> Vec<PathBuf> {
        self.manifest_paths
            .iter()
            .map(|p| {
                if p.is_relative() {
                    self.project_root.join(p)
                } else {
                    p.clone()
                }
            })
            .collect()
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.manifest_paths, vec![PathBuf::from(".")]);
        assert!(config.check_placeholders);
        assert!(!config.check_external_references);
    }

    #[test]
    fn parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            manifest_paths = ["services/accounts", "services/billing"]
            check_external_references = true

            [severity.overrides]
            UNKNOWN_PLACEHOLDER = "error"
            "#,
        )
        .unwrap();

        assert_eq!(config.manifest_paths.len(), 2);
        assert!(config.check_external_references);
        assert!(config.check_placeholders);
        assert_eq!(
            config.severity.get_severity(DiagnosticCode::UnknownPlaceholder, Severity::Warn),
            Severity::Error
        );
    }

    #[test]
    fn severity_override_applies_to_diagnostics() {
        let mut threshold = SeverityThreshold::default();
        threshold.set_override(DiagnosticCode::ManifestNotFound, Severity::Warn);

        let mut diagnostics = vec![
            Diagnostic::new(DiagnosticCode::ManifestNotFound, Severity::Error, "missing"),
            Diagnostic::new(DiagnosticCode::DuplicateManifestSlug, Severity::Error, "dup"),
        ];
        threshold.apply(&mut diagnostics);

        assert_eq!(diagnostics[0].severity, Severity::Warn);
        assert_eq!(diagnostics[1].severity, Severity::Error);
    }

    #[test]
    fn downgrade_to_info_is_counted_as_info() {
        let config = Config::from_toml(
            r#"
            [severity.overrides]
            UNKNOWN_PLACEHOLDER = "info"
            "#,
        )
        .unwrap();

        let mut diagnostics = vec![
            Diagnostic::new(DiagnosticCode::UnknownPlaceholder, Severity::Warn, "unknown :name"),
            Diagnostic::new(DiagnosticCode::VersionMismatch, Severity::Error, "no v2"),
        ];
        config.severity.apply(&mut diagnostics);

        let report = crate::report::Report::from_diagnostics(diagnostics);
        assert_eq!(report.summary.info, 1);
        assert_eq!(report.summary.warnings, 0);
        assert_eq!(report.summary.errors, 1);
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::from_toml("check_placeholders = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.manifest_paths, parsed.manifest_paths);
        assert_eq!(config.check_placeholders, parsed.check_placeholders);
    }
}
