//! Cross-manifest verification
//!
//! Checks a set of manifests for slug collisions, duplicate public schemas,
//! undeclared data stores and consumer schemas whose public schema reference
//! cannot be resolved.
//! References to manifests outside the set are collected rather than
//! treated as failures unless `check_external_references` is set.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use syncschema_core::{
    ConsumerSchemaData, Diagnostic, DiagnosticCode, ExternalReference, Location, PublicSchemaData,
    ReferencedBy, Severity, Version,
};

use crate::manifest::ManifestWithPath;
use crate::placeholder::extract_placeholders;

/// Verification switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Report references to manifests outside the set as errors
    pub check_external_references: bool,

    /// Cross-check consumer SQL placeholders against public schema fields
    pub check_placeholders: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            check_external_references: false,
            check_placeholders: true,
        }
    }
}

impl From<&syncschema_core::Config> for VerifyOptions {
    fn from(config: &syncschema_core::Config) -> Self {
        Self {
            check_external_references: config.check_external_references,
            check_placeholders: config.check_placeholders,
        }
    }
}

/// Outcome of verifying a set of manifests
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    /// True when no diagnostic has error severity
    pub is_valid: bool,

    pub diagnostics: Vec<Diagnostic>,

    /// Consumer references to manifests outside the verified set
    pub external_references: Vec<ExternalReference>,
}

impl VerificationResult {
    fn new(diagnostics: Vec<Diagnostic>, external_references: Vec<ExternalReference>) -> Self {
        Self {
            is_valid: !diagnostics.iter().any(Diagnostic::is_error),
            diagnostics,
            external_references,
        }
    }

    /// Recompute validity after severities were rewritten
    pub fn refresh(&mut self) {
        self.is_valid = !self.diagnostics.iter().any(Diagnostic::is_error);
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}

/// Verify a set of manifests against each other
pub fn verify_manifests(manifests: &[ManifestWithPath], options: &VerifyOptions) -> VerificationResult {
    let mut diagnostics = verify_slug_uniqueness(manifests);
    diagnostics.extend(verify_public_schema_uniqueness(manifests));
    diagnostics.extend(verify_public_schema_sources(manifests));

    let (reference_diagnostics, external_references) = verify_consumer_references(manifests, options);
    diagnostics.extend(reference_diagnostics);

    let result = VerificationResult::new(diagnostics, external_references);

    if result.is_valid {
        tracing::debug!(
            manifests = manifests.len(),
            external = result.external_references.len(),
            "manifests verified"
        );
    } else {
        tracing::warn!(
            manifests = manifests.len(),
            errors = result.errors().count(),
            "manifest verification failed"
        );
    }

    result
}

fn location(entry: &ManifestWithPath) -> Location {
    Location::new(entry.manifest.slug.clone()).with_path(entry.path_string())
}

fn verify_slug_uniqueness(manifests: &[ManifestWithPath]) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    let mut diagnostics = Vec::new();

    for entry in manifests {
        let slug = &entry.manifest.slug;
        if !seen.insert(slug.as_str()) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DuplicateManifestSlug,
                    Severity::Error,
                    format!("Manifest slug '{}' is already used by another manifest", slug),
                )
                .with_location(location(entry))
                .with_hint(
                    "Each manifest must have a unique slug",
                    Some("Change the slug of one of the manifests".to_string()),
                ),
            );
        }
    }

    diagnostics
}

/// A public schema name and full version may be defined once across the whole set
fn verify_public_schema_uniqueness(manifests: &[ManifestWithPath]) -> Vec<Diagnostic> {
    let mut defined_in: HashMap<(&str, Version), &str> = HashMap::new();
    let mut diagnostics = Vec::new();

    for entry in manifests {
        for (index, schema) in entry.manifest.public_schemas.iter().enumerate() {
            match defined_in.entry((schema.name.as_str(), schema.version)) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.manifest.slug.as_str());
                }
                Entry::Occupied(previous) => {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::DuplicatePublicSchema,
                            Severity::Error,
                            format!(
                                "Public schema '{}' version {} already defined in manifest '{}'",
                                schema.name,
                                schema.version,
                                previous.get()
                            ),
                        )
                        .with_location(location(entry).with_context(format!("publicSchemas[{}]", index)))
                        .with_hint("Bump the version or remove one of the definitions", None),
                    );
                }
            }
        }
    }

    diagnostics
}

/// Public schemas must read from a configured data store of their own manifest.
/// Only manifests that declare data stores are checked.
fn verify_public_schema_sources(manifests: &[ManifestWithPath]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for entry in manifests.iter().filter(|e| !e.manifest.data_stores.is_empty()) {
        for (index, schema) in entry.manifest.public_schemas.iter().enumerate() {
            let slug = &schema.source.data_store_slug;
            let context = format!("publicSchemas[{}].source.dataStoreSlug", index);

            match entry.manifest.find_data_store(slug) {
                None => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DataStoreNotFound,
                        Severity::Error,
                        format!(
                            "Public schema '{}' references data store '{}' which does not exist in manifest '{}'",
                            schema.name, slug, entry.manifest.slug
                        ),
                    )
                    .with_location(location(entry).with_context(context))
                    .with_hint(
                        "Declare the data store under dataStores",
                        Some(format!("Declared data stores: {}", declared_names(entry))),
                    ),
                ),
                Some(store) if store.config.is_none() => diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DataStoreMissingConfig,
                        Severity::Error,
                        format!(
                            "Public schema '{}' references data store '{}' which does not have a configuration",
                            schema.name, slug
                        ),
                    )
                    .with_location(location(entry).with_context(context))
                    .with_hint(
                        "Add a configuration to the data store",
                        Some("Define the connection type and its settings".to_string()),
                    ),
                ),
                Some(_) => {}
            }
        }
    }

    diagnostics
}

fn declared_names(entry: &ManifestWithPath) -> String {
    entry
        .manifest
        .data_stores
        .iter()
        .map(|ds| ds.connection_slug.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn verify_consumer_references(
    manifests: &[ManifestWithPath],
    options: &VerifyOptions,
) -> (Vec<Diagnostic>, Vec<ExternalReference>) {
    let by_slug: HashMap<&str, &ManifestWithPath> = manifests
        .iter()
        .map(|entry| (entry.manifest.slug.as_str(), entry))
        .collect();

    // Destination stores may live in any manifest of the set
    let declared_stores: HashSet<&str> = manifests
        .iter()
        .flat_map(|entry| entry.manifest.data_stores.iter())
        .map(|ds| ds.connection_slug.as_str())
        .collect();

    let mut diagnostics = Vec::new();
    let mut external = Vec::new();

    for entry in manifests {
        for (index, consumer) in entry.manifest.consumer_schemas.iter().enumerate() {
            let context = format!("consumerSchemas[{}]", index);

            let Some(source) = by_slug.get(consumer.source_manifest_slug.as_str()) else {
                if options.check_external_references {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::ManifestNotFound,
                            Severity::Error,
                            format!(
                                "Consumer schema '{}' references manifest '{}' which does not exist in the workspace",
                                consumer.name, consumer.source_manifest_slug
                            ),
                        )
                        .with_location(location(entry).with_context(format!("{}.sourceManifestSlug", context)))
                        .with_hint("Ensure all referenced manifests are included in the workspace", None),
                    );
                }

                external.push(ExternalReference {
                    manifest_slug: consumer.source_manifest_slug.clone(),
                    public_schema: consumer.public_schema.clone(),
                    referenced_by: ReferencedBy {
                        manifest_slug: entry.manifest.slug.clone(),
                    },
                });
                continue;
            };

            let reference = &consumer.public_schema;
            let candidates: Vec<&PublicSchemaData> = source
                .manifest
                .public_schemas
                .iter()
                .filter(|s| s.name == reference.name)
                .collect();

            if candidates.is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::PublicSchemaNotFound,
                        Severity::Error,
                        format!(
                            "Consumer schema '{}' references public schema '{}' which does not exist in manifest '{}'",
                            consumer.name, reference.name, source.manifest.slug
                        ),
                    )
                    .with_location(location(entry).with_context(format!("{}.publicSchema.name", context)))
                    .with_hint(
                        "Reference a public schema defined by the source manifest",
                        available_schemas(source),
                    ),
                );
                continue;
            }

            let public = candidates
                .iter()
                .copied()
                .find(|s| s.version.major == reference.major_version);

            if public.is_none() {
                let versions: Vec<String> = candidates.iter().map(|s| s.version.to_string()).collect();
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::VersionMismatch,
                        Severity::Error,
                        format!(
                            "Consumer schema '{}' requires major version {} of public schema '{}', but available versions are: {}",
                            consumer.name,
                            reference.major_version,
                            reference.name,
                            versions.join(", ")
                        ),
                    )
                    .with_location(location(entry).with_context(format!("{}.publicSchema.majorVersion", context)))
                    .with_hint("Reference a major version published by the source manifest", None),
                );
            }

            let destination = consumer.config.destination_data_store_slug.as_str();
            if !declared_stores.is_empty() && !declared_stores.contains(destination) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DataStoreNotFound,
                        Severity::Error,
                        format!(
                            "Consumer schema '{}' references data store '{}' which does not exist in any manifest",
                            consumer.name, destination
                        ),
                    )
                    .with_location(
                        location(entry).with_context(format!("{}.config.destinationDataStoreSlug", context)),
                    )
                    .with_hint("Declare the destination data store in one of the manifests", None),
                );
            }

            if let Some(public) = public {
                if options.check_placeholders {
                    diagnostics.extend(verify_placeholders(entry, &context, consumer, public));
                }
            }
        }
    }

    (diagnostics, external)
}

fn available_schemas(source: &ManifestWithPath) -> Option<String> {
    let mut names: Vec<&str> = source
        .manifest
        .public_schemas
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    names.sort_unstable();
    names.dedup();

    if names.is_empty() {
        None
    } else {
        Some(format!("Available public schemas: {}", names.join(", ")))
    }
}

fn verify_placeholders(
    entry: &ManifestWithPath,
    context: &str,
    consumer: &ConsumerSchemaData,
    public: &PublicSchemaData,
) -> Vec<Diagnostic> {
    let statements = std::iter::once(("sql", consumer.config.sql.as_str()))
        .chain(consumer.config.delete_sql.as_deref().map(|sql| ("deleteSql", sql)));

    let mut diagnostics = Vec::new();
    for (field, sql) in statements {
        for name in extract_placeholders(sql) {
            if public.output_schema.has_property(&name) {
                continue;
            }

            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::UnknownPlaceholder,
                    Severity::Warn,
                    format!(
                        "Placeholder ':{}' in consumer schema '{}' is not a field of public schema '{}'",
                        name, consumer.name, public.name
                    ),
                )
                .with_location(location(entry).with_context(format!("{}.config.{}", context, field)))
                .with_hint(
                    "Placeholders are bound from the public schema output",
                    Some(format!("Known fields: {}", public.output_schema.property_names().join(", "))),
                ),
            );
        }
    }

    diagnostics
}
