//! Sync manifest handling
//!
//! This crate handles:
//! - Reading and writing manifest files (`syncschema-manifest.json`)
//! - Discovering manifests in a directory tree
//! - Verifying references between manifests and to declared data stores
//! - Extracting named SQL placeholders

pub mod manifest;
pub mod placeholder;
pub mod verify;

pub use manifest::{
    find_manifests, DataStore, DataStoreConfig, ManifestError, ManifestWithPath, SyncManifest,
    MANIFEST_FILE_NAME, MANIFEST_VERSION,
};
pub use placeholder::extract_placeholders;
pub use verify::{verify_manifests, VerificationResult, VerifyOptions};
