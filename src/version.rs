//! Schema version marker

use serde::{Deserialize, Serialize};

/// Schema version written by this library
pub const SCHEMA_VERSION: i64 = 1;

/// The only identifier the `version_info` table accepts
pub const VERSION_INFO_ID: i64 = 1;

/// Singleton row identifying the schema in use and the library that wrote it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version_info_id: i64,
    pub schema_version: i64,
    pub library_version: String,
}

impl VersionInfo {
    pub fn new(schema_version: i64, library_version: impl Into<String>) -> Self {
        Self {
            version_info_id: VERSION_INFO_ID,
            schema_version,
            library_version: library_version.into(),
        }
    }

    /// Marker for the running build
    pub fn current() -> Self {
        Self::new(SCHEMA_VERSION, env!("CARGO_PKG_VERSION"))
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "schema v{} (library {})", self.schema_version, self.library_version)
    }
}
