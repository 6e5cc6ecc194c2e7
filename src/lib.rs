//! # Trialstore - Relational storage for optimization studies
//!
//! Persistence layer for a hyperparameter-optimization experiment tracker.
//!
//! Trialstore provides:
//! - SQLite schema for studies, trials, study/trial attributes and a version marker
//! - Engine-enforced uniqueness, singleton and referential constraints
//! - Repositories scoped to an explicit unit of work
//! - Typed, distinguishable integrity failures for callers that retry

pub mod study;
pub mod trial;
pub mod attribute;
pub mod version;
pub mod storage;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use study::{NewStudy, Study, StudyDirection, StudyId};
pub use trial::{NewTrial, Trial, TrialFilter, TrialId, TrialState};
pub use attribute::{StudySystemAttribute, TrialAttribute, TrialAttributeKind};
pub use version::{VersionInfo, SCHEMA_VERSION, VERSION_INFO_ID};
pub use storage::{Store, UnitOfWork};
pub use config::StoreConfig;

/// Result type alias for Trialstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which declared constraint the engine reported as violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
    Check,
    NotNull,
    Other,
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::PrimaryKey => "primary key",
            ConstraintKind::Check => "check",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Other => "constraint",
        };
        f.write_str(s)
    }
}

/// Error types for Trialstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[source] rusqlite::Error),

    #[error("Integrity violation ({constraint}): {message}")]
    Integrity {
        constraint: ConstraintKind,
        message: String,
    },

    #[error("Referential integrity violation: {0}")]
    Referential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition for trial {trial_id}: {from} -> {to}")]
    InvalidTransition {
        trial_id: i64,
        from: TrialState,
        to: TrialState,
    },

    #[error("Unit of work aborted after a failed write; nothing was committed")]
    UnitOfWorkAborted,

    #[error("Schema version mismatch: database has {found}, library expects {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for uniqueness/singleton/check failures and foreign-key failures,
    /// i.e. everything a caller may retry or abort on.
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::Integrity { .. } | Error::Referential(_))
    }

    /// Copy of a constraint failure, so a unit of work can report it again
    /// at commit. Other errors carry no copyable detail.
    pub(crate) fn integrity_copy(&self) -> Option<Error> {
        match self {
            Error::Integrity {
                constraint,
                message,
            } => Some(Error::Integrity {
                constraint: *constraint,
                message: message.clone(),
            }),
            Error::Referential(message) => Some(Error::Referential(message.clone())),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                let message = msg.clone().unwrap_or_else(|| code.to_string());
                let constraint = match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Error::Referential(message),
                    ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
                    ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
                    ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
                    _ => ConstraintKind::Other,
                };
                return Error::Integrity { constraint, message };
            }
        }
        Error::Storage(err)
    }
}
