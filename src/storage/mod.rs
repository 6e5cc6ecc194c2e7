//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - study(study_id, study_name, task, datetime_create)
//! - trial(trial_id, study_id, state, value, datetime_start, datetime_complete)
//! - study_system_attribute(study_id, key, value_json)
//! - trial_user_attribute(trial_id, key, value_json)
//! - trial_system_attribute(trial_id, key, value_json)
//! - version_info(version_info_id, schema_version, library_version)

pub mod repo;
pub mod schema;
pub mod session;
pub mod sqlite;

pub use repo::{
    StudyAttributeRepository, StudyRepository, TrialAttributeRepository, TrialRepository,
    VersionRepository,
};
pub use schema::Schema;
pub use session::UnitOfWork;
pub use sqlite::{DbStats, Store};
