//! Database schema definitions
//!
//! The schema is a plain value built by [`Schema::current`] and handed to the
//! store when it opens a database. Every consistency rule the layers above rely
//! on is declared here so SQLite enforces it for all writers:
//! - `UNIQUE (study_id, key)` / `UNIQUE (trial_id, key)` on attribute tables
//! - `CHECK (version_info_id = 1)` on the version marker
//! - state/direction domains and the running-iff-no-completion-time rule
//! - engine-side `now` defaults for every timestamp

use crate::version::SCHEMA_VERSION;

/// Engine clock expression used for defaults and state transitions (UTC, ms)
pub const NOW_SQL: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Text layout produced by [`NOW_SQL`], for parsing on the way out
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQL to create the study table
pub const CREATE_STUDY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS study (
    study_id INTEGER PRIMARY KEY,
    study_name TEXT NOT NULL UNIQUE,
    task TEXT NOT NULL DEFAULT 'NOT_SET'
        CHECK (task IN ('NOT_SET', 'MINIMIZE', 'MAXIMIZE')),
    datetime_create TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

/// SQL to create the trial table
pub const CREATE_TRIAL_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS trial (
    trial_id INTEGER PRIMARY KEY,
    study_id INTEGER REFERENCES study(study_id) ON DELETE CASCADE,
    state TEXT NOT NULL DEFAULT 'RUNNING'
        CHECK (state IN ('RUNNING', 'COMPLETE', 'PRUNED', 'FAIL')),
    value REAL,
    datetime_start TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
    datetime_complete TEXT,
    CHECK ((state = 'RUNNING') = (datetime_complete IS NULL))
)
"#;

/// SQL to create the study_system_attribute table
pub const CREATE_STUDY_SYSTEM_ATTRIBUTE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS study_system_attribute (
    study_system_attribute_id INTEGER PRIMARY KEY,
    study_id INTEGER REFERENCES study(study_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value_json TEXT NOT NULL,
    UNIQUE (study_id, key)
)
"#;

/// SQL to create the trial_user_attribute table
pub const CREATE_TRIAL_USER_ATTRIBUTE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS trial_user_attribute (
    trial_user_attribute_id INTEGER PRIMARY KEY,
    trial_id INTEGER REFERENCES trial(trial_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value_json TEXT NOT NULL,
    UNIQUE (trial_id, key)
)
"#;

/// SQL to create the trial_system_attribute table
pub const CREATE_TRIAL_SYSTEM_ATTRIBUTE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS trial_system_attribute (
    trial_system_attribute_id INTEGER PRIMARY KEY,
    trial_id INTEGER REFERENCES trial(trial_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value_json TEXT NOT NULL,
    UNIQUE (trial_id, key)
)
"#;

/// SQL to create the version_info table.
/// `version_info_id` aliases the rowid, so an insert without an explicit id
/// gets max+1 and trips the CHECK once a row exists.
pub const CREATE_VERSION_INFO_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS version_info (
    version_info_id INTEGER PRIMARY KEY CHECK (version_info_id = 1),
    schema_version INTEGER NOT NULL,
    library_version TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_trial_study ON trial(study_id)",
    "CREATE INDEX IF NOT EXISTS idx_trial_state ON trial(state)",
];

/// One table of the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub ddl: &'static str,
}

impl TableDef {
    const fn new(name: &'static str, ddl: &'static str) -> Self {
        Self { name, ddl }
    }
}

/// Immutable schema definition applied by the store at open time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    version: i64,
    tables: Vec<TableDef>,
    indexes: Vec<&'static str>,
}

impl Schema {
    /// The schema this build of the library reads and writes
    pub fn current() -> Self {
        Self {
            version: SCHEMA_VERSION,
            // Parents before children so REFERENCES resolve in order
            tables: vec![
                TableDef::new("study", CREATE_STUDY_TABLE),
                TableDef::new("trial", CREATE_TRIAL_TABLE),
                TableDef::new("study_system_attribute", CREATE_STUDY_SYSTEM_ATTRIBUTE_TABLE),
                TableDef::new("trial_user_attribute", CREATE_TRIAL_USER_ATTRIBUTE_TABLE),
                TableDef::new("trial_system_attribute", CREATE_TRIAL_SYSTEM_ATTRIBUTE_TABLE),
                TableDef::new("version_info", CREATE_VERSION_INFO_TABLE),
            ],
            indexes: CREATE_INDEXES.to_vec(),
        }
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        self.tables.iter().map(|t| t.name).collect()
    }

    /// All schema creation statements, tables first
    pub fn statements(&self) -> Vec<&'static str> {
        let mut stmts: Vec<&'static str> = self.tables.iter().map(|t| t.ddl).collect();
        stmts.extend(self.indexes.iter().copied());
        stmts
    }
}
