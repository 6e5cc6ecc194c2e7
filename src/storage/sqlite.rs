//! SQLite storage implementation

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};

use super::schema::Schema;
use super::session::UnitOfWork;
use crate::attribute::TrialAttributeKind;
use crate::config::StoreConfig;
use crate::trial::{TrialFilter, TrialState};
use crate::version::VersionInfo;
use crate::{Error, Result};

/// SQLite-backed store for studies, trials and their attributes.
///
/// One `Store` owns one connection. Workers in other threads or processes
/// open their own `Store` on the same file; SQLite arbitrates between them.
pub struct Store {
    conn: Connection,
    schema: Schema,
}

impl Store {
    /// Open a database file with default settings (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &StoreConfig::default())
    }

    /// Open a database file with explicit settings
    pub fn open_with(path: &Path, config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, config, Schema::current())
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(&StoreConfig::default())
    }

    pub fn open_in_memory_with(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, config, Schema::current())
    }

    /// Open the database named by `config.database`
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        Self::open_with(&config.database_path(), config)
    }

    fn with_connection(conn: Connection, config: &StoreConfig, schema: Schema) -> Result<Self> {
        configure_connection(&conn, config)?;
        let mut store = Self { conn, schema };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create missing tables and make sure the version marker matches.
    ///
    /// Runs under `BEGIN IMMEDIATE`, so concurrent openers serialize on the
    /// write lock. If another writer still wins the marker insert, the
    /// integrity failure is absorbed and the marker is read back.
    fn initialize_schema(&mut self) -> Result<()> {
        let expected = self.schema.version();
        let statements = self.schema.statements();

        let outcome = {
            let uow = self.begin()?;
            let mut result = Ok(());
            for stmt in &statements {
                if let Err(err) = uow.execute_ddl(stmt) {
                    result = Err(err);
                    break;
                }
            }
            match result.and_then(|_| bootstrap_version(&uow, expected)) {
                Ok(()) => uow.commit(),
                Err(err) => Err(err),
            }
        };
        if outcome.is_ok() {
            tracing::debug!(
                "schema v{} ready: {}",
                expected,
                self.schema.table_names().join(", ")
            );
        }

        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.is_integrity() => {
                tracing::warn!("version marker written concurrently, re-reading: {}", err);
                let uow = self.read()?;
                check_version(uow.version().get()?, expected)
            }
            Err(err) => Err(err),
        }
    }

    /// Begin a write unit of work (takes the write lock up front)
    pub fn begin(&mut self) -> Result<UnitOfWork<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(UnitOfWork::new(tx))
    }

    /// Begin a read unit of work; sees only committed state
    pub fn read(&mut self) -> Result<UnitOfWork<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)?;
        Ok(UnitOfWork::new(tx))
    }

    /// Run `f` in a write unit of work, committing on `Ok` and rolling back on `Err`
    pub fn transact<T>(&mut self, f: impl FnOnce(&UnitOfWork<'_>) -> Result<T>) -> Result<T> {
        let uow = self.begin()?;
        match f(&uow) {
            Ok(value) => {
                uow.commit()?;
                Ok(value)
            }
            Err(err) => {
                uow.rollback()?;
                Err(err)
            }
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The stored version marker
    pub fn version_info(&mut self) -> Result<Option<VersionInfo>> {
        let uow = self.read()?;
        uow.version().get()
    }

    /// Get database statistics
    pub fn stats(&mut self) -> Result<DbStats> {
        let uow = self.read()?;
        let trials = uow.trials();

        let mut trials_by_state = Vec::new();
        for state in TrialState::all() {
            trials_by_state.push((*state, trials.count(&TrialFilter::all().state(*state))?));
        }

        Ok(DbStats {
            studies: uow.studies().count()?,
            trials: trials.count(&TrialFilter::all())?,
            trials_by_state,
            study_attributes: uow.study_attributes().count()?,
            trial_user_attributes: uow.trial_attributes(TrialAttributeKind::User).count()?,
            trial_system_attributes: uow.trial_attributes(TrialAttributeKind::System).count()?,
        })
    }
}

fn configure_connection(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
    let mode: String = conn.pragma_update_and_check(
        None,
        "journal_mode",
        config.journal_mode.pragma_value(),
        |row| row.get(0),
    )?;
    tracing::debug!(
        "sqlite connection ready (journal_mode={}, foreign_keys={})",
        mode,
        config.foreign_keys
    );
    Ok(())
}

fn bootstrap_version(uow: &UnitOfWork<'_>, expected: i64) -> Result<()> {
    let repo = uow.version();
    match repo.get()? {
        Some(found) => check_version(Some(found), expected),
        None => {
            let marker = VersionInfo {
                schema_version: expected,
                ..VersionInfo::current()
            };
            tracing::debug!("writing version marker ({})", marker);
            repo.set(marker.schema_version, &marker.library_version)
        }
    }
}

fn check_version(found: Option<VersionInfo>, expected: i64) -> Result<()> {
    match found {
        Some(info) if info.schema_version != expected => Err(Error::SchemaMismatch {
            found: info.schema_version,
            expected,
        }),
        Some(_) => Ok(()),
        None => Err(Error::NotFound("version marker".to_string())),
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub studies: usize,
    pub trials: usize,
    pub trials_by_state: Vec<(TrialState, usize)>,
    pub study_attributes: usize,
    pub trial_user_attributes: usize,
    pub trial_system_attributes: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Studies: {}", self.studies)?;
        writeln!(f, "  Trials: {}", self.trials)?;
        for (state, count) in &self.trials_by_state {
            writeln!(f, "    {}: {}", state, count)?;
        }
        writeln!(f, "  Study attributes: {}", self.study_attributes)?;
        writeln!(f, "  Trial user attributes: {}", self.trial_user_attributes)?;
        write!(f, "  Trial system attributes: {}", self.trial_system_attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstraintKind, NewStudy, NewTrial, StudyDirection, VERSION_INFO_ID};

    fn store() -> Store {
        Store::open_in_memory().unwrap()
    }

    /// Store without referential checks, for rows that point at missing parents
    fn loose_store() -> Store {
        let config = StoreConfig {
            foreign_keys: false,
            ..StoreConfig::default()
        };
        Store::open_in_memory_with(&config).unwrap()
    }

    #[test]
    fn test_open_writes_version_marker() {
        let mut store = store();
        let info = store.version_info().unwrap().unwrap();
        assert_eq!(info.version_info_id, VERSION_INFO_ID);
        assert_eq!(info.schema_version, store.schema().version());
        assert_eq!(info, VersionInfo::current());
    }

    #[test]
    fn test_study_crud() {
        let mut store = store();
        let id = store
            .transact(|uow| {
                uow.studies()
                    .create(&NewStudy::new("s1").with_direction(StudyDirection::Minimize))
            })
            .unwrap();

        let uow = store.read().unwrap();
        let study = uow.studies().find(id).unwrap().unwrap();
        assert_eq!(study.study_name, "s1");
        assert_eq!(study.direction, StudyDirection::Minimize);
        assert_eq!(uow.studies().find_by_name("s1").unwrap().unwrap().study_id, id);
        assert!(uow.studies().find(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_all_studies_in_id_order() {
        let mut store = store();
        assert!(store.read().unwrap().studies().all().unwrap().is_empty());

        store
            .transact(|uow| {
                uow.studies().create(&NewStudy::new("late").with_id(7))?;
                uow.studies().create(&NewStudy::new("early").with_id(3))
            })
            .unwrap();

        let uow = store.read().unwrap();
        let names: Vec<_> = uow
            .studies()
            .all()
            .unwrap()
            .into_iter()
            .map(|s| s.study_name)
            .collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[test]
    fn test_duplicate_study_name_is_integrity_error() {
        let mut store = store();
        store.transact(|uow| uow.studies().create(&NewStudy::new("s1"))).unwrap();

        let err = store
            .transact(|uow| uow.studies().create(&NewStudy::new("s1")))
            .unwrap_err();
        assert!(matches!(err, Error::Integrity { constraint: ConstraintKind::Unique, .. }));
        assert_eq!(store.stats().unwrap().studies, 1);
    }

    #[test]
    fn test_set_direction() {
        let mut store = store();
        let id = store.transact(|uow| uow.studies().create(&NewStudy::new("s1"))).unwrap();
        store
            .transact(|uow| uow.studies().set_direction(id, StudyDirection::Maximize))
            .unwrap();

        let uow = store.read().unwrap();
        assert_eq!(uow.studies().find(id).unwrap().unwrap().direction, StudyDirection::Maximize);
        assert!(matches!(
            uow.studies().set_direction(99, StudyDirection::Minimize),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_write_aborts_whole_unit() {
        let mut store = store();
        let uow = store.begin().unwrap();
        uow.studies().create(&NewStudy::new("kept?")).unwrap();
        assert!(uow.studies().create(&NewStudy::new("kept?")).is_err());
        assert!(uow.is_aborted());
        let err = uow.commit().unwrap_err();
        assert!(err.is_integrity(), "{err}");
        assert!(matches!(
            err,
            Error::Integrity {
                constraint: ConstraintKind::Unique,
                ..
            }
        ));

        // Neither the valid nor the invalid insert survived
        assert_eq!(store.stats().unwrap().studies, 0);
    }

    #[test]
    fn test_commit_reports_first_failure() {
        let mut store = store();
        let uow = store.begin().unwrap();
        uow.studies().create(&NewStudy::new("s").with_id(1)).unwrap();
        uow.study_attributes().insert(1, "k", "1").unwrap();
        assert!(uow.study_attributes().insert(1, "k", "2").is_err());
        assert!(uow.version().insert(&VersionInfo::new(1, "0.0.0")).is_err());

        // The later primary-key failure does not replace the first one
        let err = uow.commit().unwrap_err();
        assert!(matches!(
            err,
            Error::Integrity {
                constraint: ConstraintKind::Unique,
                ..
            }
        ));
    }

    #[test]
    fn test_non_constraint_failure_aborts_without_cause() {
        let mut store = store();
        let uow = store.begin().unwrap();
        assert!(uow.execute_ddl("CREATE TABL broken (id INTEGER)").is_err());
        assert!(uow.is_aborted());

        let err = uow.commit().unwrap_err();
        assert!(matches!(err, Error::UnitOfWorkAborted));
        assert!(!err.is_integrity());
    }

    #[test]
    fn test_uncommitted_unit_is_rolled_back_on_drop() {
        let mut store = store();
        {
            let uow = store.begin().unwrap();
            uow.studies().create(&NewStudy::new("dropped")).unwrap();
        }
        assert_eq!(store.stats().unwrap().studies, 0);
    }

    #[test]
    fn test_stats_counts_everything() {
        let mut store = loose_store();
        store
            .transact(|uow| {
                let study = uow.studies().create(&NewStudy::new("s1"))?;
                let t1 = uow.trials().create(&NewTrial::new(study))?;
                uow.trials()
                    .create(&NewTrial::new(study).with_state(TrialState::Pruned))?;
                uow.study_attributes().insert(study, "k", "1")?;
                uow.trial_attributes(TrialAttributeKind::User).insert(t1, "k", "1")?;
                uow.trial_attributes(TrialAttributeKind::System).insert(t1, "k", "1")?;
                uow.trial_attributes(TrialAttributeKind::System).insert(t1, "k2", "2")
            })
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.studies, 1);
        assert_eq!(stats.trials, 2);
        assert!(stats.trials_by_state.contains(&(TrialState::Pruned, 1)));
        assert!(stats.trials_by_state.contains(&(TrialState::Running, 1)));
        assert_eq!(stats.study_attributes, 1);
        assert_eq!(stats.trial_user_attributes, 1);
        assert_eq!(stats.trial_system_attributes, 2);
        assert!(stats.to_string().contains("Trials: 2"));
    }
}
