//! Unit of work - the atomic boundary for reads and writes
//!
//! A [`UnitOfWork`] wraps one SQLite transaction. Repositories borrowed from
//! it share that transaction, so their writes become visible together on
//! [`UnitOfWork::commit`] or not at all. Dropping a unit without committing
//! rolls it back.
//!
//! Once any write fails inside a unit (constraint violation, busy database,
//! ...), the unit is marked aborted and `commit` refuses to persist the
//! remaining writes. If the first failure was a constraint violation,
//! `commit` reports that violation again.

use std::cell::{Cell, RefCell};

use rusqlite::{Connection, Transaction};

use super::repo::{
    StudyAttributeRepository, StudyRepository, TrialAttributeRepository, TrialRepository,
    VersionRepository,
};
use crate::attribute::TrialAttributeKind;
use crate::{Error, Result};

/// Handle shared by the repositories of one unit of work
#[derive(Clone, Copy)]
pub struct Session<'a> {
    conn: &'a Connection,
    aborted: &'a Cell<bool>,
    cause: &'a RefCell<Option<Error>>,
}

impl<'a> Session<'a> {
    /// Run a read; failures propagate but leave the unit usable
    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&'a Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        f(self.conn).map_err(Into::into)
    }

    /// Run a write; any failure aborts the whole unit
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&'a Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        f(self.conn).map_err(|err| {
            let err = Error::from(err);
            if err.is_integrity() {
                tracing::debug!("write rejected by constraint: {}", err);
            }
            // Only the first failure decides what commit reports
            if !self.aborted.replace(true) {
                *self.cause.borrow_mut() = err.integrity_copy();
            }
            err
        })
    }
}

/// One atomic group of reads and writes
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    aborted: Cell<bool>,
    cause: RefCell<Option<Error>>,
}

impl<'conn> UnitOfWork<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self {
            tx,
            aborted: Cell::new(false),
            cause: RefCell::new(None),
        }
    }

    fn session(&self) -> Session<'_> {
        Session {
            conn: &self.tx,
            aborted: &self.aborted,
            cause: &self.cause,
        }
    }

    pub fn studies(&self) -> StudyRepository<'_> {
        StudyRepository::new(self.session())
    }

    pub fn trials(&self) -> TrialRepository<'_> {
        TrialRepository::new(self.session())
    }

    pub fn study_attributes(&self) -> StudyAttributeRepository<'_> {
        StudyAttributeRepository::new(self.session())
    }

    pub fn trial_attributes(&self, kind: TrialAttributeKind) -> TrialAttributeRepository<'_> {
        TrialAttributeRepository::new(self.session(), kind)
    }

    pub fn version(&self) -> VersionRepository<'_> {
        VersionRepository::new(self.session())
    }

    pub(crate) fn execute_ddl(&self, sql: &str) -> Result<()> {
        self.session().write(|conn| conn.execute(sql, []).map(|_| ()))
    }

    /// Whether an earlier write failed
    pub fn is_aborted(&self) -> bool {
        self.aborted.get()
    }

    /// Make every write of this unit visible atomically.
    ///
    /// A unit whose earlier write failed is rolled back instead. The error is
    /// the constraint violation that aborted it, or `UnitOfWorkAborted` when
    /// the failure was not a constraint.
    pub fn commit(self) -> Result<()> {
        if self.aborted.get() {
            self.tx.rollback()?;
            tracing::debug!("unit of work rolled back after failed write");
            return Err(self.cause.into_inner().unwrap_or(Error::UnitOfWorkAborted));
        }
        self.tx.commit()?;
        tracing::debug!("unit of work committed");
        Ok(())
    }

    /// Discard every write of this unit
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        tracing::debug!("unit of work rolled back");
        Ok(())
    }
}
