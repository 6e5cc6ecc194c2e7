use rusqlite::{params, OptionalExtension};

use super::enum_at;
use crate::attribute::{StudySystemAttribute, TrialAttribute, TrialAttributeKind};
use crate::storage::session::Session;
use crate::study::StudyId;
use crate::trial::TrialId;
use crate::Result;

/// System attributes of studies
pub struct StudyAttributeRepository<'a> {
    session: Session<'a>,
}

impl<'a> StudyAttributeRepository<'a> {
    pub(crate) fn new(session: Session<'a>) -> Self {
        Self { session }
    }

    /// Insert a new (study, key) row. An existing key fails with an
    /// integrity error and aborts the unit of work.
    pub fn insert(&self, study_id: StudyId, key: &str, value_json: &str) -> Result<i64> {
        self.session.write(|conn| {
            conn.execute(
                "INSERT INTO study_system_attribute (study_id, key, value_json)
                 VALUES (?1, ?2, ?3)",
                params![study_id, key, value_json],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Insert or overwrite the value for (study, key)
    pub fn set(&self, study_id: StudyId, key: &str, value_json: &str) -> Result<()> {
        self.session.write(|conn| {
            conn.execute(
                "INSERT INTO study_system_attribute (study_id, key, value_json) VALUES (?1, ?2, ?3)
                 ON CONFLICT (study_id, key) DO UPDATE SET value_json = excluded.value_json",
                params![study_id, key, value_json],
            )
        })?;
        Ok(())
    }

    /// Row for (study, key), or `None`
    pub fn find_by_study_and_key(
        &self,
        study_id: StudyId,
        key: &str,
    ) -> Result<Option<StudySystemAttribute>> {
        self.session.read(|conn| {
            conn.query_row(
                "SELECT study_system_attribute_id, study_id, key, value_json
                 FROM study_system_attribute WHERE study_id = ?1 AND key = ?2",
                params![study_id, key],
                row_to_study_attribute,
            )
            .optional()
        })
    }

    /// Every attribute of a study. Unknown ids yield an empty list.
    pub fn where_study_id(&self, study_id: StudyId) -> Result<Vec<StudySystemAttribute>> {
        self.session.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT study_system_attribute_id, study_id, key, value_json
                 FROM study_system_attribute WHERE study_id = ?1",
            )?;
            let attrs: rusqlite::Result<Vec<StudySystemAttribute>> =
                stmt.query_map([study_id], row_to_study_attribute)?.collect();
            attrs
        })
    }

    /// Count all rows
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.session.read(|conn| {
            conn.query_row("SELECT COUNT(*) FROM study_system_attribute", [], |row| row.get(0))
        })?;
        Ok(count as usize)
    }
}

fn row_to_study_attribute(row: &rusqlite::Row) -> rusqlite::Result<StudySystemAttribute> {
    Ok(StudySystemAttribute {
        study_system_attribute_id: row.get(0)?,
        study_id: row.get(1)?,
        key: row.get(2)?,
        value_json: row.get(3)?,
    })
}

/// User or system attributes of trials, one table per kind
pub struct TrialAttributeRepository<'a> {
    session: Session<'a>,
    kind: TrialAttributeKind,
    select: String,
}

impl<'a> TrialAttributeRepository<'a> {
    pub(crate) fn new(session: Session<'a>, kind: TrialAttributeKind) -> Self {
        // Table names come from the closed kind enum, never from input
        let select = format!(
            "SELECT a.{id}, '{kind}', a.trial_id, a.key, a.value_json FROM {table} a",
            id = kind.id_column(),
            kind = kind.as_str(),
            table = kind.table(),
        );
        Self { session, kind, select }
    }

    /// Insert a new (trial, key) row. An existing key fails with an
    /// integrity error and aborts the unit of work.
    pub fn insert(&self, trial_id: TrialId, key: &str, value_json: &str) -> Result<i64> {
        let sql = format!(
            "INSERT INTO {} (trial_id, key, value_json) VALUES (?1, ?2, ?3)",
            self.kind.table()
        );
        self.session.write(|conn| {
            conn.execute(&sql, params![trial_id, key, value_json])?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Insert or overwrite the value for (trial, key)
    pub fn set(&self, trial_id: TrialId, key: &str, value_json: &str) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (trial_id, key, value_json) VALUES (?1, ?2, ?3)
             ON CONFLICT (trial_id, key) DO UPDATE SET value_json = excluded.value_json",
            self.kind.table()
        );
        self.session.write(|conn| conn.execute(&sql, params![trial_id, key, value_json]))?;
        Ok(())
    }

    /// Row for (trial, key), or `None`
    pub fn find_by_trial_and_key(
        &self,
        trial_id: TrialId,
        key: &str,
    ) -> Result<Option<TrialAttribute>> {
        let sql = format!("{} WHERE a.trial_id = ?1 AND a.key = ?2", self.select);
        self.session.read(|conn| {
            conn.query_row(&sql, params![trial_id, key], row_to_trial_attribute).optional()
        })
    }

    /// Attributes of every trial owned by `study_id`.
    /// Scoped through the trial's study reference, not the attribute row.
    pub fn where_study(&self, study_id: StudyId) -> Result<Vec<TrialAttribute>> {
        let sql = format!(
            "{} JOIN trial t ON t.trial_id = a.trial_id WHERE t.study_id = ?1",
            self.select
        );
        self.query_list(&sql, [study_id])
    }

    /// Attributes of one trial
    pub fn where_trial(&self, trial_id: TrialId) -> Result<Vec<TrialAttribute>> {
        let sql = format!("{} WHERE a.trial_id = ?1", self.select);
        self.query_list(&sql, [trial_id])
    }

    /// Every row of this kind, unscoped
    pub fn all(&self) -> Result<Vec<TrialAttribute>> {
        self.query_list(&self.select, [])
    }

    /// Count all rows of this kind
    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.kind.table());
        let count: i64 = self
            .session
            .read(|conn| conn.query_row(&sql, [], |row| row.get(0)))?;
        Ok(count as usize)
    }

    fn query_list<P: rusqlite::Params>(&self, sql: &str, args: P) -> Result<Vec<TrialAttribute>> {
        self.session.read(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let attrs: rusqlite::Result<Vec<TrialAttribute>> =
                stmt.query_map(args, row_to_trial_attribute)?.collect();
            attrs
        })
    }
}

fn row_to_trial_attribute(row: &rusqlite::Row) -> rusqlite::Result<TrialAttribute> {
    Ok(TrialAttribute {
        trial_attribute_id: row.get(0)?,
        kind: enum_at(row, 1)?,
        trial_id: row.get(2)?,
        key: row.get(3)?,
        value_json: row.get(4)?,
    })
}
