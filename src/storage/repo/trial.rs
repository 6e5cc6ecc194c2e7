use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};

use super::{enum_at, optional_timestamp_at, timestamp_at};
use crate::storage::schema::NOW_SQL;
use crate::storage::session::Session;
use crate::study::StudyId;
use crate::trial::{NewTrial, Trial, TrialFilter, TrialId, TrialState};
use crate::{Error, Result};

const TRIAL_COLUMNS: &str = "trial_id, study_id, state, value, datetime_start, datetime_complete";

/// Trial rows and their lifecycle
pub struct TrialRepository<'a> {
    session: Session<'a>,
}

impl<'a> TrialRepository<'a> {
    pub(crate) fn new(session: Session<'a>) -> Self {
        Self { session }
    }

    /// Insert a trial and return its identifier.
    ///
    /// `datetime_start` comes from the engine clock. A trial created directly
    /// in a terminal state gets its completion time in the same statement.
    pub fn create(&self, trial: &NewTrial) -> Result<TrialId> {
        let sql = format!(
            "INSERT INTO trial (trial_id, study_id, state, datetime_complete)
             VALUES (?1, ?2, ?3, CASE WHEN ?3 = 'RUNNING' THEN NULL ELSE {NOW_SQL} END)"
        );
        self.session.write(|conn| {
            conn.execute(
                &sql,
                params![trial.trial_id, trial.study_id, trial.state.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Get a trial by id
    pub fn find(&self, trial_id: TrialId) -> Result<Option<Trial>> {
        self.session.read(|conn| {
            conn.query_row(
                &format!("SELECT {TRIAL_COLUMNS} FROM trial WHERE trial_id = ?1"),
                [trial_id],
                row_to_trial,
            )
            .optional()
        })
    }

    /// First trial by id, if any
    pub fn first(&self) -> Result<Option<Trial>> {
        self.session.read(|conn| {
            conn.query_row(
                &format!("SELECT {TRIAL_COLUMNS} FROM trial ORDER BY trial_id LIMIT 1"),
                [],
                row_to_trial,
            )
            .optional()
        })
    }

    /// All trials owned by a study, in id order
    pub fn where_study(&self, study_id: StudyId) -> Result<Vec<Trial>> {
        self.session.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRIAL_COLUMNS} FROM trial WHERE study_id = ?1 ORDER BY trial_id"
            ))?;
            let trials: rusqlite::Result<Vec<Trial>> =
                stmt.query_map([study_id], row_to_trial)?.collect();
            trials
        })
    }

    /// Count trials matching every set field of `filter`
    pub fn count(&self, filter: &TrialFilter) -> Result<usize> {
        let mut clauses = Vec::new();
        let mut args: Vec<Value> = Vec::new();
        if let Some(study_id) = filter.study_id {
            args.push(Value::Integer(study_id));
            clauses.push(format!("study_id = ?{}", args.len()));
        }
        if let Some(state) = filter.state {
            args.push(Value::Text(state.as_str().to_string()));
            clauses.push(format!("state = ?{}", args.len()));
        }

        let mut sql = String::from("SELECT COUNT(*) FROM trial");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let count: i64 = self
            .session
            .read(|conn| conn.query_row(&sql, params_from_iter(args), |row| row.get(0)))?;
        Ok(count as usize)
    }

    /// Move a running trial into a terminal state.
    ///
    /// State, objective value and completion time change in one statement
    /// guarded by `state = 'RUNNING'`, so a second transition cannot slip in
    /// between a check and the write.
    pub fn finish(&self, trial_id: TrialId, state: TrialState, value: Option<f64>) -> Result<()> {
        if !state.is_finished() {
            return Err(self.transition_error(trial_id, state));
        }

        let sql = format!(
            "UPDATE trial SET state = ?1, value = COALESCE(?2, value), datetime_complete = {NOW_SQL}
             WHERE trial_id = ?3 AND state = 'RUNNING'"
        );
        let changed = self
            .session
            .write(|conn| conn.execute(&sql, params![state.as_str(), value, trial_id]))?;

        if changed == 0 {
            return Err(self.transition_error(trial_id, state));
        }
        Ok(())
    }

    /// Record an intermediate objective value on a running trial
    pub fn set_value(&self, trial_id: TrialId, value: f64) -> Result<()> {
        let changed = self.session.write(|conn| {
            conn.execute(
                "UPDATE trial SET value = ?1 WHERE trial_id = ?2 AND state = 'RUNNING'",
                params![value, trial_id],
            )
        })?;
        if changed == 0 {
            return Err(self.transition_error(trial_id, TrialState::Running));
        }
        Ok(())
    }

    fn transition_error(&self, trial_id: TrialId, to: TrialState) -> Error {
        match self.find(trial_id) {
            Ok(Some(trial)) => Error::InvalidTransition {
                trial_id,
                from: trial.state,
                to,
            },
            Ok(None) => Error::NotFound(format!("trial {}", trial_id)),
            Err(err) => err,
        }
    }
}

fn row_to_trial(row: &rusqlite::Row) -> rusqlite::Result<Trial> {
    Ok(Trial {
        trial_id: row.get(0)?,
        study_id: row.get(1)?,
        state: enum_at(row, 2)?,
        value: row.get(3)?,
        datetime_start: timestamp_at(row, 4)?,
        datetime_complete: optional_timestamp_at(row, 5)?,
    })
}
