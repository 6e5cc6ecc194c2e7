use rusqlite::{params, OptionalExtension};

use super::{enum_at, timestamp_at};
use crate::storage::session::Session;
use crate::study::{NewStudy, Study, StudyDirection, StudyId};
use crate::{Error, Result};

const STUDY_COLUMNS: &str = "study_id, study_name, task, datetime_create";

/// Study rows
pub struct StudyRepository<'a> {
    session: Session<'a>,
}

impl<'a> StudyRepository<'a> {
    pub(crate) fn new(session: Session<'a>) -> Self {
        Self { session }
    }

    /// Insert a study and return its identifier.
    /// A taken name or id fails with an integrity error.
    pub fn create(&self, study: &NewStudy) -> Result<StudyId> {
        self.session.write(|conn| {
            conn.execute(
                "INSERT INTO study (study_id, study_name, task) VALUES (?1, ?2, ?3)",
                params![study.study_id, study.study_name, study.direction.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Get a study by id
    pub fn find(&self, study_id: StudyId) -> Result<Option<Study>> {
        self.session.read(|conn| {
            conn.query_row(
                &format!("SELECT {STUDY_COLUMNS} FROM study WHERE study_id = ?1"),
                [study_id],
                row_to_study,
            )
            .optional()
        })
    }

    /// Get a study by its unique name
    pub fn find_by_name(&self, study_name: &str) -> Result<Option<Study>> {
        self.session.read(|conn| {
            conn.query_row(
                &format!("SELECT {STUDY_COLUMNS} FROM study WHERE study_name = ?1"),
                [study_name],
                row_to_study,
            )
            .optional()
        })
    }

    /// All studies, oldest id first
    pub fn all(&self) -> Result<Vec<Study>> {
        self.session.read(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {STUDY_COLUMNS} FROM study ORDER BY study_id"))?;
            let studies: rusqlite::Result<Vec<Study>> = stmt.query_map([], row_to_study)?.collect();
            studies
        })
    }

    /// Count all studies
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .session
            .read(|conn| conn.query_row("SELECT COUNT(*) FROM study", [], |row| row.get(0)))?;
        Ok(count as usize)
    }

    /// Change the optimization direction of an existing study
    pub fn set_direction(&self, study_id: StudyId, direction: StudyDirection) -> Result<()> {
        let changed = self.session.write(|conn| {
            conn.execute(
                "UPDATE study SET task = ?1 WHERE study_id = ?2",
                params![direction.as_str(), study_id],
            )
        })?;
        if changed == 0 {
            return Err(Error::NotFound(format!("study {}", study_id)));
        }
        Ok(())
    }
}

fn row_to_study(row: &rusqlite::Row) -> rusqlite::Result<Study> {
    Ok(Study {
        study_id: row.get(0)?,
        study_name: row.get(1)?,
        direction: enum_at(row, 2)?,
        datetime_create: timestamp_at(row, 3)?,
    })
}
