use rusqlite::{params, OptionalExtension};

use crate::storage::session::Session;
use crate::version::VersionInfo;
use crate::Result;

/// The singleton version marker
pub struct VersionRepository<'a> {
    session: Session<'a>,
}

impl<'a> VersionRepository<'a> {
    pub(crate) fn new(session: Session<'a>) -> Self {
        Self { session }
    }

    /// The marker row, or `None` on a database that was never initialized
    pub fn get(&self) -> Result<Option<VersionInfo>> {
        self.session.read(|conn| {
            conn.query_row(
                "SELECT version_info_id, schema_version, library_version FROM version_info",
                [],
                |row| {
                    Ok(VersionInfo {
                        version_info_id: row.get(0)?,
                        schema_version: row.get(1)?,
                        library_version: row.get(2)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Write the marker. The engine picks the identifier, so only the first
    /// call can satisfy the singleton check; later calls fail with an
    /// integrity error.
    pub fn set(&self, schema_version: i64, library_version: &str) -> Result<()> {
        self.session.write(|conn| {
            conn.execute(
                "INSERT INTO version_info (schema_version, library_version) VALUES (?1, ?2)",
                params![schema_version, library_version],
            )
        })?;
        Ok(())
    }

    /// Write a marker row with an explicit identifier
    pub fn insert(&self, info: &VersionInfo) -> Result<()> {
        self.session.write(|conn| {
            conn.execute(
                "INSERT INTO version_info (version_info_id, schema_version, library_version)
                 VALUES (?1, ?2, ?3)",
                params![info.version_info_id, info.schema_version, info.library_version],
            )
        })?;
        Ok(())
    }
}
