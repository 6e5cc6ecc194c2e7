//! Repositories - per-entity data access scoped to a unit of work

mod attribute;
mod study;
mod trial;
mod version;

pub use attribute::{StudyAttributeRepository, TrialAttributeRepository};
pub use study::StudyRepository;
pub use trial::TrialRepository;
pub use version::VersionRepository;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;

use super::schema::TIMESTAMP_FORMAT;

/// Parse an engine-written timestamp column
pub(crate) fn timestamp_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_timestamp(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a nullable engine-written timestamp column
pub(crate) fn optional_timestamp_at(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        parse_timestamp(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map(|naive| naive.and_utc())
}

/// Parse an enum column stored as text
pub(crate) fn enum_at<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = crate::Error>,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e: crate::Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_engine_timestamp() {
        let ts = parse_timestamp("2024-03-01 12:34:56.789").unwrap();
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.nanosecond(), 789_000_000);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
