//! Study types
//!
//! A study is one optimization run. It has a unique name and a direction:
//! - `NotSet`: direction not decided yet
//! - `Minimize`: lower objective values are better
//! - `Maximize`: higher objective values are better

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a study row
pub type StudyId = i64;

/// Optimization direction of a study.
///
/// Stored as the upper-case name (`NOT_SET`, `MINIMIZE`, `MAXIMIZE`) and
/// constrained by a CHECK in the `study` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyDirection {
    #[default]
    NotSet,
    Minimize,
    Maximize,
}

impl StudyDirection {
    /// Get the stored representation of the direction
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyDirection::NotSet => "NOT_SET",
            StudyDirection::Minimize => "MINIMIZE",
            StudyDirection::Maximize => "MAXIMIZE",
        }
    }

    /// Get all directions
    pub fn all() -> &'static [StudyDirection] {
        &[
            StudyDirection::NotSet,
            StudyDirection::Minimize,
            StudyDirection::Maximize,
        ]
    }
}

impl FromStr for StudyDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "NOT_SET" | "NOTSET" | "UNDECIDED" => Ok(StudyDirection::NotSet),
            "MINIMIZE" | "MIN" => Ok(StudyDirection::Minimize),
            "MAXIMIZE" | "MAX" => Ok(StudyDirection::Maximize),
            _ => Err(Error::InvalidValue(format!("Unknown study direction: {}", s))),
        }
    }
}

impl std::fmt::Display for StudyDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted study row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub study_id: StudyId,
    pub study_name: String,
    pub direction: StudyDirection,
    /// Assigned by the engine at insert time
    pub datetime_create: DateTime<Utc>,
}

/// Insertable study. Leave `study_id` empty to let the engine assign one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudy {
    pub study_id: Option<StudyId>,
    pub study_name: String,
    pub direction: StudyDirection,
}

impl NewStudy {
    pub fn new(study_name: impl Into<String>) -> Self {
        Self {
            study_id: None,
            study_name: study_name.into(),
            direction: StudyDirection::NotSet,
        }
    }

    pub fn with_id(mut self, study_id: StudyId) -> Self {
        self.study_id = Some(study_id);
        self
    }

    pub fn with_direction(mut self, direction: StudyDirection) -> Self {
        self.direction = direction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_roundtrip_names() {
        for dir in StudyDirection::all() {
            assert_eq!(dir.as_str().parse::<StudyDirection>().unwrap(), *dir);
        }
        assert_eq!("min".parse::<StudyDirection>().unwrap(), StudyDirection::Minimize);
        assert!("sideways".parse::<StudyDirection>().is_err());
    }

    #[test]
    fn test_new_study_builder() {
        let s = NewStudy::new("s1").with_id(7).with_direction(StudyDirection::Maximize);
        assert_eq!(s.study_id, Some(7));
        assert_eq!(s.study_name, "s1");
        assert_eq!(s.direction, StudyDirection::Maximize);
    }
}
