//! Trial types
//!
//! A trial is one evaluation inside a study. Its lifecycle is
//! `Running -> {Complete, Fail, Pruned}`; terminal states are final.

use crate::study::StudyId;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a trial row
pub type TrialId = i64;

/// Lifecycle state of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialState {
    #[default]
    Running,
    Complete,
    Pruned,
    Fail,
}

impl TrialState {
    /// Get the stored representation of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialState::Running => "RUNNING",
            TrialState::Complete => "COMPLETE",
            TrialState::Pruned => "PRUNED",
            TrialState::Fail => "FAIL",
        }
    }

    /// Get all states
    pub fn all() -> &'static [TrialState] {
        &[
            TrialState::Running,
            TrialState::Complete,
            TrialState::Pruned,
            TrialState::Fail,
        ]
    }

    /// Terminal states carry a completion timestamp and never change again
    pub fn is_finished(&self) -> bool {
        !matches!(self, TrialState::Running)
    }
}

impl FromStr for TrialState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "RUNNING" => Ok(TrialState::Running),
            "COMPLETE" | "COMPLETED" => Ok(TrialState::Complete),
            "PRUNED" => Ok(TrialState::Pruned),
            "FAIL" | "FAILED" => Ok(TrialState::Fail),
            _ => Err(Error::InvalidValue(format!("Unknown trial state: {}", s))),
        }
    }
}

impl std::fmt::Display for TrialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted trial row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub trial_id: TrialId,
    /// Owning study. Only `None` for rows written without referential checks.
    pub study_id: Option<StudyId>,
    pub state: TrialState,
    /// Objective value reported on completion
    pub value: Option<f64>,
    /// Engine clock at insert, truncated to whole milliseconds
    pub datetime_start: DateTime<Utc>,
    /// Engine clock at the terminal transition, same resolution
    pub datetime_complete: Option<DateTime<Utc>>,
}

/// Insertable trial. Timestamps are always assigned by the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTrial {
    pub trial_id: Option<TrialId>,
    pub study_id: Option<StudyId>,
    pub state: TrialState,
}

impl NewTrial {
    pub fn new(study_id: StudyId) -> Self {
        Self {
            trial_id: None,
            study_id: Some(study_id),
            state: TrialState::Running,
        }
    }

    pub fn with_id(mut self, trial_id: TrialId) -> Self {
        self.trial_id = Some(trial_id);
        self
    }

    pub fn with_state(mut self, state: TrialState) -> Self {
        self.state = state;
        self
    }
}

/// Filters for counting trials. Set fields compose with AND; an empty
/// filter matches every trial.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrialFilter {
    pub study_id: Option<StudyId>,
    pub state: Option<TrialState>,
}

impl TrialFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn study(mut self, study_id: StudyId) -> Self {
        self.study_id = Some(study_id);
        self
    }

    pub fn state(mut self, state: TrialState) -> Self {
        self.state = Some(state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse() {
        for state in TrialState::all() {
            assert_eq!(state.as_str().parse::<TrialState>().unwrap(), *state);
        }
        assert_eq!("failed".parse::<TrialState>().unwrap(), TrialState::Fail);
        assert!("waiting".parse::<TrialState>().is_err());
    }

    #[test]
    fn test_finished_states() {
        assert!(!TrialState::Running.is_finished());
        assert!(TrialState::Complete.is_finished());
        assert!(TrialState::Pruned.is_finished());
        assert!(TrialState::Fail.is_finished());
    }

    #[test]
    fn test_filter_builder() {
        let f = TrialFilter::all().study(3).state(TrialState::Complete);
        assert_eq!(f.study_id, Some(3));
        assert_eq!(f.state, Some(TrialState::Complete));
        assert_eq!(TrialFilter::all(), TrialFilter::default());
    }
}
