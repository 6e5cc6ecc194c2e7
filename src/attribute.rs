//! Attribute rows - key/value annotations on studies and trials
//!
//! Values are opaque JSON text. The store never interprets them; callers
//! encode with [`encode_value`] and decode with `value()`.

use crate::study::StudyId;
use crate::trial::TrialId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Trial attribute variant. Both variants share one layout but live in
/// separate tables, each with its own (trial_id, key) uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialAttributeKind {
    /// Caller-supplied metadata
    User,
    /// Framework-internal metadata
    System,
}

impl TrialAttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialAttributeKind::User => "user",
            TrialAttributeKind::System => "system",
        }
    }

    /// Table holding this variant
    pub fn table(&self) -> &'static str {
        match self {
            TrialAttributeKind::User => "trial_user_attribute",
            TrialAttributeKind::System => "trial_system_attribute",
        }
    }

    /// Primary key column of [`Self::table`]
    pub(crate) fn id_column(&self) -> &'static str {
        match self {
            TrialAttributeKind::User => "trial_user_attribute_id",
            TrialAttributeKind::System => "trial_system_attribute_id",
        }
    }

    pub fn all() -> &'static [TrialAttributeKind] {
        &[TrialAttributeKind::User, TrialAttributeKind::System]
    }
}

impl FromStr for TrialAttributeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TrialAttributeKind::User),
            "system" | "sys" => Ok(TrialAttributeKind::System),
            _ => Err(Error::InvalidValue(format!("Unknown attribute kind: {}", s))),
        }
    }
}

impl std::fmt::Display for TrialAttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encode any serializable value as attribute payload text
pub fn encode_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// System attribute of a study, unique per (study_id, key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySystemAttribute {
    pub study_system_attribute_id: i64,
    pub study_id: StudyId,
    pub key: String,
    pub value_json: String,
}

impl StudySystemAttribute {
    /// Decode the stored payload
    pub fn value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.value_json)?)
    }
}

/// User or system attribute of a trial, unique per (trial_id, key) within its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialAttribute {
    pub trial_attribute_id: i64,
    pub kind: TrialAttributeKind,
    pub trial_id: TrialId,
    pub key: String,
    pub value_json: String,
}

impl TrialAttribute {
    /// Decode the stored payload
    pub fn value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.value_json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tables_are_distinct() {
        assert_ne!(TrialAttributeKind::User.table(), TrialAttributeKind::System.table());
        assert_eq!("SYSTEM".parse::<TrialAttributeKind>().unwrap(), TrialAttributeKind::System);
        assert!("other".parse::<TrialAttributeKind>().is_err());
    }

    #[test]
    fn test_value_decoding() {
        let attr = TrialAttribute {
            trial_attribute_id: 1,
            kind: TrialAttributeKind::User,
            trial_id: 1,
            key: "lr".into(),
            value_json: encode_value(&serde_json::json!({"lr": 0.01, "layers": [64, 32]})).unwrap(),
        };
        let v = attr.value().unwrap();
        assert_eq!(v["layers"][1], 32);

        let broken = StudySystemAttribute {
            study_system_attribute_id: 1,
            study_id: 1,
            key: "k".into(),
            value_json: "{not json".into(),
        };
        assert!(matches!(broken.value(), Err(Error::Serialization(_))));
    }
}
