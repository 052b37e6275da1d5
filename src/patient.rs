//! Patients and severity classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Relation};

/// Closed set of patient severity classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Most severe.
    Severe,
    /// Moderate.
    Moderate,
    /// Mild.
    Mild,
    /// Least severe.
    Minor,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Severe => "Severe",
            Self::Moderate => "Moderate",
            Self::Mild => "Mild",
            Self::Minor => "Minor",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "severe" => Ok(Self::Severe),
            "moderate" => Ok(Self::Moderate),
            "mild" => Ok(Self::Mild),
            "minor" => Ok(Self::Minor),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// A patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Unique id.
    pub id: EntityId,

    /// Severity classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Admission ward.
    #[serde(default)]
    pub admitted_to: Relation,

    /// Recovery room.
    #[serde(default)]
    pub recovery_room: Relation,

    /// Admission slot.
    #[serde(default)]
    pub admitted_at: Relation,

    /// Surgeries this patient undergoes.
    #[serde(default)]
    pub undergoes_surgery: Relation,
}

/// Input for creating a patient.
///
/// Every reference is optional; references that do not resolve are left
/// unlinked.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    /// Patient id.
    pub id: String,
    /// Severity classification.
    pub severity: Option<Severity>,
    /// Ward id.
    pub ward: Option<String>,
    /// Recovery room id.
    pub recovery_room: Option<String>,
    /// Admission slot id.
    pub admitted_at: Option<String>,
    /// Surgery id.
    pub surgery: Option<String>,
}

impl NewPatient {
    /// Starts a new patient with only an id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the severity.
    #[must_use]
    pub const fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Sets the ward.
    #[must_use]
    pub fn ward(mut self, ward: impl Into<String>) -> Self {
        self.ward = Some(ward.into());
        self
    }

    /// Sets the recovery room.
    #[must_use]
    pub fn recovery_room(mut self, room: impl Into<String>) -> Self {
        self.recovery_room = Some(room.into());
        self
    }

    /// Sets the admission slot.
    #[must_use]
    pub fn admitted_at(mut self, slot: impl Into<String>) -> Self {
        self.admitted_at = Some(slot.into());
        self
    }

    /// Sets the surgery.
    #[must_use]
    pub fn surgery(mut self, surgery: impl Into<String>) -> Self {
        self.surgery = Some(surgery.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!("severe".parse::<Severity>(), Ok(Severity::Severe));
        assert_eq!(" Minor ".parse::<Severity>(), Ok(Severity::Minor));
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_display_roundtrip() {
        for s in [Severity::Severe, Severity::Moderate, Severity::Mild, Severity::Minor] {
            assert_eq!(s.to_string().parse::<Severity>(), Ok(s));
        }
    }

    #[test]
    fn test_new_patient_builder() {
        let p = NewPatient::new("Patient_John_Doe")
            .severity(Severity::Severe)
            .ward("Neurology_Ward")
            .surgery("Brain_Surgery");
        assert_eq!(p.id, "Patient_John_Doe");
        assert_eq!(p.ward.as_deref(), Some("Neurology_Ward"));
        assert!(p.recovery_room.is_none());
    }
}
