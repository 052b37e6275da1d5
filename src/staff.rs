//! Staff records: surgeons and support staff.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Relation};

/// A surgeon.
///
/// `works_in_theatre` is the authorization set: the theatres this surgeon may
/// operate in. `performs_operation` lists the surgeries assigned to the
/// surgeon, in assignment order, and is maintained by the knowledge store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surgeon {
    /// Unique id.
    pub id: EntityId,

    /// Professional license number.
    pub license_number: String,

    /// Theatres this surgeon is authorized for.
    #[serde(default)]
    pub works_in_theatre: Relation,

    /// Surgeries this surgeon performs.
    #[serde(default)]
    pub performs_operation: Relation,
}

impl Surgeon {
    /// Creates a surgeon with no authorizations and no surgeries.
    #[must_use]
    pub fn new(id: EntityId, license_number: impl Into<String>) -> Self {
        Self {
            id,
            license_number: license_number.into(),
            works_in_theatre: Relation::new(),
            performs_operation: Relation::new(),
        }
    }

    /// Returns true if the surgeon may operate in `theatre`.
    #[must_use]
    pub fn is_authorized_for(&self, theatre: &EntityId) -> bool {
        self.works_in_theatre.contains(theatre)
    }

    /// Returns true if the surgeon has no theatre authorization at all.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.works_in_theatre.is_empty()
    }
}

/// Role of a non-surgeon staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Anaesthesia specialist.
    Anaesthetist,
    /// Nursing staff.
    Nurse,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anaesthetist => write!(f, "anaesthetist"),
            Self::Nurse => write!(f, "nurse"),
        }
    }
}

/// Support staff assignable to surgeries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportStaff {
    /// Unique id.
    pub id: EntityId,

    /// Role.
    pub role: StaffRole,

    /// Theatres this staff member works in.
    #[serde(default)]
    pub works_in_theatre: Relation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surgeon_is_unauthorized() {
        let s = Surgeon::new(EntityId::new("Dr_Brown").unwrap(), "GS34567");
        assert!(s.is_unauthorized());
        assert!(s.performs_operation.is_empty());
    }

    #[test]
    fn test_authorization_set() {
        let neuro = EntityId::new("Neuro_Theatre").unwrap();
        let cardio = EntityId::new("Cardio_Theatre").unwrap();
        let mut s = Surgeon::new(EntityId::new("Dr_Smith").unwrap(), "12345");
        s.works_in_theatre.link(neuro.clone());
        assert!(s.is_authorized_for(&neuro));
        assert!(!s.is_authorized_for(&cardio));
    }

    #[test]
    fn test_surgeon_serde_defaults_relations() {
        let json = r#"{"id":"Dr_X","license_number":"1"}"#;
        let s: Surgeon = serde_json::from_str(json).unwrap();
        assert!(s.works_in_theatre.is_empty());
    }
}
