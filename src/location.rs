//! Physical locations: theatres, wards and recovery rooms.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// An operating theatre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theatre {
    /// Unique id.
    pub id: EntityId,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Optional capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl Theatre {
    /// Creates a theatre with no display name or capacity.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            display_name: None,
            capacity: None,
        }
    }

    /// The specialty implied by the id, e.g. `Neuro_Theatre` -> `Neuro`.
    #[must_use]
    pub fn specialty(&self) -> String {
        specialty_of(&self.id)
    }
}

/// Derives a readable specialty from a theatre id.
#[must_use]
pub fn specialty_of(id: &EntityId) -> String {
    id.as_str().replace("_Theatre", "").replace('_', " ")
}

/// A ward patients are admitted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    /// Unique id.
    pub id: EntityId,
}

/// A post-operative recovery room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryRoom {
    /// Unique id.
    pub id: EntityId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialty() {
        let t = Theatre::new(EntityId::new("Neuro_Theatre").unwrap());
        assert_eq!(t.specialty(), "Neuro");
        let t = Theatre::new(EntityId::new("Paediatric_Cardio_Theatre").unwrap());
        assert_eq!(t.specialty(), "Paediatric Cardio");
    }
}
