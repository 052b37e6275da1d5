//! Surgeries.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Relation};

/// A surgical operation.
///
/// The single-valued links (`requires_theatre`, `performed_by`, `timeslot`)
/// are relations like every other link and may be empty when the referenced
/// entity was unknown at creation time or has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surgery {
    /// Unique id.
    pub id: EntityId,

    /// Estimated duration in minutes.
    pub estimated_duration: u32,

    /// Emergency flag.
    #[serde(default)]
    pub is_emergency: bool,

    /// Theatre this surgery needs.
    #[serde(default)]
    pub requires_theatre: Relation,

    /// Performing surgeon.
    #[serde(default)]
    pub performed_by: Relation,

    /// Scheduled slot.
    #[serde(default)]
    pub timeslot: Relation,

    /// Assigned staff (surgeons or support staff).
    #[serde(default)]
    pub assigned_staff: Relation,
}

impl Surgery {
    /// The required theatre, if linked.
    #[must_use]
    pub fn theatre(&self) -> Option<&EntityId> {
        self.requires_theatre.first()
    }

    /// The performing surgeon, if linked.
    #[must_use]
    pub fn surgeon(&self) -> Option<&EntityId> {
        self.performed_by.first()
    }

    /// The scheduled slot, if linked.
    #[must_use]
    pub fn slot(&self) -> Option<&EntityId> {
        self.timeslot.first()
    }
}
