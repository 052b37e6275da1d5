//! Conflict records produced by detection.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityId;
use crate::error::DataQualityWarning;

/// Namespace for deterministic conflict ids.
const CONFLICT_NAMESPACE: Uuid = Uuid::from_u128(0x3c1e_9a64_7b2d_5f08_a4e1_0d93_c6b7_2f15);

/// Identifier of a conflict.
///
/// Derived from the conflict kind and its participants, so the same
/// violation detected twice gets the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(Uuid);

impl ConflictId {
    /// Derives the id of a conflict.
    ///
    /// Every component is length-prefixed, so ids containing any separator
    /// character cannot make two different conflicts share a key.
    #[must_use]
    pub fn derive(conflict_type: &ConflictType) -> Self {
        let mut key = Vec::new();
        let kind = conflict_type.kind();
        let components =
            std::iter::once(kind).chain(conflict_type.participants().into_iter().map(EntityId::as_str));
        for component in components {
            key.extend_from_slice(&(component.len() as u64).to_le_bytes());
            key.extend_from_slice(component.as_bytes());
        }
        Self(Uuid::new_v5(&CONFLICT_NAMESPACE, &key))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How dangerous a conflict is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    /// A surgeon working outside their authorized theatres.
    Medium,
    /// A shared resource booked twice.
    High,
    /// One patient in two operations at once.
    Critical,
}

impl fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The kind of violation, with its participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictType {
    /// A surgeon performs two surgeries in overlapping slots.
    SurgeonDoubleBooking {
        /// The double-booked surgeon.
        surgeon: EntityId,
        /// Earlier surgery in the surgeon's assignment order.
        surgery1: EntityId,
        /// Later surgery.
        surgery2: EntityId,
    },

    /// Two surgeries need the same theatre in overlapping slots.
    TheatreDoubleBooking {
        /// The double-booked theatre.
        theatre: EntityId,
        /// Earlier surgery in insertion order.
        surgery1: EntityId,
        /// Later surgery.
        surgery2: EntityId,
    },

    /// A patient undergoes two surgeries in overlapping slots.
    PatientDoubleBooking {
        /// The patient.
        patient: EntityId,
        /// Earlier surgery in the patient's link order.
        surgery1: EntityId,
        /// Later surgery.
        surgery2: EntityId,
    },

    /// A surgery's theatre is outside its surgeon's authorization set.
    SpecializationMismatch {
        /// The performing surgeon.
        surgeon: EntityId,
        /// The surgery.
        surgery: EntityId,
        /// Theatres the surgeon is authorized for; may be empty.
        authorized_theatres: Vec<EntityId>,
        /// Theatre the surgery requires.
        required_theatre: EntityId,
    },
}

impl ConflictType {
    /// Stable snake_case name of the kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SurgeonDoubleBooking { .. } => "surgeon_double_booking",
            Self::TheatreDoubleBooking { .. } => "theatre_double_booking",
            Self::PatientDoubleBooking { .. } => "patient_double_booking",
            Self::SpecializationMismatch { .. } => "specialization_mismatch",
        }
    }

    /// Severity fixed by the kind.
    #[must_use]
    pub const fn severity(&self) -> ConflictSeverity {
        match self {
            Self::SurgeonDoubleBooking { .. } | Self::TheatreDoubleBooking { .. } => ConflictSeverity::High,
            Self::PatientDoubleBooking { .. } => ConflictSeverity::Critical,
            Self::SpecializationMismatch { .. } => ConflictSeverity::Medium,
        }
    }

    /// The resource first, then the surgeries involved.
    #[must_use]
    pub fn participants(&self) -> Vec<&EntityId> {
        match self {
            Self::SurgeonDoubleBooking {
                surgeon: owner,
                surgery1,
                surgery2,
            }
            | Self::TheatreDoubleBooking {
                theatre: owner,
                surgery1,
                surgery2,
            }
            | Self::PatientDoubleBooking {
                patient: owner,
                surgery1,
                surgery2,
            } => vec![owner, surgery1, surgery2],
            Self::SpecializationMismatch {
                surgeon,
                surgery,
                required_theatre,
                ..
            } => vec![surgeon, surgery, required_theatre],
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::SurgeonDoubleBooking { surgeon, .. } => {
                format!("{surgeon} is scheduled for two surgeries at overlapping times")
            }
            Self::TheatreDoubleBooking { theatre, .. } => format!("{theatre} is double-booked"),
            Self::PatientDoubleBooking { patient, .. } => {
                format!("Patient {patient} is scheduled for two surgeries at overlapping times")
            }
            Self::SpecializationMismatch {
                surgeon,
                authorized_theatres,
                required_theatre,
                ..
            } => {
                let allowed = authorized_theatres
                    .iter()
                    .map(EntityId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{surgeon} is authorized for [{allowed}] but surgery requires {required_theatre}")
            }
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// One detected violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conflict {
    /// Deterministic id.
    pub id: ConflictId,
    /// Kind and participants.
    #[serde(flatten)]
    pub conflict_type: ConflictType,
    /// Severity.
    pub severity: ConflictSeverity,
    /// Human-readable summary.
    pub description: String,
}

impl Conflict {
    /// Builds a conflict, deriving its id, severity and description.
    #[must_use]
    pub fn new(conflict_type: ConflictType) -> Self {
        Self {
            id: ConflictId::derive(&conflict_type),
            severity: conflict_type.severity(),
            description: conflict_type.describe(),
            conflict_type,
        }
    }

    /// Participants, resource first.
    #[must_use]
    pub fn participants(&self) -> Vec<&EntityId> {
        self.conflict_type.participants()
    }

    /// Returns true if `id` takes part in this conflict.
    #[must_use]
    pub fn involves(&self, id: &str) -> bool {
        self.participants().iter().any(|p| p.as_str() == id)
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.conflict_type, self.description)
    }
}

/// Result of one detection pass, partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Surgeon double-bookings.
    pub surgeon_conflicts: Vec<Conflict>,
    /// Theatre double-bookings.
    pub theatre_conflicts: Vec<Conflict>,
    /// Patient double-bookings.
    pub patient_conflicts: Vec<Conflict>,
    /// Surgeons outside their authorized theatres.
    pub specialization_mismatches: Vec<Conflict>,
    /// Data-quality findings, each reported once.
    pub warnings: Vec<DataQualityWarning>,
}

impl ConflictReport {
    /// Every conflict, in partition order.
    pub fn all(&self) -> impl Iterator<Item = &Conflict> {
        self.surgeon_conflicts
            .iter()
            .chain(&self.theatre_conflicts)
            .chain(&self.patient_conflicts)
            .chain(&self.specialization_mismatches)
    }

    /// Number of conflicts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.surgeon_conflicts.len()
            + self.theatre_conflicts.len()
            + self.patient_conflicts.len()
            + self.specialization_mismatches.len()
    }

    /// Returns true if no conflict was found. Warnings do not count.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// The most severe conflict level present.
    #[must_use]
    pub fn highest_severity(&self) -> Option<ConflictSeverity> {
        self.all().map(|c| c.severity).max()
    }
}
