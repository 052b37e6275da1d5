//! Ordered export and import of the whole graph.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::graph::KnowledgeGraph;
use crate::entity::{EntityId, EntityKind, Relation};
use crate::error::{TheatreError, TheatreResult};
use crate::location::{RecoveryRoom, Theatre, Ward};
use crate::patient::Patient;
use crate::staff::{SupportStaff, Surgeon};
use crate::surgery::Surgery;
use crate::timeslot::TimeSlot;

/// Current snapshot layout version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Every entity of a graph, each table in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    /// Layout version.
    pub format_version: u32,
    /// Theatres.
    #[serde(default)]
    pub theatres: Vec<Theatre>,
    /// Wards.
    #[serde(default)]
    pub wards: Vec<Ward>,
    /// Recovery rooms.
    #[serde(default)]
    pub recovery_rooms: Vec<RecoveryRoom>,
    /// Surgeons.
    #[serde(default)]
    pub surgeons: Vec<Surgeon>,
    /// Support staff.
    #[serde(default)]
    pub support_staff: Vec<SupportStaff>,
    /// Time slots.
    #[serde(default)]
    pub timeslots: Vec<TimeSlot>,
    /// Surgeries.
    #[serde(default)]
    pub surgeries: Vec<Surgery>,
    /// Patients.
    #[serde(default)]
    pub patients: Vec<Patient>,
}

impl Default for KnowledgeSnapshot {
    fn default() -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            theatres: Vec::new(),
            wards: Vec::new(),
            recovery_rooms: Vec::new(),
            surgeons: Vec::new(),
            support_staff: Vec::new(),
            timeslots: Vec::new(),
            surgeries: Vec::new(),
            patients: Vec::new(),
        }
    }
}

impl KnowledgeSnapshot {
    /// Number of entities in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.theatres.len()
            + self.wards.len()
            + self.recovery_rooms.len()
            + self.surgeons.len()
            + self.support_staff.len()
            + self.timeslots.len()
            + self.surgeries.len()
            + self.patients.len()
    }

    /// Returns true if the snapshot holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KnowledgeGraph {
    /// Exports every entity and relation.
    #[must_use]
    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            theatres: self.theatres().cloned().collect(),
            wards: self.wards().cloned().collect(),
            recovery_rooms: self.recovery_rooms().cloned().collect(),
            surgeons: self.surgeons().cloned().collect(),
            support_staff: self.support_staff().cloned().collect(),
            timeslots: self.timeslots().cloned().collect(),
            surgeries: self.surgeries().cloned().collect(),
            patients: self.patients().cloned().collect(),
        }
    }

    /// Rebuilds a graph from a snapshot.
    ///
    /// Relations pointing at ids of the wrong kind or at missing entities are
    /// dropped with a warning, so the result never holds a dangling link.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported format version or a duplicate id.
    pub fn from_snapshot(snapshot: KnowledgeSnapshot) -> TheatreResult<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(TheatreError::internal(format!(
                "unsupported snapshot format version {} (expected {SNAPSHOT_FORMAT_VERSION})",
                snapshot.format_version
            )));
        }

        let mut graph = Self::new();
        macro_rules! load {
            ($rows:expr, $insert:ident) => {
                for row in $rows {
                    graph.ensure_unused(&row.id)?;
                    graph.$insert(row);
                }
            };
        }
        load!(snapshot.theatres, insert_theatre);
        load!(snapshot.wards, insert_ward);
        load!(snapshot.recovery_rooms, insert_recovery_room);
        load!(snapshot.surgeons, insert_surgeon);
        load!(snapshot.support_staff, insert_support_staff);
        load!(snapshot.timeslots, insert_timeslot);
        load!(snapshot.patients, insert_patient);

        // Surgeries go through the plain table so stored surgeon links are
        // taken as-is rather than re-mirrored.
        for surgery in snapshot.surgeries {
            graph.ensure_unused(&surgery.id)?;
            graph.surgeries.insert(surgery);
        }

        graph.prune_dangling();
        Ok(graph)
    }

    fn prune_dangling(&mut self) {
        let kinds = self.clone();
        let keep = |owner: &EntityId, name: &str, kind: EntityKind, rel: &mut Relation| {
            let kept: Relation = rel
                .iter()
                .filter(|id| {
                    let ok = kinds.kind_of(id.as_str()) == Some(kind);
                    if !ok {
                        warn!(entity = %owner, relation = name, target = %id, "dropping dangling link");
                    }
                    ok
                })
                .cloned()
                .collect();
            *rel = kept;
        };

        for s in self.surgeons.iter_mut() {
            keep(&s.id, "works_in_theatre", EntityKind::Theatre, &mut s.works_in_theatre);
            keep(&s.id, "performs_operation", EntityKind::Surgery, &mut s.performs_operation);
        }
        for s in self.support_staff.iter_mut() {
            keep(&s.id, "works_in_theatre", EntityKind::Theatre, &mut s.works_in_theatre);
        }
        for t in self.timeslots.iter_mut() {
            keep(&t.id, "temporal_overlaps", EntityKind::TimeSlot, &mut t.temporal_overlaps);
        }
        for s in self.surgeries.iter_mut() {
            keep(&s.id, "requires_theatre", EntityKind::Theatre, &mut s.requires_theatre);
            keep(&s.id, "performed_by", EntityKind::Surgeon, &mut s.performed_by);
            keep(&s.id, "timeslot", EntityKind::TimeSlot, &mut s.timeslot);
            let staff: Relation = s
                .assigned_staff
                .iter()
                .filter(|id| kinds.is_staff(id.as_str()))
                .cloned()
                .collect();
            s.assigned_staff = staff;
        }
        for p in self.patients.iter_mut() {
            keep(&p.id, "admitted_to", EntityKind::Ward, &mut p.admitted_to);
            keep(&p.id, "recovery_room", EntityKind::RecoveryRoom, &mut p.recovery_room);
            keep(&p.id, "admitted_at", EntityKind::TimeSlot, &mut p.admitted_at);
            keep(&p.id, "undergoes_surgery", EntityKind::Surgery, &mut p.undergoes_surgery);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    #[test]
    fn test_roundtrip_preserves_order_and_links() {
        let mut g = KnowledgeGraph::new();
        g.insert_theatre(Theatre::new(id("B_Theatre")));
        g.insert_theatre(Theatre::new(id("A_Theatre")));
        let mut dr = Surgeon::new(id("Dr_A"), "1");
        dr.works_in_theatre.link(id("A_Theatre"));
        g.insert_surgeon(dr);

        let snap = g.snapshot();
        let restored = KnowledgeGraph::from_snapshot(snap.clone()).unwrap();
        assert_eq!(restored.snapshot(), snap);
        let order: Vec<&str> = restored.theatres().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["B_Theatre", "A_Theatre"]);
    }

    #[test]
    fn test_rejects_wrong_version() {
        let snap = KnowledgeSnapshot {
            format_version: 99,
            ..KnowledgeSnapshot::default()
        };
        assert!(KnowledgeGraph::from_snapshot(snap).is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids_across_kinds() {
        let snap = KnowledgeSnapshot {
            theatres: vec![Theatre::new(id("Same"))],
            wards: vec![Ward { id: id("Same") }],
            ..KnowledgeSnapshot::default()
        };
        let err = KnowledgeGraph::from_snapshot(snap).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_prunes_dangling_links() {
        let mut dr = Surgeon::new(id("Dr_A"), "1");
        dr.works_in_theatre.link(id("Ghost_Theatre"));
        let snap = KnowledgeSnapshot {
            surgeons: vec![dr],
            ..KnowledgeSnapshot::default()
        };
        let g = KnowledgeGraph::from_snapshot(snap).unwrap();
        assert!(g.surgeon("Dr_A").unwrap().works_in_theatre.is_empty());
    }
}
