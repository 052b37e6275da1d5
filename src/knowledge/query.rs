//! Read-only schedule queries over a [`KnowledgeGraph`].
//!
//! Every query degrades instead of failing: a surgery without a slot is
//! left out of slot-based schedules, and any missing single-valued link is
//! reported as `None`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::graph::KnowledgeGraph;
use crate::entity::EntityId;
use crate::surgery::Surgery;
use crate::time::DATE_FORMAT;
use crate::timeslot::TimeSlot;

/// One surgery in a surgeon's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Surgery id.
    pub surgery: EntityId,
    /// Slot id.
    pub timeslot: EntityId,
    /// Raw slot start.
    pub start_time: String,
    /// Raw slot end.
    pub end_time: String,
    /// Slot date, if any.
    pub date: Option<String>,
    /// Required theatre, if linked.
    pub theatre: Option<EntityId>,
}

/// One surgery in a theatre's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheatreScheduleEntry {
    /// Surgery id.
    pub surgery: EntityId,
    /// Performing surgeon, if linked.
    pub surgeon: Option<EntityId>,
    /// Slot id.
    pub timeslot: EntityId,
    /// Raw slot start.
    pub start_time: String,
    /// Raw slot end.
    pub end_time: String,
    /// Slot date, if any.
    pub date: Option<String>,
}

/// One surgery booked into a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeslotScheduleEntry {
    /// Surgery id.
    pub surgery: EntityId,
    /// Performing surgeon, if linked.
    pub surgeon: Option<EntityId>,
    /// Required theatre, if linked.
    pub theatre: Option<EntityId>,
}

/// Everything known about one surgery, with links resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryInfo {
    /// Surgery id.
    pub surgery: EntityId,
    /// Estimated duration in minutes.
    pub estimated_duration: u32,
    /// Emergency flag.
    pub is_emergency: bool,
    /// Performing surgeon.
    pub surgeon: Option<EntityId>,
    /// Required theatre.
    pub theatre: Option<EntityId>,
    /// Scheduled slot.
    pub timeslot: Option<EntityId>,
    /// Raw slot start.
    pub start_time: Option<String>,
    /// Raw slot end.
    pub end_time: Option<String>,
    /// Slot date.
    pub date: Option<String>,
    /// First patient undergoing the surgery.
    pub patient: Option<EntityId>,
    /// That patient's ward.
    pub patient_ward: Option<EntityId>,
    /// That patient's recovery room.
    pub recovery_room: Option<EntityId>,
    /// Assigned staff.
    pub assigned_staff: Vec<EntityId>,
}

/// Entity counts for dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Entities of every kind.
    pub total_entities: usize,
    /// Surgeons.
    pub surgeons: usize,
    /// Theatres.
    pub theatres: usize,
    /// Surgeries.
    pub surgeries: usize,
    /// Patients.
    pub patients: usize,
    /// Time slots.
    pub timeslots: usize,
}

impl KnowledgeGraph {
    fn slot_of(&self, surgery: &Surgery) -> Option<&TimeSlot> {
        surgery.slot().and_then(|id| self.timeslot(id.as_str()))
    }

    /// Surgeries performed by a surgeon that have a slot, in assignment order.
    ///
    /// Unknown surgeons yield an empty schedule.
    #[must_use]
    pub fn surgeon_schedule(&self, surgeon_id: &str) -> Vec<ScheduleEntry> {
        let Some(surgeon) = self.surgeon(surgeon_id) else {
            return Vec::new();
        };
        surgeon
            .performs_operation
            .iter()
            .filter_map(|id| self.surgery(id.as_str()))
            .filter_map(|surgery| {
                let slot = self.slot_of(surgery)?;
                Some(ScheduleEntry {
                    surgery: surgery.id.clone(),
                    timeslot: slot.id.clone(),
                    start_time: slot.start_time.clone(),
                    end_time: slot.end_time.clone(),
                    date: slot.date.clone(),
                    theatre: surgery.theatre().cloned(),
                })
            })
            .collect()
    }

    /// Surgeries requiring a theatre that have a slot, in insertion order.
    #[must_use]
    pub fn theatre_schedule(&self, theatre_id: &str) -> Vec<TheatreScheduleEntry> {
        let theatre_id = theatre_id.trim();
        self.surgeries()
            .filter(|s| s.theatre().is_some_and(|t| t.as_str() == theatre_id))
            .filter_map(|surgery| {
                let slot = self.slot_of(surgery)?;
                Some(TheatreScheduleEntry {
                    surgery: surgery.id.clone(),
                    surgeon: surgery.surgeon().cloned(),
                    timeslot: slot.id.clone(),
                    start_time: slot.start_time.clone(),
                    end_time: slot.end_time.clone(),
                    date: slot.date.clone(),
                })
            })
            .collect()
    }

    /// Surgeries booked into a slot.
    #[must_use]
    pub fn timeslot_schedule(&self, timeslot_id: &str) -> Vec<TimeslotScheduleEntry> {
        let timeslot_id = timeslot_id.trim();
        self.surgeries()
            .filter(|s| s.slot().is_some_and(|t| t.as_str() == timeslot_id))
            .map(|surgery| TimeslotScheduleEntry {
                surgery: surgery.id.clone(),
                surgeon: surgery.surgeon().cloned(),
                theatre: surgery.theatre().cloned(),
            })
            .collect()
    }

    /// Surgeries whose slot falls on `date`.
    ///
    /// Slots without a date, or with a date that no longer parses, never match.
    pub fn surgeries_on_date(&self, date: NaiveDate) -> impl Iterator<Item = &Surgery> {
        self.surgeries().filter(move |surgery| {
            self.slot_of(surgery)
                .and_then(|slot| slot.date.as_deref())
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), DATE_FORMAT).ok())
                == Some(date)
        })
    }

    /// Full details of one surgery.
    #[must_use]
    pub fn surgery_info(&self, surgery_id: &str) -> Option<SurgeryInfo> {
        let surgery = self.surgery(surgery_id)?;
        let slot = self.slot_of(surgery);
        let patient = self
            .patients()
            .find(|p| p.undergoes_surgery.contains(&surgery.id));

        Some(SurgeryInfo {
            surgery: surgery.id.clone(),
            estimated_duration: surgery.estimated_duration,
            is_emergency: surgery.is_emergency,
            surgeon: surgery.surgeon().cloned(),
            theatre: surgery.theatre().cloned(),
            timeslot: slot.map(|s| s.id.clone()),
            start_time: slot.map(|s| s.start_time.clone()),
            end_time: slot.map(|s| s.end_time.clone()),
            date: slot.and_then(|s| s.date.clone()),
            patient: patient.map(|p| p.id.clone()),
            patient_ward: patient.and_then(|p| p.admitted_to.first().cloned()),
            recovery_room: patient.and_then(|p| p.recovery_room.first().cloned()),
            assigned_staff: surgery.assigned_staff.as_slice().to_vec(),
        })
    }

    /// Entity counts.
    #[must_use]
    pub fn schedule_summary(&self) -> ScheduleSummary {
        let [surgeons, theatres, surgeries, patients, timeslots] = self.counts();
        ScheduleSummary {
            total_entities: self.entity_count(),
            surgeons,
            theatres,
            surgeries,
            patients,
            timeslots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Relation;
    use crate::location::Theatre;
    use crate::staff::Surgeon;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn graph() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.insert_theatre(Theatre::new(id("Neuro_Theatre")));
        g.insert_surgeon(Surgeon::new(id("Dr_Smith"), "12345"));
        g.insert_timeslot(TimeSlot {
            id: id("TS_1"),
            start_time: "08:00".into(),
            end_time: "10:30".into(),
            duration_minutes: 150,
            date: Some("2025-12-26".into()),
            temporal_overlaps: Relation::new(),
        });
        g.insert_surgery(Surgery {
            id: id("Brain_Surgery"),
            estimated_duration: 240,
            is_emergency: false,
            requires_theatre: Relation::single(id("Neuro_Theatre")),
            performed_by: Relation::single(id("Dr_Smith")),
            timeslot: Relation::single(id("TS_1")),
            assigned_staff: Relation::new(),
        });
        g.insert_surgery(Surgery {
            id: id("Unslotted"),
            estimated_duration: 60,
            is_emergency: true,
            requires_theatre: Relation::single(id("Neuro_Theatre")),
            performed_by: Relation::single(id("Dr_Smith")),
            timeslot: Relation::new(),
            assigned_staff: Relation::new(),
        });
        g
    }

    #[test]
    fn test_surgeon_schedule_skips_unslotted() {
        let g = graph();
        let sched = g.surgeon_schedule("Dr_Smith");
        assert_eq!(sched.len(), 1);
        assert_eq!(sched[0].surgery.as_str(), "Brain_Surgery");
        assert_eq!(sched[0].start_time, "08:00");
        assert_eq!(sched[0].theatre.as_ref().map(EntityId::as_str), Some("Neuro_Theatre"));
        assert!(g.surgeon_schedule("Dr_Nobody").is_empty());
    }

    #[test]
    fn test_theatre_schedule() {
        let g = graph();
        let sched = g.theatre_schedule("Neuro_Theatre");
        assert_eq!(sched.len(), 1);
        assert_eq!(sched[0].surgeon.as_ref().map(EntityId::as_str), Some("Dr_Smith"));
    }

    #[test]
    fn test_surgeries_on_date() {
        let g = graph();
        let day = NaiveDate::from_ymd_opt(2025, 12, 26).unwrap();
        let ids: Vec<&str> = g.surgeries_on_date(day).map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Brain_Surgery"]);
        let other = NaiveDate::from_ymd_opt(2025, 12, 27).unwrap();
        assert_eq!(g.surgeries_on_date(other).count(), 0);
    }

    #[test]
    fn test_surgery_info_without_slot() {
        let g = graph();
        let info = g.surgery_info("Unslotted").unwrap();
        assert!(info.timeslot.is_none());
        assert!(info.start_time.is_none());
        assert!(info.patient.is_none());
        assert!(info.is_emergency);
        assert!(g.surgery_info("Missing").is_none());
    }

    #[test]
    fn test_summary_field_names() {
        let g = graph();
        let summary = g.schedule_summary();
        assert_eq!(summary.total_entities, 5);
        assert_eq!(summary.surgeries, 2);
        let json = serde_json::to_value(summary).unwrap();
        for key in ["total_entities", "surgeons", "theatres", "surgeries", "patients", "timeslots"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
