//! The knowledge store: system of record for the hospital schedule.
//!
//! A [`KnowledgeBase`] owns one [`KnowledgeGraph`] behind a single
//! whole-store `RwLock`. Every mutation:
//!
//! 1. validates caller input,
//! 2. applies the batch to a copy of the graph,
//! 3. saves the copy through the configured [`SnapshotStore`], if any,
//! 4. swaps the copy in.
//!
//! Any failure before step 4 leaves the store exactly as it was.

mod graph;
mod query;
mod snapshot;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use chrono::NaiveDate;
use tracing::{info, warn};

pub use graph::{DeletionSummary, EntityRecord, KnowledgeGraph};
pub use query::{ScheduleEntry, ScheduleSummary, SurgeryInfo, TheatreScheduleEntry, TimeslotScheduleEntry};
pub use snapshot::{KnowledgeSnapshot, SNAPSHOT_FORMAT_VERSION};

use crate::config::ValidationLimits;
use crate::entity::{EntityId, EntityKind, Relation};
use crate::error::{DataQualityWarning, ExecutionError, TheatreError, TheatreResult, ValidationError};
use crate::location::{RecoveryRoom, Theatre, Ward};
use crate::patient::{NewPatient, Patient};
use crate::staff::{StaffRole, SupportStaff, Surgeon};
use crate::storage::SnapshotStore;
use crate::surgery::Surgery;
use crate::time::{parse_time_of_day, validate_date};
use crate::timeslot::TimeSlot;

/// Read guard over the current graph.
///
/// Holding a view blocks writers, so every query made through one view sees
/// the same consistent state.
pub struct KnowledgeView<'a> {
    guard: RwLockReadGuard<'a, KnowledgeGraph>,
}

impl std::ops::Deref for KnowledgeView<'_> {
    type Target = KnowledgeGraph;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Hospital scheduling knowledge base.
pub struct KnowledgeBase {
    graph: RwLock<KnowledgeGraph>,
    limits: ValidationLimits,
    sink: Option<Arc<dyn SnapshotStore>>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("limits", &self.limits)
            .field("persistent", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

fn storage_err(err: impl std::fmt::Display) -> TheatreError {
    TheatreError::Execution(ExecutionError::Storage {
        message: err.to_string(),
    })
}

impl KnowledgeBase {
    /// Creates an empty in-memory knowledge base with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(ValidationLimits::default())
    }

    /// Creates an empty in-memory knowledge base.
    #[must_use]
    pub fn with_limits(limits: ValidationLimits) -> Self {
        Self {
            graph: RwLock::new(KnowledgeGraph::new()),
            limits,
            sink: None,
        }
    }

    /// Opens a knowledge base backed by `store`, restoring its last snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read or holds an invalid snapshot.
    pub fn with_store(limits: ValidationLimits, store: Arc<dyn SnapshotStore>) -> TheatreResult<Self> {
        let graph = match store.load().map_err(storage_err)? {
            Some(snapshot) => {
                let graph = KnowledgeGraph::from_snapshot(snapshot)?;
                info!(entities = graph.entity_count(), "restored knowledge base");
                graph
            }
            None => KnowledgeGraph::new(),
        };
        Ok(Self {
            graph: RwLock::new(graph),
            limits,
            sink: Some(store),
        })
    }

    /// Builds an in-memory knowledge base from a snapshot.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported format version or duplicate ids.
    pub fn from_snapshot(snapshot: KnowledgeSnapshot) -> TheatreResult<Self> {
        Ok(Self {
            graph: RwLock::new(KnowledgeGraph::from_snapshot(snapshot)?),
            limits: ValidationLimits::default(),
            sink: None,
        })
    }

    /// The configured validation limits.
    #[must_use]
    pub const fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// Takes a consistent read view of the graph.
    ///
    /// The graph is only ever replaced wholesale, so a poisoned lock still
    /// guards a consistent graph and is recovered.
    pub fn read(&self) -> KnowledgeView<'_> {
        KnowledgeView {
            guard: self.graph.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Applies `op` to a copy of the graph and commits it as one batch.
    fn mutate<T>(&self, op: impl FnOnce(&mut KnowledgeGraph) -> TheatreResult<T>) -> TheatreResult<T> {
        let mut guard = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        let out = op(&mut next)?;
        if let Some(sink) = &self.sink {
            sink.save(&next.snapshot()).map_err(storage_err)?;
        }
        *guard = next;
        Ok(out)
    }

    fn new_id(&self, raw: &str) -> Result<EntityId, ValidationError> {
        let id = EntityId::new(raw)?;
        id.check_length(self.limits.max_id_length)?;
        Ok(id)
    }

    fn existing(graph: &KnowledgeGraph, kind: EntityKind, raw: &str) -> TheatreResult<EntityId> {
        let raw = raw.trim();
        if graph.kind_of(raw) == Some(kind) {
            Ok(EntityId::new(raw)?)
        } else {
            Err(TheatreError::not_found(kind, raw))
        }
    }

    // ---- creation ----

    /// Adds a theatre.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty, overlong or duplicate id.
    pub fn add_theatre(&self, id: &str, display_name: Option<&str>, capacity: Option<u32>) -> TheatreResult<Theatre> {
        let id = self.new_id(id)?;
        let theatre = Theatre {
            id,
            display_name: display_name.map(str::to_string),
            capacity,
        };
        self.mutate(|g| {
            g.ensure_unused(&theatre.id)?;
            g.insert_theatre(theatre.clone());
            Ok(())
        })?;
        info!(theatre = %theatre.id, "theatre added");
        Ok(theatre)
    }

    /// Adds a ward.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id.
    pub fn add_ward(&self, id: &str) -> TheatreResult<Ward> {
        let ward = Ward { id: self.new_id(id)? };
        self.mutate(|g| {
            g.ensure_unused(&ward.id)?;
            g.insert_ward(ward.clone());
            Ok(())
        })?;
        info!(ward = %ward.id, "ward added");
        Ok(ward)
    }

    /// Adds a recovery room.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id.
    pub fn add_recovery_room(&self, id: &str) -> TheatreResult<RecoveryRoom> {
        let room = RecoveryRoom { id: self.new_id(id)? };
        self.mutate(|g| {
            g.ensure_unused(&room.id)?;
            g.insert_recovery_room(room.clone());
            Ok(())
        })?;
        info!(recovery_room = %room.id, "recovery room added");
        Ok(room)
    }

    /// Adds a surgeon, authorizing it for `theatre_id` when that theatre exists.
    ///
    /// An unknown theatre does not fail the call: the surgeon is created with
    /// no authorization and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id.
    pub fn add_surgeon(&self, id: &str, license_number: &str, theatre_id: &str) -> TheatreResult<Surgeon> {
        let id = self.new_id(id)?;
        let surgeon = self.mutate(|g| {
            g.ensure_unused(&id)?;
            let mut surgeon = Surgeon::new(id.clone(), license_number.trim());
            let theatre = g.resolve_soft(&id, "works_in_theatre", EntityKind::Theatre, Some(theatre_id));
            if let Some(theatre) = theatre {
                surgeon.works_in_theatre.link(theatre);
            }
            g.insert_surgeon(surgeon.clone());
            Ok(surgeon)
        })?;
        info!(
            surgeon = %surgeon.id,
            authorized = surgeon.works_in_theatre.len(),
            "surgeon added"
        );
        Ok(surgeon)
    }

    /// Adds `theatre_id` to a surgeon's authorization set.
    ///
    /// Linking an already authorized theatre is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either id does not resolve.
    pub fn authorize_surgeon(&self, surgeon_id: &str, theatre_id: &str) -> TheatreResult<Surgeon> {
        let surgeon = self.mutate(|g| {
            let surgeon_id = Self::existing(g, EntityKind::Surgeon, surgeon_id)?;
            let theatre_id = Self::existing(g, EntityKind::Theatre, theatre_id)?;
            let surgeon = g
                .surgeon_mut(&surgeon_id)
                .ok_or_else(|| TheatreError::not_found(EntityKind::Surgeon, surgeon_id.as_str()))?;
            surgeon.works_in_theatre.link(theatre_id);
            Ok(surgeon.clone())
        })?;
        info!(surgeon = %surgeon.id, authorized = surgeon.works_in_theatre.len(), "surgeon authorized");
        Ok(surgeon)
    }

    /// Adds support staff, optionally attached to a theatre.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id.
    pub fn add_staff(&self, id: &str, role: StaffRole, theatre_id: Option<&str>) -> TheatreResult<SupportStaff> {
        let id = self.new_id(id)?;
        let staff = self.mutate(|g| {
            g.ensure_unused(&id)?;
            let theatre = g.resolve_soft(&id, "works_in_theatre", EntityKind::Theatre, theatre_id);
            let staff = SupportStaff {
                id: id.clone(),
                role,
                works_in_theatre: Relation::from_option(theatre),
            };
            g.insert_support_staff(staff.clone());
            Ok(staff)
        })?;
        info!(staff = %staff.id, role = %staff.role, "support staff added");
        Ok(staff)
    }

    /// Adds a time slot.
    ///
    /// Start and end are stored verbatim. Values no supported format accepts
    /// are still stored; they are logged now and excluded from computed
    /// overlap later.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id, a duration
    /// outside the configured bounds, or a malformed date.
    pub fn add_timeslot(
        &self,
        id: &str,
        start_time: &str,
        end_time: &str,
        duration_minutes: u32,
        date: Option<&str>,
    ) -> TheatreResult<TimeSlot> {
        let id = self.new_id(id)?;
        self.limits.check_duration("duration_minutes", duration_minutes)?;
        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => {
                validate_date(d)?;
                Some(d.to_string())
            }
            None => None,
        };

        for value in [start_time, end_time] {
            if parse_time_of_day(value).is_none() {
                let warning = DataQualityWarning::UnparsableTime {
                    timeslot: id.clone(),
                    value: value.to_string(),
                };
                warn!(%warning, "time slot stored with unparsable time");
            }
        }

        let slot = TimeSlot {
            id,
            start_time: start_time.trim().to_string(),
            end_time: end_time.trim().to_string(),
            duration_minutes,
            date,
            temporal_overlaps: Relation::new(),
        };
        self.mutate(|g| {
            g.ensure_unused(&slot.id)?;
            g.insert_timeslot(slot.clone());
            Ok(())
        })?;
        info!(timeslot = %slot.id, start = %slot.start_time, end = %slot.end_time, "time slot added");
        Ok(slot)
    }

    /// Records that two slots overlap, in both directions.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown slot and a validation error when
    /// both ids name the same slot.
    pub fn link_temporal_overlap(&self, a: &str, b: &str) -> TheatreResult<()> {
        self.mutate(|g| {
            let a = Self::existing(g, EntityKind::TimeSlot, a)?;
            let b = Self::existing(g, EntityKind::TimeSlot, b)?;
            if a == b {
                return Err(ValidationError::InvalidRelation {
                    reason: format!("time slot {a} cannot overlap itself"),
                }
                .into());
            }
            g.link_overlap(&a, &b);
            info!(a = %a, b = %b, "temporal overlap linked");
            Ok(())
        })
    }

    /// Adds a surgery.
    ///
    /// References that do not resolve leave the matching relation empty
    /// instead of failing the call.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id or a
    /// duration outside the configured bounds.
    pub fn add_surgery(
        &self,
        id: &str,
        surgeon_id: &str,
        theatre_id: &str,
        timeslot_id: &str,
        estimated_duration: u32,
        is_emergency: bool,
    ) -> TheatreResult<Surgery> {
        let id = self.new_id(id)?;
        self.limits.check_duration("estimated_duration", estimated_duration)?;
        let surgery = self.mutate(|g| {
            g.ensure_unused(&id)?;
            let surgeon = g.resolve_soft(&id, "performed_by", EntityKind::Surgeon, Some(surgeon_id));
            let theatre = g.resolve_soft(&id, "requires_theatre", EntityKind::Theatre, Some(theatre_id));
            let slot = g.resolve_soft(&id, "timeslot", EntityKind::TimeSlot, Some(timeslot_id));
            let surgery = Surgery {
                id: id.clone(),
                estimated_duration,
                is_emergency,
                requires_theatre: Relation::from_option(theatre),
                performed_by: Relation::from_option(surgeon),
                timeslot: Relation::from_option(slot),
                assigned_staff: Relation::new(),
            };
            g.insert_surgery(surgery.clone());
            Ok(surgery)
        })?;
        info!(
            surgery = %surgery.id,
            surgeon = surgery.surgeon().map_or("N/A", EntityId::as_str),
            theatre = surgery.theatre().map_or("N/A", EntityId::as_str),
            emergency = surgery.is_emergency,
            "surgery added"
        );
        Ok(surgery)
    }

    /// Assigns a surgeon or support staff member to a surgery.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the surgery or staff member does not exist.
    pub fn assign_staff(&self, surgery_id: &str, staff_id: &str) -> TheatreResult<Surgery> {
        self.mutate(|g| {
            let surgery_id = Self::existing(g, EntityKind::Surgery, surgery_id)?;
            let staff_raw = staff_id.trim();
            if !g.is_staff(staff_raw) {
                return Err(TheatreError::not_found(EntityKind::SupportStaff, staff_raw));
            }
            let staff_id = EntityId::new(staff_raw)?;
            let surgery = g
                .surgery_mut(&surgery_id)
                .ok_or_else(|| TheatreError::not_found(EntityKind::Surgery, surgery_id.as_str()))?;
            surgery.assigned_staff.link(staff_id);
            Ok(surgery.clone())
        })
    }

    /// Adds a patient. Every reference is optional and soft-linked.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid or duplicate id.
    pub fn add_patient(&self, new: NewPatient) -> TheatreResult<Patient> {
        let id = self.new_id(&new.id)?;
        let patient = self.mutate(|g| {
            g.ensure_unused(&id)?;
            let patient = Patient {
                id: id.clone(),
                severity: new.severity,
                admitted_to: Relation::from_option(g.resolve_soft(&id, "admitted_to", EntityKind::Ward, new.ward.as_deref())),
                recovery_room: Relation::from_option(g.resolve_soft(
                    &id,
                    "recovery_room",
                    EntityKind::RecoveryRoom,
                    new.recovery_room.as_deref(),
                )),
                admitted_at: Relation::from_option(g.resolve_soft(
                    &id,
                    "admitted_at",
                    EntityKind::TimeSlot,
                    new.admitted_at.as_deref(),
                )),
                undergoes_surgery: Relation::from_option(g.resolve_soft(
                    &id,
                    "undergoes_surgery",
                    EntityKind::Surgery,
                    new.surgery.as_deref(),
                )),
            };
            g.insert_patient(patient.clone());
            Ok(patient)
        })?;
        info!(patient = %patient.id, surgeries = patient.undergoes_surgery.len(), "patient added");
        Ok(patient)
    }

    /// Links a patient to an additional surgery.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the patient or surgery does not exist.
    pub fn schedule_patient_surgery(&self, patient_id: &str, surgery_id: &str) -> TheatreResult<Patient> {
        self.mutate(|g| {
            let patient_id = Self::existing(g, EntityKind::Patient, patient_id)?;
            let surgery_id = Self::existing(g, EntityKind::Surgery, surgery_id)?;
            let patient = g
                .patient_mut(&patient_id)
                .ok_or_else(|| TheatreError::not_found(EntityKind::Patient, patient_id.as_str()))?;
            patient.undergoes_surgery.link(surgery_id);
            Ok(patient.clone())
        })
    }

    // ---- deletion ----

    /// Deletes a surgery and every patient undergoing it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the surgery does not exist.
    pub fn delete_surgery(&self, id: &str) -> TheatreResult<DeletionSummary> {
        let summary = self.mutate(|g| {
            let id = Self::existing(g, EntityKind::Surgery, id)?;
            Ok(g.remove_surgery_cascade(&id))
        })?;
        info!(surgery = id.trim(), patients_removed = summary.patients_removed, "surgery deleted");
        Ok(summary)
    }

    /// Deletes a patient.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the patient does not exist.
    pub fn delete_patient(&self, id: &str) -> TheatreResult<()> {
        self.mutate(|g| {
            let id = Self::existing(g, EntityKind::Patient, id)?;
            g.remove_patient(&id);
            Ok(())
        })?;
        info!(patient = id.trim(), "patient deleted");
        Ok(())
    }

    /// Deletes a surgeon. Its surgeries remain, with no performing surgeon.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the surgeon does not exist.
    pub fn delete_surgeon(&self, id: &str) -> TheatreResult<Surgeon> {
        let surgeon = self.mutate(|g| {
            let id = Self::existing(g, EntityKind::Surgeon, id)?;
            g.remove_surgeon(&id)
                .ok_or_else(|| TheatreError::not_found(EntityKind::Surgeon, id.as_str()))
        })?;
        info!(surgeon = %surgeon.id, orphaned = surgeon.performs_operation.len(), "surgeon deleted");
        Ok(surgeon)
    }

    /// Deletes every surgery a surgeon performs, with their patients, as one batch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the surgeon does not exist.
    pub fn delete_surgeries_for_surgeon(&self, surgeon_id: &str) -> TheatreResult<DeletionSummary> {
        let summary = self.mutate(|g| {
            let surgeon_id = Self::existing(g, EntityKind::Surgeon, surgeon_id)?;
            let ids: Vec<EntityId> = g
                .surgeries()
                .filter(|s| s.performed_by.contains(&surgeon_id))
                .map(|s| s.id.clone())
                .collect();
            Ok(g.remove_surgeries_cascade(&ids))
        })?;
        info!(
            surgeon = surgeon_id.trim(),
            surgeries_removed = summary.surgeries_removed,
            patients_removed = summary.patients_removed,
            "surgeon schedule deleted"
        );
        Ok(summary)
    }

    /// Deletes every surgery booked into a slot, with their patients, as one batch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the slot does not exist.
    pub fn delete_surgeries_for_timeslot(&self, timeslot_id: &str) -> TheatreResult<DeletionSummary> {
        let summary = self.mutate(|g| {
            let slot_id = Self::existing(g, EntityKind::TimeSlot, timeslot_id)?;
            let ids: Vec<EntityId> = g
                .surgeries()
                .filter(|s| s.timeslot.contains(&slot_id))
                .map(|s| s.id.clone())
                .collect();
            Ok(g.remove_surgeries_cascade(&ids))
        })?;
        info!(
            timeslot = timeslot_id.trim(),
            surgeries_removed = summary.surgeries_removed,
            patients_removed = summary.patients_removed,
            "time slot schedule deleted"
        );
        Ok(summary)
    }

    /// Deletes every surgery and patient. Staff, theatres and slots survive.
    ///
    /// # Errors
    ///
    /// Fails only if the snapshot save fails.
    pub fn delete_all_schedules(&self) -> TheatreResult<DeletionSummary> {
        let summary = self.mutate(|g| Ok(g.clear_schedules()))?;
        info!(
            surgeries_removed = summary.surgeries_removed,
            patients_removed = summary.patients_removed,
            "all schedules deleted"
        );
        Ok(summary)
    }

    // ---- owned queries ----

    /// All surgeons, in insertion order.
    #[must_use]
    pub fn surgeons(&self) -> Vec<Surgeon> {
        self.read().surgeons().cloned().collect()
    }

    /// All theatres, in insertion order.
    #[must_use]
    pub fn theatres(&self) -> Vec<Theatre> {
        self.read().theatres().cloned().collect()
    }

    /// All surgeries, in insertion order.
    #[must_use]
    pub fn surgeries(&self) -> Vec<Surgery> {
        self.read().surgeries().cloned().collect()
    }

    /// All patients, in insertion order.
    #[must_use]
    pub fn patients(&self) -> Vec<Patient> {
        self.read().patients().cloned().collect()
    }

    /// All time slots, in insertion order.
    #[must_use]
    pub fn timeslots(&self) -> Vec<TimeSlot> {
        self.read().timeslots().cloned().collect()
    }

    /// All support staff, in insertion order.
    #[must_use]
    pub fn support_staff(&self) -> Vec<SupportStaff> {
        self.read().support_staff().cloned().collect()
    }

    /// All wards, in insertion order.
    #[must_use]
    pub fn wards(&self) -> Vec<Ward> {
        self.read().wards().cloned().collect()
    }

    /// All recovery rooms, in insertion order.
    #[must_use]
    pub fn recovery_rooms(&self) -> Vec<RecoveryRoom> {
        self.read().recovery_rooms().cloned().collect()
    }

    /// Finds any entity by exact id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<EntityRecord> {
        self.read().find(id)
    }

    /// See [`KnowledgeGraph::surgeon_schedule`].
    #[must_use]
    pub fn surgeon_schedule(&self, surgeon_id: &str) -> Vec<ScheduleEntry> {
        self.read().surgeon_schedule(surgeon_id)
    }

    /// See [`KnowledgeGraph::theatre_schedule`].
    #[must_use]
    pub fn theatre_schedule(&self, theatre_id: &str) -> Vec<TheatreScheduleEntry> {
        self.read().theatre_schedule(theatre_id)
    }

    /// See [`KnowledgeGraph::timeslot_schedule`].
    #[must_use]
    pub fn timeslot_schedule(&self, timeslot_id: &str) -> Vec<TimeslotScheduleEntry> {
        self.read().timeslot_schedule(timeslot_id)
    }

    /// Surgeries whose slot falls on `date` (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed date.
    pub fn surgeries_on_date(&self, date: &str) -> TheatreResult<Vec<Surgery>> {
        let date: NaiveDate = validate_date(date)?;
        Ok(self.read().surgeries_on_date(date).cloned().collect())
    }

    /// See [`KnowledgeGraph::surgery_info`].
    #[must_use]
    pub fn surgery_info(&self, surgery_id: &str) -> Option<SurgeryInfo> {
        self.read().surgery_info(surgery_id)
    }

    /// Entity counts.
    #[must_use]
    pub fn schedule_summary(&self) -> ScheduleSummary {
        self.read().schedule_summary()
    }

    /// Exports the current graph.
    #[must_use]
    pub fn snapshot(&self) -> KnowledgeSnapshot {
        self.read().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::Severity;
    use crate::storage::InMemorySnapshotStore;

    fn base() -> KnowledgeBase {
        let kb = KnowledgeBase::new();
        kb.add_theatre("Neuro_Theatre", None, None).unwrap();
        kb.add_theatre("Cardio_Theatre", None, None).unwrap();
        kb.add_timeslot("TS_A", "08:00", "10:30", 150, Some("2025-12-26")).unwrap();
        kb.add_timeslot("TS_B", "10:00", "12:30", 150, Some("2025-12-26")).unwrap();
        kb.add_surgeon("Dr_Smith", "12345", "Neuro_Theatre").unwrap();
        kb
    }

    #[test]
    fn test_add_surgeon_soft_fails_on_unknown_theatre() {
        let kb = base();
        let s = kb.add_surgeon("Dr_New", "1", "Ghost_Theatre").unwrap();
        assert!(s.is_unauthorized());
        assert!(kb.read().surgeon("Dr_New").is_some());
    }

    #[test]
    fn test_duplicate_id_rejected_across_kinds() {
        let kb = base();
        let err = kb.add_ward("Neuro_Theatre").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(kb.wards().len(), 0);
    }

    #[test]
    fn test_empty_and_long_ids_rejected() {
        let kb = base();
        assert!(kb.add_theatre("   ", None, None).unwrap_err().is_validation());
        let long = "x".repeat(101);
        assert!(kb.add_theatre(&long, None, None).unwrap_err().is_validation());
    }

    #[test]
    fn test_duration_bounds() {
        let kb = base();
        let err = kb.add_surgery("Op", "Dr_Smith", "Neuro_Theatre", "TS_A", 20, false).unwrap_err();
        assert!(err.is_validation());
        assert!(kb.surgeries().is_empty());
        assert!(kb.add_timeslot("TS_X", "08:00", "18:00", 601, None).is_err());
    }

    #[test]
    fn test_malformed_date_rejected() {
        let kb = base();
        let err = kb.add_timeslot("TS_X", "08:00", "09:00", 60, Some("26/12/2025")).unwrap_err();
        assert!(err.is_validation());
        assert!(kb.surgeries_on_date("tomorrow").unwrap_err().is_validation());
    }

    #[test]
    fn test_unparsable_time_is_stored() {
        let kb = base();
        let slot = kb.add_timeslot("TS_Bad", "noonish", "14:00", 60, None).unwrap();
        assert_eq!(slot.start_time, "noonish");
    }

    #[test]
    fn test_add_surgery_soft_links() {
        let kb = base();
        let s = kb.add_surgery("Op", "Dr_Ghost", "Neuro_Theatre", "TS_Missing", 60, false).unwrap();
        assert!(s.surgeon().is_none());
        assert!(s.slot().is_none());
        assert_eq!(s.theatre().map(EntityId::as_str), Some("Neuro_Theatre"));
    }

    #[test]
    fn test_surgery_links_surgeon_both_ways() {
        let kb = base();
        kb.add_surgery("Brain_Surgery", "Dr_Smith", "Neuro_Theatre", "TS_A", 240, false).unwrap();
        let view = kb.read();
        let dr = view.surgeon("Dr_Smith").unwrap();
        assert_eq!(dr.performs_operation.first().map(EntityId::as_str), Some("Brain_Surgery"));
    }

    #[test]
    fn test_link_temporal_overlap() {
        let kb = base();
        kb.link_temporal_overlap("TS_A", "TS_B").unwrap();
        let view = kb.read();
        let a = view.timeslot("TS_A").unwrap();
        let b = view.timeslot("TS_B").unwrap();
        assert!(a.temporal_overlaps.contains(&b.id));
        assert!(b.temporal_overlaps.contains(&a.id));
        drop(view);
        assert!(kb.link_temporal_overlap("TS_A", "TS_A").unwrap_err().is_validation());
        assert!(kb.link_temporal_overlap("TS_A", "TS_Z").unwrap_err().is_not_found());
    }

    #[test]
    fn test_authorize_surgeon_idempotent() {
        let kb = base();
        kb.authorize_surgeon("Dr_Smith", "Cardio_Theatre").unwrap();
        let s = kb.authorize_surgeon("Dr_Smith", "Cardio_Theatre").unwrap();
        assert_eq!(s.works_in_theatre.len(), 2);
        assert!(kb.authorize_surgeon("Dr_Nobody", "Cardio_Theatre").unwrap_err().is_not_found());
    }

    #[test]
    fn test_assign_staff() {
        let kb = base();
        kb.add_staff("Michael", StaffRole::Anaesthetist, Some("Neuro_Theatre")).unwrap();
        kb.add_surgery("Op", "Dr_Smith", "Neuro_Theatre", "TS_A", 60, false).unwrap();
        let s = kb.assign_staff("Op", "Michael").unwrap();
        assert_eq!(s.assigned_staff.len(), 1);
        assert!(kb.assign_staff("Op", "Neuro_Theatre").unwrap_err().is_not_found());
    }

    #[test]
    fn test_patient_cascade_on_surgery_delete() {
        let kb = base();
        kb.add_ward("Neurology_Ward").unwrap();
        kb.add_surgery("Op", "Dr_Smith", "Neuro_Theatre", "TS_A", 60, false).unwrap();
        kb.add_patient(
            NewPatient::new("P1")
                .severity(Severity::Severe)
                .ward("Neurology_Ward")
                .surgery("Op"),
        )
        .unwrap();
        let summary = kb.delete_surgery("Op").unwrap();
        assert_eq!(summary, DeletionSummary { surgeries_removed: 1, patients_removed: 1 });
        assert!(kb.patients().is_empty());
        assert!(kb.delete_surgery("Op").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_patient_not_found() {
        let kb = base();
        assert!(kb.delete_patient("Nobody").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_surgeon_keeps_surgeries() {
        let kb = base();
        kb.add_surgery("Op", "Dr_Smith", "Neuro_Theatre", "TS_A", 60, false).unwrap();
        kb.delete_surgeon("Dr_Smith").unwrap();
        let op = kb.read().surgery("Op").cloned().unwrap();
        assert!(op.surgeon().is_none());
    }

    #[test]
    fn test_delete_for_timeslot() {
        let kb = base();
        kb.add_surgery("Op1", "Dr_Smith", "Neuro_Theatre", "TS_A", 60, false).unwrap();
        kb.add_surgery("Op2", "Dr_Smith", "Neuro_Theatre", "TS_B", 60, false).unwrap();
        let summary = kb.delete_surgeries_for_timeslot("TS_A").unwrap();
        assert_eq!(summary.surgeries_removed, 1);
        let left: Vec<String> = kb.surgeries().into_iter().map(|s| s.id.to_string()).collect();
        assert_eq!(left, vec!["Op2".to_string()]);
    }

    #[test]
    fn test_one_save_per_batch() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let kb = KnowledgeBase::with_store(ValidationLimits::default(), store.clone()).unwrap();
        kb.add_theatre("Neuro_Theatre", None, None).unwrap();
        kb.add_surgeon("Dr_Smith", "1", "Neuro_Theatre").unwrap();
        kb.add_timeslot("TS_A", "08:00", "10:30", 150, None).unwrap();
        kb.add_surgery("Op1", "Dr_Smith", "Neuro_Theatre", "TS_A", 60, false).unwrap();
        kb.add_surgery("Op2", "Dr_Smith", "Neuro_Theatre", "TS_A", 60, false).unwrap();
        assert_eq!(store.save_count(), 5);
        kb.delete_surgeries_for_surgeon("Dr_Smith").unwrap();
        assert_eq!(store.save_count(), 6);
    }

    #[test]
    fn test_failed_save_leaves_state_unchanged() {
        let store = Arc::new(InMemorySnapshotStore::new());
        let kb = KnowledgeBase::with_store(ValidationLimits::default(), store.clone()).unwrap();
        kb.add_theatre("Neuro_Theatre", None, None).unwrap();
        store.set_fail_saves(true);
        let err = kb.add_theatre("Cardio_Theatre", None, None).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(kb.theatres().len(), 1);
    }

    #[test]
    fn test_restores_from_store() {
        let store = Arc::new(InMemorySnapshotStore::new());
        {
            let kb = KnowledgeBase::with_store(ValidationLimits::default(), store.clone()).unwrap();
            kb.add_theatre("Neuro_Theatre", None, Some(2)).unwrap();
        }
        let kb = KnowledgeBase::with_store(ValidationLimits::default(), store).unwrap();
        assert_eq!(kb.theatres()[0].capacity, Some(2));
    }
}
