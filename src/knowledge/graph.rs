//! The entity graph held by the knowledge base.
//!
//! `KnowledgeGraph` owns one insertion-ordered table per entity kind. Reads
//! are public; mutation primitives are crate-private and are only driven by
//! [`KnowledgeBase`](super::KnowledgeBase), which validates inputs first and
//! applies every batch to a copy of the graph.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use tracing::warn;

use crate::entity::{EntityId, EntityKind, Relation};
use crate::error::ValidationError;
use crate::location::{RecoveryRoom, Theatre, Ward};
use crate::patient::Patient;
use crate::staff::{SupportStaff, Surgeon};
use crate::surgery::Surgery;
use crate::timeslot::TimeSlot;

pub(crate) trait Record {
    fn record_id(&self) -> &EntityId;
}

macro_rules! impl_record {
    ($($ty:ty),+ $(,)?) => {
        $(impl Record for $ty {
            fn record_id(&self) -> &EntityId {
                &self.id
            }
        })+
    };
}

impl_record!(Surgeon, SupportStaff, Theatre, Ward, RecoveryRoom, TimeSlot, Surgery, Patient);

/// Insertion-ordered table keyed by entity id.
#[derive(Debug, Clone)]
pub(crate) struct Table<T> {
    rows: BTreeMap<u64, T>,
    index: HashMap<EntityId, u64>,
    next_seq: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<T: Record> Table<T> {
    pub(super) fn insert(&mut self, row: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(row.record_id().clone(), seq);
        self.rows.insert(seq, row);
    }

    pub(super) fn get<Q>(&self, id: &Q) -> Option<&T>
    where
        EntityId: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(id).and_then(|seq| self.rows.get(seq))
    }

    pub(super) fn get_mut(&mut self, id: &EntityId) -> Option<&mut T> {
        let seq = self.index.get(id)?;
        self.rows.get_mut(seq)
    }

    pub(super) fn remove(&mut self, id: &EntityId) -> Option<T> {
        let seq = self.index.remove(id)?;
        self.rows.remove(&seq)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub(super) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    pub(super) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(super) fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }
}

/// Outcome of a deletion batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeletionSummary {
    /// Surgeries removed.
    pub surgeries_removed: usize,
    /// Patients removed (directly or by cascade).
    pub patients_removed: usize,
}

impl DeletionSummary {
    fn absorb(&mut self, other: Self) {
        self.surgeries_removed += other.surgeries_removed;
        self.patients_removed += other.patients_removed;
    }
}

/// Any entity, as returned by id lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRecord {
    /// A surgeon.
    Surgeon(Surgeon),
    /// Support staff.
    SupportStaff(SupportStaff),
    /// A theatre.
    Theatre(Theatre),
    /// A ward.
    Ward(Ward),
    /// A recovery room.
    RecoveryRoom(RecoveryRoom),
    /// A time slot.
    TimeSlot(TimeSlot),
    /// A surgery.
    Surgery(Surgery),
    /// A patient.
    Patient(Patient),
}

impl EntityRecord {
    /// The kind of the record.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Surgeon(_) => EntityKind::Surgeon,
            Self::SupportStaff(_) => EntityKind::SupportStaff,
            Self::Theatre(_) => EntityKind::Theatre,
            Self::Ward(_) => EntityKind::Ward,
            Self::RecoveryRoom(_) => EntityKind::RecoveryRoom,
            Self::TimeSlot(_) => EntityKind::TimeSlot,
            Self::Surgery(_) => EntityKind::Surgery,
            Self::Patient(_) => EntityKind::Patient,
        }
    }

    /// The id of the record.
    #[must_use]
    pub const fn id(&self) -> &EntityId {
        match self {
            Self::Surgeon(r) => &r.id,
            Self::SupportStaff(r) => &r.id,
            Self::Theatre(r) => &r.id,
            Self::Ward(r) => &r.id,
            Self::RecoveryRoom(r) => &r.id,
            Self::TimeSlot(r) => &r.id,
            Self::Surgery(r) => &r.id,
            Self::Patient(r) => &r.id,
        }
    }
}

/// All entities and relations of one hospital schedule.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    pub(crate) surgeons: Table<Surgeon>,
    pub(crate) support_staff: Table<SupportStaff>,
    pub(crate) theatres: Table<Theatre>,
    pub(crate) wards: Table<Ward>,
    pub(crate) recovery_rooms: Table<RecoveryRoom>,
    pub(crate) timeslots: Table<TimeSlot>,
    pub(crate) surgeries: Table<Surgery>,
    pub(crate) patients: Table<Patient>,
}

impl KnowledgeGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- typed enumeration (insertion order) ----

    /// All surgeons.
    pub fn surgeons(&self) -> impl Iterator<Item = &Surgeon> {
        self.surgeons.iter()
    }

    /// All support staff.
    pub fn support_staff(&self) -> impl Iterator<Item = &SupportStaff> {
        self.support_staff.iter()
    }

    /// All theatres.
    pub fn theatres(&self) -> impl Iterator<Item = &Theatre> {
        self.theatres.iter()
    }

    /// All wards.
    pub fn wards(&self) -> impl Iterator<Item = &Ward> {
        self.wards.iter()
    }

    /// All recovery rooms.
    pub fn recovery_rooms(&self) -> impl Iterator<Item = &RecoveryRoom> {
        self.recovery_rooms.iter()
    }

    /// All time slots.
    pub fn timeslots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.timeslots.iter()
    }

    /// All surgeries.
    pub fn surgeries(&self) -> impl Iterator<Item = &Surgery> {
        self.surgeries.iter()
    }

    /// All patients.
    pub fn patients(&self) -> impl Iterator<Item = &Patient> {
        self.patients.iter()
    }

    // ---- exact-id lookup ----

    /// Finds a surgeon.
    #[must_use]
    pub fn surgeon(&self, id: &str) -> Option<&Surgeon> {
        self.surgeons.get(id.trim())
    }

    /// Finds support staff.
    #[must_use]
    pub fn staff_member(&self, id: &str) -> Option<&SupportStaff> {
        self.support_staff.get(id.trim())
    }

    /// Finds a theatre.
    #[must_use]
    pub fn theatre(&self, id: &str) -> Option<&Theatre> {
        self.theatres.get(id.trim())
    }

    /// Finds a ward.
    #[must_use]
    pub fn ward(&self, id: &str) -> Option<&Ward> {
        self.wards.get(id.trim())
    }

    /// Finds a recovery room.
    #[must_use]
    pub fn recovery_room(&self, id: &str) -> Option<&RecoveryRoom> {
        self.recovery_rooms.get(id.trim())
    }

    /// Finds a time slot.
    #[must_use]
    pub fn timeslot(&self, id: &str) -> Option<&TimeSlot> {
        self.timeslots.get(id.trim())
    }

    /// Finds a surgery.
    #[must_use]
    pub fn surgery(&self, id: &str) -> Option<&Surgery> {
        self.surgeries.get(id.trim())
    }

    /// Finds a patient.
    #[must_use]
    pub fn patient(&self, id: &str) -> Option<&Patient> {
        self.patients.get(id.trim())
    }

    /// Returns the kind of the entity holding `id`, if any.
    #[must_use]
    pub fn kind_of(&self, id: &str) -> Option<EntityKind> {
        let id = id.trim();
        if self.surgeons.get(id).is_some() {
            Some(EntityKind::Surgeon)
        } else if self.support_staff.get(id).is_some() {
            Some(EntityKind::SupportStaff)
        } else if self.theatres.get(id).is_some() {
            Some(EntityKind::Theatre)
        } else if self.wards.get(id).is_some() {
            Some(EntityKind::Ward)
        } else if self.recovery_rooms.get(id).is_some() {
            Some(EntityKind::RecoveryRoom)
        } else if self.timeslots.get(id).is_some() {
            Some(EntityKind::TimeSlot)
        } else if self.surgeries.get(id).is_some() {
            Some(EntityKind::Surgery)
        } else if self.patients.get(id).is_some() {
            Some(EntityKind::Patient)
        } else {
            None
        }
    }

    /// Finds any entity by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<EntityRecord> {
        let record = match self.kind_of(id)? {
            EntityKind::Surgeon => EntityRecord::Surgeon(self.surgeon(id)?.clone()),
            EntityKind::SupportStaff => EntityRecord::SupportStaff(self.staff_member(id)?.clone()),
            EntityKind::Theatre => EntityRecord::Theatre(self.theatre(id)?.clone()),
            EntityKind::Ward => EntityRecord::Ward(self.ward(id)?.clone()),
            EntityKind::RecoveryRoom => EntityRecord::RecoveryRoom(self.recovery_room(id)?.clone()),
            EntityKind::TimeSlot => EntityRecord::TimeSlot(self.timeslot(id)?.clone()),
            EntityKind::Surgery => EntityRecord::Surgery(self.surgery(id)?.clone()),
            EntityKind::Patient => EntityRecord::Patient(self.patient(id)?.clone()),
        };
        Some(record)
    }

    /// Returns true if `id` names a surgeon or support staff.
    #[must_use]
    pub fn is_staff(&self, id: &str) -> bool {
        self.kind_of(id).is_some_and(|kind| kind.is_staff())
    }

    /// Total number of entities of every kind.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.surgeons.len()
            + self.support_staff.len()
            + self.theatres.len()
            + self.wards.len()
            + self.recovery_rooms.len()
            + self.timeslots.len()
            + self.surgeries.len()
            + self.patients.len()
    }

    pub(crate) fn counts(&self) -> [usize; 5] {
        [
            self.surgeons.len(),
            self.theatres.len(),
            self.surgeries.len(),
            self.patients.len(),
            self.timeslots.len(),
        ]
    }

    // ---- mutation primitives ----

    /// Fails if `id` is already used by any entity.
    pub(crate) fn ensure_unused(&self, id: &EntityId) -> Result<(), ValidationError> {
        match self.kind_of(id.as_str()) {
            Some(existing) => Err(ValidationError::DuplicateId {
                id: id.clone(),
                existing,
            }),
            None => Ok(()),
        }
    }

    /// Resolves an optional reference of `kind`, logging when it does not resolve.
    pub(crate) fn resolve_soft(
        &self,
        owner: &EntityId,
        relation: &'static str,
        kind: EntityKind,
        reference: Option<&str>,
    ) -> Option<EntityId> {
        let raw = reference?.trim();
        if raw.is_empty() {
            return None;
        }
        if self.kind_of(raw) == Some(kind) {
            return EntityId::new(raw).ok();
        }
        warn!(
            entity = %owner,
            relation,
            reference = raw,
            expected = %kind,
            "reference did not resolve; relation left empty"
        );
        None
    }

    pub(crate) fn insert_surgeon(&mut self, surgeon: Surgeon) {
        self.surgeons.insert(surgeon);
    }

    pub(crate) fn insert_support_staff(&mut self, staff: SupportStaff) {
        self.support_staff.insert(staff);
    }

    pub(crate) fn insert_theatre(&mut self, theatre: Theatre) {
        self.theatres.insert(theatre);
    }

    pub(crate) fn insert_ward(&mut self, ward: Ward) {
        self.wards.insert(ward);
    }

    pub(crate) fn insert_recovery_room(&mut self, room: RecoveryRoom) {
        self.recovery_rooms.insert(room);
    }

    pub(crate) fn insert_timeslot(&mut self, slot: TimeSlot) {
        self.timeslots.insert(slot);
    }

    pub(crate) fn insert_patient(&mut self, patient: Patient) {
        self.patients.insert(patient);
    }

    /// Inserts a surgery and mirrors its surgeon link onto the surgeon.
    pub(crate) fn insert_surgery(&mut self, surgery: Surgery) {
        for surgeon_id in &surgery.performed_by {
            if let Some(surgeon) = self.surgeons.get_mut(surgeon_id) {
                surgeon.performs_operation.link(surgery.id.clone());
            }
        }
        self.surgeries.insert(surgery);
    }

    pub(crate) fn surgeon_mut(&mut self, id: &EntityId) -> Option<&mut Surgeon> {
        self.surgeons.get_mut(id)
    }

    pub(crate) fn surgery_mut(&mut self, id: &EntityId) -> Option<&mut Surgery> {
        self.surgeries.get_mut(id)
    }

    pub(crate) fn patient_mut(&mut self, id: &EntityId) -> Option<&mut Patient> {
        self.patients.get_mut(id)
    }

    /// Links two slots symmetrically.
    pub(crate) fn link_overlap(&mut self, a: &EntityId, b: &EntityId) {
        if let Some(slot) = self.timeslots.get_mut(a) {
            slot.temporal_overlaps.link(b.clone());
        }
        if let Some(slot) = self.timeslots.get_mut(b) {
            slot.temporal_overlaps.link(a.clone());
        }
    }

    /// Removes a surgery, the patients undergoing it, and its surgeon links.
    pub(crate) fn remove_surgery_cascade(&mut self, id: &EntityId) -> DeletionSummary {
        let Some(surgery) = self.surgeries.remove(id) else {
            return DeletionSummary::default();
        };
        for surgeon_id in &surgery.performed_by {
            if let Some(surgeon) = self.surgeons.get_mut(surgeon_id) {
                surgeon.performs_operation.unlink(id);
            }
        }

        let dependents: Vec<EntityId> = self
            .patients
            .iter()
            .filter(|p| p.undergoes_surgery.contains(id))
            .map(|p| p.id.clone())
            .collect();
        for patient_id in &dependents {
            self.patients.remove(patient_id);
        }

        DeletionSummary {
            surgeries_removed: 1,
            patients_removed: dependents.len(),
        }
    }

    /// Removes several surgeries in order, cascading each.
    pub(crate) fn remove_surgeries_cascade(&mut self, ids: &[EntityId]) -> DeletionSummary {
        let mut summary = DeletionSummary::default();
        for id in ids {
            summary.absorb(self.remove_surgery_cascade(id));
        }
        summary
    }

    pub(crate) fn remove_patient(&mut self, id: &EntityId) -> bool {
        self.patients.remove(id).is_some()
    }

    /// Removes a surgeon and unlinks it from surgeries; surgeries survive.
    pub(crate) fn remove_surgeon(&mut self, id: &EntityId) -> Option<Surgeon> {
        let surgeon = self.surgeons.remove(id)?;
        for surgery in self.surgeries.iter_mut() {
            surgery.performed_by.unlink(id);
            surgery.assigned_staff.unlink(id);
        }
        Some(surgeon)
    }

    /// Removes every surgery and patient.
    pub(crate) fn clear_schedules(&mut self) -> DeletionSummary {
        let summary = DeletionSummary {
            surgeries_removed: self.surgeries.len(),
            patients_removed: self.patients.len(),
        };
        self.patients.clear();
        self.surgeries.clear();
        for surgeon in self.surgeons.iter_mut() {
            surgeon.performs_operation = Relation::new();
        }
        summary
    }
}
