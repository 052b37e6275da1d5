//! Conflict detection over a consistent view of the knowledge base.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::types::{Conflict, ConflictReport, ConflictType};
use crate::entity::EntityId;
use crate::error::DataQualityWarning;
use crate::knowledge::{KnowledgeBase, KnowledgeGraph};
use crate::surgery::Surgery;
use crate::time::ClockInterval;
use crate::timeslot::TimeSlot;

/// Runs every conflict check against one graph.
///
/// Detection never fails: entities missing a link a check needs are left out
/// of that check and reported as warnings.
#[must_use]
pub fn detect(graph: &KnowledgeGraph) -> ConflictReport {
    let mut pass = Pass::new(graph);
    let surgeon_conflicts = pass.surgeon_conflicts(None);
    let theatre_conflicts = pass.theatre_conflicts(None);
    let patient_conflicts = pass.patient_conflicts(None);
    let specialization_mismatches = pass.specialization_mismatches();
    let report = ConflictReport {
        surgeon_conflicts,
        theatre_conflicts,
        patient_conflicts,
        specialization_mismatches,
        warnings: pass.warnings,
    };
    debug!(
        surgeon = report.surgeon_conflicts.len(),
        theatre = report.theatre_conflicts.len(),
        patient = report.patient_conflicts.len(),
        mismatch = report.specialization_mismatches.len(),
        warnings = report.warnings.len(),
        "conflict detection finished"
    );
    report
}

/// Detects scheduling conflicts in a shared knowledge base.
///
/// Each call takes one read view for its whole traversal, so it never sees a
/// half-applied mutation.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    kb: Arc<KnowledgeBase>,
}

impl ConflictDetector {
    /// Creates a detector over `kb`.
    #[must_use]
    pub const fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self { kb }
    }

    /// The knowledge base being checked.
    #[must_use]
    pub const fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }

    /// Runs every check.
    #[must_use]
    pub fn detect_all_conflicts(&self) -> ConflictReport {
        detect(&self.kb.read())
    }

    /// Surgeon double-bookings, for one surgeon or all of them.
    #[must_use]
    pub fn surgeon_conflicts(&self, surgeon_id: Option<&str>) -> Vec<Conflict> {
        Pass::new(&self.kb.read()).surgeon_conflicts(surgeon_id)
    }

    /// Theatre double-bookings, for one theatre or all of them.
    #[must_use]
    pub fn theatre_conflicts(&self, theatre_id: Option<&str>) -> Vec<Conflict> {
        Pass::new(&self.kb.read()).theatre_conflicts(theatre_id)
    }

    /// Patient double-bookings, for one patient or all of them.
    #[must_use]
    pub fn patient_conflicts(&self, patient_id: Option<&str>) -> Vec<Conflict> {
        Pass::new(&self.kb.read()).patient_conflicts(patient_id)
    }

    /// Surgeries whose theatre is outside their surgeon's authorization set.
    #[must_use]
    pub fn specialization_mismatches(&self) -> Vec<Conflict> {
        Pass::new(&self.kb.read()).specialization_mismatches()
    }
}

/// State of one detection traversal.
struct Pass<'g> {
    graph: &'g KnowledgeGraph,
    warnings: Vec<DataQualityWarning>,
    seen: HashSet<DataQualityWarning>,
}

impl<'g> Pass<'g> {
    fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            warnings: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn record(&mut self, warning: DataQualityWarning) {
        if self.seen.insert(warning.clone()) {
            match &warning {
                DataQualityWarning::UnparsableTime { .. } => warn!(%warning, "excluded from computed overlap"),
                DataQualityWarning::MissingReference { .. } => debug!(%warning, "excluded from overlap checks"),
            }
            self.warnings.push(warning);
        }
    }

    fn slot_of(&mut self, surgery: &Surgery) -> Option<&'g TimeSlot> {
        let graph = self.graph;
        let slot = surgery.slot().and_then(|id| graph.timeslot(id.as_str()));
        if slot.is_none() {
            self.record(DataQualityWarning::MissingReference {
                entity: surgery.id.clone(),
                relation: "timeslot".to_string(),
            });
        }
        slot
    }

    fn interval_of(&mut self, slot: &TimeSlot) -> Option<ClockInterval> {
        match slot.interval() {
            Ok(interval) => Some(interval),
            Err(err) => {
                self.record(DataQualityWarning::UnparsableTime {
                    timeslot: slot.id.clone(),
                    value: err.value,
                });
                None
            }
        }
    }

    /// Explicit overlap edges win; otherwise times are compared as same-day
    /// clock values, and anything unparsable does not overlap.
    fn surgeries_overlap(&mut self, a: &Surgery, b: &Surgery) -> bool {
        let (Some(slot_a), Some(slot_b)) = (self.slot_of(a), self.slot_of(b)) else {
            return false;
        };
        if slot_a.has_explicit_overlap_with(slot_b) {
            return true;
        }
        match (self.interval_of(slot_a), self.interval_of(slot_b)) {
            (Some(ia), Some(ib)) => ia.overlaps(&ib),
            _ => false,
        }
    }

    /// Every overlapping unordered pair, in `(i, j)` order with `i < j`.
    fn overlapping_pairs(&mut self, surgeries: &[&'g Surgery]) -> Vec<(&'g EntityId, &'g EntityId)> {
        let mut pairs = Vec::new();
        for (i, &first) in surgeries.iter().enumerate() {
            for &second in &surgeries[i + 1..] {
                if first.id != second.id && self.surgeries_overlap(first, second) {
                    pairs.push((&first.id, &second.id));
                }
            }
        }
        pairs
    }

    fn resolve_surgeries<'r>(&self, ids: impl IntoIterator<Item = &'r EntityId>) -> Vec<&'g Surgery> {
        let graph = self.graph;
        ids.into_iter().filter_map(|id| graph.surgery(id.as_str())).collect()
    }

    fn surgeon_conflicts(&mut self, only: Option<&str>) -> Vec<Conflict> {
        let graph = self.graph;
        let surgeons: Vec<_> = match only {
            Some(id) => graph.surgeon(id).into_iter().collect(),
            None => graph.surgeons().collect(),
        };

        let mut conflicts = Vec::new();
        for surgeon in surgeons {
            let surgeries = self.resolve_surgeries(&surgeon.performs_operation);
            for (first, second) in self.overlapping_pairs(&surgeries) {
                conflicts.push(Conflict::new(ConflictType::SurgeonDoubleBooking {
                    surgeon: surgeon.id.clone(),
                    surgery1: first.clone(),
                    surgery2: second.clone(),
                }));
            }
        }
        conflicts
    }

    fn theatre_conflicts(&mut self, only: Option<&str>) -> Vec<Conflict> {
        let graph = self.graph;
        let mut by_theatre: HashMap<&EntityId, Vec<&'g Surgery>> = HashMap::new();
        for surgery in graph.surgeries() {
            if let Some(theatre) = surgery.theatre() {
                by_theatre.entry(theatre).or_default().push(surgery);
            }
        }

        let theatres: Vec<_> = match only {
            Some(id) => graph.theatre(id).into_iter().collect(),
            None => graph.theatres().collect(),
        };

        let mut conflicts = Vec::new();
        for theatre in theatres {
            let Some(surgeries) = by_theatre.get(&theatre.id) else {
                continue;
            };
            for (first, second) in self.overlapping_pairs(surgeries) {
                conflicts.push(Conflict::new(ConflictType::TheatreDoubleBooking {
                    theatre: theatre.id.clone(),
                    surgery1: first.clone(),
                    surgery2: second.clone(),
                }));
            }
        }
        conflicts
    }

    fn patient_conflicts(&mut self, only: Option<&str>) -> Vec<Conflict> {
        let graph = self.graph;
        let patients: Vec<_> = match only {
            Some(id) => graph.patient(id).into_iter().collect(),
            None => graph.patients().collect(),
        };

        let mut conflicts = Vec::new();
        for patient in patients {
            let surgeries = self.resolve_surgeries(&patient.undergoes_surgery);
            for (first, second) in self.overlapping_pairs(&surgeries) {
                conflicts.push(Conflict::new(ConflictType::PatientDoubleBooking {
                    patient: patient.id.clone(),
                    surgery1: first.clone(),
                    surgery2: second.clone(),
                }));
            }
        }
        conflicts
    }

    fn specialization_mismatches(&self) -> Vec<Conflict> {
        let graph = self.graph;
        graph
            .surgeries()
            .filter_map(|surgery| {
                let surgeon = graph.surgeon(surgery.surgeon()?.as_str())?;
                let required = surgery.theatre()?;
                // An empty authorization set is a mismatch too, not a skip.
                if surgeon.is_authorized_for(required) {
                    return None;
                }
                Some(Conflict::new(ConflictType::SpecializationMismatch {
                    surgeon: surgeon.id.clone(),
                    surgery: surgery.id.clone(),
                    authorized_theatres: surgeon.works_in_theatre.as_slice().to_vec(),
                    required_theatre: required.clone(),
                }))
            })
            .collect()
    }
}
