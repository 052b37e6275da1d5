//! Plain-text renderings of schedule entities.
//!
//! These documents feed a [`SemanticSearch`](crate::retrieval::SemanticSearch)
//! index. Missing links render as `N/A`.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::entity::{display_or_na, EntityId};
use crate::knowledge::KnowledgeGraph;
use crate::location::{specialty_of, Theatre};
use crate::patient::Patient;
use crate::staff::Surgeon;
use crate::surgery::Surgery;
use crate::timeslot::TimeSlot;

/// Id of the fixed scheduling-rules document.
pub const RULES_DOCUMENT_ID: &str = "scheduling_rules";

const SCHEDULING_RULES: &str = "Hospital Scheduling Rules:
1. Each surgeon can only perform one surgery at a time
2. Each theatre can only host one surgery at a time
3. Surgeons should operate in their specialization theatre
4. A patient cannot undergo two surgeries at overlapping times
5. Emergency surgeries have higher priority than routine surgeries
6. Post-operative recovery rooms must be available";

/// What a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A surgeon.
    Surgeon,
    /// A theatre.
    Theatre,
    /// A surgery.
    Surgery,
    /// A patient.
    Patient,
    /// A time slot.
    Timeslot,
    /// The fixed scheduling rules.
    Rules,
}

/// A text rendering of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Id of the described entity, or [`RULES_DOCUMENT_ID`].
    pub entity_id: String,
    /// Kind of the described entity.
    pub kind: DocumentKind,
    /// Rendered text.
    pub text: String,
}

fn slot_span(graph: &KnowledgeGraph, surgery: &Surgery) -> Option<String> {
    let slot = graph.timeslot(surgery.slot()?.as_str())?;
    Some(format!("{} - {}", slot.start_time, slot.end_time))
}

/// Renders a surgeon with its authorizations and current surgeries.
#[must_use]
pub fn describe_surgeon(graph: &KnowledgeGraph, surgeon: &Surgeon) -> String {
    let specialization = surgeon
        .works_in_theatre
        .first()
        .map_or_else(|| "N/A".to_string(), specialty_of);
    let works_in: Vec<&str> = surgeon.works_in_theatre.iter().map(EntityId::as_str).collect();
    let surgeries: Vec<String> = surgeon
        .performs_operation
        .iter()
        .filter_map(|id| graph.surgery(id.as_str()))
        .filter_map(|s| slot_span(graph, s).map(|span| format!("{} ({span})", s.id)))
        .collect();

    let mut text = String::new();
    let _ = writeln!(text, "Surgeon: {}", surgeon.id);
    let _ = writeln!(text, "License Number: {}", surgeon.license_number);
    let _ = writeln!(text, "Specialization: {specialization}");
    let _ = writeln!(
        text,
        "Works In: {}",
        if works_in.is_empty() { "N/A".to_string() } else { works_in.join(", ") }
    );
    let _ = writeln!(
        text,
        "Current Surgeries: {}",
        if surgeries.is_empty() { "No surgeries scheduled".to_string() } else { surgeries.join(", ") }
    );
    let _ = write!(
        text,
        "This surgeon is qualified to perform surgeries requiring {specialization} expertise."
    );
    text
}

/// Renders a theatre with its schedule.
#[must_use]
pub fn describe_theatre(graph: &KnowledgeGraph, theatre: &Theatre) -> String {
    let specialty = theatre.specialty();
    let schedule: Vec<String> = graph
        .theatre_schedule(theatre.id.as_str())
        .into_iter()
        .map(|e| format!("{} at {} with {}", e.surgery, e.start_time, display_or_na(e.surgeon.as_ref())))
        .collect();

    let mut text = String::new();
    let _ = writeln!(text, "Theatre: {}", theatre.id);
    if let Some(name) = &theatre.display_name {
        let _ = writeln!(text, "Name: {name}");
    }
    let _ = writeln!(text, "Type: {specialty}");
    if let Some(capacity) = theatre.capacity {
        let _ = writeln!(text, "Capacity: {capacity}");
    }
    let _ = writeln!(
        text,
        "Current Schedule: {}",
        if schedule.is_empty() { "No surgeries scheduled".to_string() } else { schedule.join(", ") }
    );
    let _ = write!(text, "This theatre is equipped for {specialty} surgical procedures.");
    text
}

/// Renders a surgery.
#[must_use]
pub fn describe_surgery(graph: &KnowledgeGraph, surgery: &Surgery) -> String {
    let time = slot_span(graph, surgery).unwrap_or_else(|| "Not scheduled".to_string());

    let mut text = String::new();
    let _ = writeln!(text, "Surgery: {}", surgery.id);
    let _ = writeln!(text, "Surgeon: {}", display_or_na(surgery.surgeon()));
    let _ = writeln!(text, "Theatre: {}", display_or_na(surgery.theatre()));
    let _ = writeln!(text, "Scheduled Time: {time}");
    let _ = writeln!(text, "Duration: {} minutes", surgery.estimated_duration);
    if surgery.is_emergency {
        let _ = writeln!(text, "Emergency Status: EMERGENCY");
        let _ = write!(text, "This is an EMERGENCY surgery requiring immediate attention.");
    } else {
        let _ = write!(text, "Emergency Status: Routine");
    }
    text
}

/// Renders a patient.
#[must_use]
pub fn describe_patient(graph: &KnowledgeGraph, patient: &Patient) -> String {
    let admitted = patient
        .admitted_at
        .first()
        .and_then(|id| graph.timeslot(id.as_str()))
        .map_or_else(|| "Not assigned".to_string(), |s| format!("{} to {}", s.start_time, s.end_time));
    let surgeries: Vec<&str> = patient.undergoes_surgery.iter().map(EntityId::as_str).collect();

    let mut text = String::new();
    let _ = writeln!(text, "Patient: {}", patient.id);
    let _ = writeln!(
        text,
        "Severity: {}",
        patient.severity.map_or_else(|| "N/A".to_string(), |s| s.to_string())
    );
    let _ = writeln!(
        text,
        "Surgeries: {}",
        if surgeries.is_empty() { "None".to_string() } else { surgeries.join(", ") }
    );
    let _ = writeln!(text, "Admission Timeslot: {admitted}");
    let _ = writeln!(text, "Admitted to Ward: {}", display_or_na(patient.admitted_to.first()));
    let _ = write!(text, "Recovery Room: {}", display_or_na(patient.recovery_room.first()));
    text
}

/// Renders a time slot with the surgeries booked into it.
#[must_use]
pub fn describe_timeslot(graph: &KnowledgeGraph, slot: &TimeSlot) -> String {
    let booked: Vec<String> = graph
        .timeslot_schedule(slot.id.as_str())
        .into_iter()
        .map(|e| format!("{} (Surgeon: {})", e.surgery, display_or_na(e.surgeon.as_ref())))
        .collect();

    let mut text = String::new();
    let _ = writeln!(text, "Timeslot: {}", slot.id);
    let _ = writeln!(text, "Date: {}", slot.date.as_deref().unwrap_or("N/A"));
    let _ = writeln!(text, "Start Time: {}", slot.start_time);
    let _ = writeln!(text, "End Time: {}", slot.end_time);
    let _ = writeln!(text, "Duration: {} minutes", slot.duration_minutes);
    let _ = write!(
        text,
        "Scheduled Surgeries: {}",
        if booked.is_empty() { "Available - no surgeries scheduled".to_string() } else { booked.join(", ") }
    );
    text
}

/// Renders every surgeon, theatre, surgery, patient and slot, then the rules.
#[must_use]
pub fn describe_all(graph: &KnowledgeGraph) -> Vec<Document> {
    let doc = |id: &EntityId, kind, text| Document {
        entity_id: id.to_string(),
        kind,
        text,
    };

    let mut docs = Vec::new();
    docs.extend(graph.surgeons().map(|s| doc(&s.id, DocumentKind::Surgeon, describe_surgeon(graph, s))));
    docs.extend(graph.theatres().map(|t| doc(&t.id, DocumentKind::Theatre, describe_theatre(graph, t))));
    docs.extend(graph.surgeries().map(|s| doc(&s.id, DocumentKind::Surgery, describe_surgery(graph, s))));
    docs.extend(graph.patients().map(|p| doc(&p.id, DocumentKind::Patient, describe_patient(graph, p))));
    docs.extend(graph.timeslots().map(|t| doc(&t.id, DocumentKind::Timeslot, describe_timeslot(graph, t))));
    docs.push(Document {
        entity_id: RULES_DOCUMENT_ID.to_string(),
        kind: DocumentKind::Rules,
        text: SCHEDULING_RULES.to_string(),
    });
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;

    #[test]
    fn test_unlinked_surgery_renders_sentinels() {
        let kb = KnowledgeBase::new();
        kb.add_surgery("Loose", "Nobody", "Nowhere", "Never", 60, true).unwrap();
        let view = kb.read();
        let text = describe_surgery(&view, view.surgery("Loose").unwrap());
        assert!(text.contains("Surgeon: N/A"));
        assert!(text.contains("Theatre: N/A"));
        assert!(text.contains("Scheduled Time: Not scheduled"));
        assert!(text.contains("EMERGENCY"));
    }

    #[test]
    fn test_describe_all_order_and_rules() {
        let kb = KnowledgeBase::new();
        kb.add_theatre("Neuro_Theatre", None, None).unwrap();
        kb.add_surgeon("Dr_Smith", "12345", "Neuro_Theatre").unwrap();
        kb.add_timeslot("TS_1", "08:00", "10:30", 150, None).unwrap();
        kb.add_surgery("Brain_Surgery", "Dr_Smith", "Neuro_Theatre", "TS_1", 240, false).unwrap();

        let docs = describe_all(&kb.read());
        let kinds: Vec<DocumentKind> = docs.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DocumentKind::Surgeon,
                DocumentKind::Theatre,
                DocumentKind::Surgery,
                DocumentKind::Timeslot,
                DocumentKind::Rules
            ]
        );
        assert!(docs[0].text.contains("Brain_Surgery (08:00 - 10:30)"));
        assert!(docs[0].text.contains("Specialization: Neuro"));
        assert!(docs[1].text.contains("Brain_Surgery at 08:00 with Dr_Smith"));
        assert_eq!(docs.last().map(|d| d.entity_id.as_str()), Some(RULES_DOCUMENT_ID));
    }
}
