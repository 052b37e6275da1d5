//! A small demonstration hospital.
//!
//! The data deliberately contains one theatre double-booking
//! (`Neuro_Theatre` at `TimeSlot_08_00`) and one specialization mismatch
//! (`Dr_Williams`, authorized for `Cardio_Theatre`, operating in
//! `Neuro_Theatre`).

use tracing::info;

use crate::error::TheatreResult;
use crate::knowledge::KnowledgeBase;
use crate::patient::{NewPatient, Severity};
use crate::staff::StaffRole;

const THEATRES: [&str; 4] = ["Neuro_Theatre", "Ortho_Theatre", "Cardio_Theatre", "General_Theatre"];

const WARDS: [&str; 4] = ["Neurology_Ward", "Cardiology_Ward", "Orthopedic_Ward", "General_Ward"];

const RECOVERY_ROOMS: [&str; 3] = ["Recovery_Room_A", "Recovery_Room_B", "Recovery_Room_C"];

// (id, start, end, date)
const TIMESLOTS: [(&str, &str, &str, &str); 6] = [
    ("TimeSlot_08_00", "08:00", "10:30", "2025-12-26"),
    ("TimeSlot_10_45", "10:45", "13:15", "2025-12-27"),
    ("TimeSlot_14_00", "14:00", "16:30", "2025-12-28"),
    ("TimeSlot_16_45", "16:45", "19:15", "2025-12-26"),
    ("TimeSlot_19_30", "19:30", "22:00", "2025-12-27"),
    ("TimeSlot_22_45", "22:45", "01:15", "2025-12-28"),
];

const SLOT_MINUTES: u32 = 150;

const OVERLAPS: [(&str, &str); 3] = [
    ("TimeSlot_08_00", "TimeSlot_10_45"),
    ("TimeSlot_14_00", "TimeSlot_16_45"),
    ("TimeSlot_19_30", "TimeSlot_22_45"),
];

const ANAESTHETISTS: [(&str, &str); 4] = [
    ("Anaesthetist_Michael", "Neuro_Theatre"),
    ("Anaesthetist_David", "Ortho_Theatre"),
    ("Anaesthetist_Elijah", "Cardio_Theatre"),
    ("Anaesthetist_Frank", "General_Theatre"),
];

const SURGEONS: [(&str, &str, &str); 4] = [
    ("Dr_Smith", "12345", "Neuro_Theatre"),
    ("Dr_Johnson", "67890", "Ortho_Theatre"),
    ("Dr_Williams", "78901", "Cardio_Theatre"),
    ("Dr_Brown", "34567", "General_Theatre"),
];

struct SampleSurgery {
    id: &'static str,
    surgeon: &'static str,
    theatre: &'static str,
    slot: &'static str,
    minutes: u32,
    emergency: bool,
    anaesthetist: &'static str,
}

const SURGERIES: [SampleSurgery; 4] = [
    SampleSurgery {
        id: "Brain_Surgery",
        surgeon: "Dr_Smith",
        theatre: "Neuro_Theatre",
        slot: "TimeSlot_08_00",
        minutes: 240,
        emergency: false,
        anaesthetist: "Anaesthetist_Michael",
    },
    SampleSurgery {
        id: "Hip_Replacement_Surgery",
        surgeon: "Dr_Johnson",
        theatre: "Ortho_Theatre",
        slot: "TimeSlot_14_00",
        minutes: 120,
        emergency: false,
        anaesthetist: "Anaesthetist_David",
    },
    SampleSurgery {
        id: "Cardiac_Bypass_Surgery",
        surgeon: "Dr_Williams",
        theatre: "Neuro_Theatre",
        slot: "TimeSlot_08_00",
        minutes: 180,
        emergency: true,
        anaesthetist: "Anaesthetist_Elijah",
    },
    SampleSurgery {
        id: "Appendectomy",
        surgeon: "Dr_Brown",
        theatre: "General_Theatre",
        slot: "TimeSlot_16_45",
        minutes: 90,
        emergency: true,
        anaesthetist: "Anaesthetist_Frank",
    },
];

fn patients() -> Vec<NewPatient> {
    vec![
        NewPatient::new("Patient_John_Doe")
            .severity(Severity::Severe)
            .ward("Neurology_Ward")
            .recovery_room("Recovery_Room_A")
            .admitted_at("TimeSlot_08_00")
            .surgery("Brain_Surgery"),
        NewPatient::new("Patient_Mary_Smith")
            .severity(Severity::Moderate)
            .ward("Cardiology_Ward")
            .recovery_room("Recovery_Room_B")
            .admitted_at("TimeSlot_10_45")
            .surgery("Cardiac_Bypass_Surgery"),
        NewPatient::new("Patient_Robert_Johnson")
            .severity(Severity::Minor)
            .ward("Orthopedic_Ward")
            .recovery_room("Recovery_Room_C")
            .admitted_at("TimeSlot_14_00")
            .surgery("Hip_Replacement_Surgery"),
        NewPatient::new("Patient_Linda_Williams")
            .severity(Severity::Severe)
            .ward("General_Ward")
            .recovery_room("Recovery_Room_A")
            .admitted_at("TimeSlot_16_45")
            .surgery("Appendectomy"),
        NewPatient::new("Patient_John_Williams")
            .severity(Severity::Moderate)
            .ward("General_Ward")
            .recovery_room("Recovery_Room_A")
            .admitted_at("TimeSlot_19_30"),
        NewPatient::new("Patient_Sarah_Brown")
            .severity(Severity::Mild)
            .ward("General_Ward")
            .recovery_room("Recovery_Room_A")
            .admitted_at("TimeSlot_22_45"),
        NewPatient::new("Padma_Wickramage")
            .severity(Severity::Mild)
            .ward("Neurology_Ward")
            .recovery_room("Recovery_Room_A")
            .surgery("Brain_Surgery"),
        NewPatient::new("Patient_Emergency_Case")
            .severity(Severity::Severe)
            .ward("Cardiology_Ward")
            .recovery_room("Recovery_Room_B")
            .surgery("Cardiac_Bypass_Surgery"),
    ]
}

/// Populates `kb` with the demonstration hospital.
///
/// # Errors
///
/// Fails if any sample id is already taken or a save fails.
pub fn load_sample_hospital(kb: &KnowledgeBase) -> TheatreResult<()> {
    for id in THEATRES {
        kb.add_theatre(id, None, None)?;
    }
    for id in WARDS {
        kb.add_ward(id)?;
    }
    for id in RECOVERY_ROOMS {
        kb.add_recovery_room(id)?;
    }
    for (id, start, end, date) in TIMESLOTS {
        kb.add_timeslot(id, start, end, SLOT_MINUTES, Some(date))?;
    }
    for (a, b) in OVERLAPS {
        kb.link_temporal_overlap(a, b)?;
    }
    for (id, theatre) in ANAESTHETISTS {
        kb.add_staff(id, StaffRole::Anaesthetist, Some(theatre))?;
    }
    for (id, license, theatre) in SURGEONS {
        kb.add_surgeon(id, license, theatre)?;
    }
    for s in &SURGERIES {
        kb.add_surgery(s.id, s.surgeon, s.theatre, s.slot, s.minutes, s.emergency)?;
        kb.assign_staff(s.id, s.surgeon)?;
        kb.assign_staff(s.id, s.anaesthetist)?;
    }
    for patient in patients() {
        kb.add_patient(patient)?;
    }

    info!(entities = kb.read().entity_count(), "sample hospital loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::detect;

    #[test]
    fn test_sample_counts() {
        let kb = KnowledgeBase::new();
        load_sample_hospital(&kb).unwrap();
        let summary = kb.schedule_summary();
        assert_eq!(summary.surgeons, 4);
        assert_eq!(summary.theatres, 4);
        assert_eq!(summary.surgeries, 4);
        assert_eq!(summary.patients, 8);
        assert_eq!(summary.timeslots, 6);
    }

    #[test]
    fn test_sample_conflicts() {
        let kb = KnowledgeBase::new();
        load_sample_hospital(&kb).unwrap();
        let report = detect(&kb.read());
        assert!(report.surgeon_conflicts.is_empty());
        assert!(report.patient_conflicts.is_empty());
        assert_eq!(report.theatre_conflicts.len(), 1);
        assert_eq!(report.specialization_mismatches.len(), 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_loading_twice_fails() {
        let kb = KnowledgeBase::new();
        load_sample_hospital(&kb).unwrap();
        assert!(load_sample_hospital(&kb).is_err());
    }
}
