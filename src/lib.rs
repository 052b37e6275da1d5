//! # theatrekb - Operating Theatre Scheduling Knowledge Base
//!
//! theatrekb keeps the surgical schedule of a hospital as a graph of typed,
//! linked entities and reports every violation of the core scheduling rules
//! on demand.
//!
//! ## Core Concepts
//!
//! - **KnowledgeBase**: System of record. Every mutation is validated and
//!   applied as one atomic batch.
//! - **Relation**: An ordered, possibly-empty list of linked ids. A missing
//!   link is never an error; it renders as `N/A`.
//! - **ConflictDetector**: Read-only pass producing a deterministic
//!   [`ConflictReport`] of surgeon, theatre and patient double-bookings plus
//!   specialization mismatches.
//!
//! ## Usage
//!
//! ```rust
//! use theatrekb::{detect, KnowledgeBase};
//!
//! let kb = KnowledgeBase::new();
//! kb.add_theatre("Neuro_Theatre", None, None)?;
//! kb.add_surgeon("Dr_Smith", "12345", "Neuro_Theatre")?;
//! kb.add_timeslot("TS_0800", "08:00", "10:30", 150, None)?;
//! kb.add_timeslot("TS_1000", "10:00", "12:30", 150, None)?;
//! kb.add_surgery("Brain_Surgery", "Dr_Smith", "Neuro_Theatre", "TS_0800", 240, false)?;
//! kb.add_surgery("Spine_Surgery", "Dr_Smith", "Neuro_Theatre", "TS_1000", 120, false)?;
//!
//! let report = detect(&kb.read());
//! assert_eq!(report.surgeon_conflicts.len(), 1);
//! assert_eq!(report.theatre_conflicts.len(), 1);
//! # Ok::<(), theatrekb::TheatreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod entity;
pub mod error;
pub mod location;
pub mod patient;
pub mod staff;
pub mod surgery;
pub mod time;
pub mod timeslot;

// Store, detection and persistence
pub mod config;
pub mod conflict;
pub mod knowledge;
pub mod storage;

// Text rendering and search
pub mod describe;
pub mod embedding;
pub mod retrieval;

pub mod sample;

// Re-export primary types at crate root for convenience
pub use config::{Config, LoggingSettings, StorageSettings, ValidationLimits};
pub use conflict::{detect, Conflict, ConflictDetector, ConflictId, ConflictReport, ConflictSeverity, ConflictType};
pub use entity::{EntityId, EntityKind, Relation, NOT_AVAILABLE};
pub use error::{ConfigError, DataQualityWarning, ExecutionError, TheatreError, TheatreResult, ValidationError};
pub use knowledge::{
    DeletionSummary, EntityRecord, KnowledgeBase, KnowledgeGraph, KnowledgeSnapshot, KnowledgeView, ScheduleEntry,
    ScheduleSummary, SurgeryInfo, TheatreScheduleEntry, TimeslotScheduleEntry,
};
pub use location::{RecoveryRoom, Theatre, Ward};
pub use patient::{NewPatient, Patient, Severity};
pub use staff::{StaffRole, SupportStaff, Surgeon};
pub use storage::{InMemorySnapshotStore, SnapshotStore, StorageError};
pub use surgery::Surgery;
pub use timeslot::TimeSlot;

pub use describe::{describe_all, Document, DocumentKind};
pub use retrieval::{LexicalIndex, SearchHit, SemanticSearch};
