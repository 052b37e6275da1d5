//! Conflict detection for the surgical schedule.
//!
//! Four checks run over one consistent view of the knowledge base:
//!
//! | check                     | group by        | severity |
//! |---------------------------|-----------------|----------|
//! | surgeon double-booking    | surgeon         | HIGH     |
//! | theatre double-booking    | first theatre   | HIGH     |
//! | patient double-booking    | patient         | CRITICAL |
//! | specialization mismatch   | surgery         | MEDIUM   |
//!
//! Pairs are compared O(n²) within each group, in insertion order, so the
//! same state always yields the same report in the same order.

mod detector;
mod types;

pub use detector::{detect, ConflictDetector};
pub use types::{Conflict, ConflictId, ConflictReport, ConflictSeverity, ConflictType};
