//! Time slots.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Relation};
use crate::time::{ClockInterval, InvalidTimeOfDay};

/// A bounded period surgeries and admissions are scheduled against.
///
/// `start_time` and `end_time` are kept exactly as supplied; they are only
/// interpreted when an overlap has to be computed. `temporal_overlaps` is an
/// optional, symmetric, possibly incomplete list of slots known to overlap
/// this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique id.
    pub id: EntityId,

    /// Raw start time.
    pub start_time: String,

    /// Raw end time.
    pub end_time: String,

    /// Duration in minutes.
    pub duration_minutes: u32,

    /// Optional `YYYY-MM-DD` date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Slots explicitly recorded as overlapping this one.
    #[serde(default)]
    pub temporal_overlaps: Relation,
}

impl TimeSlot {
    /// Parses the slot bounds.
    ///
    /// # Errors
    ///
    /// Returns the first unparsable bound.
    pub fn interval(&self) -> Result<ClockInterval, InvalidTimeOfDay> {
        ClockInterval::parse(&self.start_time, &self.end_time)
    }

    /// Returns true if an explicit overlap edge links the two slots.
    #[must_use]
    pub fn has_explicit_overlap_with(&self, other: &Self) -> bool {
        self.temporal_overlaps.contains(&other.id) || other.temporal_overlaps.contains(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, start: &str, end: &str) -> TimeSlot {
        TimeSlot {
            id: EntityId::new(id).unwrap(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            duration_minutes: 150,
            date: None,
            temporal_overlaps: Relation::new(),
        }
    }

    #[test]
    fn test_interval_parses_mixed() {
        let s = slot("TS_A", "08:00 AM", "10:30:00");
        let iv = s.interval().unwrap();
        assert!(iv.start < iv.end);
    }

    #[test]
    fn test_interval_reports_bad_bound() {
        let s = slot("TS_B", "08:00", "tbd");
        assert_eq!(s.interval().unwrap_err().value, "tbd");
    }

    #[test]
    fn test_explicit_overlap_either_direction() {
        let mut a = slot("TS_A", "08:00", "10:30");
        let b = slot("TS_B", "10:45", "13:15");
        assert!(!a.has_explicit_overlap_with(&b));
        a.temporal_overlaps.link(b.id.clone());
        assert!(a.has_explicit_overlap_with(&b));
        assert!(b.has_explicit_overlap_with(&a));
    }
}
