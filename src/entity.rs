//! Entity identity and relation normalization.
//!
//! Every entity in the knowledge base is addressed by a human-assigned,
//! immutable [`EntityId`]. All kinds share one namespace, so an id names at
//! most one entity.
//!
//! Links between entities are stored as [`Relation`] values: possibly-empty
//! ordered sequences of ids. Single-valued links (a surgery's time slot, a
//! patient's ward) are read with [`Relation::first`] and degrade to `None`
//! when absent.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Rendering used wherever a single-valued link or attribute is absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Human-assigned entity identifier.
///
/// Leading and trailing whitespace is trimmed; the remainder must be
/// non-empty. Lookups are exact matches on the trimmed value.
///
/// # Examples
///
/// ```
/// use theatrekb::EntityId;
///
/// let id = EntityId::new(" Dr_Smith ").unwrap();
/// assert_eq!(id.as_str(), "Dr_Smith");
/// assert!(EntityId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Creates an id from a name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyId` if the trimmed name is empty.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks the id against a maximum length.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IdTooLong` if the id is longer than `max_length` characters.
    pub fn check_length(&self, max_length: usize) -> Result<(), ValidationError> {
        if self.0.chars().count() > max_length {
            return Err(ValidationError::IdTooLong {
                id: self.0.clone(),
                max_length,
            });
        }
        Ok(())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets id-keyed maps be queried with a plain `&str`.
impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// The kind of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A surgeon (staff subtype).
    Surgeon,
    /// Non-surgeon staff (anaesthetists, nurses).
    SupportStaff,
    /// An operating theatre.
    Theatre,
    /// A scheduled time window.
    TimeSlot,
    /// A surgical operation.
    Surgery,
    /// A patient.
    Patient,
    /// An admission ward.
    Ward,
    /// A post-operative recovery room.
    RecoveryRoom,
}

impl EntityKind {
    /// Returns the snake_case name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Surgeon => "surgeon",
            Self::SupportStaff => "support_staff",
            Self::Theatre => "theatre",
            Self::TimeSlot => "timeslot",
            Self::Surgery => "surgery",
            Self::Patient => "patient",
            Self::Ward => "ward",
            Self::RecoveryRoom => "recovery_room",
        }
    }

    /// Returns true for staff kinds (surgeons and support staff).
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Surgeon | Self::SupportStaff)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered, duplicate-free sequence of linked entity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relation(Vec<EntityId>);

impl Relation {
    /// Creates an empty relation.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a relation holding a single id.
    #[must_use]
    pub fn single(id: EntityId) -> Self {
        Self(vec![id])
    }

    /// Creates a relation from an optional id.
    #[must_use]
    pub fn from_option(id: Option<EntityId>) -> Self {
        Self(id.into_iter().collect())
    }

    /// Returns the first linked id, the value of a single-valued relation.
    #[must_use]
    pub fn first(&self) -> Option<&EntityId> {
        self.0.first()
    }

    /// Returns true if `id` is linked.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.0.contains(id)
    }

    /// Appends `id` unless already present. Returns true if it was added.
    pub fn link(&mut self, id: EntityId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Removes `id`. Returns true if it was present.
    pub fn unlink(&mut self, id: &EntityId) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        before != self.0.len()
    }

    /// Iterates over linked ids in link order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.0.iter()
    }

    /// Returns the number of linked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the linked ids as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[EntityId] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a EntityId;
    type IntoIter = std::slice::Iter<'a, EntityId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<EntityId> for Relation {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        let mut relation = Self::new();
        for id in iter {
            relation.link(id);
        }
        relation
    }
}

/// Renders an optional id, falling back to [`NOT_AVAILABLE`].
#[must_use]
pub fn display_or_na(id: Option<&EntityId>) -> &str {
    id.map_or(NOT_AVAILABLE, EntityId::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    #[test]
    fn test_entity_id_trims() {
        assert_eq!(id("  Neuro_Theatre\t").as_str(), "Neuro_Theatre");
    }

    #[test]
    fn test_entity_id_rejects_empty() {
        assert_eq!(EntityId::new(""), Err(ValidationError::EmptyId));
        assert_eq!(EntityId::new("  "), Err(ValidationError::EmptyId));
    }

    #[test]
    fn test_entity_id_length() {
        let long = id(&"x".repeat(101));
        assert!(matches!(
            long.check_length(100),
            Err(ValidationError::IdTooLong { max_length: 100, .. })
        ));
        assert!(id("short").check_length(100).is_ok());
    }

    #[test]
    fn test_entity_id_serde_rejects_empty() {
        let parsed: Result<EntityId, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
        let ok: EntityId = serde_json::from_str("\"Ward_A\"").unwrap();
        assert_eq!(ok.as_str(), "Ward_A");
    }

    #[test]
    fn test_relation_link_is_set_like() {
        let mut rel = Relation::new();
        assert!(rel.link(id("A")));
        assert!(rel.link(id("B")));
        assert!(!rel.link(id("A")));
        assert_eq!(rel.len(), 2);
        assert_eq!(rel.first(), Some(&id("A")));
    }

    #[test]
    fn test_relation_unlink() {
        let mut rel: Relation = [id("A"), id("B")].into_iter().collect();
        assert!(rel.unlink(&id("A")));
        assert!(!rel.unlink(&id("A")));
        assert_eq!(rel.first(), Some(&id("B")));
    }

    #[test]
    fn test_display_or_na() {
        let rel = Relation::new();
        assert_eq!(display_or_na(rel.first()), NOT_AVAILABLE);
        let rel = Relation::single(id("TS_1"));
        assert_eq!(display_or_na(rel.first()), "TS_1");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EntityKind::RecoveryRoom.to_string(), "recovery_room");
        assert!(EntityKind::SupportStaff.is_staff());
        assert!(!EntityKind::Ward.is_staff());
    }
}
