//! Error types for theatrekb.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions. Data-quality problems found while reading the
//! schedule are not errors at all: they are [`DataQualityWarning`] values
//! that get logged and collected, never raised.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::{EntityId, EntityKind};

/// Validation errors raised before any mutation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The id was empty or whitespace.
    #[error("Entity id cannot be empty")]
    EmptyId,

    /// The id is longer than the configured limit.
    #[error("Entity id '{id}' exceeds maximum length of {max_length}")]
    IdTooLong {
        /// The rejected id.
        id: String,
        /// Configured limit in characters.
        max_length: usize,
    },

    /// The id is already taken by an entity of any kind.
    #[error("Entity id '{id}' is already used by a {existing}")]
    DuplicateId {
        /// The reused id.
        id: EntityId,
        /// Kind of the entity holding it.
        existing: EntityKind,
    },

    /// A duration is outside the configured bounds.
    #[error("{field} of {value} minutes is outside [{min}, {max}]")]
    DurationOutOfRange {
        /// Name of the duration field.
        field: &'static str,
        /// Rejected value in minutes.
        value: u32,
        /// Lower bound.
        min: u32,
        /// Upper bound.
        max: u32,
    },

    /// A date is not `YYYY-MM-DD`.
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The raw value.
        value: String,
    },

    /// A link that cannot exist, such as a slot overlapping itself.
    #[error("Invalid relation: {reason}")]
    InvalidRelation {
        /// Why the link was refused.
        reason: String,
    },
}

/// Execution errors that occur while applying an operation.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Expected kind.
        kind: EntityKind,
        /// The missing id.
        id: String,
    },

    /// The snapshot sink failed; the batch was not applied.
    #[error("Storage error: {message}")]
    Storage {
        /// Backend error text.
        message: String,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::Config`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Top-level error type for theatrekb.
#[derive(Debug, Error)]
pub enum TheatreError {
    /// Input rejected before mutation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation failed while applying.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An invariant the crate maintains did not hold.
    #[error("Internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl TheatreError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a not-found error for the given kind and id.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::NotFound {
            kind,
            id: id.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if a referenced entity did not resolve.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::NotFound { .. }))
    }

    /// Returns true if this is a storage failure.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Storage { .. }))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for theatrekb operations.
pub type TheatreResult<T> = Result<T, TheatreError>;

/// Non-fatal data-quality findings.
///
/// These are produced by read paths (mostly conflict detection) when the
/// graph is incomplete or holds values that cannot be interpreted. The
/// offending entity is skipped for the affected check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// A time slot carries a start or end value no supported format accepts.
    UnparsableTime {
        /// The slot holding the value.
        timeslot: EntityId,
        /// The raw value.
        value: String,
    },

    /// A relation that a check needs is empty.
    MissingReference {
        /// The entity missing the link.
        entity: EntityId,
        /// Name of the empty relation.
        relation: String,
    },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsableTime { timeslot, value } => {
                write!(f, "unparsable time '{value}' on {timeslot}")
            }
            Self::MissingReference { entity, relation } => {
                write!(f, "{entity} has no {relation}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_duration() {
        let err = ValidationError::DurationOutOfRange {
            field: "estimated_duration",
            value: 700,
            min: 30,
            max: 600,
        };
        let msg = format!("{err}");
        assert!(msg.contains("700"));
        assert!(msg.contains("[30, 600]"));
    }

    #[test]
    fn test_validation_error_duplicate() {
        let err = ValidationError::DuplicateId {
            id: EntityId::new("Dr_Smith").unwrap(),
            existing: EntityKind::Surgeon,
        };
        assert!(format!("{err}").contains("already used by a surgeon"));
    }

    #[test]
    fn test_not_found() {
        let err = TheatreError::not_found(EntityKind::Surgery, "Ghost_Surgery");
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        let msg = format!("{err}");
        assert!(msg.contains("surgery not found: Ghost_Surgery"));
    }

    #[test]
    fn test_from_validation() {
        let err: TheatreError = ValidationError::EmptyId.into();
        assert!(err.is_validation());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_storage_error() {
        let err: TheatreError = ExecutionError::Storage {
            message: "disk full".to_string(),
        }
        .into();
        assert!(err.is_storage());
        assert!(format!("{err}").contains("disk full"));
    }

    #[test]
    fn test_internal() {
        let err = TheatreError::internal("unexpected state");
        assert!(format!("{err}").contains("unexpected state"));
    }

    #[test]
    fn test_warning_display() {
        let w = DataQualityWarning::UnparsableTime {
            timeslot: EntityId::new("TS_Bad").unwrap(),
            value: "noonish".to_string(),
        };
        assert_eq!(format!("{w}"), "unparsable time 'noonish' on TS_Bad");
    }
}
