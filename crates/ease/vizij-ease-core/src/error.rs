//! Error types for the easing engine

use serde::{Deserialize, Serialize};

/// Errors surfaced by the easing engine.
///
/// Configuration leniency (unknown curve names, empty target sets, zero
/// durations, removing absent fields, calls after `destroy`) never produces an
/// error. What does surface are failures of caller-supplied logic: accessors
/// that cannot read or write a field, and malformed goal/config documents.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum EaseError {
    /// The target has no readable value at this accessor path
    #[error("Property not found: {path}")]
    PropertyNotFound { path: String },

    /// The target refused a write at this accessor path
    #[error("Property write rejected: {path}")]
    PropertyWriteRejected { path: String },

    /// A goal entry could not be interpreted
    #[error("Invalid goal for '{field}': {reason}")]
    InvalidGoal { field: String, reason: String },

    /// Configuration failed validation
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl EaseError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::PropertyNotFound { .. } | Self::PropertyWriteRejected { .. } => "accessor",
            Self::InvalidGoal { .. } | Self::InvalidConfig { .. } => "validation",
            Self::Serialization { .. } => "serialization",
        }
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::PropertyNotFound { path: path.into() }
    }

    pub(crate) fn rejected(path: impl Into<String>) -> Self {
        Self::PropertyWriteRejected { path: path.into() }
    }

    pub(crate) fn invalid_goal(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGoal {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
