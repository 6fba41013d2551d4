//! Error taxonomy shared by the gauge engines

use thiserror::Error;

use crate::core::auth::Action;
use crate::core::blob::BlobError;
use crate::core::config::ConfigError;
use crate::entities::GaugeStatus;

/// Broad category of a [`GaugeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Forbidden,
    Integrity,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Forbidden => write!(f, "forbidden"),
            ErrorKind::Integrity => write!(f, "integrity"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Errors that can occur during gauge, set, and certificate operations
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid status transition for {gauge_id}: {from} → {to}")]
    InvalidTransition {
        gauge_id: String,
        from: GaugeStatus,
        to: GaugeStatus,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Forbidden: {actor} is not authorized to {action} {resource}")]
    Forbidden {
        actor: String,
        action: Action,
        resource: String,
    },

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Blob storage error: {0}")]
    Blob(#[from] BlobError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to encode specification: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GaugeError {
    pub fn validation(message: impl Into<String>) -> Self {
        GaugeError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        GaugeError::Conflict(message.into())
    }

    pub fn gauge_not_found(id: impl Into<String>) -> Self {
        GaugeError::NotFound {
            kind: "Gauge",
            id: id.into(),
        }
    }

    pub fn set_not_found(id: impl Into<String>) -> Self {
        GaugeError::NotFound {
            kind: "Set",
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GaugeError::Validation(_) => ErrorKind::Validation,
            GaugeError::InvalidTransition { .. } | GaugeError::Conflict(_) => ErrorKind::Conflict,
            GaugeError::NotFound { .. } => ErrorKind::NotFound,
            GaugeError::Forbidden { .. } => ErrorKind::Forbidden,
            GaugeError::Integrity(_) => ErrorKind::Integrity,
            GaugeError::Database(_)
            | GaugeError::Blob(_)
            | GaugeError::Config(_)
            | GaugeError::Encoding(_)
            | GaugeError::Io(_) => ErrorKind::Internal,
        }
    }

    /// Only conflicts may be retried, and only against freshly read state
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

pub type Result<T, E = GaugeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        let transition = GaugeError::InvalidTransition {
            gauge_id: "G1".to_string(),
            from: GaugeStatus::Available,
            to: GaugeStatus::Returned,
        };
        assert!(transition.is_retryable());
        assert!(GaugeError::conflict("lost race").is_retryable());
        assert!(!GaugeError::validation("bad").is_retryable());
        assert!(!GaugeError::gauge_not_found("G9").is_retryable());
        assert!(!GaugeError::Integrity("3 rows".to_string()).is_retryable());
    }

    #[test]
    fn test_transition_message() {
        let err = GaugeError::InvalidTransition {
            gauge_id: "G1".to_string(),
            from: GaugeStatus::Available,
            to: GaugeStatus::Returned,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition for G1: available → returned"
        );
    }
}
