//! Error types
//!
//! None of these ever abort a segment. The spawner turns them into log lines
//! and skips the affected obstacle.

use thiserror::Error;

use crate::sim::MovementType;

/// Failure reported by the entity host when it cannot create a backing entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("entity host failed to create {class}: {reason}")]
pub struct HostError {
    pub class: String,
    pub reason: String,
}

impl HostError {
    pub fn new(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            reason: reason.into(),
        }
    }
}

/// Pool acquisition failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("no entity class configured for {0:?}")]
    MissingEntityClass(MovementType),
    #[error("{kind:?} pool exhausted and expansion created no entities")]
    Exhausted { kind: MovementType },
}

/// Settings and asset loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}
