//! Host collaborator boundary
//!
//! The spawner talks to the outside world through two traits:
//! - `EntityHost`: creates the backing entity for a pooled obstacle
//! - `StatSink`: receives numeric telemetry (fire-and-forget)
//!
//! Log events go through the `log` facade.

use crate::error::HostError;
use crate::sim::MovementType;

/// Creates engine-side entities for the pool. Entities are never destroyed.
pub trait EntityHost {
    /// Create one entity of `class` for a `kind` bucket. An error skips that entity.
    fn create_entity(&mut self, kind: MovementType, class: &str) -> Result<(), HostError>;
}

/// Host with no engine behind it; creation always succeeds
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    pub created: usize,
}

impl EntityHost for HeadlessHost {
    fn create_entity(&mut self, _kind: MovementType, _class: &str) -> Result<(), HostError> {
        self.created += 1;
        Ok(())
    }
}

/// Numeric stats published after every segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    ActiveObstacles,
    DifficultyLevel,
    SegmentsSpawned,
}

impl Stat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stat::ActiveObstacles => "active_obstacles",
            Stat::DifficultyLevel => "difficulty_level",
            Stat::SegmentsSpawned => "segments_spawned",
        }
    }
}

/// Telemetry receiver. Never queried for control flow.
pub trait StatSink {
    fn record(&mut self, stat: Stat, value: f64);
}

/// Default sink: forwards stats to the debug log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStats;

impl StatSink for LogStats {
    fn record(&mut self, stat: Stat, value: f64) {
        log::debug!("stat {} = {}", stat.as_str(), value);
    }
}
