//! Runway Obstacles - fair obstacle layouts for a three-lane endless runner
//!
//! Core modules:
//! - `sim`: Deterministic layout generation (patterns, fairness, pooling, tutorial)
//! - `platform`: Host collaborator traits (entity creation, telemetry)
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Error types surfaced by pooling and configuration

pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, HostError, PoolError};
pub use settings::SpawnerSettings;
pub use sim::{ObstacleEvent, ObstacleSpawner, WorldView};

/// Layout configuration constants
pub mod consts {
    /// World-space distance between adjacent lane centerlines
    pub const LANE_SPACING: f32 = 300.0;

    /// Where pooled entities are parked (far below and behind the track)
    pub const OFF_TRACK_X: f32 = -100_000.0;
    pub const OFF_TRACK_Z: f32 = -10_000.0;

    /// Number of lanes on the runway
    pub const LANE_COUNT: usize = 3;

    /// Tolerance for float comparisons on relative positions
    pub const POSITION_EPSILON: f32 = 1e-4;
}

/// Map a relative segment position (0..1) to a world X coordinate
#[inline]
pub fn relative_to_world_x(start_x: f32, end_x: f32, relative: f32) -> f32 {
    start_x + (end_x - start_x) * relative
}

/// Linear remap of `value` from `[from_min, from_max]` into `[to_min, to_max]`
#[inline]
pub fn remap(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let span = from_max - from_min;
    if span.abs() <= f32::EPSILON {
        return to_min;
    }
    to_min + (value - from_min) / span * (to_max - to_min)
}
