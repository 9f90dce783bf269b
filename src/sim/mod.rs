//! Deterministic layout generation
//!
//! All spawner logic lives here. This module must stay deterministic:
//! - Seeded RNG only (one `Pcg32` owned by the spawner)
//! - Stable iteration order (bucket, then index)
//! - No engine or rendering dependencies; the host is reached through `platform`

pub mod difficulty;
pub mod fairness;
pub mod lane;
pub mod pattern;
pub mod pool;
pub mod spawner;
pub mod state;
pub mod synth;
pub mod tutorial;

pub use difficulty::{DifficultyController, DifficultyState, SegmentPlan};
pub use fairness::{FairnessReport, LayoutBounds, validate_layout};
pub use lane::{Lane, MovementType, ObstacleSpawnDescriptor};
pub use pattern::{ObstaclePattern, PatternLibrary};
pub use pool::{EntityState, ObstacleHandle, ObstaclePool, PooledObstacle};
pub use spawner::{ObstacleSpawner, PlannedSegment, SpawnerStats};
pub use state::{ObstacleEvent, RngState, TutorialPrompt, WorldView};
pub use synth::{LayoutSource, SynthesizedLayout};
pub use tutorial::{TutorialPhase, TutorialSequencer};
