//! Shared spawner state types
//!
//! Notifications, the seeded RNG wrapper, and the per-tick world view.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::lane::ObstacleSpawnDescriptor;
use super::pool::ObstacleHandle;

/// Which tutorial prompt fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TutorialPrompt {
    LaneSwitch,
    Jump,
    Slide,
}

impl TutorialPrompt {
    pub const ALL: [TutorialPrompt; 3] = [
        TutorialPrompt::LaneSwitch,
        TutorialPrompt::Jump,
        TutorialPrompt::Slide,
    ];
}

/// Notifications pushed by the spawner, drained by the host
#[derive(Debug, Clone, PartialEq)]
pub enum ObstacleEvent {
    Spawned {
        handle: ObstacleHandle,
        descriptor: ObstacleSpawnDescriptor,
        position: Vec3,
        tutorial: bool,
    },
    Deactivated {
        handle: ObstacleHandle,
    },
    DifficultyChanged {
        level: u32,
    },
    TutorialPrompt(TutorialPrompt),
    TutorialComplete,
}

/// What the world/scroll collaborator tells us each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldView {
    /// Current scroll speed (world units per second)
    pub scroll_speed: f32,
    /// Player's fixed longitudinal position
    pub player_x: f32,
}

impl WorldView {
    pub fn new(scroll_speed: f32, player_x: f32) -> Self {
        Self {
            scroll_speed,
            player_x,
        }
    }

    /// Seconds until something at `x` reaches the player (None when not scrolling)
    pub fn time_to_reach(&self, x: f32) -> Option<f32> {
        if self.scroll_speed <= 0.0 {
            return None;
        }
        Some((x - self.player_x) / self.scroll_speed)
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed.wrapping_add(self.stream))
    }

    /// Derive an independent state (e.g. after a restart)
    pub fn next_stream(&self) -> Self {
        Self {
            seed: self.seed,
            stream: self.stream.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_time_to_reach() {
        let world = WorldView::new(1000.0, 0.0);
        assert_eq!(world.time_to_reach(1500.0), Some(1.5));
        assert_eq!(WorldView::new(0.0, 0.0).time_to_reach(10.0), None);
    }

    #[test]
    fn test_rng_state_is_deterministic() {
        let state = RngState::new(42);
        let a: u32 = state.to_rng().random();
        let b: u32 = state.to_rng().random();
        assert_eq!(a, b);
        let c: u32 = state.next_stream().to_rng().random();
        assert_ne!(a, c);
    }
}
