//! Difficulty progression and breather segments
//!
//! Level is a pure function of how many regular segments have spawned.
//! Breathers are lighter segments with a clear run-up at the front.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::lane::ObstacleSpawnDescriptor;
use crate::remap;
use crate::settings::{DifficultySettings, LayoutSettings};

/// Most pattern names remembered for the variety guard
pub const PATTERN_HISTORY_LIMIT: usize = 32;

/// Mutable difficulty bookkeeping, reset on restart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifficultyState {
    pub segments_spawned: u32,
    pub level: u32,
    pub segments_since_breather: u32,
    /// Most recent selection at the back
    pub recent_patterns: VecDeque<String>,
    pub last_pattern: Option<String>,
}

impl DifficultyState {
    pub fn remember_pattern(&mut self, name: &str) {
        if self.recent_patterns.len() == PATTERN_HISTORY_LIMIT {
            self.recent_patterns.pop_front();
        }
        self.recent_patterns.push_back(name.to_string());
        self.last_pattern = Some(name.to_string());
    }

    /// The last `window` selections, newest first
    pub fn recent(&self, window: usize) -> impl Iterator<Item = &str> {
        self.recent_patterns.iter().rev().take(window).map(String::as_str)
    }

    pub fn clear_pattern_history(&mut self) {
        self.recent_patterns.clear();
    }
}

/// Per-segment decision from the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    pub level: u32,
    pub level_changed: bool,
    pub breather: bool,
}

#[derive(Debug, Clone)]
pub struct DifficultyController {
    settings: DifficultySettings,
    state: DifficultyState,
}

impl DifficultyController {
    pub fn new(settings: DifficultySettings) -> Self {
        Self {
            settings,
            state: DifficultyState::default(),
        }
    }

    pub fn state(&self) -> &DifficultyState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DifficultyState {
        &mut self.state
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn settings(&self) -> &DifficultySettings {
        &self.settings
    }

    /// Difficulty after `segments` regular segments
    pub fn level_for(&self, segments: u32) -> u32 {
        segments / self.settings.segments_per_level.max(1)
    }

    /// Count a new segment and decide its level and breather status
    pub fn advance(&mut self) -> SegmentPlan {
        self.state.segments_spawned = self.state.segments_spawned.saturating_add(1);
        self.state.segments_since_breather = self.state.segments_since_breather.saturating_add(1);

        let level = self.level_for(self.state.segments_spawned);
        let level_changed = level != self.state.level;
        if level_changed {
            log::info!(
                "Difficulty {} -> {} after {} segments",
                self.state.level,
                level,
                self.state.segments_spawned
            );
            self.state.level = level;
        }

        let breather = self.settings.breather_interval > 0
            && self.state.segments_since_breather >= self.settings.breather_interval
            && level < self.settings.breather_cutoff_level;
        if breather {
            self.state.segments_since_breather = 0;
            log::info!("Segment {} is a breather", self.state.segments_spawned);
        }

        SegmentPlan {
            level,
            level_changed,
            breather,
        }
    }

    /// Clear run-up left at the front of a breather segment
    pub fn breather_gap(&self, level: u32) -> f32 {
        let gap = self.settings.breather_gap_start
            - level as f32 * self.settings.breather_gap_shrink_per_level;
        gap.max(self.settings.breather_gap_floor)
    }

    /// Squeeze every position into the back of the segment.
    ///
    /// Returns the new earliest allowed offset.
    pub fn compress_for_breather(
        &self,
        layout: &mut [ObstacleSpawnDescriptor],
        level: u32,
        bounds: &LayoutSettings,
    ) -> f32 {
        let start = bounds.min_offset + self.breather_gap(level);
        for descriptor in layout.iter_mut() {
            let clamped = descriptor
                .relative_position
                .clamp(bounds.min_offset, bounds.max_offset);
            descriptor.relative_position =
                remap(clamped, bounds.min_offset, bounds.max_offset, start, bounds.max_offset);
        }
        start
    }

    /// Procedural count multiplier for this segment
    pub fn density_scale(&self, breather: bool) -> f32 {
        if breather {
            self.settings.breather_density
        } else {
            1.0
        }
    }

    pub fn reset(&mut self) {
        log::info!("Difficulty reset");
        self.state = DifficultyState::default();
    }
}
