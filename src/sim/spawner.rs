//! Segment spawn orchestrator
//!
//! Entry point for hosts. Owns every other piece of spawner state and runs
//! the per-segment pipeline:
//! difficulty -> synthesis -> debug blockage -> breather compression ->
//! fairness -> world positions -> pool activation.

use glam::Vec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{DifficultyController, SegmentPlan};
use super::fairness::{LayoutBounds, validate_layout};
use super::lane::{Lane, MovementType, ObstacleSpawnDescriptor};
use super::pattern::PatternLibrary;
use super::pool::{Activation, ObstacleHandle, ObstaclePool};
use super::state::{ObstacleEvent, RngState, WorldView};
use super::synth::{LayoutSource, SynthesisRequest, synthesize_layout};
use super::tutorial::{TutorialPhase, TutorialSequencer};
use crate::error::ConfigError;
use crate::platform::{EntityHost, LogStats, Stat, StatSink};
use crate::relative_to_world_x;
use crate::settings::SpawnerSettings;

/// Snapshot for hosts and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnerStats {
    /// Active entities per movement type (indexed by `MovementType::index`)
    pub active: [usize; 3],
    /// Entities ever created per movement type
    pub pooled_totals: [usize; 3],
    pub level: u32,
    pub segments_spawned: u32,
    pub tutorial_phase: TutorialPhase,
}

impl SpawnerStats {
    pub fn active_total(&self) -> usize {
        self.active.iter().sum()
    }
}

/// Validated relative layout for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSegment {
    pub plan: SegmentPlan,
    pub source: LayoutSource,
    pub obstacles: Vec<ObstacleSpawnDescriptor>,
}

pub struct ObstacleSpawner {
    settings: SpawnerSettings,
    library: PatternLibrary,
    pool: ObstaclePool,
    difficulty: DifficultyController,
    tutorial: TutorialSequencer,
    rng_state: RngState,
    rng: Pcg32,
    stats: Box<dyn StatSink>,
    events: Vec<ObstacleEvent>,
}

impl std::fmt::Debug for ObstacleSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObstacleSpawner")
            .field("settings", &self.settings)
            .field("pool", &self.pool)
            .field("difficulty", &self.difficulty)
            .field("tutorial", &self.tutorial)
            .field("rng_state", &self.rng_state)
            .field("pending_events", &self.events.len())
            .finish()
    }
}

impl ObstacleSpawner {
    /// Spawner with the built-in pattern catalog and log-backed stats.
    ///
    /// Settings are validated first; values the generator cannot work with
    /// are rejected here instead of failing mid-run.
    pub fn new(
        settings: SpawnerSettings,
        host: Box<dyn EntityHost>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let rng_state = RngState::new(seed);
        let rng = rng_state.to_rng();
        let pool = ObstaclePool::new(settings.pool.clone(), host);
        let difficulty = DifficultyController::new(settings.difficulty.clone());
        let tutorial = TutorialSequencer::new(settings.tutorial.clone());

        log::info!(
            "Obstacle spawner ready (seed {}, pacing {}, tutorial {})",
            seed,
            settings.pacing.as_str(),
            if settings.tutorial.enabled { "on" } else { "off" }
        );

        Ok(Self {
            settings,
            library: PatternLibrary::builtin(),
            pool,
            difficulty,
            tutorial,
            rng_state,
            rng,
            stats: Box::new(LogStats),
            events: Vec::new(),
        })
    }

    pub fn with_library(mut self, library: PatternLibrary) -> Self {
        log::info!("Using pattern library with {} patterns", library.len());
        self.library = library;
        self
    }

    pub fn with_stats(mut self, stats: Box<dyn StatSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn settings(&self) -> &SpawnerSettings {
        &self.settings
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn pool(&self) -> &ObstaclePool {
        &self.pool
    }

    pub fn difficulty(&self) -> &DifficultyController {
        &self.difficulty
    }

    pub fn tutorial(&self) -> &TutorialSequencer {
        &self.tutorial
    }

    pub fn set_tutorial_enabled(&mut self, enabled: bool) {
        self.tutorial.set_enabled(enabled);
    }

    /// Debug hook: inject a full block in every lane of each regular segment
    pub fn set_force_blockage(&mut self, enabled: bool) {
        log::info!("Force blockage {}", if enabled { "enabled" } else { "disabled" });
        self.settings.debug.force_blockage = enabled;
    }

    /// Populate the segment spanning `[start_x, end_x]`.
    ///
    /// Returns how many obstacles were activated. While the tutorial is
    /// pending, the first segment places it and later ones stay empty.
    /// `is_tutorial_segment` marks the segment the host reserved for the
    /// tutorial; once the tutorial is disabled or complete the flag is
    /// ignored and the segment gets a regular layout.
    pub fn spawn_obstacles_for_segment(
        &mut self,
        start_x: f32,
        end_x: f32,
        is_tutorial_segment: bool,
    ) -> usize {
        if self.tutorial.needs_placement() {
            let spawned = self.tutorial.place(
                start_x,
                &mut self.pool,
                &self.settings.layout.vertical_offsets,
                &mut self.events,
            );
            self.record_stats();
            return spawned;
        }
        if self.tutorial.suppresses_regular_spawning() {
            log::debug!("Segment at x = {} left empty for the tutorial", start_x);
            return 0;
        }
        if is_tutorial_segment {
            log::debug!("Tutorial inactive, segment at x = {} gets a regular layout", start_x);
        }

        let planned = self.plan_segment();
        let mut spawned = 0;
        for descriptor in &planned.obstacles {
            let world_x = relative_to_world_x(start_x, end_x, descriptor.relative_position);
            let position =
                Vec3::new(world_x, descriptor.lane.world_y(), descriptor.vertical_offset);
            if self.activate(*descriptor, position) {
                spawned += 1;
            }
        }

        log::debug!(
            "Segment {} [{}, {}]: {} obstacles ({:?}{})",
            self.difficulty.state().segments_spawned,
            start_x,
            end_x,
            spawned,
            planned.source,
            if planned.plan.breather { ", breather" } else { "" }
        );
        self.record_stats();
        spawned
    }

    /// Count the segment and produce its validated relative layout
    pub fn plan_segment(&mut self) -> PlannedSegment {
        let plan = self.difficulty.advance();
        if plan.level_changed {
            self.events.push(ObstacleEvent::DifficultyChanged { level: plan.level });
        }

        let request = SynthesisRequest {
            level: plan.level,
            breather: plan.breather,
            density_scale: self.difficulty.density_scale(plan.breather),
        };
        let synthesized = synthesize_layout(
            request,
            &self.settings,
            &self.library,
            self.difficulty.state_mut(),
            &mut self.rng,
        );
        let mut obstacles = synthesized.obstacles;

        let layout = &self.settings.layout;
        if self.settings.debug.force_blockage {
            let position = self
                .settings
                .debug
                .blockage_position
                .clamp(layout.min_offset, layout.max_offset);
            log::warn!("Injecting forced blockage at {:.2}", position);
            obstacles.extend(Lane::ALL.iter().map(|&lane| {
                ObstacleSpawnDescriptor::new(MovementType::FullBlock, lane, position)
                    .with_vertical_offset(layout.vertical_offsets.full)
            }));
        }

        let mut bounds = LayoutBounds {
            min_offset: layout.min_offset,
            max_offset: layout.max_offset,
        };
        if plan.breather {
            bounds.min_offset =
                self.difficulty.compress_for_breather(&mut obstacles, plan.level, layout);
        }

        validate_layout(
            &mut obstacles,
            bounds,
            &self.settings.fairness,
            &layout.vertical_offsets,
            &mut self.rng,
        );

        PlannedSegment {
            plan,
            source: synthesized.source,
            obstacles,
        }
    }

    fn activate(&mut self, descriptor: ObstacleSpawnDescriptor, position: Vec3) -> bool {
        let handle = match self.pool.acquire(descriptor.kind) {
            Ok(handle) => handle,
            Err(err) => {
                log::error!(
                    "Skipping {:?} obstacle in {:?} lane: {}",
                    descriptor.kind,
                    descriptor.lane,
                    err
                );
                return false;
            }
        };
        let activation = Activation {
            position,
            lane: descriptor.lane,
            tutorial: false,
        };
        if !self.pool.activate(handle, activation) {
            log::error!("Pool handed out an unusable {:?} entity", descriptor.kind);
            self.pool.release(handle);
            return false;
        }
        self.events.push(ObstacleEvent::Spawned {
            handle,
            descriptor,
            position,
            tutorial: false,
        });
        true
    }

    /// Per-frame update: scroll, recycle behind the player, tutorial checks
    pub fn advance(&mut self, dt: f32, world: &WorldView) {
        if dt > 0.0 && world.scroll_speed > 0.0 {
            let dx = -world.scroll_speed * dt;
            self.pool.translate_active(dx);
            self.tutorial.scroll(dx);
        }

        let despawn_x = world.player_x - self.settings.pool.despawn_distance;
        let behind: Vec<ObstacleHandle> = self
            .pool
            .active_handles()
            .into_iter()
            .filter(|&h| self.pool.get(h).is_some_and(|e| e.position.x < despawn_x))
            .collect();
        let recycled = behind.into_iter().filter(|&h| self.release(h)).count();
        if recycled > 0 {
            self.record_stats();
        }

        self.tutorial.update(world, &mut self.events);
    }

    /// Release every active obstacle
    pub fn clear_all_obstacles(&mut self) -> usize {
        let handles = self.pool.active_handles();
        let released = handles.into_iter().filter(|&h| self.release(h)).count();
        log::info!("Cleared {} obstacles", released);
        self.record_stats();
        released
    }

    /// Release active obstacles with `min_x <= x <= max_x`
    pub fn deactivate_obstacles_in_range(&mut self, min_x: f32, max_x: f32) -> usize {
        let in_range: Vec<ObstacleHandle> = self
            .pool
            .active_handles()
            .into_iter()
            .filter(|&h| {
                self.pool
                    .get(h)
                    .is_some_and(|e| (min_x..=max_x).contains(&e.position.x))
            })
            .collect();
        let released = in_range.into_iter().filter(|&h| self.release(h)).count();
        log::debug!("Deactivated {} obstacles in [{}, {}]", released, min_x, max_x);
        self.record_stats();
        released
    }

    fn release(&mut self, handle: ObstacleHandle) -> bool {
        let released = self.pool.release(handle);
        if released {
            self.events.push(ObstacleEvent::Deactivated { handle });
        }
        released
    }

    pub fn reset_difficulty(&mut self) {
        self.difficulty.reset();
    }

    pub fn reset_tutorial(&mut self) {
        self.tutorial.reset(&mut self.pool, &mut self.events);
        self.record_stats();
    }

    /// Full restart: empty track, fresh difficulty and tutorial, new RNG stream
    pub fn restart(&mut self) {
        self.clear_all_obstacles();
        self.reset_difficulty();
        self.reset_tutorial();
        self.rng_state = self.rng_state.next_stream();
        self.rng = self.rng_state.to_rng();
    }

    /// Flag a collision once per activation
    pub fn mark_player_damaged(&mut self, handle: ObstacleHandle) -> bool {
        self.pool.mark_damaged(handle)
    }

    pub fn drain_events(&mut self) -> Vec<ObstacleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> SpawnerStats {
        let state = self.difficulty.state();
        SpawnerStats {
            active: MovementType::ALL.map(|kind| self.pool.active_of(kind)),
            pooled_totals: MovementType::ALL.map(|kind| self.pool.total(kind)),
            level: state.level,
            segments_spawned: state.segments_spawned,
            tutorial_phase: self.tutorial.phase(),
        }
    }

    fn record_stats(&mut self) {
        let state = self.difficulty.state();
        let (level, segments) = (state.level, state.segments_spawned);
        self.stats.record(Stat::ActiveObstacles, self.pool.active_count() as f64);
        self.stats.record(Stat::DifficultyLevel, level as f64);
        self.stats.record(Stat::SegmentsSpawned, segments as f64);
    }
}
