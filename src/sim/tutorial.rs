//! One-shot tutorial sequence
//!
//! Three fixed groups teach the three avoidance moves: a lone center full
//! block (change lanes), a row of low obstacles (jump) and a row of tall ones
//! (slide). They sit past a pickup-only intro stretch whose length is
//! `intro_duration × base_scroll_speed`.
//!
//! Idle -> Armed when the groups are placed, Armed -> InProgress on the first
//! prompt, InProgress -> Complete once every group is behind the player.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::lane::{Lane, MovementType, ObstacleSpawnDescriptor};
use super::pool::{Activation, ObstacleHandle, ObstaclePool};
use super::state::{ObstacleEvent, TutorialPrompt, WorldView};
use crate::settings::{TutorialSettings, VerticalOffsets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TutorialPhase {
    Idle,
    Armed,
    InProgress,
    Complete,
}

/// Obstacles placed for one prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialGroup {
    pub prompt: TutorialPrompt,
    pub handles: Vec<ObstacleHandle>,
    pub world_x: f32,
    pub prompted: bool,
    pub passed: bool,
}

impl TutorialGroup {
    fn resolved(&self) -> bool {
        self.prompted && self.passed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialState {
    pub enabled: bool,
    pub phase: TutorialPhase,
    /// Prompts already announced, in prompt order
    pub fired: BTreeSet<TutorialPrompt>,
    pub groups: Vec<TutorialGroup>,
}

impl TutorialState {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            phase: TutorialPhase::Idle,
            fired: BTreeSet::new(),
            groups: Vec::new(),
        }
    }
}

/// Descriptors for one tutorial group (relative position unused)
pub fn group_descriptors(
    prompt: TutorialPrompt,
    offsets: &VerticalOffsets,
) -> Vec<ObstacleSpawnDescriptor> {
    let row = |kind: MovementType| -> Vec<ObstacleSpawnDescriptor> {
        Lane::ALL
            .iter()
            .map(|&lane| {
                ObstacleSpawnDescriptor::new(kind, lane, 0.0)
                    .with_vertical_offset(offsets.for_kind(kind))
            })
            .collect()
    };
    match prompt {
        TutorialPrompt::LaneSwitch => vec![
            ObstacleSpawnDescriptor::new(MovementType::FullBlock, Lane::Center, 0.0)
                .with_vertical_offset(offsets.full),
        ],
        TutorialPrompt::Jump => row(MovementType::LowObstacle),
        TutorialPrompt::Slide => row(MovementType::TallObstacle),
    }
}

#[derive(Debug, Clone)]
pub struct TutorialSequencer {
    settings: TutorialSettings,
    state: TutorialState,
}

impl TutorialSequencer {
    pub fn new(settings: TutorialSettings) -> Self {
        let state = TutorialState::new(settings.enabled);
        Self { settings, state }
    }

    pub fn state(&self) -> &TutorialState {
        &self.state
    }

    pub fn phase(&self) -> TutorialPhase {
        self.state.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    /// Regular segment generation waits until the tutorial is done
    pub fn suppresses_regular_spawning(&self) -> bool {
        self.state.enabled && self.state.phase != TutorialPhase::Complete
    }

    pub fn needs_placement(&self) -> bool {
        self.state.enabled && self.state.phase == TutorialPhase::Idle
    }

    /// World X of each group when placed from a segment starting at `start_x`
    pub fn group_positions(&self, start_x: f32) -> [f32; 3] {
        let intro = self.settings.intro_distance();
        self.settings.group_offsets.map(|offset| start_x + offset + intro)
    }

    /// Place the three groups. Returns how many obstacles were activated.
    pub fn place(
        &mut self,
        start_x: f32,
        pool: &mut ObstaclePool,
        vertical_offsets: &VerticalOffsets,
        events: &mut Vec<ObstacleEvent>,
    ) -> usize {
        if !self.needs_placement() {
            return 0;
        }

        let mut spawned = 0;
        let positions = self.group_positions(start_x);
        for (prompt, world_x) in TutorialPrompt::ALL.into_iter().zip(positions) {
            let mut handles = Vec::new();
            for descriptor in group_descriptors(prompt, vertical_offsets) {
                let handle = match pool.acquire(descriptor.kind) {
                    Ok(handle) => handle,
                    Err(err) => {
                        log::error!("Tutorial {:?} obstacle skipped: {}", prompt, err);
                        continue;
                    }
                };
                let position =
                    Vec3::new(world_x, descriptor.lane.world_y(), descriptor.vertical_offset);
                let activation = Activation {
                    position,
                    lane: descriptor.lane,
                    tutorial: true,
                };
                if pool.activate(handle, activation) {
                    handles.push(handle);
                    spawned += 1;
                    events.push(ObstacleEvent::Spawned {
                        handle,
                        descriptor,
                        position,
                        tutorial: true,
                    });
                }
            }
            self.state.groups.push(TutorialGroup {
                prompt,
                handles,
                world_x,
                prompted: false,
                passed: false,
            });
        }

        self.state.phase = TutorialPhase::Armed;
        log::info!(
            "Tutorial placed: {} obstacles at x = {:?}",
            spawned,
            positions
        );
        spawned
    }

    /// Move the tracked group positions with the track.
    ///
    /// Groups are followed by position, not through their entities, so
    /// clearing or recycling tutorial obstacles never skips a prompt.
    pub fn scroll(&mut self, dx: f32) {
        if !matches!(self.state.phase, TutorialPhase::Armed | TutorialPhase::InProgress) {
            return;
        }
        for group in &mut self.state.groups {
            group.world_x += dx;
        }
    }

    /// Per-tick approach check: fire prompts and detect completion
    pub fn update(&mut self, world: &WorldView, events: &mut Vec<ObstacleEvent>) {
        if !matches!(self.state.phase, TutorialPhase::Armed | TutorialPhase::InProgress) {
            return;
        }

        for group in &mut self.state.groups {
            if !group.prompted
                && world
                    .time_to_reach(group.world_x)
                    .is_some_and(|t| t <= self.settings.prompt_lead_time)
            {
                group.prompted = true;
                if self.state.fired.insert(group.prompt) {
                    log::info!("Tutorial prompt {:?}", group.prompt);
                    events.push(ObstacleEvent::TutorialPrompt(group.prompt));
                }
                self.state.phase = TutorialPhase::InProgress;
            }

            if group.world_x < world.player_x - self.settings.safety_margin {
                group.passed = true;
            }
        }

        if !self.state.groups.is_empty() && self.state.groups.iter().all(TutorialGroup::resolved) {
            self.state.phase = TutorialPhase::Complete;
            log::info!("Tutorial complete");
            events.push(ObstacleEvent::TutorialComplete);
        }
    }

    /// Back to Idle; still-active tutorial obstacles return to the pool
    pub fn reset(&mut self, pool: &mut ObstaclePool, events: &mut Vec<ObstacleEvent>) {
        for group in &self.state.groups {
            for &handle in &group.handles {
                if pool.release(handle) {
                    events.push(ObstacleEvent::Deactivated { handle });
                }
            }
        }
        self.state = TutorialState::new(self.state.enabled);
        log::info!("Tutorial reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessHost;
    use crate::settings::PoolSettings;

    fn setup(intro_secs: f32) -> (TutorialSequencer, ObstaclePool) {
        let settings = TutorialSettings {
            intro_duration_secs: intro_secs,
            ..Default::default()
        };
        (
            TutorialSequencer::new(settings),
            ObstaclePool::new(PoolSettings::default(), Box::new(HeadlessHost::default())),
        )
    }

    fn prompts(events: &[ObstacleEvent]) -> Vec<TutorialPrompt> {
        events
            .iter()
            .filter_map(|e| match e {
                ObstacleEvent::TutorialPrompt(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_group_shapes() {
        let offsets = VerticalOffsets::default();
        let lane_switch = group_descriptors(TutorialPrompt::LaneSwitch, &offsets);
        assert_eq!(lane_switch.len(), 1);
        assert_eq!(lane_switch[0].lane, Lane::Center);
        assert_eq!(lane_switch[0].kind, MovementType::FullBlock);
        assert!(group_descriptors(TutorialPrompt::Jump, &offsets)
            .iter()
            .all(|d| d.kind == MovementType::LowObstacle));
        assert_eq!(group_descriptors(TutorialPrompt::Slide, &offsets).len(), 3);
    }

    #[test]
    fn test_intro_pushes_groups_out() {
        let (tutorial, _) = setup(30.0);
        assert_eq!(tutorial.group_positions(0.0), [32_000.0, 34_000.0, 36_000.0]);
    }

    #[test]
    fn test_place_once() {
        let (mut tutorial, mut pool) = setup(0.0);
        let mut events = Vec::new();
        assert_eq!(tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events), 7);
        assert_eq!(tutorial.phase(), TutorialPhase::Armed);
        assert_eq!(tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events), 0);
        assert_eq!(pool.active_count(), 7);
    }

    #[test]
    fn test_prompts_fire_once_then_complete() {
        let (mut tutorial, mut pool) = setup(0.0);
        let mut events = Vec::new();
        tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events);

        let world = WorldView::new(1000.0, 0.0);
        // Scroll 100 units per tick, checking several times per tick
        for _ in 0..80 {
            pool.translate_active(-100.0);
            tutorial.scroll(-100.0);
            for _ in 0..3 {
                tutorial.update(&world, &mut events);
            }
        }

        assert_eq!(
            prompts(&events),
            vec![TutorialPrompt::LaneSwitch, TutorialPrompt::Jump, TutorialPrompt::Slide]
        );
        let completions = events
            .iter()
            .filter(|e| matches!(e, ObstacleEvent::TutorialComplete))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(tutorial.phase(), TutorialPhase::Complete);
        assert!(!tutorial.suppresses_regular_spawning());
    }

    #[test]
    fn test_prompt_waits_for_lead_time() {
        let (mut tutorial, mut pool) = setup(0.0);
        let mut events = Vec::new();
        tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events);
        let world = WorldView::new(1000.0, 0.0);

        // Lane switch group at 2000 is 2s away; lead time is 1.5s
        tutorial.update(&world, &mut events);
        assert!(prompts(&events).is_empty());
        assert_eq!(tutorial.phase(), TutorialPhase::Armed);

        tutorial.scroll(-600.0);
        tutorial.update(&world, &mut events);
        assert_eq!(prompts(&events), vec![TutorialPrompt::LaneSwitch]);
        assert_eq!(tutorial.phase(), TutorialPhase::InProgress);
    }

    #[test]
    fn test_cleared_group_still_prompts() {
        let (mut tutorial, mut pool) = setup(0.0);
        let mut events = Vec::new();
        tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events);

        // Drop the jump row before the player gets near it
        for handle in tutorial.state().groups[1].handles.clone() {
            assert!(pool.release(handle));
        }

        let world = WorldView::new(1000.0, 0.0);
        for _ in 0..800 {
            tutorial.scroll(-10.0);
            tutorial.update(&world, &mut events);
        }
        assert_eq!(
            prompts(&events),
            vec![TutorialPrompt::LaneSwitch, TutorialPrompt::Jump, TutorialPrompt::Slide]
        );
        assert_eq!(tutorial.phase(), TutorialPhase::Complete);
    }

    #[test]
    fn test_scroll_ignored_before_placement() {
        let (mut tutorial, _) = setup(0.0);
        tutorial.scroll(-500.0);
        assert!(tutorial.state().groups.is_empty());
        assert_eq!(tutorial.phase(), TutorialPhase::Idle);
    }

    #[test]
    fn test_reset_releases_tutorial_entities() {
        let (mut tutorial, mut pool) = setup(0.0);
        let mut events = Vec::new();
        tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events);
        events.clear();

        tutorial.reset(&mut pool, &mut events);
        assert_eq!(pool.active_count(), 0);
        assert_eq!(events.len(), 7);
        assert_eq!(tutorial.phase(), TutorialPhase::Idle);
        assert!(tutorial.needs_placement());
    }

    #[test]
    fn test_disabled_tutorial_never_places() {
        let (mut tutorial, mut pool) = setup(0.0);
        tutorial.set_enabled(false);
        let mut events = Vec::new();
        assert_eq!(tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events), 0);
        assert!(!tutorial.suppresses_regular_spawning());
    }
}
