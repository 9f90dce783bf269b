//! Property tests for the layout invariants

use glam::Vec3;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use runway_obstacles::platform::HeadlessHost;
use runway_obstacles::settings::{
    DifficultySettings, FairnessSettings, PoolSettings, TutorialSettings, VerticalOffsets,
};
use runway_obstacles::sim::fairness::{has_blocking_cluster, spacing_violations};
use runway_obstacles::sim::pool::Activation;
use runway_obstacles::sim::{
    DifficultyController, EntityState, Lane, LayoutBounds, MovementType, ObstacleHandle,
    ObstaclePool, ObstacleSpawnDescriptor, TutorialPhase, TutorialPrompt, TutorialSequencer,
    WorldView, validate_layout,
};
use runway_obstacles::ObstacleEvent;

const BOUNDS: LayoutBounds = LayoutBounds {
    min_offset: 0.02,
    max_offset: 0.98,
};

fn arb_descriptor() -> impl Strategy<Value = ObstacleSpawnDescriptor> {
    (0usize..3, 0usize..3, 0.02f32..=0.98).prop_map(|(kind, lane, position)| {
        let lane = Lane::from_index(lane).unwrap_or(Lane::Center);
        ObstacleSpawnDescriptor::new(MovementType::ALL[kind], lane, position)
    })
}

fn arb_layout() -> impl Strategy<Value = Vec<ObstacleSpawnDescriptor>> {
    prop::collection::vec(arb_descriptor(), 0..14)
}

fn validated(mut layout: Vec<ObstacleSpawnDescriptor>, seed: u64) -> Vec<ObstacleSpawnDescriptor> {
    validate_layout(
        &mut layout,
        BOUNDS,
        &FairnessSettings::default(),
        &VerticalOffsets::default(),
        &mut Pcg32::seed_from_u64(seed),
    );
    layout
}

proptest! {
    #[test]
    fn prop_validated_layouts_leave_a_lane_open(layout in arb_layout(), seed in any::<u64>()) {
        let fairness = FairnessSettings::default();
        let out = validated(layout, seed);
        prop_assert!(!has_blocking_cluster(&out, fairness.proximity_threshold));
    }

    #[test]
    fn prop_forced_blockage_is_broken_up(
        layout in arb_layout(),
        at in 0.02f32..=0.98,
        seed in any::<u64>(),
    ) {
        let fairness = FairnessSettings::default();
        let mut layout = layout;
        layout.extend(
            Lane::ALL
                .iter()
                .map(|&lane| ObstacleSpawnDescriptor::new(MovementType::FullBlock, lane, at)),
        );
        let out = validated(layout, seed);
        prop_assert!(!has_blocking_cluster(&out, fairness.proximity_threshold));
    }

    #[test]
    fn prop_validated_layouts_respect_spacing(layout in arb_layout(), seed in any::<u64>()) {
        let fairness = FairnessSettings::default();
        let out = validated(layout, seed);
        prop_assert!(spacing_violations(&out, &fairness).is_empty());
        for o in &out {
            prop_assert!(o.relative_position >= BOUNDS.min_offset - 1e-4);
            prop_assert!(o.relative_position <= BOUNDS.max_offset + 1e-4);
        }
        prop_assert!(out.windows(2).all(|w| w[0].relative_position <= w[1].relative_position));
    }

    #[test]
    fn prop_validation_never_adds(layout in arb_layout(), seed in any::<u64>()) {
        let before = layout.len();
        prop_assert!(validated(layout, seed).len() <= before);
    }

    #[test]
    fn prop_pool_totals_never_shrink(
        ops in prop::collection::vec((any::<bool>(), 0usize..3), 1..80),
    ) {
        let settings = PoolSettings { initial_size: 2, growth: 3, ..Default::default() };
        let mut pool = ObstaclePool::new(settings, Box::new(HeadlessHost::default()));
        let mut live: Vec<ObstacleHandle> = Vec::new();
        let mut totals = MovementType::ALL.map(|k| pool.total(k));

        for (spawn, kind) in ops {
            if spawn || live.is_empty() {
                let kind = MovementType::ALL[kind];
                let handle = pool.acquire(kind).expect("headless host never fails");
                prop_assert_eq!(pool.get(handle).map(|e| e.state), Some(EntityState::Pooled));
                let activation = Activation {
                    position: Vec3::ZERO,
                    lane: Lane::Center,
                    tutorial: false,
                };
                prop_assert!(pool.activate(handle, activation));
                prop_assert_eq!(pool.get(handle).map(|e| e.state), Some(EntityState::Active));
                live.push(handle);
            } else {
                let handle = live.swap_remove(kind % live.len());
                prop_assert!(pool.release(handle));
            }

            let now = MovementType::ALL.map(|k| pool.total(k));
            for k in 0..3 {
                prop_assert!(now[k] >= totals[k]);
            }
            totals = now;
            prop_assert_eq!(pool.active_count(), live.len());
            for kind in MovementType::ALL {
                prop_assert_eq!(pool.active_of(kind) + pool.free_count(kind), pool.total(kind));
            }
        }
    }

    #[test]
    fn prop_difficulty_steps_exactly(per_level in 1u32..12, segments in 0u32..150) {
        let mut difficulty = DifficultyController::new(DifficultySettings {
            segments_per_level: per_level,
            ..Default::default()
        });
        let mut previous = 0;
        for n in 1..=segments {
            let plan = difficulty.advance();
            prop_assert_eq!(plan.level, n / per_level);
            prop_assert!(plan.level >= previous);
            prop_assert_eq!(plan.level_changed, n % per_level == 0);
            previous = plan.level;
        }
    }

    #[test]
    fn prop_tutorial_prompts_fire_exactly_once(
        speed in 200.0f32..3000.0,
        dt in 0.005f32..0.1,
        checks_per_tick in 1usize..4,
    ) {
        let settings = TutorialSettings { intro_duration_secs: 0.0, ..Default::default() };
        let mut tutorial = TutorialSequencer::new(settings);
        let host = Box::new(HeadlessHost::default());
        let mut pool = ObstaclePool::new(PoolSettings::default(), host);
        let mut events = Vec::new();
        tutorial.place(0.0, &mut pool, &VerticalOffsets::default(), &mut events);

        let world = WorldView::new(speed, 0.0);
        let ticks = ((7000.0 / speed) / dt).ceil() as usize + 10;
        for _ in 0..ticks {
            pool.translate_active(-speed * dt);
            tutorial.scroll(-speed * dt);
            for _ in 0..checks_per_tick {
                tutorial.update(&world, &mut events);
            }
        }

        for prompt in TutorialPrompt::ALL {
            let fired = events
                .iter()
                .filter(|e| matches!(e, ObstacleEvent::TutorialPrompt(p) if *p == prompt))
                .count();
            prop_assert_eq!(fired, 1);
        }
        let completions = events
            .iter()
            .filter(|e| matches!(e, ObstacleEvent::TutorialComplete))
            .count();
        prop_assert_eq!(completions, 1);
        prop_assert_eq!(tutorial.phase(), TutorialPhase::Complete);
    }
}
