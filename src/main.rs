//! Runway Obstacles demo entry point
//!
//! Runs the spawner headless: a fixed-timestep scroll loop that requests a new
//! segment whenever the generated track runs short, then prints a summary.
//!
//! Usage: `runway-obstacles [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
use runway_obstacles::platform::HeadlessHost;
#[cfg(not(target_arch = "wasm32"))]
use runway_obstacles::sim::TutorialPrompt;
#[cfg(not(target_arch = "wasm32"))]
use runway_obstacles::{ObstacleEvent, ObstacleSpawner, SpawnerSettings, WorldView};

#[cfg(not(target_arch = "wasm32"))]
const SEGMENT_LENGTH: f32 = 6250.0;
#[cfg(not(target_arch = "wasm32"))]
const LOOKAHEAD: f32 = 3.0 * SEGMENT_LENGTH;
#[cfg(not(target_arch = "wasm32"))]
const DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const RUN_SECONDS: f32 = 120.0;

#[cfg(not(target_arch = "wasm32"))]
fn load_settings(path: Option<String>) -> SpawnerSettings {
    let Some(path) = path else {
        return SpawnerSettings::default();
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => match SpawnerSettings::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Invalid settings in {}: {}; using defaults", path, e);
                SpawnerSettings::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read {}: {}; using defaults", path, e);
            SpawnerSettings::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Runway Obstacles (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = load_settings(args.next());
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5EED);

    let world = WorldView::new(settings.tutorial.base_scroll_speed, 0.0);
    let host = Box::new(HeadlessHost::default());
    let mut spawner = match ObstacleSpawner::new(settings, host, seed) {
        Ok(spawner) => spawner,
        Err(e) => {
            log::error!("Cannot start spawner: {}", e);
            return;
        }
    };

    // World X where the generated track currently ends (scrolls with the obstacles)
    let mut track_end = 0.0_f32;
    let mut segments = 0u32;
    let mut spawned = 0usize;
    let mut recycled = 0usize;
    let mut prompts: Vec<TutorialPrompt> = Vec::new();
    let mut elapsed = 0.0;

    while elapsed < RUN_SECONDS {
        while track_end < world.player_x + LOOKAHEAD {
            let first = segments == 0;
            spawner.spawn_obstacles_for_segment(track_end, track_end + SEGMENT_LENGTH, first);
            track_end += SEGMENT_LENGTH;
            segments += 1;
        }

        spawner.advance(DT, &world);
        track_end -= world.scroll_speed * DT;
        elapsed += DT;

        for event in spawner.drain_events() {
            match event {
                ObstacleEvent::Spawned { .. } => spawned += 1,
                ObstacleEvent::Deactivated { .. } => recycled += 1,
                ObstacleEvent::DifficultyChanged { level } => {
                    log::info!("t = {:.1}s: difficulty {}", elapsed, level);
                }
                ObstacleEvent::TutorialPrompt(prompt) => {
                    log::info!("t = {:.1}s: tutorial prompt {:?}", elapsed, prompt);
                    prompts.push(prompt);
                }
                ObstacleEvent::TutorialComplete => {
                    log::info!("t = {:.1}s: tutorial complete", elapsed);
                }
            }
        }
    }

    let stats = spawner.stats();
    println!(
        "\nSimulated {:.0}s at {} units/s (seed {})",
        RUN_SECONDS, world.scroll_speed, seed
    );
    println!("  segments requested:  {}", segments);
    println!("  regular segments:    {}", stats.segments_spawned);
    println!("  difficulty level:    {}", stats.level);
    println!("  obstacles spawned:   {}", spawned);
    println!("  obstacles recycled:  {}", recycled);
    println!("  active now:          {}", stats.active_total());
    println!("  pool sizes (L/T/F):  {:?}", stats.pooled_totals);
    println!("  tutorial:            {:?} {:?}", stats.tutorial_phase, prompts);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is driven by the host engine
}
