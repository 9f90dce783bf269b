//! Candidate layout synthesis
//!
//! Two strategies, picked per segment:
//! - pattern: weighted pick from the library plus filler in the leftover space
//! - procedural: evenly spread obstacles with jitter and lane re-rolls
//!
//! Output is unvalidated; the fairness pass runs afterwards.

use std::collections::HashSet;

use rand::Rng;
use rand_pcg::Pcg32;

use super::difficulty::DifficultyState;
use super::lane::{Lane, MovementType, ObstacleSpawnDescriptor, sort_by_position};
use super::pattern::{ObstaclePattern, PatternLibrary};
use crate::settings::{LayoutSettings, PatternSettings, ProceduralSettings, SpawnerSettings};

/// Where a candidate layout came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    Pattern(String),
    Procedural,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedLayout {
    pub obstacles: Vec<ObstacleSpawnDescriptor>,
    pub source: LayoutSource,
}

/// Per-segment inputs
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest {
    pub level: u32,
    pub breather: bool,
    /// Multiplier on the procedural count (breathers are lighter)
    pub density_scale: f32,
}

/// Produce a candidate layout for one segment
pub fn synthesize_layout(
    request: SynthesisRequest,
    settings: &SpawnerSettings,
    library: &PatternLibrary,
    history: &mut DifficultyState,
    rng: &mut Pcg32,
) -> SynthesizedLayout {
    let chance = settings.patterns.pattern_chance.clamp(0.0, 1.0) as f64;
    if chance > 0.0 && rng.random_bool(chance) {
        let selected = select_pattern(library, request.level, &settings.patterns, history, rng);
        if let Some(pattern) = selected {
            log::debug!("Segment uses pattern {}", pattern.name);
            let obstacles = fill_pattern(pattern, request, settings, rng);
            return SynthesizedLayout {
                obstacles,
                source: LayoutSource::Pattern(pattern.name.clone()),
            };
        }
        log::debug!("No eligible pattern at level {}, falling back to procedural", request.level);
    }

    SynthesizedLayout {
        obstacles: procedural_layout(request, settings, rng),
        source: LayoutSource::Procedural,
    }
}

/// Weighted pick among patterns unlocked at `level`, honoring the variety guard
pub fn select_pattern<'a>(
    library: &'a PatternLibrary,
    level: u32,
    settings: &PatternSettings,
    history: &mut DifficultyState,
    rng: &mut Pcg32,
) -> Option<&'a ObstaclePattern> {
    let eligible: Vec<&ObstaclePattern> =
        library.eligible(level).filter(|p| p.weight > 0.0).collect();
    if eligible.is_empty() {
        return None;
    }

    let mut candidates = eligible.clone();
    if settings.variety_enabled {
        let window = settings
            .variety_window
            .unwrap_or(eligible.len().saturating_sub(1));
        let excluded: HashSet<&str> = history.recent(window).collect();
        candidates.retain(|p| !excluded.contains(p.name.as_str()));
        if candidates.is_empty() {
            log::debug!("Variety guard excluded every pattern, clearing history");
            history.clear_pattern_history();
            candidates = eligible;
        }
    }

    let chosen = weighted_pick(&candidates, |p| p.weight, rng)?;
    history.remember_pattern(&chosen.name);
    Some(chosen)
}

/// Proportional selection: cumulative sum then a uniform draw
pub fn weighted_pick<T: Copy>(
    items: &[T],
    weight: impl Fn(&T) -> f32,
    rng: &mut Pcg32,
) -> Option<T> {
    let total: f32 = items.iter().map(|item| weight(item).max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }

    let draw = rng.random::<f32>() * total;
    let mut cumulative = 0.0;
    for item in items {
        cumulative += weight(item).max(0.0);
        if draw < cumulative {
            return Some(*item);
        }
    }
    // Float rounding can leave draw == total
    items.iter().rev().find(|item| weight(item) > 0.0).copied()
}

/// Copy a pattern and pad the space before and after it with filler obstacles
pub fn fill_pattern(
    pattern: &ObstaclePattern,
    request: SynthesisRequest,
    settings: &SpawnerSettings,
    rng: &mut Pcg32,
) -> Vec<ObstacleSpawnDescriptor> {
    let layout = &settings.layout;
    let mut obstacles: Vec<_> = pattern
        .obstacles
        .iter()
        .map(|o| {
            let mut o = *o;
            o.relative_position = o.relative_position.clamp(layout.min_offset, layout.max_offset);
            if o.vertical_offset == 0.0 {
                o.vertical_offset = layout.vertical_offsets.for_kind(o.kind);
            }
            o
        })
        .collect();

    let Some((first, last)) = pattern.bounds() else {
        return obstacles;
    };
    if request.breather {
        return obstacles;
    }

    let spacing = filler_spacing(&settings.patterns, request.level);
    let front_gap = (first - spacing - layout.min_offset).max(0.0);
    let back_gap = (layout.max_offset - (last + spacing)).max(0.0);
    let total_gap = front_gap + back_gap;
    if total_gap <= 0.0 {
        return obstacles;
    }

    let count = ((total_gap / spacing).floor() as u32).min(settings.patterns.max_fillers);
    let front_count = ((count as f32 * front_gap / total_gap).round() as u32)
        .min(region_capacity(front_gap, spacing, first - spacing >= layout.min_offset));
    let back_count = (count - front_count.min(count))
        .min(region_capacity(back_gap, spacing, last + spacing <= layout.max_offset));

    let front_start = layout.min_offset;
    let back_start = last + spacing;
    let regions = [
        (front_start, front_gap, front_count),
        (back_start, back_gap, back_count),
    ];
    for (start, gap, n) in regions {
        for position in spread(start, gap, n) {
            let kind = random_kind(layout, rng);
            let lane = random_lane(rng);
            obstacles.push(
                ObstacleSpawnDescriptor::new(kind, lane, position)
                    .with_vertical_offset(layout.vertical_offsets.for_kind(kind)),
            );
        }
    }

    log::debug!(
        "Pattern {} padded with {} filler obstacles (spacing {:.2})",
        pattern.name,
        front_count + back_count,
        spacing
    );
    sort_by_position(&mut obstacles);
    obstacles
}

fn filler_spacing(settings: &PatternSettings, level: u32) -> f32 {
    if level >= settings.high_difficulty_level {
        settings.high_difficulty_filler_spacing
    } else {
        settings.filler_spacing
    }
}

/// How many obstacles fit in a region of length `gap` at `spacing`
fn region_capacity(gap: f32, spacing: f32, exists: bool) -> u32 {
    if !exists {
        return 0;
    }
    (gap / spacing).floor() as u32 + 1
}

/// `n` evenly spread positions covering `[start, start + gap]`
fn spread(start: f32, gap: f32, n: u32) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start + gap / 2.0],
        _ => (0..n)
            .map(|i| start + gap * i as f32 / (n - 1) as f32)
            .collect(),
    }
}

/// Obstacle count for a procedural segment
pub fn procedural_count(
    level: u32,
    density_scale: f32,
    settings: &ProceduralSettings,
    forced: Option<u32>,
    rng: &mut Pcg32,
) -> u32 {
    if let Some(forced) = forced {
        return forced.max(1);
    }

    let growth = (level as f32 * settings.per_level_increase).floor() as i64;
    let base = settings.min_count as i64 + growth;
    let variance = settings.count_variance as i64;
    let jittered = base + rng.random_range(-variance..=variance);
    let clamped = jittered.clamp(settings.min_count as i64, settings.max_count as i64) as u32;
    ((clamped as f32 * density_scale).round() as u32).clamp(settings.min_count, settings.max_count)
}

/// Evenly spread obstacles with jitter, re-rolling lanes to avoid stacking
pub fn procedural_layout(
    request: SynthesisRequest,
    settings: &SpawnerSettings,
    rng: &mut Pcg32,
) -> Vec<ObstacleSpawnDescriptor> {
    let layout = &settings.layout;
    let count = procedural_count(
        request.level,
        request.density_scale,
        &settings.procedural,
        settings.debug.forced_obstacle_count,
        rng,
    );

    let span = layout.max_offset - layout.min_offset;
    let spacing = span / count as f32;
    // Sampling range must not invert, even for unvalidated settings
    let jitter = (settings.procedural.jitter_fraction * spacing).abs();
    let min_gap = settings.fairness.min_spacing;

    let mut obstacles: Vec<ObstacleSpawnDescriptor> = Vec::with_capacity(count as usize);
    for i in 0..count {
        let even = layout.min_offset + spacing * (i as f32 + 0.5);
        let position =
            (even + rng.random_range(-jitter..=jitter)).clamp(layout.min_offset, layout.max_offset);

        let conflicts = |lane: Lane, placed: &[ObstacleSpawnDescriptor]| {
            placed
                .iter()
                .any(|o| o.lane == lane && (o.relative_position - position).abs() < min_gap)
        };

        let mut lane = random_lane(rng);
        let mut retries = 0;
        while conflicts(lane, &obstacles) && retries < settings.procedural.lane_retries {
            lane = random_lane(rng);
            retries += 1;
        }
        if conflicts(lane, &obstacles) {
            if let Some(free) = Lane::ALL.into_iter().find(|&l| !conflicts(l, &obstacles)) {
                lane = free;
            }
        }

        let kind = random_kind(layout, rng);
        obstacles.push(
            ObstacleSpawnDescriptor::new(kind, lane, position)
                .with_vertical_offset(layout.vertical_offsets.for_kind(kind)),
        );
    }

    log::debug!(
        "Procedural layout: {} obstacles at level {}{}",
        count,
        request.level,
        if request.breather { " (breather)" } else { "" }
    );
    obstacles
}

fn random_lane(rng: &mut Pcg32) -> Lane {
    Lane::ALL[rng.random_range(0..Lane::ALL.len())]
}

fn random_kind(layout: &LayoutSettings, rng: &mut Pcg32) -> MovementType {
    weighted_pick(&MovementType::ALL, |k| layout.type_weights.for_kind(*k), rng)
        .unwrap_or(MovementType::LowObstacle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DebugSettings;
    use rand::SeedableRng;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    fn request(level: u32) -> SynthesisRequest {
        SynthesisRequest {
            level,
            breather: false,
            density_scale: 1.0,
        }
    }

    #[test]
    fn test_procedural_count_clamped() {
        let settings = ProceduralSettings::default();
        let mut rng = rng(1);
        for level in 0..40 {
            let count = procedural_count(level, 1.0, &settings, None, &mut rng);
            assert!((settings.min_count..=settings.max_count).contains(&count));
        }
        assert_eq!(procedural_count(0, 1.0, &settings, Some(3), &mut rng), 3);
    }

    #[test]
    fn test_procedural_count_grows_with_level() {
        let settings = ProceduralSettings {
            count_variance: 0,
            ..Default::default()
        };
        let mut rng = rng(2);
        assert_eq!(procedural_count(0, 1.0, &settings, None, &mut rng), 2);
        assert_eq!(procedural_count(4, 1.0, &settings, None, &mut rng), 4);
        assert_eq!(procedural_count(100, 1.0, &settings, None, &mut rng), 8);
    }

    #[test]
    fn test_procedural_positions_within_bounds() {
        let settings = SpawnerSettings::default();
        for seed in 0..50 {
            let layout = procedural_layout(request(seed as u32 % 12), &settings, &mut rng(seed));
            assert!(!layout.is_empty());
            for o in &layout {
                assert!(o.relative_position >= 0.02 && o.relative_position <= 0.98);
            }
        }
    }

    #[test]
    fn test_procedural_avoids_same_lane_stacking() {
        let settings = SpawnerSettings {
            debug: DebugSettings {
                forced_obstacle_count: Some(3),
                ..Default::default()
            },
            ..Default::default()
        };
        for seed in 0..200 {
            let layout = procedural_layout(request(0), &settings, &mut rng(seed));
            assert_eq!(layout.len(), 3);
            for (i, a) in layout.iter().enumerate() {
                for b in &layout[i + 1..] {
                    if a.lane == b.lane {
                        assert!((a.relative_position - b.relative_position).abs() >= 0.20);
                    }
                }
            }
        }
    }

    #[test]
    fn test_negative_jitter_does_not_panic() {
        let settings = SpawnerSettings {
            procedural: ProceduralSettings {
                jitter_fraction: -0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        let layout = procedural_layout(request(0), &settings, &mut rng(11));
        assert!(layout.len() >= settings.procedural.min_count as usize);
    }

    #[test]
    fn test_weighted_pick_respects_zero_weight() {
        let mut rng = rng(3);
        let items = [("never", 0.0_f32), ("always", 2.0)];
        for _ in 0..100 {
            let picked = weighted_pick(&items, |i| i.1, &mut rng).expect("positive total");
            assert_eq!(picked.0, "always");
        }
        assert!(weighted_pick(&[("none", 0.0_f32)], |i| i.1, &mut rng).is_none());
    }

    #[test]
    fn test_weighted_pick_is_proportional() {
        let mut rng = rng(4);
        let items = [(0usize, 1.0_f32), (1, 3.0)];
        let heavy = (0..4000)
            .filter(|_| weighted_pick(&items, |i| i.1, &mut rng).map(|i| i.0) == Some(1))
            .count();
        assert!((2700..3300).contains(&heavy), "got {heavy}");
    }

    #[test]
    fn test_select_pattern_respects_min_difficulty() {
        let library = PatternLibrary::builtin();
        let mut history = DifficultyState::default();
        let mut rng = rng(5);
        for _ in 0..50 {
            let pattern =
                select_pattern(&library, 0, &PatternSettings::default(), &mut history, &mut rng)
                    .expect("level 0 patterns exist");
            assert_eq!(pattern.min_difficulty, 0);
        }
    }

    #[test]
    fn test_select_pattern_none_when_nothing_eligible() {
        let library = PatternLibrary::default();
        let mut history = DifficultyState::default();
        let settings = PatternSettings::default();
        assert!(select_pattern(&library, 3, &settings, &mut history, &mut rng(6)).is_none());
    }

    #[test]
    fn test_empty_library_falls_back_to_procedural() {
        let settings = SpawnerSettings {
            patterns: PatternSettings {
                pattern_chance: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut history = DifficultyState::default();
        let layout = synthesize_layout(
            request(0),
            &settings,
            &PatternLibrary::default(),
            &mut history,
            &mut rng(7),
        );
        assert_eq!(layout.source, LayoutSource::Procedural);
        assert!(layout.obstacles.len() >= settings.procedural.min_count as usize);
    }

    #[test]
    fn test_fill_pattern_pads_gaps() {
        let settings = SpawnerSettings::default();
        let library = PatternLibrary::builtin();
        let pattern = library.get("center_gate").expect("builtin pattern");
        let filled = fill_pattern(pattern, request(0), &settings, &mut rng(8));
        // 0.45 bounds: front gap 0.13, back gap 0.23 at spacing 0.30 -> one filler
        assert_eq!(filled.len(), pattern.obstacles.len() + 1);
        for o in &filled {
            assert!(o.relative_position >= 0.02 && o.relative_position <= 0.98);
        }
    }

    #[test]
    fn test_fill_pattern_denser_at_high_difficulty() {
        let settings = SpawnerSettings::default();
        let library = PatternLibrary::builtin();
        let pattern = library.get("jump_row").expect("builtin pattern");
        let normal = fill_pattern(pattern, request(0), &settings, &mut rng(9));
        let dense = fill_pattern(pattern, request(10), &settings, &mut rng(9));
        assert!(dense.len() > normal.len());
    }

    #[test]
    fn test_fill_pattern_skips_fillers_on_breather() {
        let settings = SpawnerSettings::default();
        let library = PatternLibrary::builtin();
        let pattern = library.get("jump_row").expect("builtin pattern");
        let breather = SynthesisRequest {
            breather: true,
            ..request(0)
        };
        assert_eq!(fill_pattern(pattern, breather, &settings, &mut rng(10)).len(), 3);
    }
}
