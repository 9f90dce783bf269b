//! Hand-authored obstacle patterns
//!
//! The built-in catalog is a static table; hosts can swap in their own via
//! JSON. Every authored pattern leaves at least one lane open at every
//! position and respects the default same-lane spacing.

use serde::{Deserialize, Serialize};

use super::lane::{Lane, MovementType, ObstacleSpawnDescriptor};
use crate::error::ConfigError;

use super::lane::Lane::{Center as C, Left as L, Right as R};
use super::lane::MovementType::{FullBlock as FULL, LowObstacle as LOW, TallObstacle as TALL};

/// A named obstacle layout with selection metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePattern {
    pub name: String,
    pub obstacles: Vec<ObstacleSpawnDescriptor>,
    #[serde(default)]
    pub min_difficulty: u32,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl ObstaclePattern {
    /// First and last relative positions occupied by the pattern
    pub fn bounds(&self) -> Option<(f32, f32)> {
        self.obstacles.iter().fold(None, |acc, o| {
            let p = o.relative_position;
            Some(match acc {
                None => (p, p),
                Some((lo, hi)) => (lo.min(p), hi.max(p)),
            })
        })
    }
}

/// Row of the built-in table
struct PatternDef {
    name: &'static str,
    min_difficulty: u32,
    weight: f32,
    obstacles: &'static [(MovementType, Lane, f32)],
}

const BUILTIN_PATTERNS: &[PatternDef] = &[
    PatternDef {
        name: "jump_row",
        min_difficulty: 0,
        weight: 1.0,
        obstacles: &[(LOW, L, 0.5), (LOW, C, 0.5), (LOW, R, 0.5)],
    },
    PatternDef {
        name: "duck_row",
        min_difficulty: 0,
        weight: 1.0,
        obstacles: &[(TALL, L, 0.5), (TALL, C, 0.5), (TALL, R, 0.5)],
    },
    PatternDef {
        name: "center_gate",
        min_difficulty: 0,
        weight: 1.2,
        obstacles: &[(FULL, L, 0.45), (FULL, R, 0.45)],
    },
    PatternDef {
        name: "slalom",
        min_difficulty: 1,
        weight: 1.0,
        obstacles: &[(FULL, L, 0.25), (FULL, C, 0.5), (FULL, R, 0.75)],
    },
    PatternDef {
        name: "reverse_slalom",
        min_difficulty: 1,
        weight: 1.0,
        obstacles: &[(FULL, R, 0.25), (FULL, C, 0.5), (FULL, L, 0.75)],
    },
    PatternDef {
        name: "hurdles",
        min_difficulty: 1,
        weight: 0.8,
        obstacles: &[(LOW, C, 0.3), (LOW, C, 0.55), (LOW, C, 0.8)],
    },
    PatternDef {
        name: "side_walls_low_center",
        min_difficulty: 2,
        weight: 1.0,
        obstacles: &[(FULL, L, 0.5), (LOW, C, 0.5), (FULL, R, 0.5)],
    },
    PatternDef {
        name: "side_walls_tall_center",
        min_difficulty: 2,
        weight: 1.0,
        obstacles: &[(FULL, L, 0.5), (TALL, C, 0.5), (FULL, R, 0.5)],
    },
    PatternDef {
        name: "jump_then_duck",
        min_difficulty: 3,
        weight: 0.9,
        obstacles: &[
            (LOW, L, 0.3),
            (LOW, C, 0.3),
            (LOW, R, 0.3),
            (TALL, L, 0.65),
            (TALL, C, 0.65),
            (TALL, R, 0.65),
        ],
    },
    PatternDef {
        name: "staircase",
        min_difficulty: 3,
        weight: 0.8,
        obstacles: &[
            (FULL, L, 0.2),
            (FULL, C, 0.2),
            (LOW, R, 0.2),
            (FULL, C, 0.55),
            (FULL, R, 0.55),
            (TALL, L, 0.55),
        ],
    },
    PatternDef {
        name: "zigzag_mixed",
        min_difficulty: 4,
        weight: 0.7,
        obstacles: &[
            (FULL, L, 0.15),
            (LOW, C, 0.15),
            (TALL, R, 0.4),
            (FULL, C, 0.4),
            (LOW, L, 0.65),
            (FULL, R, 0.65),
            (TALL, C, 0.9),
        ],
    },
    PatternDef {
        name: "gauntlet",
        min_difficulty: 6,
        weight: 0.5,
        obstacles: &[
            (FULL, L, 0.1),
            (FULL, R, 0.1),
            (TALL, C, 0.35),
            (FULL, L, 0.35),
            (LOW, R, 0.35),
            (FULL, C, 0.6),
            (FULL, R, 0.6),
            (LOW, L, 0.6),
            (TALL, L, 0.9),
            (FULL, C, 0.9),
        ],
    },
];

/// Catalog of patterns available to the synthesizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternLibrary {
    pub patterns: Vec<ObstaclePattern>,
}

impl PatternLibrary {
    pub fn new(patterns: Vec<ObstaclePattern>) -> Self {
        Self { patterns }
    }

    /// The authored catalog shipped with the crate
    pub fn builtin() -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .map(|def| ObstaclePattern {
                name: def.name.to_string(),
                obstacles: def
                    .obstacles
                    .iter()
                    .map(|&(kind, lane, pos)| ObstacleSpawnDescriptor::new(kind, lane, pos))
                    .collect(),
                min_difficulty: def.min_difficulty,
                weight: def.weight,
            })
            .collect();
        Self { patterns }
    }

    /// Load a catalog from a JSON asset (`{ "patterns": [...] }`)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let library: Self = serde_json::from_str(json)?;
        for pattern in &library.patterns {
            if pattern.weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "pattern {} has negative weight",
                    pattern.name
                )));
            }
            if pattern
                .obstacles
                .iter()
                .any(|o| !(0.0..=1.0).contains(&o.relative_position))
            {
                return Err(ConfigError::Invalid(format!(
                    "pattern {} has a position outside 0..1",
                    pattern.name
                )));
            }
        }
        Ok(library)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ObstaclePattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Patterns unlocked at `level`
    pub fn eligible(&self, level: u32) -> impl Iterator<Item = &ObstaclePattern> {
        self.patterns.iter().filter(move |p| p.min_difficulty <= level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FairnessSettings;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_unique() {
        let library = PatternLibrary::builtin();
        let names: HashSet<_> = library.patterns.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), library.len());
    }

    #[test]
    fn test_builtin_patterns_never_block_all_lanes() {
        for pattern in &PatternLibrary::builtin().patterns {
            for o in &pattern.obstacles {
                let blocked: HashSet<_> = pattern
                    .obstacles
                    .iter()
                    .filter(|b| {
                        b.kind.is_blocking()
                            && (b.relative_position - o.relative_position).abs() <= 0.05
                    })
                    .map(|b| b.lane)
                    .collect();
                assert!(blocked.len() < 3, "{} blocks every lane", pattern.name);
            }
        }
    }

    #[test]
    fn test_builtin_patterns_respect_spacing() {
        let fairness = FairnessSettings::default();
        for pattern in &PatternLibrary::builtin().patterns {
            for lane in Lane::ALL {
                let mut in_lane: Vec<_> =
                    pattern.obstacles.iter().filter(|o| o.lane == lane).collect();
                in_lane.sort_by(|a, b| a.relative_position.total_cmp(&b.relative_position));
                for pair in in_lane.windows(2) {
                    let gap = pair[1].relative_position - pair[0].relative_position;
                    assert!(
                        gap + 1e-4 >= fairness.required_spacing(pair[0].kind, pair[1].kind),
                        "{} violates spacing in {:?}",
                        pattern.name,
                        lane
                    );
                }
            }
        }
    }

    #[test]
    fn test_eligible_filters_by_difficulty() {
        let library = PatternLibrary::builtin();
        assert!(library.eligible(0).all(|p| p.min_difficulty == 0));
        assert_eq!(library.eligible(u32::MAX).count(), library.len());
    }

    #[test]
    fn test_from_json_defaults_weight() {
        let library = PatternLibrary::from_json(
            r#"{ "patterns": [ { "name": "solo", "obstacles": [
                { "kind": "FullBlock", "lane": "Center", "relative_position": 0.5 } ] } ] }"#,
        )
        .expect("valid library");
        let solo = library.get("solo").expect("pattern present");
        assert_eq!(solo.weight, 1.0);
        assert_eq!(solo.bounds(), Some((0.5, 0.5)));
    }

    #[test]
    fn test_from_json_rejects_out_of_range_position() {
        let result = PatternLibrary::from_json(
            r#"{ "patterns": [ { "name": "bad", "obstacles": [
                { "kind": "LowObstacle", "lane": "Left", "relative_position": 1.5 } ] } ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
