//! Spawner tuning
//!
//! Every empirically tuned number lives here so hosts can ship it as a JSON
//! asset. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::MovementType;

/// Pacing presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PacingPreset {
    Relaxed,
    #[default]
    Standard,
    Relentless,
}

impl PacingPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacingPreset::Relaxed => "Relaxed",
            PacingPreset::Standard => "Standard",
            PacingPreset::Relentless => "Relentless",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(PacingPreset::Relaxed),
            "standard" | "normal" => Some(PacingPreset::Standard),
            "relentless" | "hard" => Some(PacingPreset::Relentless),
            _ => None,
        }
    }

    /// Segments needed to gain one difficulty level
    pub fn segments_per_level(&self) -> u32 {
        match self {
            PacingPreset::Relaxed => 8,
            PacingPreset::Standard => 5,
            PacingPreset::Relentless => 3,
        }
    }

    /// Segments between breathers
    pub fn breather_interval(&self) -> u32 {
        match self {
            PacingPreset::Relaxed => 5,
            PacingPreset::Standard => 8,
            PacingPreset::Relentless => 12,
        }
    }
}

/// Per-type vertical offsets applied to generated descriptors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalOffsets {
    pub low: f32,
    pub tall: f32,
    pub full: f32,
}

impl Default for VerticalOffsets {
    fn default() -> Self {
        Self {
            low: 0.0,
            tall: 120.0,
            full: 0.0,
        }
    }
}

impl VerticalOffsets {
    pub fn for_kind(&self, kind: MovementType) -> f32 {
        match kind {
            MovementType::LowObstacle => self.low,
            MovementType::TallObstacle => self.tall,
            MovementType::FullBlock => self.full,
        }
    }
}

/// Relative odds of each movement type for generated (non-pattern) obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeWeights {
    pub low: f32,
    pub tall: f32,
    pub full: f32,
}

impl Default for TypeWeights {
    fn default() -> Self {
        Self {
            low: 0.4,
            tall: 0.3,
            full: 0.3,
        }
    }
}

impl TypeWeights {
    pub fn for_kind(&self, kind: MovementType) -> f32 {
        match kind {
            MovementType::LowObstacle => self.low,
            MovementType::TallObstacle => self.tall,
            MovementType::FullBlock => self.full,
        }
    }
}

/// Shared geometry of a segment layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Earliest relative position an obstacle may occupy
    pub min_offset: f32,
    /// Latest relative position an obstacle may occupy
    pub max_offset: f32,
    pub vertical_offsets: VerticalOffsets,
    pub type_weights: TypeWeights,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_offset: 0.02,
            max_offset: 0.98,
            vertical_offsets: VerticalOffsets::default(),
            type_weights: TypeWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProceduralSettings {
    pub min_count: u32,
    pub max_count: u32,
    /// Extra obstacles per difficulty level (fractional, floored)
    pub per_level_increase: f32,
    /// Random +/- applied to the count before clamping
    pub count_variance: u32,
    /// Position jitter as a fraction of the even spacing
    pub jitter_fraction: f32,
    /// Lane re-rolls allowed per obstacle to avoid same-lane stacking
    pub lane_retries: u32,
}

impl Default for ProceduralSettings {
    fn default() -> Self {
        Self {
            min_count: 2,
            max_count: 8,
            per_level_increase: 0.5,
            count_variance: 1,
            jitter_fraction: 0.2,
            lane_retries: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    /// Probability of using a pattern instead of procedural placement
    pub pattern_chance: f32,
    pub variety_enabled: bool,
    /// Recent selections to exclude; `None` means eligible count - 1
    pub variety_window: Option<usize>,
    /// Gap consumed by each filler obstacle
    pub filler_spacing: f32,
    pub high_difficulty_filler_spacing: f32,
    /// Level from which the denser filler spacing applies
    pub high_difficulty_level: u32,
    pub max_fillers: u32,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            pattern_chance: 0.5,
            variety_enabled: true,
            variety_window: None,
            filler_spacing: 0.30,
            high_difficulty_filler_spacing: 0.20,
            high_difficulty_level: 5,
            max_fillers: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessSettings {
    /// Base same-lane spacing (relative units)
    pub min_spacing: f32,
    /// Extra spacing when a tall obstacle is followed by a low one
    pub duck_then_jump_margin: f32,
    /// Extra spacing when a low obstacle is followed by a tall one
    pub jump_then_duck_margin: f32,
    /// Full blocks closer than this are treated as one blockage
    pub proximity_threshold: f32,
    pub repair_rounds: u32,
}

impl Default for FairnessSettings {
    fn default() -> Self {
        Self {
            min_spacing: 0.20,
            duck_then_jump_margin: 0.10,
            jump_then_duck_margin: 0.08,
            proximity_threshold: 0.05,
            repair_rounds: 4,
        }
    }
}

impl FairnessSettings {
    /// Required same-lane distance when `earlier` is followed by `later`
    pub fn required_spacing(&self, earlier: MovementType, later: MovementType) -> f32 {
        let margin = match (earlier, later) {
            (MovementType::TallObstacle, MovementType::LowObstacle) => self.duck_then_jump_margin,
            (MovementType::LowObstacle, MovementType::TallObstacle) => self.jump_then_duck_margin,
            _ => 0.0,
        };
        self.min_spacing + margin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultySettings {
    pub segments_per_level: u32,
    pub breather_interval: u32,
    /// Breathers stop at and above this level
    pub breather_cutoff_level: u32,
    /// Front gap at level 0 (relative units)
    pub breather_gap_start: f32,
    pub breather_gap_shrink_per_level: f32,
    pub breather_gap_floor: f32,
    /// Procedural count multiplier on breather segments
    pub breather_density: f32,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            segments_per_level: 5,
            breather_interval: 8,
            breather_cutoff_level: 6,
            breather_gap_start: 0.40,
            breather_gap_shrink_per_level: 0.04,
            breather_gap_floor: 0.15,
            breather_density: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorialSettings {
    pub enabled: bool,
    /// Authored world offsets of the lane-switch, jump and slide groups
    pub group_offsets: [f32; 3],
    pub base_scroll_speed: f32,
    /// Pickup-only stretch before the first tutorial obstacle (seconds)
    pub intro_duration_secs: f32,
    /// Fire a prompt when the group is this many seconds away
    pub prompt_lead_time: f32,
    /// Distance behind the player before a group counts as passed
    pub safety_margin: f32,
}

impl Default for TutorialSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            group_offsets: [2000.0, 4000.0, 6000.0],
            base_scroll_speed: 1000.0,
            intro_duration_secs: 10.0,
            prompt_lead_time: 1.5,
            safety_margin: 300.0,
        }
    }
}

impl TutorialSettings {
    /// World distance covered by the intro stretch
    pub fn intro_distance(&self) -> f32 {
        self.intro_duration_secs * self.base_scroll_speed
    }
}

/// Entity class names handed to the host, per movement type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityClasses {
    pub low: Option<String>,
    pub tall: Option<String>,
    pub full: Option<String>,
}

impl Default for EntityClasses {
    fn default() -> Self {
        Self {
            low: Some("obstacle_low".to_string()),
            tall: Some("obstacle_tall".to_string()),
            full: Some("obstacle_full".to_string()),
        }
    }
}

impl EntityClasses {
    pub fn for_kind(&self, kind: MovementType) -> Option<&str> {
        match kind {
            MovementType::LowObstacle => self.low.as_deref(),
            MovementType::TallObstacle => self.tall.as_deref(),
            MovementType::FullBlock => self.full.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub initial_size: u32,
    pub growth: u32,
    pub entity_classes: EntityClasses,
    /// Active obstacles this far behind the player are recycled
    pub despawn_distance: f32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            initial_size: 8,
            growth: 4,
            entity_classes: EntityClasses::default(),
            despawn_distance: 1500.0,
        }
    }
}

/// Test-only overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Inject a full block in every lane at `blockage_position`
    pub force_blockage: bool,
    pub blockage_position: f32,
    /// Pin the procedural count
    pub forced_obstacle_count: Option<u32>,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            force_blockage: false,
            blockage_position: 0.5,
            forced_obstacle_count: None,
        }
    }
}

/// All spawner tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerSettings {
    pub pacing: PacingPreset,
    pub layout: LayoutSettings,
    pub procedural: ProceduralSettings,
    pub patterns: PatternSettings,
    pub fairness: FairnessSettings,
    pub difficulty: DifficultySettings,
    pub tutorial: TutorialSettings,
    pub pool: PoolSettings,
    pub debug: DebugSettings,
}

impl SpawnerSettings {
    /// Create settings from a pacing preset (applies preset defaults)
    pub fn from_preset(preset: PacingPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a pacing preset (updates pacing-dependent settings)
    pub fn apply_preset(&mut self, preset: PacingPreset) {
        self.pacing = preset;
        self.difficulty.segments_per_level = preset.segments_per_level();
        self.difficulty.breather_interval = preset.breather_interval();
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the generator cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if !(0.0..=1.0).contains(&layout.min_offset)
            || !(0.0..=1.0).contains(&layout.max_offset)
            || layout.min_offset >= layout.max_offset
        {
            return Err(invalid(format!(
                "layout offsets must satisfy 0 <= min < max <= 1 (got {}..{})",
                layout.min_offset, layout.max_offset
            )));
        }
        let weights = &layout.type_weights;
        if weights.low < 0.0 || weights.tall < 0.0 || weights.full < 0.0 {
            return Err(invalid("type weights must be non-negative"));
        }
        if weights.low + weights.tall + weights.full <= 0.0 {
            return Err(invalid("at least one type weight must be positive"));
        }

        let procedural = &self.procedural;
        if procedural.min_count == 0 || procedural.min_count > procedural.max_count {
            return Err(invalid(format!(
                "procedural count range must satisfy 1 <= min <= max (got {}..{})",
                procedural.min_count, procedural.max_count
            )));
        }
        if !(0.0..0.5).contains(&procedural.jitter_fraction) {
            return Err(invalid("jitter_fraction must be in [0, 0.5)"));
        }

        let patterns = &self.patterns;
        if !(0.0..=1.0).contains(&patterns.pattern_chance) {
            return Err(invalid("pattern_chance must be in [0, 1]"));
        }
        if patterns.filler_spacing <= 0.0 || patterns.high_difficulty_filler_spacing <= 0.0 {
            return Err(invalid("filler spacing must be positive"));
        }

        let fairness = &self.fairness;
        if fairness.min_spacing <= 0.0 {
            return Err(invalid("min_spacing must be positive"));
        }
        if fairness.duck_then_jump_margin < 0.0 || fairness.jump_then_duck_margin < 0.0 {
            return Err(invalid("spacing margins must be non-negative"));
        }
        if fairness.proximity_threshold < 0.0 {
            return Err(invalid("proximity_threshold must be non-negative"));
        }

        let difficulty = &self.difficulty;
        if difficulty.segments_per_level == 0 {
            return Err(invalid("segments_per_level must be at least 1"));
        }
        if difficulty.breather_gap_floor < 0.0
            || difficulty.breather_gap_start < difficulty.breather_gap_floor
            || difficulty.breather_gap_start >= layout.max_offset - layout.min_offset
        {
            return Err(invalid("breather gap must satisfy 0 <= floor <= start < layout span"));
        }
        if !(0.0..=1.0).contains(&difficulty.breather_density) {
            return Err(invalid("breather_density must be in [0, 1]"));
        }

        let tutorial = &self.tutorial;
        if tutorial.base_scroll_speed < 0.0 || tutorial.intro_duration_secs < 0.0 {
            return Err(invalid("tutorial speed and intro duration must be non-negative"));
        }
        if !tutorial.group_offsets.windows(2).all(|w| w[0] < w[1]) {
            return Err(invalid("tutorial group offsets must be strictly increasing"));
        }

        if self.pool.growth == 0 {
            return Err(invalid("pool growth must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
