//! Data-driven game balance
//!
//! Every constant the simulation reads lives here. Loaded once at start from
//! JSON; any field left out of the file keeps its default.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Well geometry (screen coordinates, +y is down)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WellTuning {
    pub width: f32,
    pub height: f32,
    /// Vertical coordinate new pieces are dropped from
    pub drop_y: f32,
    /// Pieces whose center is above (smaller y than) this line are in danger
    pub danger_y: f32,
}

impl Default for WellTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 1000.0,
            drop_y: 80.0,
            danger_y: 200.0,
        }
    }
}

/// Rank ladder and the radius formula
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RankTuning {
    pub max_rank: u8,
    pub radius_base: f32,
    pub radius_step: f32,
}

impl Default for RankTuning {
    fn default() -> Self {
        Self {
            max_rank: 10,
            radius_base: 25.0,
            radius_step: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    pub restitution: f32,
    pub friction: f32,
    /// Linear speed below which a body counts as resting (pixels/s)
    pub settle_speed: f32,
    /// Angular speed below which a body counts as resting (radians/s)
    pub settle_spin: f32,
    /// Consecutive resting steps before a body is settled
    pub settle_steps: u32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: 900.0,
            restitution: 0.4,
            friction: 0.5,
            settle_speed: 12.0,
            settle_spin: 0.5,
            settle_steps: 30,
        }
    }
}

/// How a drop gesture is recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DropMode {
    /// Press starts aiming, release drops
    #[default]
    PressAndRelease,
    /// Press drops immediately
    PressOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub cooldown_ms: f64,
    /// Inclusive range the next piece's rank is drawn from
    pub next_rank_min: u8,
    pub next_rank_max: u8,
    pub drop_mode: DropMode,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 200.0,
            next_rank_min: 1,
            next_rank_max: 4,
            drop_mode: DropMode::PressAndRelease,
        }
    }
}

/// Which pieces count toward the lose timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DangerPolicy {
    /// Any piece above the danger line, moving or not
    AnyPiece,
    /// Only settled pieces above the danger line
    #[default]
    SettledOnly,
}

/// What producing a max-rank piece does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinPolicy {
    /// Win ends the run
    #[default]
    Terminal,
    /// Win is announced once, play continues
    Continue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesTuning {
    pub lose_duration_ms: f64,
    pub danger_policy: DangerPolicy,
    pub win_policy: WinPolicy,
    /// When false, pairs with a piece above the danger line do not merge
    pub merge_in_danger_zone: bool,
}

impl Default for RulesTuning {
    fn default() -> Self {
        Self {
            lose_duration_ms: 5000.0,
            danger_policy: DangerPolicy::SettledOnly,
            win_policy: WinPolicy::Terminal,
            merge_in_danger_zone: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    /// Dropped rank -> points
    pub drop_points: BTreeMap<u8, u64>,
    /// Merge output rank -> points
    pub merge_points: BTreeMap<u8, u64>,
    /// Points per output rank when the merge table has no entry
    pub merge_fallback_per_rank: u64,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            drop_points: (1..=5u8).map(|rank| (rank, rank as u64)).collect(),
            // Triangular numbers: 1, 3, 6, 10, ...
            merge_points: (2..=10u8)
                .map(|rank| {
                    let n = (rank - 1) as u64;
                    (rank, n * (n + 1) / 2)
                })
                .collect(),
            merge_fallback_per_rank: 10,
        }
    }
}

/// Complete game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub well: WellTuning,
    pub ranks: RankTuning,
    pub physics: PhysicsTuning,
    pub spawn: SpawnTuning,
    pub rules: RulesTuning,
    pub score: ScoreTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: String| Err(TuningError::Invalid(msg));
        let ranks = &self.ranks;

        if ranks.max_rank < 2 {
            return invalid(format!("max_rank must be at least 2, got {}", ranks.max_rank));
        }
        if ranks.radius_step <= 0.0 {
            return invalid(format!("radius_step must be positive, got {}", ranks.radius_step));
        }
        if ranks.radius_base + 2.0 * ranks.radius_step <= 0.0 {
            return invalid("rank 1 radius must be positive".to_string());
        }

        let spawn = &self.spawn;
        if spawn.next_rank_min < 1
            || spawn.next_rank_min > spawn.next_rank_max
            || spawn.next_rank_max >= ranks.max_rank
        {
            return invalid(format!(
                "next rank range {}..={} must lie within 1..={}",
                spawn.next_rank_min,
                spawn.next_rank_max,
                ranks.max_rank - 1
            ));
        }
        if spawn.cooldown_ms < 0.0 {
            return invalid("cooldown_ms must not be negative".to_string());
        }
        if self.rules.lose_duration_ms <= 0.0 {
            return invalid("lose_duration_ms must be positive".to_string());
        }

        let mut previous: Option<u64> = None;
        for (&rank, &points) in &self.score.merge_points {
            if previous.is_some_and(|p| points <= p) {
                return invalid(format!("merge_points must strictly increase (rank {rank})"));
            }
            previous = Some(points);
        }

        let widest = 2.0 * (ranks.radius_base + (spawn.next_rank_max as f32 + 1.0) * ranks.radius_step);
        if self.well.width < widest {
            return invalid(format!(
                "well width {} cannot fit a rank {} piece",
                self.well.width, spawn.next_rank_max
            ));
        }
        if self.well.drop_y >= self.well.height || self.well.danger_y >= self.well.height {
            return invalid("drop_y and danger_y must lie inside the well".to_string());
        }

        let physics = &self.physics;
        if !(0.0..=1.0).contains(&physics.restitution) || physics.friction < 0.0 {
            return invalid("restitution must be in [0, 1] and friction non-negative".to_string());
        }

        Ok(())
    }
}
