//! Game state and core simulation types
//!
//! `GameState` is the single aggregate every frame works on; nothing in the
//! simulation lives in globals.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::merge::{MergeResolver, MergeRules};
use super::monitor::{LoseTimer, LoseWinMonitor};
use super::piece::{PieceId, PieceRegistry};
use super::score::ScoreLedger;
use super::spawn::SpawnController;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Max rank reached under the terminal win policy
    Won,
    /// Lose timer expired
    GameOver,
}

impl GamePhase {
    /// No stepping, merging or spawning happens until reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::GameOver)
    }
}

/// Something that happened during a tick, for audio and persistence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Dropped { piece: PieceId, rank: u8 },
    Merged { piece: PieceId, rank: u8, x: f32, y: f32 },
    /// Max rank produced (fires once per run)
    Won { rank: u8 },
    GameOver { score: u64 },
    NewBest { score: u64 },
    Reset,
}

/// Read-only view of one piece for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceView {
    pub id: PieceId,
    pub rank: u8,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub angle: f32,
    pub settled: bool,
}

/// Read-only view of a frame for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub best: u64,
    pub next_rank: u8,
    pub aim_x: f32,
    pub time_ms: f64,
    /// Time left on the lose timer, if armed
    pub danger_remaining_ms: Option<f64>,
    pub pieces: Vec<PieceView>,
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated milliseconds since start or reset
    pub clock_ms: f64,
    pub phase: GamePhase,
    pub registry: PieceRegistry,
    pub resolver: MergeResolver,
    pub spawn: SpawnController,
    pub monitor: LoseWinMonitor,
    pub ledger: ScoreLedger,
    /// Events produced by the most recent tick
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self::with_best(seed, tuning, 0)
    }

    /// Create a new game state, carrying a previously saved best score
    ///
    /// The tuning is expected to have passed `Tuning::validate`.
    pub fn with_best(seed: u64, tuning: Tuning, best: u64) -> Self {
        debug_assert!(
            tuning.validate().is_ok(),
            "invalid tuning: {:?}",
            tuning.validate().err()
        );
        let mut rng = Pcg32::seed_from_u64(seed);
        Self {
            seed,
            time_ticks: 0,
            clock_ms: 0.0,
            phase: GamePhase::Playing,
            registry: PieceRegistry::new(&tuning),
            resolver: MergeResolver::new(),
            spawn: SpawnController::new(&tuning, &mut rng),
            monitor: LoseWinMonitor::new(&tuning),
            ledger: ScoreLedger::new(&tuning.score, best),
            events: Vec::new(),
            rng,
            tuning,
        }
    }

    pub fn merge_rules(&self) -> MergeRules {
        MergeRules {
            max_rank: self.tuning.ranks.max_rank,
            blocked_above_y: (!self.tuning.rules.merge_in_danger_zone).then_some(self.tuning.well.danger_y),
        }
    }

    /// Clear the well and start over; the best score survives
    pub fn reset(&mut self) {
        self.registry.clear();
        self.ledger.reset();
        self.monitor.reset();
        self.spawn.reset(&mut self.rng);
        self.time_ticks = 0;
        self.clock_ms = 0.0;
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::Reset);
        log::info!("Game reset (best {})", self.ledger.best());
    }

    pub fn snapshot(&self) -> Snapshot {
        let pieces = self
            .registry
            .pieces()
            .filter_map(|piece| {
                let body = self.registry.body(piece.id)?;
                Some(PieceView {
                    id: piece.id,
                    rank: piece.rank,
                    x: body.pos.x,
                    y: body.pos.y,
                    radius: body.radius,
                    angle: body.angle,
                    settled: self.registry.is_settled(piece.id),
                })
            })
            .collect();

        Snapshot {
            phase: self.phase,
            score: self.ledger.score(),
            best: self.ledger.best(),
            next_rank: self.spawn.next_rank(),
            aim_x: self.spawn.preview_x(),
            time_ms: self.clock_ms,
            danger_remaining_ms: match self.monitor.timer() {
                LoseTimer::Armed { .. } => self.monitor.remaining_ms(self.clock_ms),
                _ => None,
            },
            pieces,
        }
    }
}
