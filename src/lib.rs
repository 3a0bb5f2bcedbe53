//! Merge Drop - a drop-and-merge physics puzzle core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, merges, spawning, win/lose, score)
//! - `tuning`: Data-driven game balance
//! - `audio`: Sound effect dispatch to a pluggable backend
//! - `highscores`: Best-score persistence

pub mod audio;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use highscores::{JsonFileStore, MemoryStore, ScoreStore};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}
