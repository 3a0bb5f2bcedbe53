//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by handle / piece id)
//! - No rendering, audio or platform dependencies

pub mod merge;
pub mod monitor;
pub mod physics;
pub mod piece;
pub mod score;
pub mod spawn;
pub mod state;
pub mod tick;

pub use merge::{MergeOutcome, MergeResolver, MergeRules};
pub use monitor::{LoseTimer, LoseWinMonitor, pieces_in_danger};
pub use physics::{BodyHandle, BodyState, Contact, PhysicsWorld};
pub use piece::{Piece, PieceContact, PieceId, PieceRegistry};
pub use score::ScoreLedger;
pub use spawn::{DropRequest, InputEvent, SpawnController, SpawnState};
pub use state::{GameEvent, GamePhase, GameState, PieceView, Snapshot};
pub use tick::{TickInput, tick};
