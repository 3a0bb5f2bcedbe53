//! Lose timer and win detection

use serde::{Deserialize, Serialize};

use super::piece::PieceRegistry;
use crate::tuning::{DangerPolicy, Tuning, WinPolicy};

/// Sustained-danger timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LoseTimer {
    Inactive,
    Armed { since_ms: f64 },
    Expired,
}

/// Count the pieces that currently count as dangerous
///
/// A piece is dangerous when its center is above `danger_y`; under
/// `SettledOnly` it must also be settled, so pieces still falling through
/// the top of the well are ignored.
pub fn pieces_in_danger(registry: &PieceRegistry, danger_y: f32, policy: DangerPolicy) -> usize {
    registry
        .pieces()
        .filter(|piece| {
            let above = registry.position(piece.id).is_some_and(|pos| pos.y < danger_y);
            above
                && match policy {
                    DangerPolicy::AnyPiece => true,
                    DangerPolicy::SettledOnly => registry.is_settled(piece.id),
                }
        })
        .count()
}

#[derive(Debug, Clone)]
pub struct LoseWinMonitor {
    lose_duration_ms: f64,
    max_rank: u8,
    win_policy: WinPolicy,
    timer: LoseTimer,
    won: bool,
}

impl LoseWinMonitor {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            lose_duration_ms: tuning.rules.lose_duration_ms,
            max_rank: tuning.ranks.max_rank,
            win_policy: tuning.rules.win_policy,
            timer: LoseTimer::Inactive,
            won: false,
        }
    }

    pub fn timer(&self) -> LoseTimer {
        self.timer
    }

    pub fn win_policy(&self) -> WinPolicy {
        self.win_policy
    }

    /// Milliseconds left before the lose timer expires, if armed
    pub fn remaining_ms(&self, now_ms: f64) -> Option<f64> {
        match self.timer {
            LoseTimer::Armed { since_ms } => Some((self.lose_duration_ms - (now_ms - since_ms)).max(0.0)),
            _ => None,
        }
    }

    /// Update the lose timer; returns true on the frame it expires
    ///
    /// Danger must hold on every frame: a single clear frame disarms it.
    pub fn observe_danger(&mut self, now_ms: f64, in_danger: bool) -> bool {
        match (self.timer, in_danger) {
            (LoseTimer::Expired, _) => false,
            (_, false) => {
                self.timer = LoseTimer::Inactive;
                false
            }
            (LoseTimer::Inactive, true) => {
                log::debug!("lose timer armed at {now_ms:.0} ms");
                self.timer = LoseTimer::Armed { since_ms: now_ms };
                false
            }
            (LoseTimer::Armed { since_ms }, true) => {
                if now_ms - since_ms > self.lose_duration_ms {
                    self.timer = LoseTimer::Expired;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a merge output; returns true the first time max rank appears
    pub fn observe_rank(&mut self, rank: u8) -> bool {
        if rank >= self.max_rank && !self.won {
            self.won = true;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.timer = LoseTimer::Inactive;
        self.won = false;
    }
}
