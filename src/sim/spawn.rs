//! Aim/drop gesture and the next-piece queue
//!
//! State machine: `Idle -> Aiming -> Released(at)`. A press is only accepted
//! once the cooldown since the previous drop has fully elapsed.

use std::ops::RangeInclusive;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::{DropMode, RankTuning, Tuning};

/// Raw pointer input from the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Press { x: f32, y: f32 },
    Release { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnState {
    /// Nothing dropped since start or reset
    Idle,
    /// Press held; `x` is already clamped
    Aiming { x: f32 },
    /// Last drop happened at `at_ms`
    Released { at_ms: f64 },
}

/// A piece the controller wants created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropRequest {
    pub position: Vec2,
    pub rank: u8,
}

#[derive(Debug, Clone)]
pub struct SpawnController {
    state: SpawnState,
    mode: DropMode,
    cooldown_ms: f64,
    rank_range: RangeInclusive<u8>,
    ranks: RankTuning,
    width: f32,
    drop_y: f32,
    next_rank: u8,
    pointer_x: f32,
}

impl SpawnController {
    pub fn new<R: Rng>(tuning: &Tuning, rng: &mut R) -> Self {
        let rank_range = tuning.spawn.next_rank_min..=tuning.spawn.next_rank_max;
        Self {
            state: SpawnState::Idle,
            mode: tuning.spawn.drop_mode,
            cooldown_ms: tuning.spawn.cooldown_ms,
            next_rank: rng.random_range(rank_range.clone()),
            rank_range,
            ranks: tuning.ranks,
            width: tuning.well.width,
            drop_y: tuning.well.drop_y,
            pointer_x: tuning.well.width / 2.0,
        }
    }

    pub fn state(&self) -> SpawnState {
        self.state
    }

    /// Rank of the piece the next drop will create
    pub fn next_rank(&self) -> u8 {
        self.next_rank
    }

    /// Where the next piece would drop if released now
    pub fn preview_x(&self) -> f32 {
        match self.state {
            SpawnState::Aiming { x } => x,
            _ => self.clamp_x(self.pointer_x),
        }
    }

    /// Keep the next piece's circle inside the well horizontally
    ///
    /// A piece wider than the well is centered.
    pub fn clamp_x(&self, x: f32) -> f32 {
        let r = self.ranks.radius(self.next_rank);
        if self.width <= 2.0 * r {
            return self.width / 2.0;
        }
        x.clamp(r, self.width - r)
    }

    /// Whether a press at `now_ms` would be accepted
    pub fn ready(&self, now_ms: f64) -> bool {
        match self.state {
            SpawnState::Idle => true,
            SpawnState::Aiming { .. } => false,
            SpawnState::Released { at_ms } => now_ms - at_ms > self.cooldown_ms,
        }
    }

    /// Feed one input event; returns a drop when the gesture completes
    pub fn handle<R: Rng>(&mut self, event: &InputEvent, now_ms: f64, rng: &mut R) -> Option<DropRequest> {
        match *event {
            InputEvent::PointerMove { x, .. } => {
                self.pointer_x = x;
                if let SpawnState::Aiming { .. } = self.state {
                    self.state = SpawnState::Aiming { x: self.clamp_x(x) };
                }
                None
            }
            InputEvent::Press { x, .. } => {
                self.pointer_x = x;
                if !self.ready(now_ms) {
                    return None;
                }
                let x = self.clamp_x(x);
                match self.mode {
                    DropMode::PressAndRelease => {
                        self.state = SpawnState::Aiming { x };
                        None
                    }
                    DropMode::PressOnly => Some(self.release(x, now_ms, rng)),
                }
            }
            InputEvent::Release { x, .. } => {
                self.pointer_x = x;
                match self.state {
                    SpawnState::Aiming { .. } => {
                        let x = self.clamp_x(x);
                        Some(self.release(x, now_ms, rng))
                    }
                    _ => None,
                }
            }
            InputEvent::Quit => None,
        }
    }

    /// Back to `Idle` with a freshly drawn next rank
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.state = SpawnState::Idle;
        self.next_rank = rng.random_range(self.rank_range.clone());
    }

    fn release<R: Rng>(&mut self, x: f32, now_ms: f64, rng: &mut R) -> DropRequest {
        let request = DropRequest {
            position: Vec2::new(x, self.drop_y),
            rank: self.next_rank,
        };
        self.next_rank = rng.random_range(self.rank_range.clone());
        self.state = SpawnState::Released { at_ms: now_ms };
        log::debug!("drop rank {} at x={:.1}", request.rank, x);
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn controller(mode: DropMode) -> (SpawnController, Pcg32) {
        let mut tuning = Tuning::default();
        tuning.spawn.drop_mode = mode;
        let mut rng = Pcg32::seed_from_u64(7);
        (SpawnController::new(&tuning, &mut rng), rng)
    }

    fn press(x: f32) -> InputEvent {
        InputEvent::Press { x, y: 300.0 }
    }

    fn release(x: f32) -> InputEvent {
        InputEvent::Release { x, y: 300.0 }
    }

    #[test]
    fn test_press_then_release_drops() {
        let (mut spawn, mut rng) = controller(DropMode::PressAndRelease);
        let rank = spawn.next_rank();
        assert!(spawn.handle(&press(300.0), 0.0, &mut rng).is_none());
        assert_eq!(spawn.state(), SpawnState::Aiming { x: 300.0 });

        let drop = spawn.handle(&release(320.0), 16.0, &mut rng).expect("release should drop");
        assert_eq!(drop.rank, rank);
        assert_eq!(drop.position, Vec2::new(320.0, 80.0));
        assert_eq!(spawn.state(), SpawnState::Released { at_ms: 16.0 });
    }

    #[test]
    fn test_pointer_move_updates_aim() {
        let (mut spawn, mut rng) = controller(DropMode::PressAndRelease);
        spawn.handle(&press(300.0), 0.0, &mut rng);
        spawn.handle(&InputEvent::PointerMove { x: 5000.0, y: 0.0 }, 8.0, &mut rng);
        let r = RankTuning::default().radius(spawn.next_rank());
        assert_eq!(spawn.state(), SpawnState::Aiming { x: 800.0 - r });
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let (mut spawn, mut rng) = controller(DropMode::PressAndRelease);
        assert!(spawn.handle(&release(300.0), 0.0, &mut rng).is_none());
        assert_eq!(spawn.state(), SpawnState::Idle);
    }

    #[test]
    fn test_press_inside_cooldown_is_ignored() {
        let (mut spawn, mut rng) = controller(DropMode::PressAndRelease);
        spawn.handle(&press(300.0), 0.0, &mut rng);
        spawn.handle(&release(300.0), 10.0, &mut rng).unwrap();

        // 100 ms later: still cooling down
        assert!(spawn.handle(&press(300.0), 110.0, &mut rng).is_none());
        assert!(spawn.handle(&release(300.0), 120.0, &mut rng).is_none());
        assert_eq!(spawn.state(), SpawnState::Released { at_ms: 10.0 });

        // Exactly at the cooldown is still too early
        assert!(!spawn.ready(210.0));
        assert!(spawn.ready(211.0));
        spawn.handle(&press(300.0), 211.0, &mut rng);
        assert!(spawn.handle(&release(300.0), 220.0, &mut rng).is_some());
    }

    #[test]
    fn test_press_only_mode_drops_on_press() {
        let (mut spawn, mut rng) = controller(DropMode::PressOnly);
        assert!(spawn.handle(&press(300.0), 0.0, &mut rng).is_some());
        assert!(spawn.handle(&press(300.0), 50.0, &mut rng).is_none());
        assert!(spawn.handle(&press(300.0), 250.0, &mut rng).is_some());
    }

    #[test]
    fn test_drop_is_clamped_to_walls() {
        let (mut spawn, mut rng) = controller(DropMode::PressOnly);
        let r = RankTuning::default().radius(spawn.next_rank());
        let drop = spawn.handle(&press(-50.0), 0.0, &mut rng).unwrap();
        assert_eq!(drop.position.x, r);
    }

    #[test]
    fn test_piece_wider_than_well_is_centered() {
        let mut tuning = Tuning::default();
        tuning.well.width = 60.0;
        let mut rng = Pcg32::seed_from_u64(7);
        let mut spawn = SpawnController::new(&tuning, &mut rng);
        assert_eq!(spawn.clamp_x(5.0), 30.0);
        spawn.handle(&press(10.0), 0.0, &mut rng);
        let drop = spawn.handle(&release(50.0), 16.0, &mut rng).unwrap();
        assert_eq!(drop.position.x, 30.0);
    }

    #[test]
    fn test_next_rank_stays_in_range() {
        let (mut spawn, mut rng) = controller(DropMode::PressOnly);
        for i in 0..200 {
            let drop = spawn.handle(&press(400.0), i as f64 * 1000.0, &mut rng).unwrap();
            assert!((1..=4).contains(&drop.rank));
            assert!((1..=4).contains(&spawn.next_rank()));
        }
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let (mut spawn, mut rng) = controller(DropMode::PressOnly);
        spawn.handle(&press(300.0), 0.0, &mut rng);
        spawn.reset(&mut rng);
        assert_eq!(spawn.state(), SpawnState::Idle);
        assert!(spawn.ready(1.0));
    }
}
