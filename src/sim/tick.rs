//! Fixed timestep simulation tick
//!
//! One tick is one frame: input -> spawn -> physics step -> merge pass ->
//! win/lose evaluation. Score changes fall out of the drop and merge steps.

use super::monitor::pieces_in_danger;
use super::spawn::{InputEvent, SpawnState};
use super::state::{GameEvent, GamePhase, GameState};
use crate::tuning::{DangerPolicy, WinPolicy};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer events received since the previous tick, in order
    pub events: Vec<InputEvent>,
    /// Pause toggle
    pub pause: bool,
    /// Clear the well and start over
    pub reset: bool,
    /// Idle/demo mode - the simulation aims and drops by itself
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    if input.reset {
        state.reset();
        return;
    }

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    // Don't tick if paused, won or game over
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;
    state.clock_ms += dt as f64 * 1000.0;
    let now = state.clock_ms;
    let mut new_best = None;

    // Spawn
    let mut events = input.events.clone();
    if input.idle_mode {
        events.extend(autoplay(state));
    }
    for event in &events {
        let Some(request) = state.spawn.handle(event, now, &mut state.rng) else {
            continue;
        };
        let piece = state.registry.create(request.position, request.rank);
        state.events.push(GameEvent::Dropped {
            piece,
            rank: request.rank,
        });
        new_best = state.ledger.on_drop(request.rank).or(new_best);
    }

    // Physics, then merges against the settled contact list
    let contacts = state.registry.step(dt);
    let rules = state.merge_rules();
    let outcomes = state.resolver.resolve(&mut state.registry, &contacts, &rules);

    for outcome in &outcomes {
        if let Some(piece) = outcome.created {
            state.events.push(GameEvent::Merged {
                piece,
                rank: outcome.rank,
                x: outcome.position.x,
                y: outcome.position.y,
            });
        }
        new_best = state.ledger.on_merge(outcome.rank).or(new_best);

        if state.monitor.observe_rank(outcome.rank) {
            log::info!("Max rank {} reached at {:.0} ms", outcome.rank, now);
            state.events.push(GameEvent::Won { rank: outcome.rank });
            if state.monitor.win_policy() == WinPolicy::Terminal {
                state.phase = GamePhase::Won;
            }
        }
    }

    if let Some(score) = new_best {
        state.events.push(GameEvent::NewBest { score });
    }

    // Lose timer
    if state.phase == GamePhase::Playing {
        let rules = &state.tuning.rules;
        let danger = pieces_in_danger(&state.registry, state.tuning.well.danger_y, rules.danger_policy) > 0;
        if state.monitor.observe_danger(now, danger) {
            let score = state.ledger.score();
            log::info!("Game over: score {score}, {} pieces", state.registry.len());
            state.phase = GamePhase::GameOver;
            state.events.push(GameEvent::GameOver { score });
        }
    }
}

/// Pick inputs for idle mode
///
/// Waits until nothing is passing through the danger zone, then aims at the
/// highest piece matching the next rank, or sweeps across the well.
fn autoplay(state: &GameState) -> Vec<InputEvent> {
    let y = state.tuning.well.drop_y;

    if let SpawnState::Aiming { x } = state.spawn.state() {
        return vec![InputEvent::Release { x, y }];
    }
    if !state.spawn.ready(state.clock_ms) {
        return Vec::new();
    }
    if pieces_in_danger(&state.registry, state.tuning.well.danger_y, DangerPolicy::AnyPiece) > 0 {
        return Vec::new();
    }

    let next = state.spawn.next_rank();
    let target = state
        .registry
        .pieces()
        .filter(|p| p.rank == next)
        .filter_map(|p| state.registry.position(p.id))
        .min_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
        .map(|pos| pos.x);

    let x = target.unwrap_or_else(|| {
        // Oscillating sweep so drops spread across the well
        let t = state.time_ticks as f32 * 0.013;
        state.tuning.well.width * (0.5 + 0.35 * t.sin() + 0.1 * (t * 2.7).sin())
    });

    // Under press-and-release the release follows on the next tick
    vec![InputEvent::Press { x, y }]
}
