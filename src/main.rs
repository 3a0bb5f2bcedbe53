//! Merge Drop headless entry point
//!
//! Runs the simulation in idle mode without a window: useful for soak runs
//! and for tuning files. Usage: `merge-drop [seed] [frames]`. Set
//! `MERGE_DROP_CONFIG` to a tuning JSON file, `MERGE_DROP_VOLUME` to a
//! volume in `[0, 1]` (0 mutes), and `RUST_LOG` for verbosity.

use merge_drop::audio::{AudioManager, LogBackend};
use merge_drop::consts::*;
use merge_drop::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
use merge_drop::{JsonFileStore, ScoreStore, Tuning};

const BEST_SCORE_FILE: &str = "merge_drop_best.json";

/// Game instance holding all state
struct Game {
    state: GameState,
    accumulator: f32,
    input: TickInput,
    audio: AudioManager,
    store: JsonFileStore,
}

impl Game {
    fn new(seed: u64, tuning: Tuning, volume: Option<f32>) -> Self {
        let store = JsonFileStore::new(BEST_SCORE_FILE);
        let best = store.load();
        let mut audio = AudioManager::new(Some(Box::new(LogBackend)));
        if let Some(volume) = volume {
            audio.set_master_volume(volume);
            audio.set_muted(volume <= 0.0);
        }
        Self {
            state: GameState::with_best(seed, tuning, best),
            accumulator: 0.0,
            input: TickInput {
                idle_mode: true,
                ..Default::default()
            },
            audio,
            store,
        }
    }

    /// Run simulation ticks for `dt` seconds of wall time
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            self.audio.handle_events(&self.state.events);
            for event in &self.state.events {
                if let GameEvent::NewBest { score } = event {
                    self.store.save(*score);
                }
            }

            // Clear one-shot inputs after processing
            self.input.events.clear();
            self.input.pause = false;
            self.input.reset = false;
        }
    }
}

fn load_tuning() -> Tuning {
    let Ok(path) = std::env::var("MERGE_DROP_CONFIG") else {
        return Tuning::default();
    };
    match Tuning::load(&path) {
        Ok(tuning) => tuning,
        Err(err) => {
            log::warn!("{err}; using default tuning");
            Tuning::default()
        }
    }
}

fn load_volume() -> Option<f32> {
    let raw = std::env::var("MERGE_DROP_VOLUME").ok()?;
    match raw.parse() {
        Ok(volume) => Some(volume),
        Err(err) => {
            log::warn!("Ignoring MERGE_DROP_VOLUME={raw:?}: {err}");
            None
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let frames: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60 * 120);

    log::info!("Merge Drop (headless) starting: seed {seed}, {frames} frames");
    let mut game = Game::new(seed, load_tuning(), load_volume());

    for frame in 0..frames {
        game.update(SIM_DT);
        if game.state.phase.is_terminal() {
            log::info!("Run ended at frame {frame}: {:?}", game.state.phase);
            break;
        }
    }

    let snapshot = game.state.snapshot();
    if snapshot.phase == GamePhase::Playing {
        log::info!("Frame budget exhausted while still playing");
    }
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Failed to serialize snapshot: {err}"),
    }
}
