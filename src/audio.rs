//! Sound effect dispatch
//!
//! The simulation never talks to audio directly: the driver forwards
//! `GameEvent`s here. Playback goes through an `AudioBackend`; with no
//! backend, or when the backend fails, `play` is a silent no-op.

use thiserror::Error;

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// A piece was dropped into the well
    Drop,
    /// Two pieces merged
    Merge,
    /// Max rank reached
    Win,
    /// Lose timer expired
    GameOver,
}

impl SoundEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::Drop => "drop",
            SoundEffect::Merge => "merge",
            SoundEffect::Win => "win",
            SoundEffect::GameOver => "game_over",
        }
    }

    /// The effect a game event should trigger, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Dropped { .. } => Some(SoundEffect::Drop),
            GameEvent::Merged { .. } => Some(SoundEffect::Merge),
            GameEvent::Won { .. } => Some(SoundEffect::Win),
            GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
            GameEvent::NewBest { .. } | GameEvent::Reset => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("missing sound asset: {0}")]
    MissingAsset(String),
}

/// Something that can actually make noise
pub trait AudioBackend {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> Result<(), AudioError>;
}

/// Backend that logs instead of playing (headless runs)
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play(&mut self, effect: SoundEffect, volume: f32) -> Result<(), AudioError> {
        log::debug!("sfx {} @ {:.2}", effect.as_str(), volume);
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    master_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioManager {
    pub fn new(backend: Option<Box<dyn AudioBackend>>) -> Self {
        if backend.is_none() {
            log::warn!("No audio backend - audio disabled");
        }
        Self {
            backend,
            master_volume: 0.8,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume
        }
    }

    /// Play a sound effect; failures are logged and dropped
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        if let Err(err) = backend.play(effect, vol) {
            log::warn!("Failed to play {}: {err}", effect.as_str());
        }
    }

    /// Play whatever the tick's events call for
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for effect in events.iter().filter_map(SoundEffect::for_event) {
            self.play(effect);
        }
    }
}
