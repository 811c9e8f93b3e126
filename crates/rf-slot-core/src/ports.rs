//! Collaborator ports: audio cues, session flags, wall clock
//!
//! The machine never reaches for globals; each collaborator is injected and
//! has an in-memory implementation suitable for tests and headless runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::symbols::Symbol;

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Sound cue emitted by a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "cue", content = "symbol", rename_all = "snake_case")]
pub enum SoundCue {
    Spin,
    Win(Symbol),
    Jackpot,
    NearMiss,
}

/// Sound playback sink
pub trait AudioPort: Send + Sync {
    fn play(&self, cue: SoundCue);
}

/// Discards every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioPort for SilentAudio {
    fn play(&self, _cue: SoundCue) {}
}

/// Keeps cues in order, for assertions
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    cues: Arc<Mutex<Vec<SoundCue>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<SoundCue> {
        self.cues.lock().clone()
    }

    pub fn take(&self) -> Vec<SoundCue> {
        std::mem::take(&mut *self.cues.lock())
    }
}

impl AudioPort for RecordingAudio {
    fn play(&self, cue: SoundCue) {
        self.cues.lock().push(cue);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-session boolean flags (e.g. "has seen intro")
pub trait SessionStore: Send + Sync {
    fn get_flag(&self, key: &str) -> bool;
    fn set_flag(&self, key: &str, value: bool);
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    flags: Arc<RwLock<HashMap<String, bool>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_flag(&self, key: &str) -> bool {
        self.flags.read().get(key).copied().unwrap_or(false)
    }

    fn set_flag(&self, key: &str, value: bool) {
        self.flags.write().insert(key.to_string(), value);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_audio_keeps_order() {
        let audio = RecordingAudio::new();
        let handle = audio.clone();
        audio.play(SoundCue::Spin);
        audio.play(SoundCue::Win(Symbol::Bell));
        assert_eq!(handle.cues(), vec![SoundCue::Spin, SoundCue::Win(Symbol::Bell)]);
        assert_eq!(handle.take().len(), 2);
        assert!(audio.cues().is_empty());
    }

    #[test]
    fn test_memory_store_defaults_false() {
        let store = MemorySessionStore::new();
        assert!(!store.get_flag("has_seen_intro"));
        store.set_flag("has_seen_intro", true);
        assert!(store.get_flag("has_seen_intro"));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.advance(Duration::minutes(3));
        assert_eq!(clock.now() - start, Duration::minutes(3));
    }

    #[test]
    fn test_sound_cue_serde() {
        let json = serde_json::to_string(&SoundCue::Win(Symbol::Axe)).unwrap();
        assert_eq!(json, r#"{"cue":"win","symbol":"axe"}"#);
    }
}
