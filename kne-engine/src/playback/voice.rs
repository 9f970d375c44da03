//! Voice parameters and bookkeeping
//!
//! A voice is one playback of one sound. Backends receive a fully prepared
//! [`VoiceSpec`] and report completion through the shared [`VoiceTracker`].

use crate::audio::SoundBuffer;
use kne_common::{SoundType, UrgencyLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Identifier of one started voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceId(pub u64);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice-{}", self.0)
    }
}

/// Source position relative to the listener (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SpatialPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Caller-facing playback parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayParams {
    /// Contextual volume (0.0-1.0) before master volume
    pub volume: f32,
    pub priority: UrgencyLevel,
    pub spatial: Option<SpatialPosition>,
}

impl PlayParams {
    pub fn new(volume: f32, priority: UrgencyLevel) -> Self {
        Self {
            volume,
            priority,
            spatial: None,
        }
    }

    pub fn with_spatial(mut self, position: SpatialPosition) -> Self {
        self.spatial = Some(position);
        self
    }
}

impl Default for PlayParams {
    fn default() -> Self {
        Self::new(0.7, UrgencyLevel::Medium)
    }
}

/// Optional effect stages (graph backend only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectOptions {
    pub bass_boost: bool,
    pub reverb: bool,
}

/// Everything a backend needs to render one voice
#[derive(Debug, Clone)]
pub struct VoiceSpec {
    pub id: VoiceId,
    pub sound_type: SoundType,
    /// Already at the backend's sample rate
    pub buffer: SoundBuffer,
    /// Per-asset pre-gain
    pub source_gain: f32,
    /// Final voice gain, already clamped
    pub gain: f32,
    pub effects: EffectOptions,
    pub spatial: Option<SpatialPosition>,
}

/// Set of currently playing voices
///
/// Cloned handles share one set.
#[derive(Debug, Clone, Default)]
pub struct VoiceTracker {
    playing: Arc<Mutex<HashSet<VoiceId>>>,
}

impl VoiceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: VoiceId) {
        if let Ok(mut playing) = self.playing.lock() {
            playing.insert(id);
        }
    }

    /// Remove a finished voice
    pub fn complete(&self, id: VoiceId) {
        if let Ok(mut playing) = self.playing.lock() {
            playing.remove(&id);
        }
    }

    /// Non-blocking variant for the audio thread
    ///
    /// Returns false when the set is busy; the caller retries later.
    pub fn try_complete(&self, id: VoiceId) -> bool {
        match self.playing.try_lock() {
            Ok(mut playing) => {
                playing.remove(&id);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear(&self) {
        if let Ok(mut playing) = self.playing.lock() {
            playing.clear();
        }
    }

    pub fn contains(&self, id: VoiceId) -> bool {
        self.playing
            .lock()
            .map(|p| p.contains(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.playing.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
