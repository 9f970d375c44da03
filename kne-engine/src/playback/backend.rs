//! Audio backend abstraction
//!
//! The playback engine talks to exactly one backend chosen at startup:
//! the effects-capable graph backend (cpal), the simple sample backend
//! (rodio), or the headless backend when no device can be opened.

use crate::audio::resampler::DEFAULT_SAMPLE_RATE;
use crate::error::Result;
use crate::playback::voice::{VoiceSpec, VoiceTracker};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Graph,
    Sample,
    Headless,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Graph => "graph",
            BackendKind::Sample => "sample",
            BackendKind::Headless => "headless",
        }
    }

    /// Whether the backend renders the bass/reverb/panner chain
    pub fn supports_effects(&self) -> bool {
        matches!(self, BackendKind::Graph)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output capability used by the playback engine
///
/// `start_voice` must return promptly: rendering happens on the backend's
/// own thread, which calls `tracker.complete` (or `try_complete`) once the
/// voice has finished.
pub trait AudioBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Rate voices must be rendered at
    fn sample_rate(&self) -> u32;

    fn start_voice(&self, voice: VoiceSpec, tracker: &VoiceTracker) -> Result<()>;

    /// Halt every voice immediately
    fn stop_all(&self);

    /// Release the device; later voices are dropped
    fn shutdown(&self);

    /// Errors the output stream has reported since it opened
    fn stream_errors(&self) -> u32 {
        0
    }
}

/// Backend without an output device
///
/// Keeps the playing set accurate by completing each voice after its
/// nominal duration.
#[derive(Debug, Default)]
pub struct HeadlessBackend;

impl HeadlessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for HeadlessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Headless
    }

    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }

    fn start_voice(&self, voice: VoiceSpec, tracker: &VoiceTracker) -> Result<()> {
        let duration = voice.buffer.duration();
        debug!("Headless voice {} ({:?})", voice.id, duration);
        complete_after(tracker.clone(), voice, duration);
        Ok(())
    }

    fn stop_all(&self) {}

    fn shutdown(&self) {}
}

/// Complete a voice after `duration` on the runtime, or at once without one
fn complete_after(tracker: VoiceTracker, voice: VoiceSpec, duration: Duration) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(duration).await;
                tracker.complete(voice.id);
            });
        }
        Err(_) => tracker.complete(voice.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundBuffer;
    use crate::playback::voice::{EffectOptions, VoiceId};
    use kne_common::SoundType;

    fn spec(id: u64, frames: usize) -> VoiceSpec {
        VoiceSpec {
            id: VoiceId(id),
            sound_type: SoundType::Tick,
            buffer: SoundBuffer::new(vec![0.0; frames * 2], 1000),
            source_gain: 1.0,
            gain: 0.5,
            effects: EffectOptions::default(),
            spatial: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_headless_completes_after_duration() {
        let backend = HeadlessBackend::new();
        let tracker = VoiceTracker::new();
        tracker.register(VoiceId(7));

        backend.start_voice(spec(7, 500), &tracker).unwrap();
        tokio::task::yield_now().await;
        assert!(tracker.contains(VoiceId(7)));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!tracker.contains(VoiceId(7)));
    }

    #[test]
    fn test_headless_without_runtime_completes_immediately() {
        let backend = HeadlessBackend::new();
        let tracker = VoiceTracker::new();
        tracker.register(VoiceId(1));
        backend.start_voice(spec(1, 10), &tracker).unwrap();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_only_graph_supports_effects() {
        assert!(BackendKind::Graph.supports_effects());
        assert!(!BackendKind::Sample.supports_effects());
        assert!(!BackendKind::Headless.supports_effects());
    }
}
