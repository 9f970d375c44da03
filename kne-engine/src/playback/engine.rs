//! Playback engine
//!
//! Chooses a backend at startup, decodes and caches assets at the backend's
//! rate, substitutes a synthesized tone for missing assets and keeps the
//! playing-voice set and the recent sound event log.
//!
//! Backend selection order: graph (when enabled) → sample → headless.
//! Any fallback caused by an error is recorded as the degraded reason.

use crate::audio::{synth, AssetDecoder, Resampler, SoundBuffer};
use crate::error::Result;
use crate::playback::backend::{AudioBackend, BackendKind, HeadlessBackend};
use crate::playback::graph::GraphBackend;
use crate::playback::registry::{self, SoundRegistry};
use crate::playback::sampler::SampleBackend;
use crate::playback::voice::{EffectOptions, PlayParams, VoiceId, VoiceSpec, VoiceTracker};
use chrono::{DateTime, Utc};
use kne_common::config::EngineConfig;
use kne_common::{SoundType, UrgencyLevel};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum entries kept in the sound event log
pub const SOUND_EVENT_CAP: usize = 50;

/// Minimum and maximum voice gain
pub const MIN_VOICE_GAIN: f32 = 0.1;
pub const MAX_VOICE_GAIN: f32 = 1.0;

/// Result of one successful `play`
#[derive(Debug, Clone, PartialEq)]
pub struct PlayOutcome {
    pub voice_id: VoiceId,
    /// Length of the rendered buffer (excluding effect tails)
    pub duration: Duration,
    /// True when a fallback tone replaced the asset
    pub synthesized: bool,
    pub backend: BackendKind,
}

/// One voice started by the engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundEvent {
    pub voice_id: VoiceId,
    pub sound_type: SoundType,
    pub volume: f32,
    pub priority: UrgencyLevel,
    pub backend: BackendKind,
    pub synthesized: bool,
    pub timestamp: DateTime<Utc>,
}

/// Cached outcome of loading one asset
#[derive(Debug, Clone)]
enum CachedAsset {
    Decoded(SoundBuffer),
    Unavailable(String),
}

pub struct PlaybackEngine {
    backend: Arc<dyn AudioBackend>,
    registry: SoundRegistry,
    cache: RwLock<HashMap<SoundType, CachedAsset>>,
    tracker: VoiceTracker,
    master_volume: Arc<Mutex<f32>>,
    bass_boost: bool,
    reverb: bool,
    hearing_aid_mode: AtomicBool,
    sound_events: Mutex<VecDeque<SoundEvent>>,
    next_voice: AtomicU64,
    degraded_reason: Option<String>,
}

impl PlaybackEngine {
    /// Probe backends and build the engine; never fails
    pub fn init(config: &EngineConfig) -> Self {
        let device = config.audio.device.as_deref();
        let mut failures: Vec<String> = Vec::new();

        let backend: Arc<dyn AudioBackend> = 'probe: {
            if config.audio.prefer_graph_backend {
                match GraphBackend::open(device) {
                    Ok(backend) => break 'probe Arc::new(backend),
                    Err(e) => {
                        warn!("Graph backend unavailable, trying sample backend: {}", e);
                        failures.push(e.to_string());
                    }
                }
            } else {
                info!("Graph backend disabled by configuration");
            }

            match SampleBackend::open(device) {
                Ok(backend) => break 'probe Arc::new(backend),
                Err(e) => {
                    warn!("Sample backend unavailable, running headless: {}", e);
                    failures.push(e.to_string());
                }
            }

            Arc::new(HeadlessBackend::new())
        };

        let degraded_reason = if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        };

        let registry = SoundRegistry::new(&config.assets_dir, config.sound_variant.clone());
        let mut engine = Self::with_backend(backend, registry, config.audio.master_volume);
        engine.bass_boost = config.audio.bass_boost;
        engine.reverb = config.audio.reverb;
        engine.degraded_reason = degraded_reason;

        info!(
            "Playback engine using {} backend (assets: {})",
            engine.backend.kind(),
            engine.registry.assets_dir().display()
        );
        engine
    }

    /// Build around an explicit backend
    pub fn with_backend(
        backend: Arc<dyn AudioBackend>,
        registry: SoundRegistry,
        master_volume: f32,
    ) -> Self {
        Self {
            backend,
            registry,
            cache: RwLock::new(HashMap::new()),
            tracker: VoiceTracker::new(),
            master_volume: Arc::new(Mutex::new(master_volume.clamp(0.0, 1.0))),
            bass_boost: false,
            reverb: false,
            hearing_aid_mode: AtomicBool::new(false),
            sound_events: Mutex::new(VecDeque::with_capacity(SOUND_EVENT_CAP)),
            next_voice: AtomicU64::new(1),
            degraded_reason: None,
        }
    }

    /// Enable effect stages (graph backend only)
    pub fn with_effects(mut self, bass_boost: bool, reverb: bool) -> Self {
        self.bass_boost = bass_boost;
        self.reverb = reverb;
        self
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Why the preferred backend was not used, if it failed
    pub fn degraded_reason(&self) -> Option<&str> {
        self.degraded_reason.as_deref()
    }

    pub fn registry(&self) -> &SoundRegistry {
        &self.registry
    }

    /// Decode every asset into the cache
    ///
    /// Returns the number of sound types with a usable asset.
    pub fn preload(&self) -> usize {
        let loaded = SoundType::ALL
            .iter()
            .filter(|sound| matches!(self.cached_asset(**sound), CachedAsset::Decoded(_)))
            .count();
        info!("Preloaded {}/{} sound assets", loaded, SoundType::ALL.len());
        loaded
    }

    /// Play one sound
    ///
    /// Asset failures fall back to a synthesized tone and are not errors.
    /// The error path is reserved for the backend refusing the voice.
    pub fn play(&self, sound_type: SoundType, params: PlayParams) -> Result<PlayOutcome> {
        let asset = registry::asset(sound_type);

        let (buffer, synthesized) = match self.cached_asset(sound_type) {
            CachedAsset::Decoded(buffer) => (buffer, false),
            CachedAsset::Unavailable(reason) => {
                warn!(
                    "Asset for {} unavailable ({}), playing synthesized tone",
                    sound_type, reason
                );
                (
                    synth::tone_sequence(asset.fallback_frequencies, self.backend.sample_rate()),
                    true,
                )
            }
        };

        let gain = self.voice_gain(params.volume);
        let id = VoiceId(self.next_voice.fetch_add(1, Ordering::SeqCst));
        let duration = buffer.duration();

        let spec = VoiceSpec {
            id,
            sound_type,
            buffer,
            source_gain: asset.base_volume,
            gain,
            effects: self.effect_options(),
            spatial: params.spatial,
        };

        self.tracker.register(id);
        if let Err(e) = self.backend.start_voice(spec, &self.tracker) {
            self.tracker.complete(id);
            return Err(e);
        }

        debug!(
            "Started {} for {} (gain {:.2}, priority {}, {:?})",
            id, sound_type, gain, params.priority, duration
        );

        self.record_event(SoundEvent {
            voice_id: id,
            sound_type,
            volume: gain,
            priority: params.priority,
            backend: self.backend.kind(),
            synthesized,
            timestamp: Utc::now(),
        });

        Ok(PlayOutcome {
            voice_id: id,
            duration,
            synthesized,
            backend: self.backend.kind(),
        })
    }

    /// `clamp(master × contextual, 0.1, 1.0)`, read at voice creation
    pub fn voice_gain(&self, contextual_volume: f32) -> f32 {
        let raw = self.master_volume() * contextual_volume;
        if raw.is_finite() {
            raw.clamp(MIN_VOICE_GAIN, MAX_VOICE_GAIN)
        } else {
            MIN_VOICE_GAIN
        }
    }

    fn effect_options(&self) -> EffectOptions {
        if !self.backend.kind().supports_effects() {
            return EffectOptions::default();
        }
        EffectOptions {
            bass_boost: self.bass_boost || self.hearing_aid_mode.load(Ordering::SeqCst),
            reverb: self.reverb,
        }
    }

    /// Halt every voice and clear the playing set
    pub fn stop_all(&self) {
        self.backend.stop_all();
        self.tracker.clear();
        info!("Stopped all voices");
    }

    pub fn shutdown(&self) {
        self.stop_all();
        self.backend.shutdown();
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume.lock().map(|v| *v).unwrap_or(1.0)
    }

    /// Set master volume, clamped to [0, 1]; NaN is ignored
    pub fn set_master_volume(&self, volume: f32) -> f32 {
        if let Ok(mut current) = self.master_volume.lock() {
            if !volume.is_nan() {
                *current = volume.clamp(0.0, 1.0);
            }
            *current
        } else {
            1.0
        }
    }

    pub fn set_hearing_aid_mode(&self, enabled: bool) {
        self.hearing_aid_mode.store(enabled, Ordering::SeqCst);
    }

    pub fn hearing_aid_mode(&self) -> bool {
        self.hearing_aid_mode.load(Ordering::SeqCst)
    }

    pub fn active_voices(&self) -> usize {
        self.tracker.len()
    }

    pub fn stream_errors(&self) -> u32 {
        self.backend.stream_errors()
    }

    pub fn is_playing(&self, id: VoiceId) -> bool {
        self.tracker.contains(id)
    }

    /// Recent sound events, oldest first
    pub fn sound_events(&self) -> Vec<SoundEvent> {
        self.sound_events
            .lock()
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record_event(&self, event: SoundEvent) {
        if let Ok(mut events) = self.sound_events.lock() {
            if events.len() >= SOUND_EVENT_CAP {
                events.pop_front();
            }
            events.push_back(event);
        }
    }

    fn cached_asset(&self, sound_type: SoundType) -> CachedAsset {
        if let Ok(cache) = self.cache.read() {
            if let Some(asset) = cache.get(&sound_type) {
                return asset.clone();
            }
        }

        let loaded = self.load_asset(sound_type);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(sound_type, loaded.clone());
        }
        loaded
    }

    fn load_asset(&self, sound_type: SoundType) -> CachedAsset {
        let Some(path) = self.registry.resolve_path(sound_type) else {
            return CachedAsset::Unavailable("no asset file".to_string());
        };

        let target_rate = self.backend.sample_rate();
        let decoded = AssetDecoder::decode(&path).and_then(|(samples, rate)| {
            Resampler::resample(&samples, rate, target_rate)
        });

        match decoded {
            Ok(samples) => {
                debug!("Cached {} from {}", sound_type, path.display());
                CachedAsset::Decoded(SoundBuffer::new(samples, target_rate))
            }
            Err(e) => CachedAsset::Unavailable(format!("{}: {}", path.display(), e)),
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.backend.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_engine(dir: &std::path::Path) -> PlaybackEngine {
        PlaybackEngine::with_backend(
            Arc::new(HeadlessBackend::new()),
            SoundRegistry::new(dir, None),
            0.8,
        )
    }

    #[test]
    fn test_voice_gain_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let engine = headless_engine(dir.path());
        assert_eq!(engine.voice_gain(0.0), MIN_VOICE_GAIN);
        assert_eq!(engine.voice_gain(5.0), MAX_VOICE_GAIN);
        assert!((engine.voice_gain(0.5) - 0.4).abs() < 1e-6);
        assert_eq!(engine.voice_gain(f32::NAN), MIN_VOICE_GAIN);
    }

    #[test]
    fn test_master_volume_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let engine = headless_engine(dir.path());
        assert_eq!(engine.set_master_volume(1.7), 1.0);
        assert_eq!(engine.set_master_volume(-0.2), 0.0);
        assert_eq!(engine.set_master_volume(f32::NAN), 0.0);
    }

    #[test]
    fn test_missing_asset_synthesizes() {
        let dir = tempfile::tempdir().unwrap();
        let engine = headless_engine(dir.path());
        let outcome = engine
            .play(SoundType::Bell, PlayParams::new(0.7, UrgencyLevel::Low))
            .unwrap();
        assert!(outcome.synthesized);
        assert_eq!(outcome.backend, BackendKind::Headless);
        assert!(outcome.duration > Duration::ZERO);
    }

    #[test]
    fn test_sound_event_log_capped() {
        let dir = tempfile::tempdir().unwrap();
        let engine = headless_engine(dir.path());
        for _ in 0..(SOUND_EVENT_CAP + 7) {
            engine
                .play(SoundType::Tick, PlayParams::default())
                .unwrap();
        }
        let events = engine.sound_events();
        assert_eq!(events.len(), SOUND_EVENT_CAP);
        assert_eq!(events[0].voice_id, VoiceId(8));
    }

    #[test]
    fn test_effects_only_on_graph_backend() {
        let dir = tempfile::tempdir().unwrap();
        let engine = headless_engine(dir.path()).with_effects(true, true);
        engine.set_hearing_aid_mode(true);
        assert_eq!(engine.effect_options(), EffectOptions::default());
    }
}
