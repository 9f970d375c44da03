//! Test helpers for kne-engine integration tests
//!
//! Provides reusable test infrastructure:
//! - RecordingBackend: audio backend that records every voice it is handed
//! - RecordingSpeech / ScriptedRecognizer / RecordingLiveRegion: host
//!   capabilities that record calls and can be told to fail
//! - TestHarness: a fully wired engine on a fixed clock

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use kne_common::config::EngineConfig;
use kne_common::db::SettingsStore;
use kne_common::events::EventBus;
use kne_common::time::FixedClock;
use kne_engine::accessibility::{
    AccessibilityPlatform, LiveRegion, SpeechRecognizer, SpeechSynthesizer, Utterance, VoiceInfo,
};
use kne_engine::playback::{
    AudioBackend, BackendKind, PlaybackEngine, SoundRegistry, VoiceSpec, VoiceTracker,
};
use kne_engine::{EngineComponents, Error, NotificationEngine, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const TEST_SAMPLE_RATE: u32 = 8_000;

/// Voice as seen by the backend
#[derive(Debug, Clone)]
pub struct StartedVoice {
    pub spec: VoiceSpec,
    pub started_at: Instant,
}

/// Backend that records voices and completes them after their duration
pub struct RecordingBackend {
    kind: BackendKind,
    voices: Mutex<Vec<StartedVoice>>,
    stop_calls: AtomicUsize,
    fail: AtomicBool,
    stream_errors: AtomicU32,
}

impl RecordingBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            voices: Mutex::new(Vec::new()),
            stop_calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            stream_errors: AtomicU32::new(0),
        }
    }

    pub fn voices(&self) -> Vec<StartedVoice> {
        self.voices.lock().unwrap().clone()
    }

    pub fn started(&self) -> usize {
        self.voices.lock().unwrap().len()
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Make every later `start_voice` fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Simulate the device reporting a stream error
    pub fn report_stream_error(&self) {
        self.stream_errors.fetch_add(1, Ordering::SeqCst);
    }
}

impl AudioBackend for RecordingBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn sample_rate(&self) -> u32 {
        TEST_SAMPLE_RATE
    }

    fn start_voice(&self, voice: VoiceSpec, tracker: &VoiceTracker) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Backend("device unplugged".to_string()));
        }

        let id = voice.id;
        let duration = voice.buffer.duration();
        self.voices.lock().unwrap().push(StartedVoice {
            spec: voice,
            started_at: Instant::now(),
        });

        let tracker = tracker.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tracker.complete(id);
        });
        Ok(())
    }

    fn stop_all(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn shutdown(&self) {}

    fn stream_errors(&self) -> u32 {
        self.stream_errors.load(Ordering::SeqCst)
    }
}

/// Speech synthesizer that records utterances
#[derive(Default)]
pub struct RecordingSpeech {
    voices: Vec<VoiceInfo>,
    spoken: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voices(voices: Vec<VoiceInfo>) -> Self {
        Self {
            voices,
            ..Default::default()
        }
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|u| u.text).collect()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl SpeechSynthesizer for RecordingSpeech {
    fn voices(&self) -> Vec<VoiceInfo> {
        self.voices.clone()
    }

    fn speak(&self, utterance: &Utterance) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Capability("speech engine crashed".to_string()));
        }
        self.spoken.lock().unwrap().push(utterance.clone());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Recognizer driven by the test
///
/// Each `start` hands out a fresh session; `say` feeds the live one and
/// `end_session` drops it, as a platform does when its stream ends.
#[derive(Default)]
pub struct ScriptedRecognizer {
    session: Mutex<Option<mpsc::UnboundedSender<String>>>,
    languages: Mutex<Vec<String>>,
    stops: AtomicUsize,
    attempts: AtomicUsize,
    refuse: AtomicBool,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.languages.lock().unwrap().len()
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn has_session(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    /// Deliver a final transcript; false when no session is live
    pub fn say(&self, transcript: &str) -> bool {
        match self.session.lock().unwrap().as_ref() {
            Some(tx) => tx.send(transcript.to_string()).is_ok(),
            None => false,
        }
    }

    pub fn end_session(&self) {
        self.session.lock().unwrap().take();
    }

    /// Calls to `start`, including refused ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Make `start` fail, as a platform does when permission is denied
    pub fn set_refusing(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&self, language: &str, transcripts: mpsc::UnboundedSender<String>) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(Error::Capability("microphone permission denied".to_string()));
        }
        self.languages.lock().unwrap().push(language.to_string());
        *self.session.lock().unwrap() = Some(transcripts);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.session.lock().unwrap().take();
    }
}

/// Live region that records every write
#[derive(Default)]
pub struct RecordingLiveRegion {
    writes: Mutex<Vec<String>>,
    fail: AtomicBool,
    panic: AtomicBool,
}

impl RecordingLiveRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Writes other than the clearing empty string
    pub fn announcements(&self) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter(|w| !w.is_empty())
            .collect()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make every write panic instead of returning an error
    pub fn set_panicking(&self, panic: bool) {
        self.panic.store(panic, Ordering::SeqCst);
    }
}

impl LiveRegion for RecordingLiveRegion {
    fn set_text(&self, text: &str) -> Result<()> {
        if self.panic.load(Ordering::SeqCst) {
            panic!("live region bridge crashed");
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Capability("live region detached".to_string()));
        }
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Local time on Wednesday 2024-03-06
pub fn wednesday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 6)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Local time on Saturday 2024-03-09
pub fn saturday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Write a short stereo sine WAV file
pub fn write_wav(path: &Path, frequency: f32, millis: u32, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = sample_rate * millis / 1000;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = (t * frequency * 2.0 * std::f32::consts::PI).sin() * 0.5;
        let value = (sample * i16::MAX as f32) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

/// Engine wired to recording capabilities on a fixed clock
pub struct TestHarness {
    pub engine: NotificationEngine,
    pub backend: Arc<RecordingBackend>,
    pub speech: Arc<RecordingSpeech>,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub live_region: Arc<RecordingLiveRegion>,
    pub clock: Arc<FixedClock>,
    pub event_bus: EventBus,
    pub assets: TempDir,
}

pub struct HarnessBuilder {
    at: NaiveDateTime,
    kind: BackendKind,
    master_volume: f32,
    recognizer: bool,
    assets: Vec<(&'static str, u32)>,
    settings_store: Option<SettingsStore>,
}

impl HarnessBuilder {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            at,
            kind: BackendKind::Graph,
            master_volume: 1.0,
            recognizer: true,
            assets: Vec::new(),
            settings_store: None,
        }
    }

    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn master_volume(mut self, volume: f32) -> Self {
        self.master_volume = volume;
        self
    }

    pub fn without_recognizer(mut self) -> Self {
        self.recognizer = false;
        self
    }

    pub fn settings_store(mut self, store: SettingsStore) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Write `{stem}.wav` of the given length into the asset directory
    pub fn asset(mut self, stem: &'static str, millis: u32) -> Self {
        self.assets.push((stem, millis));
        self
    }

    pub fn build(self) -> TestHarness {
        let assets = TempDir::new().unwrap();
        for (stem, millis) in &self.assets {
            write_wav(
                &assets.path().join(format!("{}.wav", stem)),
                440.0,
                *millis,
                TEST_SAMPLE_RATE,
            );
        }

        let backend = Arc::new(RecordingBackend::new(self.kind));
        let speech = Arc::new(RecordingSpeech::new());
        let recognizer = Arc::new(ScriptedRecognizer::new());
        let live_region = Arc::new(RecordingLiveRegion::new());
        let clock = Arc::new(FixedClock::new(self.at));
        let event_bus = EventBus::new(256);

        let playback = Arc::new(PlaybackEngine::with_backend(
            backend.clone(),
            SoundRegistry::new(assets.path(), None),
            self.master_volume,
        ));

        let mut platform = AccessibilityPlatform::default()
            .with_speech(speech.clone())
            .with_live_region(live_region.clone());
        if self.recognizer {
            platform = platform.with_recognizer(recognizer.clone());
        }

        let config = EngineConfig {
            assets_dir: assets.path().to_path_buf(),
            context_check_interval_secs: 0,
            ..Default::default()
        };

        let engine = NotificationEngine::new(
            config,
            EngineComponents {
                playback,
                platform,
                clock: clock.clone(),
                settings_store: self.settings_store,
                event_bus: event_bus.clone(),
            },
        );

        TestHarness {
            engine,
            backend,
            speech,
            recognizer,
            live_region,
            clock,
            event_bus,
            assets,
        }
    }
}

impl TestHarness {
    /// Built and initialized engine at `at`
    pub async fn start(at: NaiveDateTime) -> Self {
        let harness = HarnessBuilder::new(at).build();
        harness.engine.init().await;
        harness
    }
}

/// Let spawned tasks run without moving paused time
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance paused time in small steps so chained timers all fire
pub async fn advance(total: Duration) {
    let step = Duration::from_millis(10);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        tokio::time::advance(step).await;
        settle().await;
        elapsed += step;
    }
}
