//! Host accessibility capabilities
//!
//! The engine never talks to a speech engine, recognizer or screen reader
//! directly. Hosts plug in implementations of these traits; missing ones
//! disable only the channel that needs them.

use crate::error::{Error, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Call into a host capability, turning a panic into `Error::Capability`
///
/// Host code runs on the dispatching task; a panic there must stay
/// inside the channel that made the call.
pub fn guard<T>(capability: &str, call: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(Error::Capability(format!(
            "{} panicked: {}",
            capability,
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Voice offered by the platform speech synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP 47 tag, e.g. "es-MX"
    pub language: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// One request to speak
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    /// 1.0 = normal speed
    pub rate: f32,
    /// None = platform default voice
    pub voice: Option<VoiceInfo>,
}

/// Text-to-speech capability
pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start speaking; returns without waiting for speech to finish
    fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Cancel the utterance in flight, if any
    fn cancel(&self);
}

/// Continuous speech recognition capability
pub trait SpeechRecognizer: Send + Sync {
    /// Start a recognition session
    ///
    /// Final transcripts are sent on `transcripts`. The session ends when
    /// the recognizer drops the sender.
    fn start(&self, language: &str, transcripts: mpsc::UnboundedSender<String>) -> Result<()>;

    fn stop(&self);
}

/// Assertive screen-reader live region
pub trait LiveRegion: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Synthesizer that accepts and discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpeech;

impl SpeechSynthesizer for NoopSpeech {
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    fn speak(&self, _utterance: &Utterance) -> Result<()> {
        Ok(())
    }

    fn cancel(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLiveRegion;

impl LiveRegion for NoopLiveRegion {
    fn set_text(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Set of capabilities available on the host
#[derive(Clone, Default)]
pub struct AccessibilityPlatform {
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
    pub recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pub live_region: Option<Arc<dyn LiveRegion>>,
}

impl AccessibilityPlatform {
    /// No-op speech and live region, no recognizer
    pub fn headless() -> Self {
        Self {
            speech: Some(Arc::new(NoopSpeech)),
            recognizer: None,
            live_region: Some(Arc::new(NoopLiveRegion)),
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_live_region(mut self, live_region: Arc<dyn LiveRegion>) -> Self {
        self.live_region = Some(live_region);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_passes_results_through() {
        assert_eq!(guard("speech", || Ok(7)).unwrap(), 7);
        assert!(matches!(
            guard::<()>("speech", || Err(Error::Capability("down".to_string()))),
            Err(Error::Capability(msg)) if msg == "down"
        ));
    }

    #[test]
    fn test_guard_catches_panics() {
        let result: Result<()> = guard("live region", || panic!("region gone"));
        match result {
            Err(Error::Capability(msg)) => {
                assert_eq!(msg, "live region panicked: region gone");
            }
            other => panic!("expected capability error, got {:?}", other),
        }

        let code = 3;
        let result: Result<()> = guard("speech", || panic!("engine exited with {}", code));
        assert!(matches!(result, Err(Error::Capability(msg)) if msg.ends_with("engine exited with 3")));
    }
}
