//! Speech output channel
//!
//! Last one wins: any utterance in flight is cancelled before the next
//! one starts.

use crate::accessibility::platform::{guard, SpeechSynthesizer, Utterance, VoiceInfo};
use crate::error::{Error, Result};
use kne_common::AccessibilitySettings;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pick a voice for `language`
///
/// Exact tag match first (case-insensitive), then primary subtag match.
/// `None` leaves the choice to the platform default.
pub fn select_voice(voices: &[VoiceInfo], language: &str) -> Option<VoiceInfo> {
    let wanted = language.trim().to_ascii_lowercase().replace('_', "-");
    if let Some(voice) = voices
        .iter()
        .find(|v| v.language.to_ascii_lowercase().replace('_', "-") == wanted)
    {
        return Some(voice.clone());
    }

    let primary = primary_subtag(&wanted);
    voices
        .iter()
        .find(|v| primary_subtag(&v.language.to_ascii_lowercase()) == primary)
        .cloned()
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

#[derive(Clone)]
pub struct SpeechChannel {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl SpeechChannel {
    pub fn new(synthesizer: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { synthesizer }
    }

    pub fn is_available(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Build the utterance for `text` under the current settings
    pub fn utterance(&self, text: &str, settings: &AccessibilitySettings) -> Utterance {
        let voice = self
            .synthesizer
            .as_ref()
            .and_then(|s| select_voice(&s.voices(), &settings.language));
        Utterance {
            text: text.to_string(),
            language: settings.language.clone(),
            rate: settings.effective_speech_rate(),
            voice,
        }
    }

    /// Cancel whatever is being spoken and speak `text`
    pub fn speak(&self, text: &str, settings: &AccessibilitySettings) -> Result<()> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or_else(|| Error::Capability("No speech synthesizer available".to_string()))?;

        guard("speech synthesizer", || {
            let utterance = self.utterance(text, settings);
            synthesizer.cancel();
            debug!(
                "Speaking '{}' (rate {:.1}, voice {:?})",
                utterance.text,
                utterance.rate,
                utterance.voice.as_ref().map(|v| v.name.as_str())
            );
            synthesizer.speak(&utterance)
        })
    }

    pub fn cancel(&self) {
        if let Some(synthesizer) = &self.synthesizer {
            let cancelled = guard("speech synthesizer", || {
                synthesizer.cancel();
                Ok(())
            });
            if let Err(e) = cancelled {
                warn!("Speech cancel failed: {}", e);
            }
        }
    }
}
