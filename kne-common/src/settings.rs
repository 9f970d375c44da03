//! Accessibility settings
//!
//! Flat bag of toggles persisted as a single JSON blob. Loaded once at
//! startup and overwritten wholesale on every update.

use serde::{Deserialize, Serialize};

/// Speech synthesis rate preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechRate {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl SpeechRate {
    /// Playback rate multiplier handed to the speech platform
    pub fn multiplier(&self) -> f32 {
        match self {
            SpeechRate::Slow => 0.7,
            SpeechRate::Normal => 1.0,
            SpeechRate::Fast => 1.3,
        }
    }
}

/// Accessibility preferences of the kitchen display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilitySettings {
    /// Show visual alerts alongside sounds
    pub visual_alerts: bool,
    /// Use full-screen flash instead of a border pulse
    pub flash_screen: bool,
    /// Show captions for notifications
    pub subtitles: bool,
    pub high_contrast: bool,
    /// Bass-boost notification sounds
    pub hearing_aid_mode: bool,
    /// Speak notifications aloud
    pub speech_enabled: bool,
    pub slow_speech: bool,
    pub speech_rate: SpeechRate,
    pub voice_commands: bool,
    /// Announce notifications through the screen-reader live region
    pub screen_reader: bool,
    /// BCP-47 language tag used for captions, speech and command responses
    pub language: String,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            visual_alerts: true,
            flash_screen: false,
            subtitles: true,
            high_contrast: false,
            hearing_aid_mode: false,
            speech_enabled: false,
            slow_speech: false,
            speech_rate: SpeechRate::Normal,
            voice_commands: false,
            screen_reader: true,
            language: "en-US".to_string(),
        }
    }
}

impl AccessibilitySettings {
    /// Merge a partial update into these settings
    pub fn apply(&mut self, update: &AccessibilitySettingsUpdate) {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(value) = &update.$field {
                    self.$field = value.clone();
                })*
            };
        }
        merge!(
            visual_alerts,
            flash_screen,
            subtitles,
            high_contrast,
            hearing_aid_mode,
            speech_enabled,
            slow_speech,
            speech_rate,
            voice_commands,
            screen_reader,
            language
        );
    }

    /// Effective speech rate after the slow-speech override
    pub fn effective_speech_rate(&self) -> f32 {
        let rate = self.speech_rate.multiplier();
        if self.slow_speech {
            rate.min(SpeechRate::Slow.multiplier())
        } else {
            rate
        }
    }
}

/// Partial settings update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilitySettingsUpdate {
    pub visual_alerts: Option<bool>,
    pub flash_screen: Option<bool>,
    pub subtitles: Option<bool>,
    pub high_contrast: Option<bool>,
    pub hearing_aid_mode: Option<bool>,
    pub speech_enabled: Option<bool>,
    pub slow_speech: Option<bool>,
    pub speech_rate: Option<SpeechRate>,
    pub voice_commands: Option<bool>,
    pub screen_reader: Option<bool>,
    pub language: Option<String>,
}
