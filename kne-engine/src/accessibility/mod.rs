//! Accessibility broadcaster
//!
//! Fans each notification out to the visual, caption, speech and
//! screen-reader channels. Channels are independent: one failing is logged
//! and never stops the others.

pub mod announcer;
pub mod captions;
pub mod phrases;
pub mod platform;
pub mod speech;
pub mod visual;
pub mod voice_commands;

pub use announcer::Announcer;
pub use captions::CaptionQueue;
pub use platform::{
    AccessibilityPlatform, LiveRegion, NoopLiveRegion, NoopSpeech, SpeechRecognizer,
    SpeechSynthesizer, Utterance, VoiceInfo,
};
pub use speech::SpeechChannel;
pub use visual::VisualAlertQueue;
pub use voice_commands::VoiceCommandListener;

use crate::notification::Notification;
use kne_common::alerts::CaptionCategory;
use kne_common::events::EventBus;
use kne_common::AccessibilitySettings;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

/// Channels that delivered one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub visual: bool,
    pub caption: bool,
    pub speech: bool,
    pub announcement: bool,
}

pub struct AccessibilityBroadcaster {
    visual: VisualAlertQueue,
    captions: CaptionQueue,
    speech: SpeechChannel,
    announcer: Announcer,
    voice_commands: VoiceCommandListener,
}

impl AccessibilityBroadcaster {
    pub fn new(
        platform: AccessibilityPlatform,
        settings: Arc<RwLock<AccessibilitySettings>>,
        event_bus: EventBus,
    ) -> Self {
        let speech = SpeechChannel::new(platform.speech);
        Self {
            visual: VisualAlertQueue::new(event_bus.clone()),
            captions: CaptionQueue::new(event_bus.clone()),
            announcer: Announcer::new(platform.live_region),
            voice_commands: VoiceCommandListener::new(
                platform.recognizer,
                speech.clone(),
                settings,
                event_bus,
            ),
            speech,
        }
    }

    /// Deliver a notification to every enabled channel
    pub fn broadcast(
        &self,
        notification: &Notification,
        settings: &AccessibilitySettings,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let message = notification.message.as_str();

        if settings.visual_alerts {
            let alert = visual::build_alert(
                notification.sound_type,
                Some(message.to_string()),
                settings,
            );
            self.visual.raise(alert);
            report.visual = true;
        }

        if settings.subtitles {
            let category = if notification.order_data.is_some() {
                CaptionCategory::Order
            } else {
                CaptionCategory::Notification
            };
            self.captions.add(message, category, &settings.language);
            report.caption = true;
        }

        if settings.speech_enabled {
            match self.speech.speak(message, settings) {
                Ok(()) => report.speech = true,
                Err(e) => error!("Speech channel failed: {}", e),
            }
        }

        if settings.screen_reader {
            match self.announcer.announce(message) {
                Ok(()) => report.announcement = true,
                Err(e) => error!("Screen-reader channel failed: {}", e),
            }
        }

        report
    }

    /// Start or stop the voice listener to match the settings
    pub fn sync_voice_commands(&self, settings: &AccessibilitySettings) {
        if settings.voice_commands {
            self.voice_commands.start(&settings.language);
        } else {
            self.voice_commands.stop();
        }
    }

    pub fn visual(&self) -> &VisualAlertQueue {
        &self.visual
    }

    pub fn captions(&self) -> &CaptionQueue {
        &self.captions
    }

    pub fn speech(&self) -> &SpeechChannel {
        &self.speech
    }

    pub fn voice_commands(&self) -> &VoiceCommandListener {
        &self.voice_commands
    }

    /// Stop the listener, silence speech and drop queued alerts
    pub fn shutdown(&self) {
        self.voice_commands.stop();
        self.speech.cancel();
        self.visual.clear();
        self.captions.clear();
    }
}
