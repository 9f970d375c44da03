//! Voice command listener
//!
//! Runs continuous recognition while enabled, restarting the platform
//! session whenever it ends. Matched commands are published on the event
//! bus for the host to perform and confirmed by speech.

use crate::accessibility::phrases::{command_confirmation, command_not_recognized, match_command};
use crate::accessibility::platform::{guard, SpeechRecognizer};
use crate::accessibility::speech::SpeechChannel;
use chrono::Utc;
use kne_common::alerts::VoiceAction;
use kne_common::events::{EngineEvent, EventBus};
use kne_common::AccessibilitySettings;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause before restarting an ended recognition session
pub const RESTART_DELAY: Duration = Duration::from_millis(250);

/// Longest pause between failed recognizer starts
pub const MAX_RESTART_DELAY: Duration = Duration::from_secs(8);

/// Consecutive start failures after which the listener gives up
pub const MAX_START_FAILURES: u32 = 5;

/// Pause after `failures` consecutive failed starts (doubling, capped)
pub fn start_backoff(failures: u32) -> Duration {
    let factor = 1u32 << failures.saturating_sub(1).min(16);
    RESTART_DELAY.saturating_mul(factor).min(MAX_RESTART_DELAY)
}

pub struct VoiceCommandListener {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    speech: SpeechChannel,
    settings: Arc<RwLock<AccessibilitySettings>>,
    event_bus: EventBus,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceCommandListener {
    pub fn new(
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        speech: SpeechChannel,
        settings: Arc<RwLock<AccessibilitySettings>>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            recognizer,
            speech,
            settings,
            event_bus,
            task: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|t| t.as_ref().map(|h| !h.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Start listening in `language`; restarts a running listener
    ///
    /// Without a recognizer this logs and does nothing.
    pub fn start(&self, language: &str) {
        let Some(recognizer) = self.recognizer.clone() else {
            warn!("Voice commands requested but no speech recognizer is available");
            return;
        };
        self.stop();

        let speech = self.speech.clone();
        let settings = Arc::clone(&self.settings);
        let event_bus = self.event_bus.clone();
        let language = language.to_string();

        let handle = tokio::spawn(async move {
            info!("Voice command listener started ({})", language);
            let mut failures = 0u32;
            loop {
                let (tx, mut rx) = mpsc::unbounded_channel();
                if let Err(e) = guard("speech recognizer", || recognizer.start(&language, tx)) {
                    failures += 1;
                    if failures >= MAX_START_FAILURES {
                        error!(
                            "Speech recognizer failed to start {} times, voice commands disabled: {}",
                            failures, e
                        );
                        return;
                    }
                    let backoff = start_backoff(failures);
                    warn!(
                        "Speech recognizer failed to start (retry in {:?}): {}",
                        backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                failures = 0;

                while let Some(transcript) = rx.recv().await {
                    let snapshot = settings.read().await.clone();
                    handle_transcript(&transcript, &snapshot, &speech, &event_bus);
                }

                debug!("Recognition session ended, restarting");
                tokio::time::sleep(RESTART_DELAY).await;
            }
        });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    pub fn stop(&self) {
        let handle = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(handle) = handle {
            handle.abort();
            if let Some(recognizer) = &self.recognizer {
                let stopped = guard("speech recognizer", || {
                    recognizer.stop();
                    Ok(())
                });
                if let Err(e) = stopped {
                    warn!("Speech recognizer stop failed: {}", e);
                }
            }
            info!("Voice command listener stopped");
        }
    }
}

impl Drop for VoiceCommandListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Match one transcript, publish the outcome and speak the response
///
/// Returns the matched action, if any.
pub fn handle_transcript(
    transcript: &str,
    settings: &AccessibilitySettings,
    speech: &SpeechChannel,
    event_bus: &EventBus,
) -> Option<VoiceAction> {
    let normalized = transcript.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let action = match_command(&normalized);
    let response = match action {
        Some(action) => {
            info!("Voice command '{}' -> {}", normalized, action.as_str());
            event_bus.emit_lossy(EngineEvent::VoiceCommand {
                action,
                transcript: normalized.clone(),
                timestamp: Utc::now(),
            });
            command_confirmation(action, &settings.language)
        }
        None => {
            debug!("Unrecognized voice command '{}'", normalized);
            event_bus.emit_lossy(EngineEvent::VoiceCommandUnrecognized {
                transcript: normalized.clone(),
                timestamp: Utc::now(),
            });
            command_not_recognized(&settings.language).to_string()
        }
    };

    if speech.is_available() {
        if let Err(e) = speech.speak(&response, settings) {
            warn!("Voice command response not spoken: {}", e);
        }
    }

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_backoff_doubles_then_caps() {
        assert_eq!(start_backoff(1), RESTART_DELAY);
        assert_eq!(start_backoff(2), Duration::from_millis(500));
        assert_eq!(start_backoff(3), Duration::from_secs(1));
        assert_eq!(start_backoff(10), MAX_RESTART_DELAY);
        assert_eq!(start_backoff(u32::MAX), MAX_RESTART_DELAY);
    }
}
