//! Event types for the KNE event system
//!
//! Provides the shared event definitions and the EventBus that UI consumers
//! and the host application subscribe to.

use crate::alerts::{SubtitleEntry, VisualAlert, VoiceAction};
use crate::settings::AccessibilitySettings;
use crate::{Context, SoundType, UrgencyLevel};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Engine event types
///
/// Events are broadcast via EventBus and can be serialized for transport to
/// a display process. All events use this central enum for exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A notification was dispatched to its channels
    NotificationDispatched {
        notification_id: Uuid,
        sound_type: SoundType,
        context: Context,
        urgency: UrgencyLevel,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Detected operating context changed
    ContextChanged {
        old_context: Context,
        new_context: Context,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Preferred audio backend unavailable; playback continues on a simpler one
    ///
    /// Emitted once, at engine init.
    AudioBackendDegraded {
        /// Backend actually in use
        backend: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visual alert raised
    VisualAlertRaised { alert: VisualAlert },

    /// Visual alert removed after its duration
    VisualAlertExpired { alert_id: Uuid },

    /// Caption line added
    CaptionAdded { entry: SubtitleEntry },

    /// Caption line removed (expired or evicted)
    CaptionExpired { entry_id: Uuid },

    /// Voice command recognized; the host performs the action
    VoiceCommand {
        action: VoiceAction,
        transcript: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transcript matched no known command
    VoiceCommandUnrecognized {
        transcript: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Accessibility settings replaced
    SettingsChanged { settings: AccessibilitySettings },
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use kne_common::events::{EventBus, EngineEvent};
/// use kne_common::Context;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(EngineEvent::ContextChanged {
///     old_context: Context::Preparation,
///     new_context: Context::LunchRush,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(EngineEvent::ContextChanged { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before lagging subscribers
    ///   start dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EngineEvent,
    ) -> Result<usize, broadcast::error::SendError<EngineEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_error() {
        let bus = EventBus::new(8);
        let result = bus.emit(EngineEvent::VisualAlertExpired {
            alert_id: Uuid::new_v4(),
        });
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new(8);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let count = bus
            .emit(EngineEvent::VoiceCommandUnrecognized {
                transcript: "flip the grill".to_string(),
                timestamp: chrono::Utc::now(),
            })
            .unwrap();
        assert_eq!(count, 2);

        for rx in [&mut rx1, &mut rx2] {
            match rx.recv().await.unwrap() {
                EngineEvent::VoiceCommandUnrecognized { transcript, .. } => {
                    assert_eq!(transcript, "flip the grill");
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = EngineEvent::VoiceCommand {
            action: VoiceAction::MarkReady,
            transcript: "mark ready".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "VoiceCommand");
        assert_eq!(json["action"], "mark-ready");
    }
}
