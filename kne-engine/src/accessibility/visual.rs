//! Visual alert queue
//!
//! Every alert removes itself after its duration via a scheduled task.

use kne_common::alerts::{VisualAlert, VisualAlertKind};
use kne_common::events::{EngineEvent, EventBus};
use kne_common::{AccessibilitySettings, SoundType};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

pub const URGENT_DURATION_MS: u64 = 3000;
pub const DEFAULT_DURATION_MS: u64 = 2000;
pub const URGENT_INTENSITY: u8 = 100;
pub const DEFAULT_INTENSITY: u8 = 70;

/// Alert color for a sound type
pub fn alert_color(sound_type: SoundType, high_contrast: bool) -> &'static str {
    if high_contrast {
        return match sound_type {
            SoundType::UrgentAlert | SoundType::Error => "#FF0000",
            SoundType::Warning => "#FFFF00",
            SoundType::OrderReady | SoundType::OrderComplete | SoundType::Success => "#00FF00",
            SoundType::NewOrder => "#00FFFF",
            SoundType::Notification
            | SoundType::Bell
            | SoundType::Chime
            | SoundType::Tick
            | SoundType::Whoosh => "#FFFFFF",
        };
    }

    match sound_type {
        SoundType::NewOrder => "#3B82F6",
        SoundType::OrderReady => "#22C55E",
        SoundType::UrgentAlert => "#EF4444",
        SoundType::OrderComplete => "#10B981",
        SoundType::Warning => "#F59E0B",
        SoundType::Success => "#16A34A",
        SoundType::Error => "#DC2626",
        SoundType::Notification => "#6366F1",
        SoundType::Bell => "#EAB308",
        SoundType::Chime => "#A855F7",
        SoundType::Tick => "#9CA3AF",
        SoundType::Whoosh => "#06B6D4",
    }
}

/// Build the alert for a notification
pub fn build_alert(
    sound_type: SoundType,
    message: Option<String>,
    settings: &AccessibilitySettings,
) -> VisualAlert {
    let urgent = sound_type == SoundType::UrgentAlert;
    VisualAlert {
        id: Uuid::new_v4(),
        kind: if settings.flash_screen {
            VisualAlertKind::Flash
        } else {
            VisualAlertKind::Border
        },
        color: alert_color(sound_type, settings.high_contrast).to_string(),
        duration_ms: if urgent {
            URGENT_DURATION_MS
        } else {
            DEFAULT_DURATION_MS
        },
        intensity: if urgent {
            URGENT_INTENSITY
        } else {
            DEFAULT_INTENSITY
        },
        message,
    }
}

/// Active visual alerts
#[derive(Clone)]
pub struct VisualAlertQueue {
    active: Arc<Mutex<Vec<VisualAlert>>>,
    event_bus: EventBus,
}

impl VisualAlertQueue {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            active: Arc::new(Mutex::new(Vec::new())),
            event_bus,
        }
    }

    /// Raise an alert and schedule its removal
    ///
    /// Must be called from within a tokio runtime.
    pub fn raise(&self, alert: VisualAlert) -> VisualAlert {
        if let Ok(mut active) = self.active.lock() {
            active.push(alert.clone());
        }
        self.event_bus.emit_lossy(EngineEvent::VisualAlertRaised {
            alert: alert.clone(),
        });

        let queue = self.clone();
        let id = alert.id;
        let duration = Duration::from_millis(alert.duration_ms);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            queue.expire(id);
        });

        debug!("Visual alert {} raised ({})", alert.id, alert.color);
        alert
    }

    fn expire(&self, id: Uuid) {
        let removed = match self.active.lock() {
            Ok(mut active) => {
                let before = active.len();
                active.retain(|a| a.id != id);
                active.len() != before
            }
            Err(_) => false,
        };
        if removed {
            self.event_bus
                .emit_lossy(EngineEvent::VisualAlertExpired { alert_id: id });
        }
    }

    pub fn active(&self) -> Vec<VisualAlert> {
        self.active.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        let drained: Vec<VisualAlert> = match self.active.lock() {
            Ok(mut active) => active.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for alert in drained {
            self.event_bus
                .emit_lossy(EngineEvent::VisualAlertExpired { alert_id: alert.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgent_alert_properties() {
        let settings = AccessibilitySettings {
            flash_screen: true,
            ..Default::default()
        };
        let alert = build_alert(SoundType::UrgentAlert, None, &settings);
        assert_eq!(alert.duration_ms, 3000);
        assert_eq!(alert.intensity, 100);
        assert_eq!(alert.kind, VisualAlertKind::Flash);
        assert_eq!(alert.color, "#EF4444");
    }

    #[test]
    fn test_default_alert_properties() {
        let settings = AccessibilitySettings {
            high_contrast: true,
            ..Default::default()
        };
        let alert = build_alert(SoundType::OrderReady, Some("Order ready".into()), &settings);
        assert_eq!(alert.duration_ms, 2000);
        assert_eq!(alert.intensity, 70);
        assert_eq!(alert.kind, VisualAlertKind::Border);
        assert_eq!(alert.color, "#00FF00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_expires_after_duration() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let queue = VisualAlertQueue::new(bus);

        let alert = queue.raise(build_alert(
            SoundType::Bell,
            None,
            &AccessibilitySettings::default(),
        ));
        assert_eq!(queue.active().len(), 1);
        assert!(matches!(rx.recv().await, Ok(EngineEvent::VisualAlertRaised { .. })));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(queue.active().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(queue.active().is_empty());
        match rx.recv().await {
            Ok(EngineEvent::VisualAlertExpired { alert_id }) => assert_eq!(alert_id, alert.id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
