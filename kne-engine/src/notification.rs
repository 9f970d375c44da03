//! Notification record and its playback adaptations

use kne_common::{Context, EnvironmentalState, OrderData, SoundType, UrgencyLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Playback behavior derived for one notification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adaptation {
    /// Contextual volume in [0.1, 1.0]
    pub volume: f64,
    /// Number of plays in [1, 4]
    pub repeat: u32,
    /// Gap between consecutive plays
    pub delay_ms: u64,
    pub use_alternate_sound: bool,
}

/// One dispatched notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    /// Requested sound type (before any alternate substitution)
    pub sound_type: SoundType,
    pub context: Context,
    pub urgency: UrgencyLevel,
    pub order_data: Option<OrderData>,
    pub environment: EnvironmentalState,
    pub adaptations: Adaptation,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Notification {
    /// Sound actually played
    pub fn played_sound(&self) -> SoundType {
        if self.adaptations.use_alternate_sound {
            crate::adaptation::alternate_sound(self.sound_type)
        } else {
            self.sound_type
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptation::alternate_sound;

    fn notification(use_alternate_sound: bool) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            sound_type: SoundType::OrderReady,
            context: Context::DinnerRush,
            urgency: UrgencyLevel::High,
            order_data: Some(OrderData::new("B4").with_table(12)),
            environment: EnvironmentalState::default(),
            adaptations: Adaptation {
                volume: 0.9,
                repeat: 3,
                delay_ms: 100,
                use_alternate_sound,
            },
            message: "Order ready B4, table 12".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_played_sound_follows_alternate_flag() {
        assert_eq!(notification(false).played_sound(), SoundType::OrderReady);
        assert_eq!(
            notification(true).played_sound(),
            alternate_sound(SoundType::OrderReady)
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(notification(true)).unwrap();
        assert_eq!(json["soundType"], "order-ready");
        assert_eq!(json["context"], "dinner-rush");
        assert_eq!(json["adaptations"]["delayMs"], 100);
        assert_eq!(json["adaptations"]["useAlternateSound"], true);
        assert_eq!(json["orderData"]["id"], "B4");
    }
}
