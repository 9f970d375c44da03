//! Bounded notification history

use crate::notification::Notification;
use chrono::{DateTime, Utc};
use kne_common::SoundType;
use std::collections::VecDeque;

/// Maximum notifications retained
pub const HISTORY_CAP: usize = 100;

/// Ring of recent notifications, oldest evicted first
#[derive(Debug, Clone)]
pub struct NotificationHistory {
    entries: VecDeque<Notification>,
    cap: usize,
}

impl Default for NotificationHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAP)
    }
}

impl NotificationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, notification: Notification) {
        while self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(notification);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn last(&self) -> Option<&Notification> {
        self.entries.back()
    }

    /// Up to `limit` notifications, newest first
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Notifications of `sound_type` within `window` before `now`
    pub fn count_recent(
        &self,
        sound_type: SoundType,
        now: DateTime<Utc>,
        window: chrono::Duration,
    ) -> usize {
        let since = now - window;
        self.entries
            .iter()
            .filter(|n| n.sound_type == sound_type && n.timestamp >= since && n.timestamp <= now)
            .count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Adaptation;
    use kne_common::{Context, EnvironmentalState, UrgencyLevel};
    use uuid::Uuid;

    fn notification(sound_type: SoundType, timestamp: DateTime<Utc>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            sound_type,
            context: Context::DinnerRush,
            urgency: UrgencyLevel::Medium,
            order_data: None,
            environment: EnvironmentalState::default(),
            adaptations: Adaptation {
                volume: 0.5,
                repeat: 1,
                delay_ms: 200,
                use_alternate_sound: false,
            },
            message: String::new(),
            timestamp,
        }
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let now = Utc::now();
        let mut history = NotificationHistory::new();
        let first = notification(SoundType::Bell, now);
        let first_id = first.id;
        history.push(first);
        for _ in 0..HISTORY_CAP + 10 {
            history.push(notification(SoundType::Tick, now));
        }
        assert_eq!(history.len(), HISTORY_CAP);
        assert!(history.recent(HISTORY_CAP).iter().all(|n| n.id != first_id));
    }

    #[test]
    fn test_count_recent_window() {
        let now = Utc::now();
        let mut history = NotificationHistory::new();
        history.push(notification(SoundType::NewOrder, now - chrono::Duration::seconds(90)));
        history.push(notification(SoundType::NewOrder, now - chrono::Duration::seconds(30)));
        history.push(notification(SoundType::Bell, now - chrono::Duration::seconds(10)));
        history.push(notification(SoundType::NewOrder, now));

        let window = chrono::Duration::seconds(60);
        assert_eq!(history.count_recent(SoundType::NewOrder, now, window), 2);
        assert_eq!(history.count_recent(SoundType::Bell, now, window), 1);
        assert_eq!(history.count_recent(SoundType::Chime, now, window), 0);
    }

    #[test]
    fn test_recent_newest_first() {
        let now = Utc::now();
        let mut history = NotificationHistory::new();
        history.push(notification(SoundType::Bell, now));
        history.push(notification(SoundType::Chime, now));
        let recent = history.recent(1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].sound_type, SoundType::Chime);
    }
}
