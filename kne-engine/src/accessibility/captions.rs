//! Caption queue
//!
//! Keeps the five most recent captions. Each caption also expires on its
//! own after its display time.

use chrono::Utc;
use kne_common::alerts::{CaptionCategory, SubtitleEntry};
use kne_common::events::{EngineEvent, EventBus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const CAPTION_CAP: usize = 5;
pub const MIN_CAPTION_MS: u64 = 3000;
pub const MS_PER_CHAR: u64 = 100;

/// Display time: `max(3000, chars × 100)` ms
pub fn caption_duration_ms(text: &str) -> u64 {
    (text.chars().count() as u64 * MS_PER_CHAR).max(MIN_CAPTION_MS)
}

#[derive(Clone)]
pub struct CaptionQueue {
    entries: Arc<Mutex<VecDeque<SubtitleEntry>>>,
    event_bus: EventBus,
}

impl CaptionQueue {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(CAPTION_CAP))),
            event_bus,
        }
    }

    /// Add a caption, evicting the oldest beyond the cap
    ///
    /// Must be called from within a tokio runtime.
    pub fn add(&self, text: &str, category: CaptionCategory, language: &str) -> SubtitleEntry {
        let entry = SubtitleEntry {
            id: Uuid::new_v4(),
            text: text.to_string(),
            timestamp: Utc::now(),
            duration_ms: caption_duration_ms(text),
            category,
            language: language.to_string(),
        };

        let mut evicted = Vec::new();
        if let Ok(mut entries) = self.entries.lock() {
            entries.push_back(entry.clone());
            while entries.len() > CAPTION_CAP {
                if let Some(old) = entries.pop_front() {
                    evicted.push(old.id);
                }
            }
        }

        for entry_id in evicted {
            self.event_bus
                .emit_lossy(EngineEvent::CaptionExpired { entry_id });
        }
        self.event_bus.emit_lossy(EngineEvent::CaptionAdded {
            entry: entry.clone(),
        });

        let queue = self.clone();
        let id = entry.id;
        let duration = Duration::from_millis(entry.duration_ms);
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            queue.expire(id);
        });

        entry
    }

    fn expire(&self, id: Uuid) {
        let removed = match self.entries.lock() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|e| e.id != id);
                entries.len() != before
            }
            Err(_) => false,
        };
        if removed {
            self.event_bus
                .emit_lossy(EngineEvent::CaptionExpired { entry_id: id });
        }
    }

    /// Current captions, oldest first
    pub fn entries(&self) -> Vec<SubtitleEntry> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_rule() {
        assert_eq!(caption_duration_ms(""), 3000);
        assert_eq!(caption_duration_ms("New order A12"), 3000);
        assert_eq!(caption_duration_ms(&"x".repeat(45)), 4500);
        // Characters, not bytes
        assert_eq!(caption_duration_ms(&"é".repeat(40)), 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_keeps_most_recent() {
        let queue = CaptionQueue::new(EventBus::new(64));
        for i in 0..8 {
            queue.add(&format!("caption {}", i), CaptionCategory::Order, "en-US");
        }
        let entries = queue.entries();
        assert_eq!(entries.len(), CAPTION_CAP);
        assert_eq!(entries[0].text, "caption 3");
        assert_eq!(entries[4].text, "caption 7");
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_self_expire() {
        let queue = CaptionQueue::new(EventBus::new(64));
        queue.add("short", CaptionCategory::System, "en-US");
        queue.add(&"y".repeat(50), CaptionCategory::System, "en-US");

        tokio::time::sleep(Duration::from_millis(3001)).await;
        let remaining = queue.entries();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].duration_ms, 5000);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(queue.entries().is_empty());
    }
}
