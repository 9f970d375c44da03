//! Shared engine state
//!
//! Mutable state read by the dispatcher, the context monitor and the
//! accessibility channels. Uses tokio `RwLock`: reads dominate.

use crate::history::NotificationHistory;
use kne_common::{AccessibilitySettings, Context, EnvironmentalState};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct SharedState {
    /// Last-write-wins per field
    pub environment: RwLock<EnvironmentalState>,

    pub history: RwLock<NotificationHistory>,

    /// Context seen at the last dispatch or monitor tick
    pub current_context: RwLock<Context>,

    /// Shared with the voice command listener
    pub settings: Arc<RwLock<AccessibilitySettings>>,
}

impl SharedState {
    pub fn new(initial_context: Context) -> Self {
        Self {
            environment: RwLock::new(EnvironmentalState::default()),
            history: RwLock::new(NotificationHistory::new()),
            current_context: RwLock::new(initial_context),
            settings: Arc::new(RwLock::new(AccessibilitySettings::default())),
        }
    }

    pub async fn environment(&self) -> EnvironmentalState {
        *self.environment.read().await
    }

    pub async fn settings(&self) -> AccessibilitySettings {
        self.settings.read().await.clone()
    }

    pub async fn current_context(&self) -> Context {
        *self.current_context.read().await
    }

    /// Store a newly detected context
    ///
    /// Returns the previous context when it changed.
    pub async fn replace_context(&self, context: Context) -> Option<Context> {
        let mut current = self.current_context.write().await;
        if *current == context {
            None
        } else {
            Some(std::mem::replace(&mut *current, context))
        }
    }
}
