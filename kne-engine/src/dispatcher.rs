//! Notification dispatcher
//!
//! `NotificationEngine` is the single entry point for the order-management
//! system. Each dispatch runs detection, scoring and adaptation on the
//! caller's task, then hands playback to the runtime and fans out to the
//! accessibility channels.
//!
//! **Guarantees toward the caller:**
//! - Public `notify_*` entry points never return errors
//! - Playback repeats are scheduled, never awaited
//! - A failing channel is logged and skipped; the others still run

use crate::accessibility::phrases::notification_message;
use crate::accessibility::{AccessibilityBroadcaster, AccessibilityPlatform};
use crate::adaptation::adapt;
use crate::context::detect;
use crate::error::Result;
use crate::learning::LearningStore;
use crate::monitor::{refresh_context, start_context_monitor};
use crate::notification::Notification;
use crate::playback::{BackendKind, PlayOutcome, PlayParams, PlaybackEngine, SoundEvent};
use crate::state::SharedState;
use crate::urgency;
use kne_common::config::EngineConfig;
use kne_common::db::{init_database, SettingsStore};
use kne_common::events::{EngineEvent, EventBus};
use kne_common::time::{Clock, SystemClock};
use kne_common::{
    AccessibilitySettings, AccessibilitySettingsUpdate, Context, EnvironmentUpdate,
    EnvironmentalState, OrderData, SoundType, UrgencyLevel,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Collaborators of the engine, injectable for tests and embedding hosts
pub struct EngineComponents {
    pub playback: Arc<PlaybackEngine>,
    pub platform: AccessibilityPlatform,
    pub clock: Arc<dyn Clock>,
    /// None runs without settings persistence
    pub settings_store: Option<SettingsStore>,
    pub event_bus: EventBus,
}

/// Snapshot returned by [`NotificationEngine::statistics`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatistics {
    pub current_context: Context,
    pub backend: BackendKind,
    pub active_voices: usize,
    pub stream_errors: u32,
    pub history_len: usize,
    pub sound_events: usize,
    pub master_volume: f32,
    pub environment: EnvironmentalState,
    pub total_dispatches: u64,
}

pub struct NotificationEngine {
    config: EngineConfig,
    playback: Arc<PlaybackEngine>,
    state: Arc<SharedState>,
    learning: LearningStore,
    accessibility: AccessibilityBroadcaster,
    clock: Arc<dyn Clock>,
    settings_store: Option<SettingsStore>,
    event_bus: EventBus,
    /// Bumped by `stop_all`; repeats scheduled under an older value are dropped
    playback_generation: Arc<AtomicU64>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    initialized: AtomicBool,
}

impl NotificationEngine {
    /// Production wiring: real clock, probed audio backend, SQLite settings
    ///
    /// A database that cannot be opened disables persistence instead of
    /// failing startup.
    pub async fn open(config: EngineConfig, platform: AccessibilityPlatform) -> Self {
        let settings_store = match init_database(&config.database_path).await {
            Ok(pool) => Some(SettingsStore::new(pool)),
            Err(e) => {
                warn!(
                    "Settings database {} unavailable, settings will not persist: {}",
                    config.database_path.display(),
                    e
                );
                None
            }
        };

        let playback = Arc::new(PlaybackEngine::init(&config));

        Self::new(
            config,
            EngineComponents {
                playback,
                platform,
                clock: Arc::new(SystemClock),
                settings_store,
                event_bus: EventBus::default(),
            },
        )
    }

    pub fn new(config: EngineConfig, components: EngineComponents) -> Self {
        let initial = detect(
            &components.clock.local_now(),
            &EnvironmentalState::default(),
        );
        let state = Arc::new(SharedState::new(initial));
        let accessibility = AccessibilityBroadcaster::new(
            components.platform,
            Arc::clone(&state.settings),
            components.event_bus.clone(),
        );

        Self {
            config,
            playback: components.playback,
            state,
            learning: LearningStore::new(),
            accessibility,
            clock: components.clock,
            settings_store: components.settings_store,
            event_bus: components.event_bus,
            playback_generation: Arc::new(AtomicU64::new(0)),
            monitor: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// Load settings, warm the asset cache and start background tasks
    ///
    /// Idempotent. Emits `AudioBackendDegraded` once when the preferred
    /// backend failed.
    pub async fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let settings = match &self.settings_store {
            Some(store) => store.load_accessibility_or_default().await,
            None => AccessibilitySettings::default(),
        };
        self.playback.set_hearing_aid_mode(settings.hearing_aid_mode);
        *self.state.settings.write().await = settings.clone();

        if let Some(reason) = self.playback.degraded_reason() {
            self.event_bus.emit_lossy(EngineEvent::AudioBackendDegraded {
                backend: self.playback.backend_kind().to_string(),
                reason: reason.to_string(),
                timestamp: self.clock.utc_now(),
            });
        }

        let playback = Arc::clone(&self.playback);
        if let Err(e) = tokio::task::spawn_blocking(move || playback.preload()).await {
            warn!("Asset preload task failed: {}", e);
        }

        refresh_context(&self.state, self.clock.as_ref(), &self.event_bus).await;

        if self.config.context_check_interval_secs > 0 {
            let handle = start_context_monitor(
                Arc::clone(&self.state),
                Arc::clone(&self.clock),
                self.event_bus.clone(),
                Duration::from_secs(self.config.context_check_interval_secs),
            );
            if let Ok(mut monitor) = self.monitor.lock() {
                *monitor = Some(handle);
            }
        }

        self.accessibility.sync_voice_commands(&settings);

        info!(
            "Notification engine initialized (backend: {}, context: {})",
            self.playback.backend_kind(),
            self.state.current_context().await
        );
    }

    /// Stop background tasks, voices and accessibility channels
    pub async fn shutdown(&self) {
        if let Ok(mut monitor) = self.monitor.lock() {
            if let Some(handle) = monitor.take() {
                handle.abort();
            }
        }
        self.stop_all();
        self.accessibility.shutdown();
        self.playback.shutdown();
        self.initialized.store(false, Ordering::SeqCst);
        info!("Notification engine shut down");
    }

    // ------------------------------------------------------------------
    // Inbound notifications
    // ------------------------------------------------------------------

    pub async fn notify_new_order(&self, order: OrderData) -> Notification {
        self.dispatch(SoundType::NewOrder, Some(order), None, None)
            .await
    }

    pub async fn notify_order_ready(&self, order: OrderData) -> Notification {
        self.dispatch(SoundType::OrderReady, Some(order), None, None)
            .await
    }

    pub async fn notify_order_complete(&self, order: OrderData) -> Notification {
        self.dispatch(SoundType::OrderComplete, Some(order), None, None)
            .await
    }

    /// Urgent alert, always critical
    pub async fn notify_urgent_alert(&self, message: &str, order_id: Option<&str>) -> Notification {
        let order = order_id.map(OrderData::new);
        self.dispatch(
            SoundType::UrgentAlert,
            order,
            Some(UrgencyLevel::Critical),
            Some(message.to_string()),
        )
        .await
    }

    /// Dispatch any sound type, optionally forcing the urgency
    pub async fn send_contextual_notification(
        &self,
        sound_type: SoundType,
        order: Option<OrderData>,
        force_urgency: Option<UrgencyLevel>,
    ) -> Notification {
        self.dispatch(sound_type, order, force_urgency, None).await
    }

    async fn dispatch(
        &self,
        sound_type: SoundType,
        order: Option<OrderData>,
        force_urgency: Option<UrgencyLevel>,
        message: Option<String>,
    ) -> Notification {
        let env = self.state.environment().await;
        let now = self.clock.utc_now();
        let context = refresh_context(&self.state, self.clock.as_ref(), &self.event_bus).await;

        let urgency = urgency::score(sound_type, order.as_ref(), context, &env, force_urgency);
        let bias = self.learning.volume_bias(context);
        let settings = self.state.settings().await;

        let adaptations = {
            let history = self.state.history.read().await;
            adapt(sound_type, urgency, context, bias, &env, &history, now)
        };

        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| notification_message(sound_type, order.as_ref(), &settings.language));

        let notification = Notification {
            id: Uuid::new_v4(),
            sound_type,
            context,
            urgency,
            order_data: order,
            environment: env,
            adaptations,
            message,
            timestamp: now,
        };

        debug!(
            "Dispatching {} ({}, {}): volume {:.2}, repeat {}, delay {}ms, alternate {}",
            sound_type,
            context,
            urgency,
            adaptations.volume,
            adaptations.repeat,
            adaptations.delay_ms,
            adaptations.use_alternate_sound
        );

        self.schedule_playback(&notification);
        self.learning.record_dispatch(context, sound_type, urgency);
        self.state.history.write().await.push(notification.clone());
        self.accessibility.broadcast(&notification, &settings);

        self.event_bus.emit_lossy(EngineEvent::NotificationDispatched {
            notification_id: notification.id,
            sound_type,
            context,
            urgency,
            timestamp: now,
        });

        notification
    }

    /// First play happens now; later repeats each wait for the previous
    /// sound plus the urgency delay
    fn schedule_playback(&self, notification: &Notification) {
        let sound = notification.played_sound();
        let adaptations = notification.adaptations;
        let params = PlayParams::new(adaptations.volume as f32, notification.urgency);
        let delay = Duration::from_millis(adaptations.delay_ms);

        let first = match self.playback.play(sound, params) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Playback of {} failed: {}", sound, e);
                return;
            }
        };
        if adaptations.repeat <= 1 {
            return;
        }

        let playback = Arc::clone(&self.playback);
        let generation = Arc::clone(&self.playback_generation);
        let scheduled_in = generation.load(Ordering::SeqCst);

        tokio::spawn(async move {
            let mut previous = first.duration;
            for _ in 1..adaptations.repeat {
                tokio::time::sleep(previous + delay).await;
                if generation.load(Ordering::SeqCst) != scheduled_in {
                    debug!("Pending repeats of {} cancelled", sound);
                    return;
                }
                match playback.play(sound, params) {
                    Ok(outcome) => previous = outcome.duration,
                    Err(e) => {
                        error!("Playback of {} failed: {}", sound, e);
                        return;
                    }
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------

    pub async fn update_environmental_state(&self, update: EnvironmentUpdate) {
        self.state.environment.write().await.apply(&update);
    }

    pub async fn update_order_backlog(&self, backlog: u32) {
        self.update_environmental_state(EnvironmentUpdate {
            order_backlog: Some(backlog),
            ..Default::default()
        })
        .await;
    }

    pub async fn update_recent_order_rate(&self, rate: f64) {
        self.update_environmental_state(EnvironmentUpdate {
            recent_order_rate: Some(rate),
            ..Default::default()
        })
        .await;
    }

    pub async fn update_staff_count(&self, staff: u32) {
        self.update_environmental_state(EnvironmentUpdate {
            staff_count: Some(staff),
            ..Default::default()
        })
        .await;
    }

    pub async fn update_ambient_noise(&self, level: f64) {
        self.update_environmental_state(EnvironmentUpdate {
            ambient_noise: Some(level),
            ..Default::default()
        })
        .await;
    }

    pub async fn environment(&self) -> EnvironmentalState {
        self.state.environment().await
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Merge a partial update, persist it and apply it to every channel
    ///
    /// Persistence failures are logged; the new settings still take effect.
    pub async fn update_settings(&self, update: AccessibilitySettingsUpdate) -> AccessibilitySettings {
        let (previous, merged) = {
            let mut settings = self.state.settings.write().await;
            let previous = settings.clone();
            settings.apply(&update);
            (previous, settings.clone())
        };

        if let Some(store) = &self.settings_store {
            if let Err(e) = store.save_accessibility(&merged).await {
                error!("Failed to persist accessibility settings: {}", e);
            }
        }

        self.playback.set_hearing_aid_mode(merged.hearing_aid_mode);

        if previous.voice_commands != merged.voice_commands
            || (merged.voice_commands && previous.language != merged.language)
        {
            self.accessibility.sync_voice_commands(&merged);
        }

        self.event_bus.emit_lossy(EngineEvent::SettingsChanged {
            settings: merged.clone(),
        });
        merged
    }

    pub async fn settings(&self) -> AccessibilitySettings {
        self.state.settings().await
    }

    // ------------------------------------------------------------------
    // Playback control
    // ------------------------------------------------------------------

    /// Halt all voices and cancel repeats not yet started
    pub fn stop_all(&self) {
        self.playback_generation.fetch_add(1, Ordering::SeqCst);
        self.playback.stop_all();
    }

    pub fn master_volume(&self) -> f32 {
        self.playback.master_volume()
    }

    pub fn set_master_volume(&self, volume: f32) -> f32 {
        self.playback.set_master_volume(volume)
    }

    /// Preview a sound at medium urgency in the current context
    ///
    /// Not recorded in history and not counted.
    pub async fn test_sound(&self, sound_type: SoundType) -> Result<PlayOutcome> {
        let context = self.state.current_context().await;
        let env = self.state.environment().await;
        let volume = crate::adaptation::volume(
            UrgencyLevel::Medium,
            context,
            self.learning.volume_bias(context),
            &env,
        );
        self.playback
            .play(sound_type, PlayParams::new(volume as f32, UrgencyLevel::Medium))
    }

    // ------------------------------------------------------------------
    // Learning
    // ------------------------------------------------------------------

    pub fn set_volume_bias(&self, context: Context, bias: f64) -> Result<()> {
        self.learning.set_volume_bias(context, bias)
    }

    pub fn volume_bias(&self, context: Context) -> f64 {
        self.learning.volume_bias(context)
    }

    pub fn effectiveness(&self, context: Context, sound_type: SoundType, urgency: UrgencyLevel) -> u64 {
        self.learning.effectiveness(context, sound_type, urgency)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn current_context(&self) -> Context {
        self.state.current_context().await
    }

    /// Up to `limit` notifications, newest first
    pub async fn recent_notifications(&self, limit: usize) -> Vec<Notification> {
        self.state.history.read().await.recent(limit)
    }

    pub fn sound_events(&self) -> Vec<SoundEvent> {
        self.playback.sound_events()
    }

    pub async fn statistics(&self) -> EngineStatistics {
        EngineStatistics {
            current_context: self.state.current_context().await,
            backend: self.playback.backend_kind(),
            active_voices: self.playback.active_voices(),
            stream_errors: self.playback.stream_errors(),
            history_len: self.state.history.read().await.len(),
            sound_events: self.playback.sound_events().len(),
            master_volume: self.playback.master_volume(),
            environment: self.state.environment().await,
            total_dispatches: self.learning.total_dispatches(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn playback(&self) -> &Arc<PlaybackEngine> {
        &self.playback
    }

    pub fn accessibility(&self) -> &AccessibilityBroadcaster {
        &self.accessibility
    }
}
