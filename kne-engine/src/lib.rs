//! # Kitchen Notification Engine Library (kne-engine)
//!
//! Context-aware audio and accessibility notifications for a restaurant
//! kitchen.
//!
//! **Purpose:** Turn order events into sounds whose urgency, loudness and
//! repetition fit the current service period, and mirror every notification
//! to visual, caption, speech and screen-reader channels.
//!
//! **Architecture:** symphonia + rubato decode and resample assets; playback
//! runs on cpal (per-voice effect chain), rodio (plain samples) or headless.

pub mod accessibility;
pub mod adaptation;
pub mod audio;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod learning;
pub mod monitor;
pub mod notification;
pub mod playback;
pub mod state;
pub mod urgency;

pub use dispatcher::{EngineComponents, EngineStatistics, NotificationEngine};
pub use error::{Error, Result};
pub use notification::{Adaptation, Notification};
pub use state::SharedState;
