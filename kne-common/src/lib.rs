//! # KNE Common Library
//!
//! Shared code for the kitchen notification engine and its host applications:
//! - Sound, context, order and environment model types
//! - Accessibility settings and alert records
//! - Event types (EngineEvent enum) and the EventBus
//! - Configuration loading
//! - SQLite-backed settings persistence
//! - Clock abstraction for wall-clock dependent logic

pub mod alerts;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod events;
pub mod order;
pub mod settings;
pub mod sound;
pub mod time;

pub use context::{Context, EnvironmentUpdate, EnvironmentalState, UrgencyLevel};
pub use error::{Error, Result};
pub use order::{OrderData, OrderPriority};
pub use settings::{AccessibilitySettings, AccessibilitySettingsUpdate, SpeechRate};
pub use sound::SoundType;
