//! Records produced by the accessibility channels
//!
//! These are the payloads UI consumers receive through the event bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a visual alert is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualAlertKind {
    /// Full-screen flash
    Flash,
    /// Colored border pulse
    Border,
}

/// Visual counterpart of a sound notification; expires after `duration_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAlert {
    pub id: Uuid,
    pub kind: VisualAlertKind,
    /// CSS hex color
    pub color: String,
    pub duration_ms: u64,
    /// 0-100
    pub intensity: u8,
    pub message: Option<String>,
}

/// Caption grouping used by the display for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionCategory {
    Notification,
    System,
    Order,
}

/// One caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleEntry {
    pub id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Display time; never below 3000ms
    pub duration_ms: u64,
    pub category: CaptionCategory,
    pub language: String,
}

/// Host action requested by a recognized voice command
///
/// The host maps each action onto its keyboard-shortcut equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceAction {
    NextOrder,
    PreviousOrder,
    MarkReady,
    CompleteOrder,
    RepeatLast,
    ShowOrders,
    Mute,
    Unmute,
    Help,
}

impl VoiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceAction::NextOrder => "next-order",
            VoiceAction::PreviousOrder => "previous-order",
            VoiceAction::MarkReady => "mark-ready",
            VoiceAction::CompleteOrder => "complete-order",
            VoiceAction::RepeatLast => "repeat-last",
            VoiceAction::ShowOrders => "show-orders",
            VoiceAction::Mute => "mute",
            VoiceAction::Unmute => "unmute",
            VoiceAction::Help => "help",
        }
    }
}
