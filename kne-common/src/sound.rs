//! Sound type vocabulary
//!
//! Closed set of sounds the engine knows how to play. Every table keyed by
//! sound type (asset names, fallback tones, base urgency scores, alert colors)
//! is an exhaustive `match` over this enum.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of sound a notification plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundType {
    NewOrder,
    OrderReady,
    UrgentAlert,
    OrderComplete,
    Warning,
    Success,
    Error,
    Notification,
    Bell,
    Chime,
    Tick,
    Whoosh,
}

impl SoundType {
    /// Every sound type, in declaration order
    pub const ALL: [SoundType; 12] = [
        SoundType::NewOrder,
        SoundType::OrderReady,
        SoundType::UrgentAlert,
        SoundType::OrderComplete,
        SoundType::Warning,
        SoundType::Success,
        SoundType::Error,
        SoundType::Notification,
        SoundType::Bell,
        SoundType::Chime,
        SoundType::Tick,
        SoundType::Whoosh,
    ];

    /// Stable kebab-case name (also used for asset file names)
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundType::NewOrder => "new-order",
            SoundType::OrderReady => "order-ready",
            SoundType::UrgentAlert => "urgent-alert",
            SoundType::OrderComplete => "order-complete",
            SoundType::Warning => "warning",
            SoundType::Success => "success",
            SoundType::Error => "error",
            SoundType::Notification => "notification",
            SoundType::Bell => "bell",
            SoundType::Chime => "chime",
            SoundType::Tick => "tick",
            SoundType::Whoosh => "whoosh",
        }
    }

    /// True for sounds tied to an order lifecycle step
    pub fn is_order_related(&self) -> bool {
        matches!(
            self,
            SoundType::NewOrder | SoundType::OrderReady | SoundType::OrderComplete
        )
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SoundType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        SoundType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown sound type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_parse_back() {
        for sound in SoundType::ALL {
            assert_eq!(sound.as_str().parse::<SoundType>().unwrap(), sound);
        }
        let mut names: Vec<_> = SoundType::ALL.iter().map(|s| s.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), SoundType::ALL.len());
    }

    #[test]
    fn test_parse_accepts_underscores_and_case() {
        assert_eq!("Order_Ready".parse::<SoundType>().unwrap(), SoundType::OrderReady);
        assert!("klaxon".parse::<SoundType>().is_err());
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&SoundType::UrgentAlert).unwrap();
        assert_eq!(json, "\"urgent-alert\"");
    }
}
