//! Operating context, urgency and environment snapshot types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named operating regime of the kitchen
///
/// Each context carries its own audio behavior profile (see the engine's
/// profile table). Declaration order is the order profiles are matched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Context {
    QuietHours,
    Breakfast,
    Preparation,
    LunchRush,
    AfternoonLull,
    DinnerRush,
    Closing,
}

impl Context {
    pub const ALL: [Context; 7] = [
        Context::QuietHours,
        Context::Breakfast,
        Context::Preparation,
        Context::LunchRush,
        Context::AfternoonLull,
        Context::DinnerRush,
        Context::Closing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Context::QuietHours => "quiet-hours",
            Context::Breakfast => "breakfast",
            Context::Preparation => "preparation",
            Context::LunchRush => "lunch-rush",
            Context::AfternoonLull => "afternoon-lull",
            Context::DinnerRush => "dinner-rush",
            Context::Closing => "closing",
        }
    }

    /// Lunch and dinner rush
    pub fn is_rush(&self) -> bool {
        matches!(self, Context::LunchRush | Context::DinnerRush)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Context {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Context::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown context: {}", s)))
    }
}

/// Severity assigned to one notification
///
/// Ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    pub const ALL: [UrgencyLevel; 4] = [
        UrgencyLevel::Low,
        UrgencyLevel::Medium,
        UrgencyLevel::High,
        UrgencyLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
            UrgencyLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of kitchen load pushed in by the order-management system
///
/// Fields are updated independently (last write wins per field); there is
/// no cross-field atomicity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalState {
    /// Ambient noise estimate, always within [0.0, 1.0]
    pub ambient_noise: f64,
    pub staff_count: u32,
    /// Orders waiting to be prepared
    pub order_backlog: u32,
    /// Average wait time in minutes
    pub average_wait_time: f64,
    /// Orders per 15 minutes (as reported by the host)
    pub recent_order_rate: f64,
}

impl Default for EnvironmentalState {
    fn default() -> Self {
        Self {
            ambient_noise: 0.5,
            staff_count: 1,
            order_backlog: 0,
            average_wait_time: 0.0,
            recent_order_rate: 0.0,
        }
    }
}

impl EnvironmentalState {
    /// Apply a partial update, field by field
    ///
    /// Ambient noise is clamped into [0, 1]; negative or non-finite rates and
    /// wait times are ignored.
    pub fn apply(&mut self, update: &EnvironmentUpdate) {
        if let Some(noise) = update.ambient_noise {
            if noise.is_finite() {
                self.ambient_noise = noise.clamp(0.0, 1.0);
            }
        }
        if let Some(staff) = update.staff_count {
            self.staff_count = staff;
        }
        if let Some(backlog) = update.order_backlog {
            self.order_backlog = backlog;
        }
        if let Some(wait) = update.average_wait_time {
            if wait.is_finite() && wait >= 0.0 {
                self.average_wait_time = wait;
            }
        }
        if let Some(rate) = update.recent_order_rate {
            if rate.is_finite() && rate >= 0.0 {
                self.recent_order_rate = rate;
            }
        }
    }
}

/// Partial environment update; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentUpdate {
    pub ambient_noise: Option<f64>,
    pub staff_count: Option<u32>,
    pub order_backlog: Option<u32>,
    pub average_wait_time: Option<f64>,
    pub recent_order_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_ordering() {
        assert!(UrgencyLevel::Low < UrgencyLevel::Medium);
        assert!(UrgencyLevel::Medium < UrgencyLevel::High);
        assert!(UrgencyLevel::High < UrgencyLevel::Critical);
    }

    #[test]
    fn test_rush_contexts() {
        let rush: Vec<_> = Context::ALL.iter().filter(|c| c.is_rush()).collect();
        assert_eq!(rush, vec![&Context::LunchRush, &Context::DinnerRush]);
    }

    #[test]
    fn test_context_parse_round_trip() {
        for context in Context::ALL {
            assert_eq!(context.as_str().parse::<Context>().unwrap(), context);
        }
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let mut env = EnvironmentalState::default();
        env.apply(&EnvironmentUpdate {
            order_backlog: Some(12),
            ..Default::default()
        });
        assert_eq!(env.order_backlog, 12);
        assert_eq!(env.staff_count, 1);
        assert_eq!(env.ambient_noise, 0.5);
    }

    #[test]
    fn test_ambient_noise_clamped() {
        let mut env = EnvironmentalState::default();
        env.apply(&EnvironmentUpdate {
            ambient_noise: Some(4.0),
            ..Default::default()
        });
        assert_eq!(env.ambient_noise, 1.0);

        env.apply(&EnvironmentUpdate {
            ambient_noise: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(env.ambient_noise, 1.0);
    }
}
