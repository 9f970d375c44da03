//! Static context profile table

use kne_common::Context;
use serde::Serialize;

/// How aggressively a context repeats notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatBehavior {
    Reduced,
    Normal,
    Enhanced,
}

/// Hour range `[start, end)`; wraps past midnight when `start > end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristics {
    pub base_volume: f64,
    pub urgency_multiplier: f64,
    pub repeat_behavior: RepeatBehavior,
    /// Whether repeated sounds may switch to their alternate
    pub sound_variation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Triggers {
    /// Orders per interval above which the context escalates
    pub order_threshold: f64,
    /// Minutes of wait before urgency grows
    pub wait_time_threshold: f64,
    pub backlog_threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextProfile {
    pub context: Context,
    pub hours: &'static [HourRange],
    pub characteristics: Characteristics,
    pub triggers: Triggers,
}

impl ContextProfile {
    pub fn matches_hour(&self, hour: u32) -> bool {
        self.hours.iter().any(|range| range.contains(hour))
    }
}

/// Profiles in match order
pub static PROFILES: [ContextProfile; 7] = [
    ContextProfile {
        context: Context::QuietHours,
        hours: &[HourRange::new(23, 7)],
        characteristics: Characteristics {
            base_volume: 0.4,
            urgency_multiplier: 0.8,
            repeat_behavior: RepeatBehavior::Reduced,
            sound_variation: false,
        },
        triggers: Triggers {
            order_threshold: 3.0,
            wait_time_threshold: 20.0,
            backlog_threshold: 5,
        },
    },
    ContextProfile {
        context: Context::Breakfast,
        hours: &[HourRange::new(7, 9)],
        characteristics: Characteristics {
            base_volume: 0.7,
            urgency_multiplier: 1.1,
            repeat_behavior: RepeatBehavior::Normal,
            sound_variation: false,
        },
        triggers: Triggers {
            order_threshold: 6.0,
            wait_time_threshold: 12.0,
            backlog_threshold: 8,
        },
    },
    ContextProfile {
        context: Context::Preparation,
        hours: &[HourRange::new(9, 11)],
        characteristics: Characteristics {
            base_volume: 0.6,
            urgency_multiplier: 1.0,
            repeat_behavior: RepeatBehavior::Normal,
            sound_variation: false,
        },
        triggers: Triggers {
            order_threshold: 5.0,
            wait_time_threshold: 15.0,
            backlog_threshold: 8,
        },
    },
    ContextProfile {
        context: Context::LunchRush,
        hours: &[HourRange::new(11, 14)],
        characteristics: Characteristics {
            base_volume: 0.8,
            urgency_multiplier: 1.3,
            repeat_behavior: RepeatBehavior::Enhanced,
            sound_variation: true,
        },
        triggers: Triggers {
            order_threshold: 10.0,
            wait_time_threshold: 10.0,
            backlog_threshold: 10,
        },
    },
    ContextProfile {
        context: Context::AfternoonLull,
        hours: &[HourRange::new(14, 17)],
        characteristics: Characteristics {
            base_volume: 0.5,
            urgency_multiplier: 0.9,
            repeat_behavior: RepeatBehavior::Reduced,
            sound_variation: false,
        },
        triggers: Triggers {
            order_threshold: 4.0,
            wait_time_threshold: 15.0,
            backlog_threshold: 6,
        },
    },
    ContextProfile {
        context: Context::DinnerRush,
        hours: &[HourRange::new(17, 21)],
        characteristics: Characteristics {
            base_volume: 0.85,
            urgency_multiplier: 1.4,
            repeat_behavior: RepeatBehavior::Enhanced,
            sound_variation: true,
        },
        triggers: Triggers {
            order_threshold: 12.0,
            wait_time_threshold: 10.0,
            backlog_threshold: 12,
        },
    },
    ContextProfile {
        context: Context::Closing,
        hours: &[HourRange::new(21, 23)],
        characteristics: Characteristics {
            base_volume: 0.5,
            urgency_multiplier: 0.9,
            repeat_behavior: RepeatBehavior::Normal,
            sound_variation: false,
        },
        triggers: Triggers {
            order_threshold: 4.0,
            wait_time_threshold: 15.0,
            backlog_threshold: 6,
        },
    },
];

/// Profile of a context
pub fn profile(context: Context) -> &'static ContextProfile {
    let index = match context {
        Context::QuietHours => 0,
        Context::Breakfast => 1,
        Context::Preparation => 2,
        Context::LunchRush => 3,
        Context::AfternoonLull => 4,
        Context::DinnerRush => 5,
        Context::Closing => 6,
    };
    &PROFILES[index]
}
