//! Urgency scoring
//!
//! Points accumulate from the sound type, the order and the kitchen load,
//! then map onto [`UrgencyLevel`]: ≥4 critical, ≥3 high, ≥2 medium.

use crate::context::profile;
use kne_common::{Context, EnvironmentalState, OrderData, OrderPriority, SoundType, UrgencyLevel};

/// Minutes of extra wait per additional urgency point
const WAIT_STEP_MINUTES: f64 = 5.0;

/// Wait points saturate here; enough on their own for critical
pub const MAX_WAIT_POINTS: f64 = 4.0;

/// Base points of a sound type
pub fn base_points(sound_type: SoundType) -> f64 {
    match sound_type {
        SoundType::UrgentAlert | SoundType::Error => 3.0,
        SoundType::NewOrder | SoundType::OrderReady | SoundType::Warning => 2.0,
        SoundType::OrderComplete | SoundType::Notification | SoundType::Bell => 1.0,
        SoundType::Success | SoundType::Chime | SoundType::Tick | SoundType::Whoosh => 0.0,
    }
}

/// Raw score before mapping to a level
pub fn raw_score(
    sound_type: SoundType,
    order: Option<&OrderData>,
    context: Context,
    env: &EnvironmentalState,
) -> f64 {
    let triggers = profile(context).triggers;
    let mut score = base_points(sound_type);

    if let Some(order) = order {
        score += wait_points(order.wait_time, triggers.wait_time_threshold);

        score += match order.priority {
            OrderPriority::Urgent => 2.0,
            OrderPriority::High => 1.0,
            OrderPriority::Normal => 0.0,
        };

        if order.allergy_alert {
            score += 1.0;
        }
        if order.has_special_instructions() {
            score += 0.5;
        }
    }

    if env.order_backlog > triggers.backlog_threshold {
        score += 1.0;
    }
    if env.recent_order_rate > triggers.order_threshold {
        score += 1.0;
    }

    score
}

/// One point per full step beyond the threshold, capped at [`MAX_WAIT_POINTS`]
///
/// NaN scores nothing; +∞ saturates.
fn wait_points(wait_time: f64, threshold: f64) -> f64 {
    if wait_time.is_nan() || wait_time <= threshold {
        return 0.0;
    }
    ((wait_time - threshold) / WAIT_STEP_MINUTES)
        .floor()
        .min(MAX_WAIT_POINTS)
}

pub fn level_for_score(score: f64) -> UrgencyLevel {
    if score >= 4.0 {
        UrgencyLevel::Critical
    } else if score >= 3.0 {
        UrgencyLevel::High
    } else if score >= 2.0 {
        UrgencyLevel::Medium
    } else {
        UrgencyLevel::Low
    }
}

/// Score a notification; a forced level is returned unchanged
pub fn score(
    sound_type: SoundType,
    order: Option<&OrderData>,
    context: Context,
    env: &EnvironmentalState,
    force: Option<UrgencyLevel>,
) -> UrgencyLevel {
    match force {
        Some(level) => level,
        None => level_for_score(raw_score(sound_type, order, context, env)),
    }
}
