//! Adaptation generator
//!
//! Turns an urgency level and the current context into volume, repeat
//! count, inter-repeat delay and the alternate-sound decision.

use crate::context::{profile, RepeatBehavior};
use crate::history::NotificationHistory;
use crate::notification::Adaptation;
use chrono::{DateTime, Utc};
use kne_common::{Context, EnvironmentalState, SoundType, UrgencyLevel};

pub const MIN_VOLUME: f64 = 0.1;
pub const MAX_VOLUME: f64 = 1.0;

/// Window in which repeats of one sound type count toward variation
pub const VARIATION_WINDOW_SECS: i64 = 60;
/// Earlier same-type notifications needed to switch to the alternate
pub const VARIATION_MIN_RECENT: usize = 2;

/// Weight of ambient noise deviation from 0.5 on volume
const NOISE_WEIGHT: f64 = 0.3;

pub fn level_multiplier(urgency: UrgencyLevel) -> f64 {
    match urgency {
        UrgencyLevel::Low => 0.8,
        UrgencyLevel::Medium => 1.0,
        UrgencyLevel::High => 1.2,
        UrgencyLevel::Critical => 1.5,
    }
}

pub fn repeat_count(behavior: RepeatBehavior, urgency: UrgencyLevel) -> u32 {
    match (behavior, urgency) {
        (RepeatBehavior::Reduced, UrgencyLevel::Critical) => 2,
        (RepeatBehavior::Reduced, _) => 1,
        (RepeatBehavior::Enhanced, UrgencyLevel::Critical) => 4,
        (RepeatBehavior::Enhanced, UrgencyLevel::High) => 3,
        (RepeatBehavior::Enhanced, UrgencyLevel::Medium) => 2,
        (RepeatBehavior::Enhanced, UrgencyLevel::Low) => 1,
        (RepeatBehavior::Normal, UrgencyLevel::Critical) => 3,
        (RepeatBehavior::Normal, UrgencyLevel::High) => 2,
        (RepeatBehavior::Normal, _) => 1,
    }
}

pub fn delay_ms(urgency: UrgencyLevel) -> u64 {
    match urgency {
        UrgencyLevel::Critical => 0,
        UrgencyLevel::High => 100,
        UrgencyLevel::Medium | UrgencyLevel::Low => 200,
    }
}

/// Contextual volume, clamped to [0.1, 1.0]
///
/// Any non-finite intermediate result yields the minimum.
pub fn volume(
    urgency: UrgencyLevel,
    context: Context,
    bias: f64,
    env: &EnvironmentalState,
) -> f64 {
    let c = profile(context).characteristics;
    let raw = c.base_volume * c.urgency_multiplier * level_multiplier(urgency) * bias
        + (env.ambient_noise - 0.5) * NOISE_WEIGHT;

    if raw.is_finite() {
        raw.clamp(MIN_VOLUME, MAX_VOLUME)
    } else {
        MIN_VOLUME
    }
}

/// Partner sound used to break up repetition
///
/// The mapping is its own inverse.
pub fn alternate_sound(sound_type: SoundType) -> SoundType {
    match sound_type {
        SoundType::NewOrder => SoundType::Bell,
        SoundType::Bell => SoundType::NewOrder,
        SoundType::OrderReady => SoundType::Chime,
        SoundType::Chime => SoundType::OrderReady,
        SoundType::UrgentAlert => SoundType::Warning,
        SoundType::Warning => SoundType::UrgentAlert,
        SoundType::OrderComplete => SoundType::Success,
        SoundType::Success => SoundType::OrderComplete,
        SoundType::Notification => SoundType::Whoosh,
        SoundType::Whoosh => SoundType::Notification,
        SoundType::Error => SoundType::Error,
        SoundType::Tick => SoundType::Tick,
    }
}

/// Derive the full adaptation for one notification
pub fn adapt(
    sound_type: SoundType,
    urgency: UrgencyLevel,
    context: Context,
    bias: f64,
    env: &EnvironmentalState,
    history: &NotificationHistory,
    now: DateTime<Utc>,
) -> Adaptation {
    let characteristics = profile(context).characteristics;

    let use_alternate_sound = characteristics.sound_variation
        && context.is_rush()
        && history.count_recent(
            sound_type,
            now,
            chrono::Duration::seconds(VARIATION_WINDOW_SECS),
        ) >= VARIATION_MIN_RECENT;

    Adaptation {
        volume: volume(urgency, context, bias, env),
        repeat: repeat_count(characteristics.repeat_behavior, urgency),
        delay_ms: delay_ms(urgency),
        use_alternate_sound,
    }
}
