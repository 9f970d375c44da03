//! Context detection
//!
//! Pure function of local time and environment. No state is carried
//! between calls.

use crate::context::profiles::{profile, PROFILES};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use kne_common::{Context, EnvironmentalState};

/// Hour before which an overload escalates to lunch rather than dinner rush
const LUNCH_ESCALATION_CUTOFF_HOUR: u32 = 15;

/// Detect the operating context
///
/// 1. Time selects the first profile whose hours contain `now.hour()`
///    (`preparation` if none).
/// 2. Backlog or order rate above that profile's thresholds escalates to a
///    rush context by time of day.
/// 3. On weekends rush contexts are dampened.
pub fn detect(now: &NaiveDateTime, env: &EnvironmentalState) -> Context {
    let hour = now.hour();

    let by_time = PROFILES
        .iter()
        .find(|p| p.matches_hour(hour))
        .map(|p| p.context)
        .unwrap_or(Context::Preparation);

    let triggers = profile(by_time).triggers;
    let overloaded = env.order_backlog > triggers.backlog_threshold
        || env.recent_order_rate > triggers.order_threshold;

    let context = if overloaded {
        if hour < LUNCH_ESCALATION_CUTOFF_HOUR {
            Context::LunchRush
        } else {
            Context::DinnerRush
        }
    } else {
        by_time
    };

    if is_weekend(now) {
        dampen_weekend(context)
    } else {
        context
    }
}

fn is_weekend(now: &NaiveDateTime) -> bool {
    matches!(now.weekday(), Weekday::Sat | Weekday::Sun)
}

fn dampen_weekend(context: Context) -> Context {
    match context {
        Context::LunchRush => Context::Preparation,
        Context::DinnerRush => Context::AfternoonLull,
        other => other,
    }
}
