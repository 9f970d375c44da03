//! Property tests for the pure scoring and adaptation functions

use chrono::{NaiveDate, NaiveDateTime};
use kne_common::{Context, EnvironmentalState, OrderData, OrderPriority, SoundType, UrgencyLevel};
use kne_engine::adaptation::{adapt, alternate_sound, volume, MAX_VOLUME, MIN_VOLUME};
use kne_engine::context::detect;
use kne_engine::history::NotificationHistory;
use kne_engine::urgency::score;
use proptest::prelude::*;

fn any_context() -> impl Strategy<Value = Context> {
    (0..Context::ALL.len()).prop_map(|i| Context::ALL[i])
}

fn any_urgency() -> impl Strategy<Value = UrgencyLevel> {
    (0..UrgencyLevel::ALL.len()).prop_map(|i| UrgencyLevel::ALL[i])
}

fn any_sound() -> impl Strategy<Value = SoundType> {
    (0..SoundType::ALL.len()).prop_map(|i| SoundType::ALL[i])
}

fn any_priority() -> impl Strategy<Value = OrderPriority> {
    prop_oneof![
        Just(OrderPriority::Normal),
        Just(OrderPriority::High),
        Just(OrderPriority::Urgent),
    ]
}

/// Any f64, including the non-finite ones
fn wild_f64() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -1.0e6f64..1.0e6,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
        1 => Just(f64::MAX),
        1 => Just(0.0),
    ]
}

fn any_environment() -> impl Strategy<Value = EnvironmentalState> {
    (0.0f64..1.0, 0u32..20, 0u32..40, 0.0f64..60.0, 0.0f64..30.0).prop_map(
        |(ambient_noise, staff_count, order_backlog, average_wait_time, recent_order_rate)| {
            EnvironmentalState {
                ambient_noise,
                staff_count,
                order_backlog,
                average_wait_time,
                recent_order_rate,
            }
        },
    )
}

fn any_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (1u32..29, 0u32..24, 0u32..60).prop_map(|(day, hour, minute)| {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    })
}

/// Wait times including the unbounded end
fn any_wait_time() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.0f64..1.0e9,
        1 => Just(f64::MAX),
        1 => Just(f64::INFINITY),
    ]
}

fn priority_rank(priority: OrderPriority) -> u8 {
    match priority {
        OrderPriority::Normal => 0,
        OrderPriority::High => 1,
        OrderPriority::Urgent => 2,
    }
}

proptest! {
    #[test]
    fn volume_stays_in_bounds(
        urgency in any_urgency(),
        context in any_context(),
        bias in wild_f64(),
        noise in wild_f64(),
    ) {
        let env = EnvironmentalState { ambient_noise: noise, ..Default::default() };
        let v = volume(urgency, context, bias, &env);
        prop_assert!((MIN_VOLUME..=MAX_VOLUME).contains(&v), "volume {}", v);
    }

    #[test]
    fn adaptation_stays_in_bounds(
        sound in any_sound(),
        urgency in any_urgency(),
        context in any_context(),
        bias in wild_f64(),
        env in any_environment(),
    ) {
        let history = NotificationHistory::new();
        let a = adapt(sound, urgency, context, bias, &env, &history, chrono::Utc::now());
        prop_assert!((MIN_VOLUME..=MAX_VOLUME).contains(&a.volume));
        prop_assert!((1..=4).contains(&a.repeat));
        prop_assert!(!a.use_alternate_sound);
    }

    #[test]
    fn urgency_non_decreasing_in_wait_time(
        sound in any_sound(),
        context in any_context(),
        env in any_environment(),
        priority in any_priority(),
        a in any_wait_time(),
        b in any_wait_time(),
    ) {
        let (short_wait, long_wait) = if a <= b { (a, b) } else { (b, a) };
        let shorter = OrderData::new("P").with_priority(priority).with_wait_time(short_wait);
        let longer = OrderData::new("P").with_priority(priority).with_wait_time(long_wait);
        prop_assert!(
            score(sound, Some(&shorter), context, &env, None)
                <= score(sound, Some(&longer), context, &env, None)
        );
    }

    #[test]
    fn urgency_non_decreasing_in_priority(
        sound in any_sound(),
        context in any_context(),
        env in any_environment(),
        a in any_priority(),
        b in any_priority(),
        wait in 0.0f64..60.0,
    ) {
        let (low, high) = if priority_rank(a) <= priority_rank(b) { (a, b) } else { (b, a) };
        let lower = OrderData::new("P").with_priority(low).with_wait_time(wait);
        let higher = OrderData::new("P").with_priority(high).with_wait_time(wait);
        prop_assert!(
            score(sound, Some(&lower), context, &env, None)
                <= score(sound, Some(&higher), context, &env, None)
        );
    }

    #[test]
    fn urgency_non_decreasing_in_backlog(
        sound in any_sound(),
        context in any_context(),
        env in any_environment(),
        extra in 0u32..50,
    ) {
        let busier = EnvironmentalState { order_backlog: env.order_backlog + extra, ..env };
        prop_assert!(score(sound, None, context, &env, None) <= score(sound, None, context, &busier, None));
    }

    #[test]
    fn forced_urgency_returned_unchanged(
        sound in any_sound(),
        context in any_context(),
        env in any_environment(),
        forced in any_urgency(),
    ) {
        prop_assert_eq!(score(sound, None, context, &env, Some(forced)), forced);
    }

    #[test]
    fn detect_is_deterministic(at in any_datetime(), env in any_environment()) {
        prop_assert_eq!(detect(&at, &env), detect(&at, &env));
    }

    #[test]
    fn alternate_sound_is_an_involution(sound in any_sound()) {
        prop_assert_eq!(alternate_sound(alternate_sound(sound)), sound);
    }
}
