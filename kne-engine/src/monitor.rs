//! Background context monitor
//!
//! Re-detects the operating context on a fixed interval so that
//! `ContextChanged` fires even when no notification is dispatched.

use crate::context::detect;
use crate::state::SharedState;
use kne_common::events::{EngineEvent, EventBus};
use kne_common::time::Clock;
use kne_common::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

/// Detect the context now and publish a change
///
/// Returns the detected context.
pub async fn refresh_context(state: &SharedState, clock: &dyn Clock, event_bus: &EventBus) -> Context {
    let env = state.environment().await;
    let detected = detect(&clock.local_now(), &env);

    if let Some(old_context) = state.replace_context(detected).await {
        info!("Context changed: {} -> {}", old_context, detected);
        event_bus.emit_lossy(EngineEvent::ContextChanged {
            old_context,
            new_context: detected,
            timestamp: clock.utc_now(),
        });
    }
    detected
}

/// Spawn the monitor task
pub fn start_context_monitor(
    state: Arc<SharedState>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        info!("Context monitor started ({}s interval)", interval.as_secs());

        loop {
            ticker.tick().await;
            let context = refresh_context(&state, clock.as_ref(), &event_bus).await;
            debug!("Context monitor tick: {}", context);
        }
    })
}
