//! Screen-reader announcer
//!
//! One assertive live region. Each announcement clears the region, then
//! writes the text after a short pause so the screen reader notices the
//! change. A newer announcement supersedes one still pending.

use crate::accessibility::platform::{guard, LiveRegion};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const ANNOUNCE_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct Announcer {
    region: Option<Arc<dyn LiveRegion>>,
    generation: Arc<AtomicU64>,
}

impl Announcer {
    pub fn new(region: Option<Arc<dyn LiveRegion>>) -> Self {
        Self {
            region,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_available(&self) -> bool {
        self.region.is_some()
    }

    /// Clear the region now and write `text` after [`ANNOUNCE_DELAY`]
    ///
    /// Must be called from within a tokio runtime.
    pub fn announce(&self, text: &str) -> Result<()> {
        let region = self
            .region
            .clone()
            .ok_or_else(|| Error::Capability("No live region available".to_string()))?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        guard("live region", || region.set_text(""))?;

        let current = Arc::clone(&self.generation);
        let text = text.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(ANNOUNCE_DELAY).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            if let Err(e) = guard("live region", || region.set_text(&text)) {
                warn!("Live region update failed: {}", e);
            }
        });
        Ok(())
    }
}
