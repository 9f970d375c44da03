//! Adaptive learning store
//!
//! Per-context volume bias (set only from outside) and per
//! (context, sound, urgency) dispatch counters. Counters never feed back
//! into the bias.

use crate::error::{Error, Result};
use kne_common::{Context, SoundType, UrgencyLevel};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

pub const DEFAULT_VOLUME_BIAS: f64 = 1.0;

/// Key of one effectiveness counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivenessKey {
    pub context: Context,
    pub sound_type: SoundType,
    pub urgency: UrgencyLevel,
}

#[derive(Debug, Default)]
pub struct LearningStore {
    volume_bias: RwLock<HashMap<Context, f64>>,
    effectiveness: RwLock<HashMap<EffectivenessKey, u64>>,
}

impl LearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume_bias(&self, context: Context) -> f64 {
        self.volume_bias
            .read()
            .ok()
            .and_then(|bias| bias.get(&context).copied())
            .unwrap_or(DEFAULT_VOLUME_BIAS)
    }

    /// Set the bias for one context
    ///
    /// # Errors
    /// `Error::InvalidInput` unless `bias` is finite and positive.
    pub fn set_volume_bias(&self, context: Context, bias: f64) -> Result<()> {
        if !bias.is_finite() || bias <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Volume bias must be finite and positive, got {}",
                bias
            )));
        }
        let mut map = self
            .volume_bias
            .write()
            .map_err(|_| Error::Internal("Volume bias lock poisoned".to_string()))?;
        map.insert(context, bias);
        info!("Volume bias for {} set to {:.2}", context, bias);
        Ok(())
    }

    pub fn record_dispatch(&self, context: Context, sound_type: SoundType, urgency: UrgencyLevel) {
        if let Ok(mut counters) = self.effectiveness.write() {
            *counters
                .entry(EffectivenessKey {
                    context,
                    sound_type,
                    urgency,
                })
                .or_insert(0) += 1;
        }
    }

    pub fn effectiveness(
        &self,
        context: Context,
        sound_type: SoundType,
        urgency: UrgencyLevel,
    ) -> u64 {
        let key = EffectivenessKey {
            context,
            sound_type,
            urgency,
        };
        self.effectiveness
            .read()
            .ok()
            .and_then(|c| c.get(&key).copied())
            .unwrap_or(0)
    }

    /// Sum over all counters
    pub fn total_dispatches(&self) -> u64 {
        self.effectiveness
            .read()
            .map(|c| c.values().sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_defaults_and_validation() {
        let store = LearningStore::new();
        assert_eq!(store.volume_bias(Context::Closing), 1.0);

        store.set_volume_bias(Context::Closing, 0.7).unwrap();
        assert_eq!(store.volume_bias(Context::Closing), 0.7);
        assert_eq!(store.volume_bias(Context::Breakfast), 1.0);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(store.set_volume_bias(Context::Closing, bad).is_err());
        }
        assert_eq!(store.volume_bias(Context::Closing), 0.7);
    }

    #[test]
    fn test_counters_increment_per_key() {
        let store = LearningStore::new();
        store.record_dispatch(Context::LunchRush, SoundType::NewOrder, UrgencyLevel::High);
        store.record_dispatch(Context::LunchRush, SoundType::NewOrder, UrgencyLevel::High);
        store.record_dispatch(Context::LunchRush, SoundType::NewOrder, UrgencyLevel::Low);

        assert_eq!(
            store.effectiveness(Context::LunchRush, SoundType::NewOrder, UrgencyLevel::High),
            2
        );
        assert_eq!(store.total_dispatches(), 3);
        // Dispatch counts do not move the bias
        assert_eq!(store.volume_bias(Context::LunchRush), DEFAULT_VOLUME_BIAS);
    }
}
