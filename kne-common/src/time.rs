//! Timestamp utilities and the engine clock
//!
//! Context detection depends on local wall-clock time, so the engine reads
//! time through [`Clock`] instead of calling `chrono` directly. Production uses
//! [`SystemClock`]; tests pin time with [`FixedClock`].

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::sync::Mutex;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    /// Local wall-clock time (drives context detection)
    fn local_now(&self) -> NaiveDateTime;

    /// UTC timestamp for records and rolling windows
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
///
/// Local time and UTC are the same instant (UTC offset zero).
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self {
            current: Mutex::new(at),
        }
    }

    /// Move the clock to a new instant
    pub fn set(&self, at: NaiveDateTime) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// Move the clock forward
    pub fn advance(&self, by: chrono::Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Clock for FixedClock {
    fn local_now(&self) -> NaiveDateTime {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn utc_now(&self) -> DateTime<Utc> {
        self.local_now().and_utc()
    }
}
