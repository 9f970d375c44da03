//! Settings persistence
//!
//! Accessibility settings are stored as one JSON blob under a fixed key.
//! The blob is read once at startup and replaced in full on every change.

use crate::settings::AccessibilitySettings;
use crate::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::{debug, warn};

/// Key of the accessibility settings blob
pub const ACCESSIBILITY_SETTINGS_KEY: &str = "accessibility_settings";

/// Settings table accessor
#[derive(Clone)]
pub struct SettingsStore {
    db: Pool<Sqlite>,
}

impl SettingsStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Load the persisted accessibility settings
    ///
    /// Returns `Ok(None)` when nothing has been saved yet. A blob that no
    /// longer parses is reported as `Error::Serialization`.
    pub async fn load_accessibility(&self) -> Result<Option<AccessibilitySettings>> {
        match get_raw(&self.db, ACCESSIBILITY_SETTINGS_KEY).await? {
            Some(blob) => {
                let settings = serde_json::from_str(&blob)?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    /// Load settings, falling back to defaults on a missing or corrupt blob
    pub async fn load_accessibility_or_default(&self) -> AccessibilitySettings {
        match self.load_accessibility().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No stored accessibility settings, using defaults");
                AccessibilitySettings::default()
            }
            Err(e) => {
                warn!("Stored accessibility settings unreadable ({}), using defaults", e);
                AccessibilitySettings::default()
            }
        }
    }

    /// Overwrite the persisted accessibility settings
    pub async fn save_accessibility(&self, settings: &AccessibilitySettings) -> Result<()> {
        let blob = serde_json::to_string(settings)?;
        set_raw(&self.db, ACCESSIBILITY_SETTINGS_KEY, &blob).await
    }
}

/// Read one raw setting value
pub async fn get_raw(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;
    Ok(value.flatten())
}

/// Insert or replace one raw setting value
pub async fn set_raw(db: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("Setting key must not be empty".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;

    Ok(())
}
