//! Database access
//!
//! The engine persists exactly one thing: the accessibility settings blob,
//! stored in a key/value `settings` table.

pub mod init;
pub mod settings;

pub use init::{init_database, init_in_memory};
pub use settings::SettingsStore;
