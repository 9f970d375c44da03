//! Error types for kne-engine
//!
//! Internal failures are typed here and caught at their origin; the
//! notification entry points never hand them to the caller.

use thiserror::Error;

/// Main error type for kne-engine
#[derive(Error, Debug)]
pub enum Error {
    /// Shared-library error (config, database, settings blob)
    #[error(transparent)]
    Common(#[from] kne_common::Error),

    /// Sound asset missing, unreadable or undecodable
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Playback backend unavailable or failed
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// Host accessibility capability missing or failed
    #[error("Capability error: {0}")]
    Capability(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using kne-engine Error
pub type Result<T> = std::result::Result<T, Error>;
