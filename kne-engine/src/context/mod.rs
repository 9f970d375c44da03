//! Operating context model: profile table and detector

pub mod detector;
pub mod profiles;

pub use detector::detect;
pub use profiles::{profile, ContextProfile, RepeatBehavior, PROFILES};
