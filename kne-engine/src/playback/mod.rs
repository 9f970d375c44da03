//! Sound playback
//!
//! Asset registry, backends and the playback engine that fronts them.

pub mod backend;
pub mod engine;
pub mod graph;
pub mod registry;
pub mod sampler;
pub mod voice;

pub use backend::{AudioBackend, BackendKind, HeadlessBackend};
pub use engine::{PlayOutcome, PlaybackEngine, SoundEvent, SOUND_EVENT_CAP};
pub use registry::{SoundAsset, SoundRegistry};
pub use voice::{PlayParams, SpatialPosition, VoiceId, VoiceSpec, VoiceTracker};
