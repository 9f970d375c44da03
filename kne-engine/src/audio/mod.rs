//! Audio primitives: decoding, resampling, device output, DSP and tone synthesis

pub mod decoder;
pub mod dsp;
pub mod output;
pub mod resampler;
pub mod synth;
pub mod types;

pub use decoder::AssetDecoder;
pub use output::AudioOutput;
pub use resampler::Resampler;
pub use types::{AudioFrame, SoundBuffer};
