//! Core audio data types
//!
//! Defines the decoded sound buffer and the stereo frame used by the mixer.

use std::sync::Arc;
use std::time::Duration;

/// Decoded sound ready for playback
///
/// **Format:**
/// - Samples are f32 (-1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Sample rate matches the active backend after resampling
///
/// Samples are shared (`Arc`) so every voice playing the same cached asset
/// reads one allocation.
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    /// PCM audio samples (interleaved stereo)
    pub samples: Arc<[f32]>,

    pub sample_rate: u32,

    /// Number of stereo frames (samples.len() / 2)
    pub frame_count: usize,
}

impl SoundBuffer {
    /// Create a buffer from interleaved stereo samples
    ///
    /// A trailing odd sample is dropped.
    pub fn new(mut samples: Vec<f32>, sample_rate: u32) -> Self {
        if samples.len() % 2 != 0 {
            samples.pop();
        }
        let frame_count = samples.len() / 2;
        Self {
            samples: samples.into(),
            sample_rate,
            frame_count,
        }
    }

    /// Playback length
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.frame_count as u128 * 1_000_000_000 / self.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }

    /// Get audio frame at specific frame index
    pub fn frame(&self, frame_index: usize) -> Option<AudioFrame> {
        let sample_index = frame_index * 2;
        if sample_index + 1 < self.samples.len() {
            Some(AudioFrame {
                left: self.samples[sample_index],
                right: self.samples[sample_index + 1],
            })
        } else {
            None
        }
    }

    /// Peak absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Copy of this buffer with every sample scaled by `gain`
    pub fn scaled(&self, gain: f32) -> Self {
        let samples: Vec<f32> = self.samples.iter().map(|s| s * gain).collect();
        Self::new(samples, self.sample_rate)
    }
}

/// AudioFrame represents a single stereo sample (one frame of audio).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Create a frame from mono sample (duplicate to both channels)
    pub fn from_mono(sample: f32) -> Self {
        AudioFrame { left: sample, right: sample }
    }

    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Apply volume scaling to both channels
    pub fn apply_volume(&mut self, volume: f32) {
        self.left *= volume;
        self.right *= volume;
    }

    /// Add another frame to this frame (for mixing)
    pub fn add(&mut self, other: &AudioFrame) {
        self.left += other.left;
        self.right += other.right;
    }

    /// Clamp samples to valid range [-1.0, 1.0] to prevent clipping
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(-1.0, 1.0);
        self.right = self.right.clamp(-1.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_buffer_duration() {
        // 44100 frames = 1 second at 44.1kHz
        let buffer = SoundBuffer::new(vec![0.0; 44100 * 2], 44100);
        assert_eq!(buffer.frame_count, 44100);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_odd_sample_dropped() {
        let buffer = SoundBuffer::new(vec![0.1, 0.2, 0.3], 8000);
        assert_eq!(buffer.frame_count, 1);
        assert_eq!(buffer.frame(0), Some(AudioFrame::from_stereo(0.1, 0.2)));
        assert_eq!(buffer.frame(1), None);
    }

    #[test]
    fn test_scaled_and_peak() {
        let buffer = SoundBuffer::new(vec![0.5, -0.8, 0.25, 0.1], 8000);
        assert_eq!(buffer.peak(), 0.8);
        let half = buffer.scaled(0.5);
        assert_eq!(half.peak(), 0.4);
    }

    #[test]
    fn test_audio_frame_mixing() {
        let mut frame = AudioFrame::from_stereo(0.8, -0.4);
        frame.add(&AudioFrame::from_mono(0.5));
        frame.clamp();
        assert_eq!(frame, AudioFrame::from_stereo(1.0, 0.1));
        frame.apply_volume(0.5);
        assert_eq!(frame.left, 0.5);
    }
}
