//! Sample rate conversion using rubato
//!
//! Cached assets are converted once to the rate of the active output device.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Rate used when no device rate is known (headless backend)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Audio resampler for interleaved stereo buffers
pub struct Resampler;

impl Resampler {
    /// Resample interleaved stereo audio to `output_rate`.
    ///
    /// Returns a copy when the rates already match. The whole buffer is
    /// processed as a single chunk.
    pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
        if input_rate == output_rate || input.is_empty() {
            return Ok(input.to_vec());
        }
        if input_rate == 0 || output_rate == 0 {
            return Err(Error::InvalidInput(format!(
                "Invalid sample rates {} -> {}",
                input_rate, output_rate
            )));
        }

        debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

        let planar_input = Self::deinterleave(input);
        let input_frames = planar_input[0].len();

        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            2,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        Ok(Self::interleave(planar_output))
    }

    /// [L, R, L, R, ...] -> [[L, L, ...], [R, R, ...]]
    fn deinterleave(samples: &[f32]) -> Vec<Vec<f32>> {
        let frames = samples.len() / 2;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in samples.chunks_exact(2) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        vec![left, right]
    }

    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        if planar.len() < 2 {
            return planar.into_iter().next().unwrap_or_default();
        }
        planar[0]
            .iter()
            .zip(planar[1].iter())
            .flat_map(|(l, r)| [*l, *r])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave_roundtrip() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let planar = Resampler::deinterleave(&interleaved);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
        assert_eq!(Resampler::interleave(planar), interleaved);
    }

    #[test]
    fn test_resample_same_rate() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(Resampler::resample(&input, 48000, 48000).unwrap(), input);
    }

    #[test]
    fn test_resample_different_rate() {
        let input_rate = 48000;
        let frames = 4800;
        let mut input = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let t = i as f32 / input_rate as f32;
            let s = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            input.push(s);
            input.push(s);
        }

        let output = Resampler::resample(&input, input_rate, 44100).unwrap();
        let expected = (frames as f64 * 44100.0 / input_rate as f64) as usize;
        let got = output.len() / 2;
        assert!(
            got + 20 >= expected && got <= expected + 20,
            "expected ~{} frames, got {}",
            expected,
            got
        );
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(Resampler::resample(&[0.0, 0.0], 0, 44100).is_err());
    }
}
