//! Per-voice effect nodes for the graph backend
//!
//! Every node processes one stereo frame at a time on the audio thread, so
//! nodes hold all their state inline and never allocate after construction.

use crate::audio::AudioFrame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// One stage of a voice's effect chain
pub trait Effect: Send {
    fn process(&mut self, input: AudioFrame) -> AudioFrame;

    /// Frames of output still produced after the source ends
    fn tail_frames(&self) -> usize {
        0
    }
}

/// Biquad state for one channel (transposed direct form II)
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    z1: f32,
    z2: f32,
}

/// Low-shelf filter raising frequencies below the corner
///
/// Coefficients from the RBJ audio EQ cookbook, shelf slope 1.
#[derive(Debug, Clone)]
pub struct BassBoost {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    left: BiquadState,
    right: BiquadState,
}

impl BassBoost {
    pub const DEFAULT_CORNER_HZ: f32 = 200.0;
    pub const DEFAULT_GAIN_DB: f32 = 6.0;

    pub fn new(sample_rate: u32, corner_hz: f32, gain_db: f32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let corner = corner_hz.clamp(10.0, sample_rate * 0.45);
        let a = 10f32.powf(gain_db / 40.0);
        let w0 = 2.0 * PI * corner / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / 2.0 * 2f32.sqrt();
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha);
        let a0 = (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0);
        let a2 = (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            left: BiquadState::default(),
            right: BiquadState::default(),
        }
    }

    pub fn with_defaults(sample_rate: u32) -> Self {
        Self::new(sample_rate, Self::DEFAULT_CORNER_HZ, Self::DEFAULT_GAIN_DB)
    }

    fn step(&self, state: &mut BiquadState, x: f32) -> f32 {
        let y = self.b0 * x + state.z1;
        state.z1 = self.b1 * x - self.a1 * y + state.z2;
        state.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

impl Effect for BassBoost {
    fn process(&mut self, input: AudioFrame) -> AudioFrame {
        let mut left = self.left;
        let mut right = self.right;
        let out = AudioFrame::from_stereo(
            self.step(&mut left, input.left),
            self.step(&mut right, input.right),
        );
        self.left = left;
        self.right = right;
        out
    }
}

/// Convolution reverb over a sparse, exponentially decaying impulse response
///
/// The impulse response is a fixed set of taps generated from a seeded RNG,
/// so every voice gets the same room.
#[derive(Debug, Clone)]
pub struct SparseReverb {
    /// (delay in frames, left gain, right gain)
    taps: Vec<(usize, f32, f32)>,
    history: Vec<AudioFrame>,
    cursor: usize,
    wet: f32,
}

impl SparseReverb {
    pub const DEFAULT_DECAY_SECS: f32 = 0.8;
    pub const DEFAULT_WET: f32 = 0.25;
    const TAP_COUNT: usize = 48;
    const SEED: u64 = 0x4b4e_4552_5642;

    pub fn new(sample_rate: u32, decay_secs: f32, wet: f32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let length = ((decay_secs.max(0.01) * sample_rate) as usize).max(2);
        let mut rng = StdRng::seed_from_u64(Self::SEED);

        let mut taps: Vec<(usize, f32, f32)> = (0..Self::TAP_COUNT)
            .map(|_| {
                let delay = rng.gen_range(1..length);
                let envelope = (-3.0 * delay as f32 / length as f32).exp();
                let left = rng.gen_range(-1.0f32..1.0) * envelope;
                let right = rng.gen_range(-1.0f32..1.0) * envelope;
                (delay, left, right)
            })
            .collect();
        taps.sort_by_key(|t| t.0);

        // Normalize so the wet path peaks no louder than the dry signal
        let norm: f32 = taps.iter().map(|t| t.1.abs().max(t.2.abs())).sum();
        if norm > 0.0 {
            for tap in &mut taps {
                tap.1 /= norm;
                tap.2 /= norm;
            }
        }

        let max_delay = taps.last().map(|t| t.0).unwrap_or(1);
        Self {
            taps,
            history: vec![AudioFrame::zero(); max_delay + 1],
            cursor: 0,
            wet: wet.clamp(0.0, 1.0),
        }
    }

    pub fn with_defaults(sample_rate: u32) -> Self {
        Self::new(sample_rate, Self::DEFAULT_DECAY_SECS, Self::DEFAULT_WET)
    }
}

impl Effect for SparseReverb {
    fn process(&mut self, input: AudioFrame) -> AudioFrame {
        let len = self.history.len();
        self.history[self.cursor] = input;

        let mut wet = AudioFrame::zero();
        for &(delay, gl, gr) in &self.taps {
            let past = self.history[(self.cursor + len - delay) % len];
            wet.left += past.left * gl;
            wet.right += past.right * gr;
        }
        self.cursor = (self.cursor + 1) % len;

        AudioFrame::from_stereo(
            input.left * (1.0 - self.wet) + wet.left * self.wet,
            input.right * (1.0 - self.wet) + wet.right * self.wet,
        )
    }

    fn tail_frames(&self) -> usize {
        self.history.len() - 1
    }
}

/// Equal-power stereo panner with inverse-distance attenuation
///
/// Listener sits at the origin facing -z; +x is to the right.
#[derive(Debug, Clone, Copy)]
pub struct Panner {
    left_gain: f32,
    right_gain: f32,
}

impl Panner {
    /// Distance inside which no attenuation applies
    pub const REF_DISTANCE: f32 = 1.0;

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        let distance = (x * x + y * y + z * z).sqrt();
        if !distance.is_finite() {
            return Self {
                left_gain: 0.0,
                right_gain: 0.0,
            };
        }

        let pan = if distance > f32::EPSILON {
            (x / distance).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let angle = (pan + 1.0) * PI / 4.0;
        let attenuation = Self::REF_DISTANCE / distance.max(Self::REF_DISTANCE);

        Self {
            left_gain: angle.cos() * attenuation,
            right_gain: angle.sin() * attenuation,
        }
    }

    pub fn gains(&self) -> (f32, f32) {
        (self.left_gain, self.right_gain)
    }
}

impl Effect for Panner {
    fn process(&mut self, input: AudioFrame) -> AudioFrame {
        let mono = (input.left + input.right) * 0.5;
        AudioFrame::from_stereo(mono * self.left_gain, mono * self.right_gain)
    }
}

/// Constant gain stage
#[derive(Debug, Clone, Copy)]
pub struct Gain(pub f32);

impl Effect for Gain {
    fn process(&mut self, mut input: AudioFrame) -> AudioFrame {
        input.apply_volume(self.0);
        input
    }
}
