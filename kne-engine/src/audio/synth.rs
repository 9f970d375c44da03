//! Fallback tone synthesis
//!
//! When an asset is missing or undecodable, a short sine arpeggio over the
//! sound type's fallback frequencies is played instead.

use crate::audio::SoundBuffer;
use std::f32::consts::PI;

/// Length of each note in the sequence
pub const NOTE_MS: u32 = 120;
/// Silence between notes
pub const GAP_MS: u32 = 20;
/// Peak amplitude of the synthesized tone
pub const TONE_AMPLITUDE: f32 = 0.3;

const ATTACK_MS: u32 = 5;
const RELEASE_MS: u32 = 40;

/// Render the frequency sequence as a stereo buffer at `sample_rate`
///
/// An empty frequency list yields a single 440Hz note.
pub fn tone_sequence(frequencies: &[f32], sample_rate: u32) -> SoundBuffer {
    let sample_rate = sample_rate.max(1);
    let freqs: &[f32] = if frequencies.is_empty() {
        &[440.0]
    } else {
        frequencies
    };

    let note_frames = frames_for(NOTE_MS, sample_rate);
    let gap_frames = frames_for(GAP_MS, sample_rate);
    let attack = frames_for(ATTACK_MS, sample_rate).max(1);
    let release = frames_for(RELEASE_MS, sample_rate).max(1);

    let total = freqs.len() * note_frames + freqs.len().saturating_sub(1) * gap_frames;
    let mut samples = Vec::with_capacity(total * 2);

    for (n, &freq) in freqs.iter().enumerate() {
        for i in 0..note_frames {
            let t = i as f32 / sample_rate as f32;
            let s = (2.0 * PI * freq * t).sin() * TONE_AMPLITUDE * envelope(i, note_frames, attack, release);
            samples.push(s);
            samples.push(s);
        }
        if n + 1 < freqs.len() {
            samples.extend(std::iter::repeat(0.0).take(gap_frames * 2));
        }
    }

    SoundBuffer::new(samples, sample_rate)
}

fn frames_for(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64 / 1000) as usize
}

/// Linear attack, flat sustain, linear release
fn envelope(i: usize, len: usize, attack: usize, release: usize) -> f32 {
    if i < attack {
        i as f32 / attack as f32
    } else if i + release >= len {
        (len - i) as f32 / release as f32
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_sequence_length() {
        let buffer = tone_sequence(&[523.25, 659.25, 783.99], 8000);
        // 3 notes of 120ms plus 2 gaps of 20ms
        assert_eq!(buffer.duration(), Duration::from_millis(400));
    }

    #[test]
    fn test_amplitude_bounded_and_audible() {
        let buffer = tone_sequence(&[880.0], 44100);
        let peak = buffer.peak();
        assert!(peak <= TONE_AMPLITUDE + 1e-6);
        assert!(peak > TONE_AMPLITUDE * 0.9);
    }

    #[test]
    fn test_starts_and_ends_silent() {
        let buffer = tone_sequence(&[440.0], 44100);
        assert_eq!(buffer.samples[0], 0.0);
        let last = buffer.frame(buffer.frame_count - 1).unwrap();
        assert!(last.left.abs() < 0.01);
    }

    #[test]
    fn test_empty_list_plays_default_note() {
        let buffer = tone_sequence(&[], 8000);
        assert_eq!(buffer.duration(), Duration::from_millis(NOTE_MS as u64));
    }
}
