//! Sound asset decoder using symphonia
//!
//! Decodes WAV, MP3, Ogg Vorbis and FLAC assets to interleaved stereo f32.
//! Assets are short, so the whole file is decoded in one pass.

use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Stateless asset decoder
pub struct AssetDecoder;

impl AssetDecoder {
    /// Decode an entire asset file.
    ///
    /// # Returns
    /// - `samples`: Interleaved stereo f32 samples (mono is duplicated,
    ///   more than two channels are folded down)
    /// - `sample_rate`: Source sample rate (before resampling)
    ///
    /// # Errors
    /// `Error::Decode` when the file cannot be opened, probed or contains no
    /// decodable audio.
    pub fn decode(path: &Path) -> Result<(Vec<f32>, u32)> {
        debug!("Decoding asset: {}", path.display());

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("Failed to open {}: {}", path.display(), e)))?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext_str);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut stereo = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => return Err(Error::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let channels = spec.channels.count();
            if channels == 0 {
                continue;
            }

            let buf = sample_buf.get_or_insert_with(|| {
                SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
            });
            if buf.capacity() < decoded.capacity() * channels {
                *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            }
            buf.copy_interleaved_ref(decoded);

            to_stereo(buf.samples(), channels, &mut stereo);
        }

        if stereo.is_empty() {
            return Err(Error::Decode(format!(
                "No audio decoded from {}",
                path.display()
            )));
        }

        debug!(
            "Decoded {} frames at {}Hz from {}",
            stereo.len() / 2,
            sample_rate,
            path.display()
        );

        Ok((stereo, sample_rate))
    }
}

/// Append interleaved samples of any channel count as stereo
fn to_stereo(samples: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        1 => {
            for &s in samples {
                output.push(s);
                output.push(s);
            }
        }
        2 => output.extend_from_slice(samples),
        n => {
            // Fold: even channels left, odd channels right
            for frame in samples.chunks_exact(n) {
                let (mut l, mut r) = (0.0f32, 0.0f32);
                for (i, s) in frame.iter().enumerate() {
                    if i % 2 == 0 {
                        l += s;
                    } else {
                        r += s;
                    }
                }
                let left_count = n.div_ceil(2) as f32;
                let right_count = (n / 2) as f32;
                output.push(l / left_count);
                output.push(r / right_count);
            }
        }
    }
}
