//! Audio output using cpal
//!
//! Opens an output device and drives a render callback from the device's
//! real-time thread. `cpal::Stream` is not `Send` on every platform, so the
//! owner of an `AudioOutput` keeps it on one thread for its whole life.

use crate::audio::AudioFrame;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Preferred device rate
const PREFERRED_SAMPLE_RATE: u32 = 48000;

/// Render callback: fill the slice with stereo frames (silence when idle)
pub type RenderFn = dyn FnMut(&mut [AudioFrame]) + Send + 'static;

/// Audio output manager using cpal.
pub struct AudioOutput {
    device: Device,
    device_name: String,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    /// Bumped by the stream error callback
    error_count: Arc<AtomicU32>,
}

impl AudioOutput {
    /// List available audio output devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Open an audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    ///
    /// A named device that cannot be found falls back to the default device.
    ///
    /// # Errors
    /// `Error::AudioOutput` when no usable device or configuration exists.
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => {
                let mut devices = host.output_devices().map_err(|e| {
                    Error::AudioOutput(format!("Failed to enumerate devices: {}", e))
                })?;

                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => dev,
                    None => {
                        warn!(
                            "Requested device '{}' not found, falling back to default device",
                            name
                        );
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "Device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?,
        };

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio device: {}", device_name);

        let (config, sample_format) = Self::get_best_config(&device)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            device_name,
            config,
            sample_format,
            stream: None,
            error_count: Arc::new(AtomicU32::new(0)),
        })
    }

    /// Prefer a stereo f32 configuration at 48kHz, else the device default
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported_configs = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported_configs.find(|config| {
            config.channels() == 2
                && config.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
                && config.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(supported_config) = preferred {
            let sample_format = supported_config.sample_format();
            let config = supported_config
                .with_sample_rate(cpal::SampleRate(PREFERRED_SAMPLE_RATE))
                .config();
            return Ok((config, sample_format));
        }

        let supported_config = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;

        let sample_format = supported_config.sample_format();
        Ok((supported_config.config(), sample_format))
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start the stream.
    ///
    /// The callback runs on the real-time audio thread: it must not block.
    pub fn start<F>(&mut self, render: F) -> Result<()>
    where
        F: FnMut(&mut [AudioFrame]) + Send + 'static,
    {
        info!("Starting audio stream on {}", self.device_name);

        let render: Arc<Mutex<Box<RenderFn>>> = Arc::new(Mutex::new(Box::new(render)));

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(render)?,
            SampleFormat::I16 => self.build_stream::<i16>(render)?,
            SampleFormat::U16 => self.build_stream::<u16>(render)?,
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn build_stream<T>(&self, render: Arc<Mutex<Box<RenderFn>>>) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = self.config.channels as usize;
        let error_count = Arc::clone(&self.error_count);
        let mut scratch: Vec<AudioFrame> = Vec::new();

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels.max(1);
                    scratch.clear();
                    scratch.resize(frames, AudioFrame::zero());

                    // A poisoned render lock plays silence
                    if let Ok(mut render) = render.lock() {
                        render(&mut scratch);
                    }

                    for (out, frame) in data.chunks_mut(channels.max(1)).zip(scratch.iter()) {
                        let mut frame = *frame;
                        frame.clamp();
                        out[0] = T::from_sample(frame.left);
                        if channels > 1 {
                            out[1] = T::from_sample(frame.right);
                        }
                        for extra in out.iter_mut().skip(2) {
                            *extra = T::from_sample(0.0f32);
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_count.fetch_add(1, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    /// Stop playback and drop the stream.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            info!("Stopping audio stream on {}", self.device_name);
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
        }
        Ok(())
    }

    /// Shared count of stream errors reported by the device
    pub fn error_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.error_count)
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop audio stream on drop: {}", e);
        }
    }
}
