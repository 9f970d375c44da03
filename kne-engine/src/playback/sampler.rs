//! Sample backend over rodio
//!
//! Plays prepared buffers through one `rodio::Sink` per voice. No effect
//! chain: only the voice gain applies.

use crate::error::{Error, Result};
use crate::playback::backend::{AudioBackend, BackendKind};
use crate::playback::voice::{VoiceId, VoiceSpec, VoiceTracker};
use rodio::buffer::SamplesBuffer;
use rodio::cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Rate used for every voice; rodio converts to the device rate itself
const SAMPLE_BACKEND_RATE: u32 = 44100;

pub struct SampleBackend {
    handle: OutputStreamHandle,
    sinks: Arc<Mutex<HashMap<VoiceId, Arc<Sink>>>>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    closed: AtomicBool,
}

impl SampleBackend {
    /// Open the output stream on a holder thread
    ///
    /// `rodio::OutputStream` is not `Send`; it stays on its own thread and
    /// only the handle is shared.
    pub fn open(device: Option<&str>) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<OutputStreamHandle>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let device = device.map(str::to_string);

        std::thread::Builder::new()
            .name("kne-sample-audio".to_string())
            .spawn(move || {
                let opened = match device.as_deref() {
                    Some(name) => open_named(name),
                    None => OutputStream::try_default(),
                };
                match opened {
                    Ok((_stream, handle)) => {
                        let _ = ready_tx.send(Ok(handle));
                        let _ = shutdown_rx.recv();
                        debug!("Sample audio thread exiting");
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::Backend(format!(
                            "Failed to open output stream: {}",
                            e
                        ))));
                    }
                }
            })
            .map_err(|e| Error::Backend(format!("Failed to spawn audio thread: {}", e)))?;

        let handle = ready_rx
            .recv()
            .map_err(|_| Error::Backend("Sample audio thread exited during startup".to_string()))??;

        info!("Sample backend started");

        Ok(Self {
            handle,
            sinks: Arc::new(Mutex::new(HashMap::new())),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn active_voices(&self) -> usize {
        self.sinks.lock().map(|s| s.len()).unwrap_or(0)
    }
}

/// Open a named device, falling back to the default one
fn open_named(
    name: &str,
) -> std::result::Result<(OutputStream, OutputStreamHandle), rodio::StreamError> {
    let host = rodio::cpal::default_host();
    let device = host
        .output_devices()
        .ok()
        .and_then(|mut devices| devices.find(|d| d.name().ok().as_deref() == Some(name)));

    match device {
        Some(device) => OutputStream::try_from_device(&device),
        None => {
            warn!("Requested device '{}' not found, falling back to default device", name);
            OutputStream::try_default()
        }
    }
}

impl AudioBackend for SampleBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sample
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_BACKEND_RATE
    }

    fn start_voice(&self, voice: VoiceSpec, tracker: &VoiceTracker) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Backend("Sample backend is shut down".to_string()));
        }

        let sink = Sink::try_new(&self.handle)
            .map_err(|e| Error::Backend(format!("Failed to create sink: {}", e)))?;
        sink.set_volume((voice.gain * voice.source_gain).clamp(0.0, 1.0));
        sink.append(SamplesBuffer::new(
            2,
            voice.buffer.sample_rate,
            voice.buffer.samples.to_vec(),
        ));

        let sink = Arc::new(sink);
        if let Ok(mut sinks) = self.sinks.lock() {
            sinks.insert(voice.id, Arc::clone(&sink));
        }

        let sinks = Arc::clone(&self.sinks);
        let tracker = tracker.clone();
        let id = voice.id;
        std::thread::Builder::new()
            .name(format!("kne-{}", id))
            .spawn(move || {
                sink.sleep_until_end();
                if let Ok(mut sinks) = sinks.lock() {
                    sinks.remove(&id);
                }
                tracker.complete(id);
            })
            .map_err(|e| Error::Backend(format!("Failed to spawn voice thread: {}", e)))?;

        Ok(())
    }

    fn stop_all(&self) {
        if let Ok(mut sinks) = self.sinks.lock() {
            for (_, sink) in sinks.drain() {
                sink.stop();
            }
        }
    }

    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_all();
        if let Ok(mut tx) = self.shutdown_tx.lock() {
            if let Some(tx) = tx.take() {
                let _ = tx.send(());
            }
        }
        info!("Sample backend shut down");
    }
}

impl Drop for SampleBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
