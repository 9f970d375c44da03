//! Graph backend: per-voice effect chains mixed into one cpal stream
//!
//! Chain per voice: source pre-gain → [bass boost] → [reverb] → [panner]
//! → voice gain. All voices are summed and clamped on the device thread.

use crate::audio::dsp::{BassBoost, Effect, Gain, Panner, SparseReverb};
use crate::audio::{AudioFrame, AudioOutput, SoundBuffer};
use crate::error::{Error, Result};
use crate::playback::backend::{AudioBackend, BackendKind};
use crate::playback::voice::{VoiceId, VoiceSpec, VoiceTracker};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// One voice inside the mixer
struct GraphVoice {
    id: VoiceId,
    buffer: SoundBuffer,
    position: usize,
    tail_remaining: usize,
    chain: Vec<Box<dyn Effect>>,
    tracker: VoiceTracker,
}

impl GraphVoice {
    fn new(spec: VoiceSpec, sample_rate: u32, tracker: VoiceTracker) -> Self {
        let mut chain: Vec<Box<dyn Effect>> = Vec::with_capacity(5);
        chain.push(Box::new(Gain(spec.source_gain)));
        if spec.effects.bass_boost {
            chain.push(Box::new(BassBoost::with_defaults(sample_rate)));
        }
        if spec.effects.reverb {
            chain.push(Box::new(SparseReverb::with_defaults(sample_rate)));
        }
        if let Some(pos) = spec.spatial {
            chain.push(Box::new(Panner::new(pos.x, pos.y, pos.z)));
        }
        chain.push(Box::new(Gain(spec.gain)));

        let tail_remaining = chain.iter().map(|e| e.tail_frames()).sum();

        Self {
            id: spec.id,
            buffer: spec.buffer,
            position: 0,
            tail_remaining,
            chain,
            tracker,
        }
    }

    /// Next output frame, or None once source and tail are exhausted
    fn next_frame(&mut self) -> Option<AudioFrame> {
        let input = match self.buffer.frame(self.position) {
            Some(frame) => {
                self.position += 1;
                frame
            }
            None if self.tail_remaining > 0 => {
                self.tail_remaining -= 1;
                AudioFrame::zero()
            }
            None => return None,
        };

        Some(
            self.chain
                .iter_mut()
                .fold(input, |frame, effect| effect.process(frame)),
        )
    }
}

/// Voice mixer shared between the control side and the device thread
#[derive(Default)]
pub struct GraphMixer {
    voices: Vec<GraphVoice>,
    /// Finished voices whose tracker entry could not be removed yet
    pending_complete: Vec<(VoiceId, VoiceTracker)>,
}

impl GraphMixer {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, voice: GraphVoice) {
        self.voices.push(voice);
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Drop every voice without reporting completion
    pub fn clear(&mut self) {
        self.voices.clear();
        self.pending_complete.clear();
    }

    /// Fill `out` with the sum of all voices
    pub fn render(&mut self, out: &mut [AudioFrame]) {
        for frame in out.iter_mut() {
            *frame = AudioFrame::zero();
        }

        let mut finished = Vec::new();
        for (index, voice) in self.voices.iter_mut().enumerate() {
            for frame in out.iter_mut() {
                match voice.next_frame() {
                    Some(sample) => frame.add(&sample),
                    None => {
                        finished.push(index);
                        break;
                    }
                }
            }
        }

        for index in finished.into_iter().rev() {
            let voice = self.voices.swap_remove(index);
            self.pending_complete.push((voice.id, voice.tracker));
        }
        self.pending_complete
            .retain(|(id, tracker)| !tracker.try_complete(*id));

        for frame in out.iter_mut() {
            frame.clamp();
        }
    }
}

/// Graph backend over a cpal output stream
pub struct GraphBackend {
    mixer: Arc<Mutex<GraphMixer>>,
    sample_rate: u32,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    stream_errors: Arc<AtomicU32>,
}

impl GraphBackend {
    /// Open the device and start the stream on a dedicated thread
    ///
    /// # Errors
    /// `Error::Backend` when no device or stream could be started.
    pub fn open(device: Option<&str>) -> Result<Self> {
        let mixer = Arc::new(Mutex::new(GraphMixer::new()));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, Arc<AtomicU32>)>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let device = device.map(str::to_string);
        let render_mixer = Arc::clone(&mixer);

        let thread = std::thread::Builder::new()
            .name("kne-graph-audio".to_string())
            .spawn(move || {
                let mut output = match AudioOutput::open(device.as_deref()) {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let started = output.start(move |out| {
                    if let Ok(mut mixer) = render_mixer.lock() {
                        mixer.render(out);
                    }
                });
                if let Err(e) = started {
                    let _ = ready_tx.send(Err(e));
                    return;
                }

                let _ = ready_tx.send(Ok((output.sample_rate(), output.error_counter())));

                // Park until shutdown; the stream lives as long as `output`
                let _ = shutdown_rx.recv();
                if let Err(e) = output.stop() {
                    warn!("Graph backend stop failed: {}", e);
                }
                debug!("Graph audio thread exiting");
            })
            .map_err(|e| Error::Backend(format!("Failed to spawn audio thread: {}", e)))?;

        let (sample_rate, stream_errors) = match ready_rx.recv() {
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(Error::Backend(format!("Graph backend unavailable: {}", e)));
            }
            Err(_) => {
                let _ = thread.join();
                return Err(Error::Backend(
                    "Graph audio thread exited during startup".to_string(),
                ));
            }
        };

        info!("Graph backend started at {}Hz", sample_rate);

        Ok(Self {
            mixer,
            sample_rate,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            thread: Mutex::new(Some(thread)),
            closed: AtomicBool::new(false),
            stream_errors,
        })
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.lock().map(|m| m.voice_count()).unwrap_or(0)
    }
}

impl AudioBackend for GraphBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Graph
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start_voice(&self, voice: VoiceSpec, tracker: &VoiceTracker) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Backend("Graph backend is shut down".to_string()));
        }
        let voice = GraphVoice::new(voice, self.sample_rate, tracker.clone());
        let mut mixer = self
            .mixer
            .lock()
            .map_err(|_| Error::Internal("Graph mixer lock poisoned".to_string()))?;
        mixer.add(voice);
        Ok(())
    }

    fn stream_errors(&self) -> u32 {
        self.stream_errors.load(Ordering::SeqCst)
    }

    fn stop_all(&self) {
        if let Ok(mut mixer) = self.mixer.lock() {
            mixer.clear();
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
        if let Ok(mut thread) = self.thread.lock() {
            if let Some(handle) = thread.take() {
                let _ = handle.join();
            }
        }
        info!("Graph backend shut down");
    }
}

impl Drop for GraphBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
