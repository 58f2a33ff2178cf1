//! Playback sink
//!
//! The pipeline's audio output boundary: start a clip, stop it, and hear
//! back when a clip finishes on its own. Natural-completion signals arrive
//! on a channel handed to the sink at construction; the pipeline decides
//! what each signal means (it discards signals for clips it already
//! stopped).

use crate::error::{Error, Result};
use crate::synth::AudioArtifact;
use std::fs::File;
use std::io::BufReader;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Events reported by a sink back to the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    /// The clip stopped producing audio: it played to its natural end, was
    /// stopped, or could not be rendered at all
    Completed,
}

/// Audio playback capability
pub trait PlaybackSink: Send + Sync {
    /// Start playing a clip. Returns once playback is underway (or has
    /// failed to start); never blocks for the clip's duration.
    fn play(&self, artifact: &AudioArtifact) -> Result<()>;

    /// Stop the clip currently playing, if any
    fn stop(&self);
}

/// Sink backed by a rodio output stream
///
/// Each clip gets its own playback thread: the audio output stream is not
/// Send, so the stream, sink and decoder all live on the thread that plays
/// the clip. The shared slot below lets `stop` reach the active clip.
pub struct RodioSink {
    events: mpsc::UnboundedSender<SinkEvent>,
    current: Arc<Mutex<Option<Arc<rodio::Sink>>>>,
}

impl RodioSink {
    pub fn new(events: mpsc::UnboundedSender<SinkEvent>) -> Self {
        Self {
            events,
            current: Arc::new(Mutex::new(None)),
        }
    }
}

impl PlaybackSink for RodioSink {
    fn play(&self, artifact: &AudioArtifact) -> Result<()> {
        // Open the file up front so unreadable artifacts fail loudly here
        let file = File::open(artifact.path())
            .map_err(|e| Error::Audio(format!("cannot open clip: {}", e)))?;

        let current = Arc::clone(&self.current);
        let events = self.events.clone();
        std::thread::spawn(move || play_clip(file, current, events));
        Ok(())
    }

    fn stop(&self) {
        let taken = self.current.lock().ok().and_then(|mut slot| slot.take());
        if let Some(sink) = taken {
            debug!("Stopping active clip");
            sink.stop();
        }
    }
}

/// Play one clip to completion on a dedicated thread.
///
/// A completion event is sent in every exit path, including output-device
/// failures, so an auto-advancing pipeline never stalls on a clip that
/// cannot render.
fn play_clip(
    file: File,
    current: Arc<Mutex<Option<Arc<rodio::Sink>>>>,
    events: mpsc::UnboundedSender<SinkEvent>,
) {
    let completed = |events: &mpsc::UnboundedSender<SinkEvent>| {
        let _ = events.send(SinkEvent::Completed);
    };

    let (_stream, handle) = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            error!("Audio output unavailable: {}", e);
            completed(&events);
            return;
        }
    };
    let sink = match rodio::Sink::try_new(&handle) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!("Cannot create audio sink: {}", e);
            completed(&events);
            return;
        }
    };
    let source = match rodio::Decoder::new(BufReader::new(file)) {
        Ok(source) => source,
        Err(e) => {
            error!("Cannot decode clip: {}", e);
            completed(&events);
            return;
        }
    };

    if let Ok(mut slot) = current.lock() {
        *slot = Some(Arc::clone(&sink));
    }

    sink.append(source);
    sink.sleep_until_end();

    // Clear the slot only if a newer clip has not already claimed it
    if let Ok(mut slot) = current.lock() {
        if slot.as_ref().map_or(false, |s| Arc::ptr_eq(s, &sink)) {
            *slot = None;
        }
    }

    completed(&events);
}
