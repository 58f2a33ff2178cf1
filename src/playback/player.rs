//! Player control loop
//!
//! One tokio task owns the [`PlaybackPipeline`] and drains a single stream
//! of messages: front-end commands, sink completion signals, and synthesis
//! worker results. Each message is processed to completion before the next,
//! so pipeline transitions never interleave even though they originate from
//! an event-driven front end and background workers.
//!
//! Synthesis runs on `spawn_blocking` workers (engine subprocesses can take
//! seconds) and hands its result back through the same message stream,
//! tagged with the index it was launched for.

use crate::error::Result;
use crate::events::PlayerEvent;
use crate::playback::pipeline::{PlaybackPipeline, PlaybackSnapshot};
use crate::playback::sink::{PlaybackSink, SinkEvent};
use crate::pronunciation::PronunciationRules;
use crate::synth::{AudioArtifact, SynthesisBackend};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::debug;

/// Messages serialized into the control task
enum ControlMessage {
    Start,
    Advance,
    SetAutoAdvance(bool),
    SynthesisDone {
        target: usize,
        result: Result<AudioArtifact>,
    },
    Shutdown,
}

/// State shared between the control task and front-end readers
struct SharedPlayback {
    snapshot: RwLock<PlaybackSnapshot>,
    events: broadcast::Sender<PlayerEvent>,
}

/// Handle to a running playback pipeline
///
/// Cheap to use from any task: commands are fire-and-forget sends into the
/// control loop, reads go through the shared snapshot. Dropping the player
/// shuts the control loop down and releases the buffered clips.
pub struct Player {
    command_tx: mpsc::UnboundedSender<ControlMessage>,
    shared: Arc<SharedPlayback>,
}

impl Player {
    /// Assemble a player from loaded parts and spawn its control task.
    ///
    /// `session::load` is the usual entry point; this constructor is public
    /// so callers can wire in their own backend or sink implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        items: Arc<Vec<String>>,
        rules: Arc<PronunciationRules>,
        backend: Arc<dyn SynthesisBackend>,
        sink: Arc<dyn PlaybackSink>,
        sink_events: mpsc::UnboundedReceiver<SinkEvent>,
        current: Option<AudioArtifact>,
        next: Option<AudioArtifact>,
        auto_advance: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let pipeline = PlaybackPipeline::new(
            Arc::clone(&items),
            current,
            next,
            sink,
            events.clone(),
            auto_advance,
        );
        let shared = Arc::new(SharedPlayback {
            snapshot: RwLock::new(pipeline.snapshot()),
            events,
        });

        tokio::spawn(control_loop(
            pipeline,
            command_rx,
            sink_events,
            command_tx.clone(),
            Arc::clone(&shared),
            items,
            rules,
            backend,
        ));

        Self { command_tx, shared }
    }

    /// Kick off playback of the first utterance
    pub fn start(&self) {
        let _ = self.command_tx.send(ControlMessage::Start);
    }

    /// Manual advance to the next utterance
    pub fn advance(&self) {
        let _ = self.command_tx.send(ControlMessage::Advance);
    }

    /// Enable or disable auto-advance on natural clip completion
    pub fn set_auto_advance(&self, enabled: bool) {
        let _ = self.command_tx.send(ControlMessage::SetAutoAdvance(enabled));
    }

    /// Current pipeline position and buffer occupancy
    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.snapshot.read().await.clone()
    }

    /// Subscribe to status events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }

    /// Stop the control loop. Also happens implicitly on drop.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ControlMessage::Shutdown);
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        let _ = self.command_tx.send(ControlMessage::Shutdown);
    }
}

#[allow(clippy::too_many_arguments)]
async fn control_loop(
    mut pipeline: PlaybackPipeline,
    mut command_rx: mpsc::UnboundedReceiver<ControlMessage>,
    mut sink_events: mpsc::UnboundedReceiver<SinkEvent>,
    command_tx: mpsc::UnboundedSender<ControlMessage>,
    shared: Arc<SharedPlayback>,
    items: Arc<Vec<String>>,
    rules: Arc<PronunciationRules>,
    backend: Arc<dyn SynthesisBackend>,
) {
    debug!("Playback control loop started");

    loop {
        tokio::select! {
            message = command_rx.recv() => {
                match message {
                    Some(ControlMessage::Start) => pipeline.start(),
                    Some(ControlMessage::Advance) => pipeline.advance(),
                    Some(ControlMessage::SetAutoAdvance(enabled)) => {
                        pipeline.set_auto_advance(enabled)
                    }
                    Some(ControlMessage::SynthesisDone { target, result }) => {
                        pipeline.on_synthesis_done(target, result)
                    }
                    Some(ControlMessage::Shutdown) | None => break,
                }
            }
            event = sink_events.recv() => {
                match event {
                    Some(SinkEvent::Completed) => pipeline.on_playback_completed(),
                    None => break,
                }
            }
        }

        // Launch whatever synthesis the transition requested
        if let Some(target) = pipeline.take_synth_request() {
            spawn_synthesis(
                target,
                items[target].clone(),
                Arc::clone(&rules),
                Arc::clone(&backend),
                command_tx.clone(),
            );
        }

        *shared.snapshot.write().await = pipeline.snapshot();
    }

    debug!("Playback control loop stopped");
}

/// Run one synthesis on a blocking worker and report back, tagged with the
/// index the result is for
fn spawn_synthesis(
    target: usize,
    text: String,
    rules: Arc<PronunciationRules>,
    backend: Arc<dyn SynthesisBackend>,
    command_tx: mpsc::UnboundedSender<ControlMessage>,
) {
    tokio::task::spawn_blocking(move || {
        let normalized = rules.apply(&text);
        let result = backend.synthesize(&normalized);
        // The control loop may already be gone on shutdown
        let _ = command_tx.send(ControlMessage::SynthesisDone { target, result });
    });
}
