//! Playback pipeline state machine
//!
//! Owns the playback index, the two-slot audio buffer (current, next), and
//! the synthesis-in-flight bookkeeping. Transitions are plain methods; the
//! [`Player`](crate::playback::player::Player) control task calls them one
//! at a time, so nothing here needs internal locking and every transition
//! runs to completion before the next begins.
//!
//! Synthesis is requested, not performed, by this type: a rotation records
//! the target index it wants synthesized, and the control loop collects it
//! via [`PlaybackPipeline::take_synth_request`] and runs the worker. The
//! worker's result comes back through
//! [`PlaybackPipeline::on_synthesis_done`], tagged with its target, and a
//! result whose target the user has already advanced past is discarded
//! rather than written into a stale slot.

use crate::error::Result;
use crate::events::PlayerEvent;
use crate::playback::sink::PlaybackSink;
use crate::synth::AudioArtifact;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Coarse pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Loaded, playback not yet started
    Idle,

    /// Somewhere before the final utterance
    Playing,

    /// Standing at the final utterance; no further advance is possible
    Finished,
}

/// Read-only view of the pipeline for the front end
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PipelineState,
    pub index: usize,
    pub current_text: String,
    /// Text of the upcoming utterance; `None` at the end of the sequence
    pub next_text: Option<String>,
    pub has_current_audio: bool,
    pub has_next_audio: bool,
    pub auto_advance: bool,
}

/// The playback state machine
pub struct PlaybackPipeline {
    /// Utterance sequence, immutable for the pipeline's lifetime
    items: Arc<Vec<String>>,

    /// Audio output boundary
    sink: Arc<dyn PlaybackSink>,

    /// Status event broadcaster
    events: broadcast::Sender<PlayerEvent>,

    /// Index of the utterance in the "current" slot
    index: usize,

    /// Audio for `items[index]`; absent if synthesis failed
    current: Option<AudioArtifact>,

    /// Audio for `items[index + 1]`; absent past the end, on failure, or
    /// while synthesis is still running
    next: Option<AudioArtifact>,

    /// Whether playback has been kicked off by the first start/advance
    started: bool,

    /// Armed by each play call, cleared by a manual skip, consumed by each
    /// completion signal. A completion that finds it cleared is stale and
    /// is swallowed without advancing.
    awaiting_natural_end: bool,

    /// Completions still owed by clips that were manually stopped. The
    /// control loop processes messages in order, so the next this-many
    /// completion signals belong to stopped clips, not the current one,
    /// even though the rotation re-armed `awaiting_natural_end` already.
    stale_completions: usize,

    /// Rotate on natural completion instead of waiting for the user
    auto_advance: bool,

    /// Target index of the synthesis worker currently running, if any
    inflight: Option<usize>,

    /// Synthesis request waiting for the control loop to launch
    pending_synth: Option<usize>,
}

impl PlaybackPipeline {
    /// Assemble a pipeline over a loaded sequence. The loader provides the
    /// first two slots (either may be absent after a synthesis failure).
    ///
    /// The sequence must be non-empty; the loader guarantees this.
    pub fn new(
        items: Arc<Vec<String>>,
        current: Option<AudioArtifact>,
        next: Option<AudioArtifact>,
        sink: Arc<dyn PlaybackSink>,
        events: broadcast::Sender<PlayerEvent>,
        auto_advance: bool,
    ) -> Self {
        Self {
            items,
            sink,
            events,
            index: 0,
            current,
            next,
            started: false,
            awaiting_natural_end: false,
            stale_completions: 0,
            auto_advance,
            inflight: None,
            pending_synth: None,
        }
    }

    /// Kick off playback of the first utterance. Valid only before any
    /// start/advance; later calls are ignored.
    pub fn start(&mut self) {
        if self.started {
            debug!("start ignored: playback already started");
            return;
        }
        self.started = true;
        self.emit_started();
        self.play_current();
    }

    /// Manual advance: move to the next utterance now.
    ///
    /// If a clip is still playing, its pending natural-completion signal is
    /// suppressed before the sink is stopped, so the signal cannot arrive
    /// later and trigger a duplicate auto-advance.
    pub fn advance(&mut self) {
        self.started = true;

        if self.awaiting_natural_end {
            self.awaiting_natural_end = false;
            self.stale_completions += 1;
            self.sink.stop();
        }

        if self.at_final_utterance() {
            debug!("advance ignored: already at final utterance");
            return;
        }

        self.rotate();
    }

    /// Natural-completion signal from the sink.
    ///
    /// Exactly one signal per play call is expected; a signal arriving
    /// after a manual skip already cleared the flag is swallowed.
    pub fn on_playback_completed(&mut self) {
        if self.stale_completions > 0 {
            self.stale_completions -= 1;
            debug!("Swallowing completion signal from a stopped clip");
            return;
        }
        if !self.awaiting_natural_end {
            debug!("Discarding stale completion signal");
            return;
        }
        self.awaiting_natural_end = false;

        self.emit(PlayerEvent::UtteranceFinished {
            index: self.index,
            timestamp: chrono::Utc::now(),
        });

        if self.at_final_utterance() {
            self.emit(PlayerEvent::PlaybackFinished {
                timestamp: chrono::Utc::now(),
            });
            return;
        }

        if self.auto_advance {
            self.rotate();
        }
    }

    /// Result hand-off from the synthesis worker, tagged with the index it
    /// was launched for
    pub fn on_synthesis_done(&mut self, target: usize, result: Result<AudioArtifact>) {
        if self.inflight == Some(target) {
            self.inflight = None;
        }

        match result {
            Ok(artifact) => {
                if target == self.index + 1 {
                    self.next = Some(artifact);
                } else {
                    debug!(
                        "Discarding stale synthesis result for utterance {} (now at {})",
                        target, self.index
                    );
                }
            }
            Err(e) => {
                warn!("Synthesis failed for utterance {}: {}", target, e);
                if target == self.index + 1 {
                    self.emit(PlayerEvent::UtteranceSkipped {
                        index: target,
                        reason: e.to_string(),
                        timestamp: chrono::Utc::now(),
                    });
                }
            }
        }

        // If the user advanced while that worker ran, the slot for the new
        // "next" is still empty; request a fresh synthesis for it. A fresh
        // failure is final for its slot: no retry.
        if target != self.index + 1 && self.next.is_none() && self.index + 1 < self.items.len() {
            self.request_synth(self.index + 1);
        }
    }

    /// Enable or disable auto-advance on natural completion
    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
    }

    /// Collect the pending synthesis request, marking it in flight. The
    /// control loop launches the worker for whatever this returns.
    pub fn take_synth_request(&mut self) -> Option<usize> {
        let target = self.pending_synth.take()?;
        self.inflight = Some(target);
        Some(target)
    }

    /// Read-only view for display and diagnostics
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state(),
            index: self.index,
            current_text: self.items[self.index].clone(),
            next_text: self.items.get(self.index + 1).cloned(),
            has_current_audio: self.current.is_some(),
            has_next_audio: self.next.is_some(),
            auto_advance: self.auto_advance,
        }
    }

    fn state(&self) -> PipelineState {
        if !self.started {
            PipelineState::Idle
        } else if self.at_final_utterance() {
            PipelineState::Finished
        } else {
            PipelineState::Playing
        }
    }

    fn at_final_utterance(&self) -> bool {
        self.index + 1 >= self.items.len()
    }

    /// Shift the buffer one step: next becomes current, a new next is
    /// requested, and the new current plays if its audio is present
    fn rotate(&mut self) {
        self.index += 1;
        self.current = self.next.take();
        self.emit_started();
        self.play_current();

        if self.index + 1 < self.items.len() {
            self.request_synth(self.index + 1);
        }
    }

    fn play_current(&mut self) {
        match &self.current {
            Some(artifact) => match self.sink.play(artifact) {
                Ok(()) => {
                    // Armed exactly once per play call
                    self.awaiting_natural_end = true;
                }
                Err(e) => {
                    warn!("Failed to start playback for utterance {}: {}", self.index, e);
                }
            },
            None => {
                debug!("No audio for utterance {}, silent step", self.index);
            }
        }
    }

    fn request_synth(&mut self, target: usize) {
        // At most one worker at a time; a stale in-flight worker triggers a
        // re-request from on_synthesis_done when it lands
        if self.inflight.is_none() && self.pending_synth.is_none() {
            self.pending_synth = Some(target);
        }
    }

    fn emit_started(&self) {
        self.emit(PlayerEvent::UtteranceStarted {
            index: self.index,
            text: self.items[self.index].clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
