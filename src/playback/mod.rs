//! Playback pipeline
//!
//! The pipeline owns a two-slot audio buffer (current, next) over an
//! immutable utterance sequence. While the current clip plays, a background
//! worker synthesizes the next one; advancement rotates the buffer.
//!
//! - [`pipeline`]: the state machine itself (index, slots, flags)
//! - [`player`]: the control task that serializes every transition
//! - [`sink`]: the audio output boundary

pub mod pipeline;
pub mod player;
pub mod sink;

pub use pipeline::{PipelineState, PlaybackPipeline, PlaybackSnapshot};
pub use player::Player;
pub use sink::{PlaybackSink, RodioSink, SinkEvent};
