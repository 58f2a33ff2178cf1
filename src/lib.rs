//! # readaloud
//!
//! Reads a document aloud one sentence at a time, pre-synthesizing the
//! next sentence in the background so stepping through the text has
//! minimal gaps.
//!
//! **Purpose:** Load a text document, segment it into utterances, pick the
//! best available speech engine (Coqui, Piper voices, optionally eSpeak NG),
//! and drive a two-slot playback pipeline with manual or automatic
//! advancement.
//!
//! **Architecture:** A single control task owns the pipeline state machine;
//! synthesis subprocesses run on blocking workers; audio plays through
//! rodio. Status flows out over a broadcast event bus and a shared snapshot.

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod playback;
pub mod pronunciation;
pub mod segment;
pub mod session;
pub mod synth;

pub use config::{Config, VoicePreference};
pub use error::{Error, Result};
pub use events::PlayerEvent;
pub use playback::{PipelineState, PlaybackSnapshot, Player};
pub use session::Session;
