//! Error types for readaloud
//!
//! Defines crate-wide error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for readaloud
#[derive(Error, Debug)]
pub enum Error {
    /// Document unreadable, format unsupported, or segmentation yielded
    /// zero utterances. Fatal to the load attempt.
    #[error("Load error: {0}")]
    Load(String),

    /// No configured speech backend could be initialized. Carries the
    /// newline-joined `<backend>: <reason>` trail of everything tried.
    #[error("No speech backend available:\n{0}")]
    BackendUnavailable(String),

    /// A backend probe failed during construction (binary, model files, or
    /// voice missing). Collected by the selector, never fatal on its own.
    #[error("{backend} unavailable: {reason}")]
    BackendInit { backend: String, reason: String },

    /// A single utterance's audio could not be produced. Non-fatal at
    /// runtime: the slot stays empty and the sequence continues.
    #[error("Synthesis error ({backend}): {reason}")]
    Synthesis { backend: String, reason: String },

    /// Synthesis requested on text that is blank after trimming
    #[error("Empty input: text is blank after trimming")]
    EmptyInput,

    /// Pronunciation rules file unreadable or malformed
    #[error("Pronunciation rules error: {0}")]
    Rules(String),

    /// Audio output device or playback errors
    #[error("Audio output error: {0}")]
    Audio(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using readaloud Error
pub type Result<T> = std::result::Result<T, Error>;
