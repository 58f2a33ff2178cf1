//! Speech synthesis backends
//!
//! A backend is one capability: given normalized text, produce a playable
//! WAV clip or fail. The pipeline is indifferent to which engine is behind
//! the trait; the selector picks one per loaded document.
//!
//! All concrete backends here drive an external engine as a subprocess and
//! write into a fresh temporary file owned by the returned [`AudioArtifact`].

pub mod coqui;
pub mod espeak;
pub mod piper;
pub mod selector;

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub use coqui::CoquiBackend;
pub use espeak::EspeakBackend;
pub use piper::PiperBackend;
pub use selector::{select_backend, BackendFactory, Diagnostic, Selection};

/// Owned handle to one synthesized audio clip
///
/// The backing temporary WAV file is removed when the artifact is dropped,
/// so whichever buffer slot holds the artifact also owns the file's
/// lifetime.
#[derive(Debug)]
pub struct AudioArtifact {
    file: NamedTempFile,
}

impl AudioArtifact {
    /// Create an empty artifact backed by a fresh temporary WAV file.
    /// Backends write their output to [`AudioArtifact::path`].
    pub fn create() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("readaloud-")
            .suffix(".wav")
            .tempfile()?;
        Ok(Self { file })
    }

    /// Path of the backing WAV file
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Speech synthesis capability
///
/// Implementations are stateless with respect to call ordering (held
/// configuration aside) and must tolerate concurrent calls: the loader
/// synthesizes the first two utterances at the same time.
pub trait SynthesisBackend: Send + Sync {
    /// Synthesize text into a freshly created audio artifact.
    ///
    /// Fails with [`Error::EmptyInput`] if the text is blank after
    /// trimming, and with [`Error::Synthesis`] on any engine-level error.
    /// Never retries internally; fallback policy belongs to the caller.
    fn synthesize(&self, text: &str) -> Result<AudioArtifact>;

    /// Human-readable identity (engine plus voice)
    fn name(&self) -> String;
}

/// Trim input text, rejecting blank input
pub(crate) fn normalized(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(trimmed)
}

/// Look up an executable on PATH
pub(crate) fn find_executable(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_file_removed_on_drop() {
        let artifact = AudioArtifact::create().unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn test_artifact_has_wav_suffix() {
        let artifact = AudioArtifact::create().unwrap();
        assert_eq!(
            artifact.path().extension().and_then(|e| e.to_str()),
            Some("wav")
        );
    }

    #[test]
    fn test_normalized_trims() {
        assert_eq!(normalized("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn test_normalized_rejects_blank() {
        assert!(matches!(normalized("   \t\n"), Err(Error::EmptyInput)));
    }
}
