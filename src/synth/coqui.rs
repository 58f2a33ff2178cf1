//! Coqui backend
//!
//! Primary neural engine: the Coqui `tts` CLI with a local VCTK VITS model.
//! Construction probes the model directory and the `tts` binary; synthesis
//! runs one subprocess per utterance.

use crate::error::{Error, Result};
use crate::synth::{find_executable, normalized, AudioArtifact, SynthesisBackend};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const BACKEND_ID: &str = "Coqui";

pub struct CoquiBackend {
    exe: PathBuf,
    model_path: PathBuf,
    config_path: PathBuf,
    speaker: String,
}

impl CoquiBackend {
    /// Probe for the `tts` CLI and the model files under `model_dir`
    pub fn new(model_dir: &Path, speaker: &str) -> Result<Self> {
        let exe = find_executable("tts").ok_or_else(|| Error::BackendInit {
            backend: BACKEND_ID.to_string(),
            reason: "tts CLI not found in PATH".to_string(),
        })?;

        let model_path = model_dir.join("model_file.pth");
        let config_path = model_dir.join("config.json");
        if !(model_path.is_file() && config_path.is_file()) {
            return Err(Error::BackendInit {
                backend: BACKEND_ID.to_string(),
                reason: format!("model files not found in {}", model_dir.display()),
            });
        }

        debug!("Loading Coqui model from {}", model_dir.display());
        Ok(Self {
            exe,
            model_path,
            config_path,
            speaker: speaker.to_string(),
        })
    }
}

impl SynthesisBackend for CoquiBackend {
    fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        let text = normalized(text)?;
        let artifact = AudioArtifact::create()?;

        let mut command = Command::new(&self.exe);
        command
            .arg("--model_path")
            .arg(&self.model_path)
            .arg("--config_path")
            .arg(&self.config_path)
            .arg("--speaker_idx")
            .arg(&self.speaker)
            .arg("--text")
            .arg(text)
            .arg("--out_path")
            .arg(artifact.path());

        debug!("Coqui synth: {:?}", command);
        let output = command.output().map_err(|e| Error::Synthesis {
            backend: self.name(),
            reason: format!("failed to run tts: {}", e),
        })?;

        if !output.status.success() {
            return Err(Error::Synthesis {
                backend: self.name(),
                reason: format!(
                    "tts exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(artifact)
    }

    fn name(&self) -> String {
        format!("Coqui TTS (VCTK, {})", self.speaker)
    }
}
