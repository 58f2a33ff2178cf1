//! eSpeak NG backend
//!
//! Robotic offline fallback, only offered when the caller explicitly allows
//! degraded quality. Probes `espeak-ng` (or the legacy `espeak`) on PATH.

use crate::error::{Error, Result};
use crate::synth::{find_executable, normalized, AudioArtifact, SynthesisBackend};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

pub struct EspeakBackend {
    exe: PathBuf,
    voice: String,
    rate: u32,
    pitch: u32,
}

impl EspeakBackend {
    pub fn new(voice: &str, rate: u32, pitch: u32) -> Result<Self> {
        let exe = find_executable("espeak-ng")
            .or_else(|| find_executable("espeak"))
            .ok_or_else(|| Error::BackendInit {
                backend: "eSpeak NG".to_string(),
                reason: "espeak-ng not found in PATH".to_string(),
            })?;

        Ok(Self {
            exe,
            voice: voice.to_string(),
            rate,
            pitch,
        })
    }
}

impl SynthesisBackend for EspeakBackend {
    fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        let text = normalized(text)?;
        let artifact = AudioArtifact::create()?;

        let mut command = Command::new(&self.exe);
        command
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.rate.to_string())
            .arg("-p")
            .arg(self.pitch.to_string())
            .arg("-w")
            .arg(artifact.path())
            .arg(text);

        debug!("eSpeak synth: {:?}", command);
        let output = command.output().map_err(|e| Error::Synthesis {
            backend: self.name(),
            reason: format!("failed to run espeak: {}", e),
        })?;

        if !output.status.success() {
            return Err(Error::Synthesis {
                backend: self.name(),
                reason: format!(
                    "espeak exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(artifact)
    }

    fn name(&self) -> String {
        format!("eSpeak NG ({})", self.voice)
    }
}
