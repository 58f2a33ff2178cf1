//! Piper backend
//!
//! Drives the `piper` binary with an ONNX voice model, feeding utterance
//! text on stdin. Probing honors explicit configuration first, then the
//! PIPER_BIN / PIPER_MODEL / PIPER_MODEL_DIR environment variables, then
//! the bundled `./piper` directory.

use crate::error::{Error, Result};
use crate::synth::{normalized, AudioArtifact, SynthesisBackend};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Debug)]
pub struct PiperBackend {
    exe: PathBuf,
    model: PathBuf,
    model_config: Option<PathBuf>,
    voice: String,
}

impl PiperBackend {
    /// Probe for the piper binary and the named voice model
    pub fn new(
        voice: &str,
        bin_override: Option<&Path>,
        model_dir_override: Option<&Path>,
    ) -> Result<Self> {
        let backend_id = format!("Piper ({})", voice);

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(bin) = bin_override {
            candidates.push(bin.to_path_buf());
        }
        if let Some(bin) = std::env::var_os("PIPER_BIN") {
            candidates.push(PathBuf::from(bin));
        }
        candidates.push(PathBuf::from("piper").join("piper"));

        debug!("Piper probe: candidates {:?}", candidates);
        let exe = candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| Error::BackendInit {
                backend: backend_id.clone(),
                reason: "piper binary not found (set PIPER_BIN or install ./piper/piper)"
                    .to_string(),
            })?;

        let model = Self::find_model(voice, model_dir_override).ok_or_else(|| {
            Error::BackendInit {
                backend: backend_id,
                reason: format!(
                    "voice model {}.onnx not found (set PIPER_MODEL or PIPER_MODEL_DIR)",
                    voice
                ),
            }
        })?;

        // The per-voice JSON config sits next to the model when present
        let mut config_name = model.clone().into_os_string();
        config_name.push(".json");
        let config_path = PathBuf::from(config_name);
        let model_config = config_path.is_file().then_some(config_path);

        debug!(
            "Piper probe: exe {}, model {}, config {:?}",
            exe.display(),
            model.display(),
            model_config
        );

        Ok(Self {
            exe,
            model,
            model_config,
            voice: voice.to_string(),
        })
    }

    fn find_model(voice: &str, model_dir_override: Option<&Path>) -> Option<PathBuf> {
        // An exact model path overrides the directory search
        if let Some(exact) = std::env::var_os("PIPER_MODEL") {
            let exact = PathBuf::from(exact);
            if exact.is_file() {
                return Some(exact);
            }
        }

        let mut search_dirs: Vec<PathBuf> = Vec::new();
        if let Some(dir) = model_dir_override {
            search_dirs.push(dir.to_path_buf());
        }
        if let Some(dir) = std::env::var_os("PIPER_MODEL_DIR") {
            search_dirs.push(PathBuf::from(dir));
        }
        search_dirs.push(PathBuf::from("piper"));

        search_dirs
            .into_iter()
            .map(|dir| dir.join(format!("{}.onnx", voice)))
            .find(|model| model.is_file())
    }

    fn synthesis_error(&self, reason: String) -> Error {
        Error::Synthesis {
            backend: self.name(),
            reason,
        }
    }
}

impl SynthesisBackend for PiperBackend {
    fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        let text = normalized(text)?;
        let artifact = AudioArtifact::create()?;

        let mut command = Command::new(&self.exe);
        command
            .arg("-m")
            .arg(&self.model)
            .arg("--output_file")
            .arg(artifact.path());
        if let Some(config) = &self.model_config {
            command.arg("-c").arg(config);
        }

        debug!("Piper synth: {:?}", command);
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.synthesis_error(format!("failed to spawn piper: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.synthesis_error("piper stdin unavailable".to_string()))?;
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| self.synthesis_error(format!("failed to write to piper: {}", e)))?;
        drop(stdin); // close stdin so piper sees EOF

        let output = child
            .wait_with_output()
            .map_err(|e| self.synthesis_error(format!("failed to wait for piper: {}", e)))?;
        if !output.status.success() {
            return Err(self.synthesis_error(format!(
                "piper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(artifact)
    }

    fn name(&self) -> String {
        format!("Piper ({})", self.voice)
    }
}
