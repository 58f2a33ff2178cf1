//! Configuration for readaloud
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables (PIPER_BIN, PIPER_MODEL, PIPER_MODEL_DIR)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! The TOML file is optional and minimal: voice preference, fallback
//! permission, and per-engine tuning. Environment overrides for Piper paths
//! are resolved at backend construction time, not here.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Piper voices searched for on disk, in fallback order
pub const PIPER_VOICES: [&str; 3] = [
    "en_GB-cori-high",
    "en_GB-semaine-medium",
    "en_GB-southern_english_female-low",
];

/// Which engine/voice the user prefers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoicePreference {
    /// Primary neural engine (Coqui VCTK)
    Coqui,

    /// A specific Piper voice, by model basename (e.g. `en_GB-cori-high`)
    Piper(String),
}

impl VoicePreference {
    /// Parse a user-supplied voice name. `"coqui"` (any case) selects the
    /// primary engine; anything else is taken as a Piper voice basename.
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("coqui") {
            VoicePreference::Coqui
        } else {
            VoicePreference::Piper(name.to_string())
        }
    }
}

/// Resolved configuration used by the loader and backend selector
#[derive(Debug, Clone)]
pub struct Config {
    /// Preferred engine/voice
    pub voice: VoicePreference,

    /// Whether the robotic eSpeak NG fallback may be used
    pub allow_espeak: bool,

    /// Advance automatically when a clip finishes playing
    pub auto_advance: bool,

    /// Coqui model directory (must contain model_file.pth and config.json)
    pub coqui_model_dir: PathBuf,

    /// Coqui VCTK speaker id
    pub coqui_speaker: String,

    /// Piper binary path override (else PIPER_BIN, then ./piper/piper)
    pub piper_bin: Option<PathBuf>,

    /// Piper model directory override (else PIPER_MODEL_DIR, then ./piper)
    pub piper_model_dir: Option<PathBuf>,

    /// eSpeak NG voice
    pub espeak_voice: String,

    /// eSpeak NG speaking rate (words per minute)
    pub espeak_rate: u32,

    /// eSpeak NG pitch (0-99)
    pub espeak_pitch: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            voice: VoicePreference::Coqui,
            allow_espeak: false,
            auto_advance: false,
            coqui_model_dir: PathBuf::from("models/vctk_vits"),
            coqui_speaker: "p240".to_string(),
            piper_bin: None,
            piper_model_dir: None,
            espeak_voice: "en-gb+f2".to_string(),
            espeak_rate: 180,
            espeak_pitch: 50,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to built-in
    /// defaults for anything the file does not set
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let toml_config: TomlConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        Ok(toml_config.resolve())
    }
}

/// TOML file shape. All fields optional; missing sections use defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Voice preference: "coqui" or a Piper voice basename
    #[serde(default)]
    pub voice: Option<String>,

    #[serde(default)]
    pub allow_espeak: Option<bool>,

    #[serde(default)]
    pub auto_advance: Option<bool>,

    #[serde(default)]
    pub coqui: CoquiSection,

    #[serde(default)]
    pub piper: PiperSection,

    #[serde(default)]
    pub espeak: EspeakSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoquiSection {
    #[serde(default = "default_coqui_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_coqui_speaker")]
    pub speaker: String,
}

impl Default for CoquiSection {
    fn default() -> Self {
        Self {
            model_dir: default_coqui_model_dir(),
            speaker: default_coqui_speaker(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PiperSection {
    #[serde(default)]
    pub binary: Option<PathBuf>,

    #[serde(default)]
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspeakSection {
    #[serde(default = "default_espeak_voice")]
    pub voice: String,

    #[serde(default = "default_espeak_rate")]
    pub rate: u32,

    #[serde(default = "default_espeak_pitch")]
    pub pitch: u32,
}

impl Default for EspeakSection {
    fn default() -> Self {
        Self {
            voice: default_espeak_voice(),
            rate: default_espeak_rate(),
            pitch: default_espeak_pitch(),
        }
    }
}

fn default_coqui_model_dir() -> PathBuf {
    PathBuf::from("models/vctk_vits")
}

fn default_coqui_speaker() -> String {
    "p240".to_string()
}

fn default_espeak_voice() -> String {
    "en-gb+f2".to_string()
}

fn default_espeak_rate() -> u32 {
    180
}

fn default_espeak_pitch() -> u32 {
    50
}

impl TomlConfig {
    /// Resolve the file contents against built-in defaults
    pub fn resolve(self) -> Config {
        let defaults = Config::default();
        Config {
            voice: self
                .voice
                .map(|v| VoicePreference::parse(&v))
                .unwrap_or(defaults.voice),
            allow_espeak: self.allow_espeak.unwrap_or(defaults.allow_espeak),
            auto_advance: self.auto_advance.unwrap_or(defaults.auto_advance),
            coqui_model_dir: self.coqui.model_dir,
            coqui_speaker: self.coqui.speaker,
            piper_bin: self.piper.binary,
            piper_model_dir: self.piper.model_dir,
            espeak_voice: self.espeak.voice,
            espeak_rate: self.espeak.rate,
            espeak_pitch: self.espeak.pitch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.voice, VoicePreference::Coqui);
        assert!(!config.allow_espeak);
        assert!(!config.auto_advance);
        assert_eq!(config.coqui_speaker, "p240");
        assert_eq!(config.espeak_rate, 180);
    }

    #[test]
    fn test_voice_preference_parse() {
        assert_eq!(VoicePreference::parse("coqui"), VoicePreference::Coqui);
        assert_eq!(VoicePreference::parse("Coqui"), VoicePreference::Coqui);
        assert_eq!(
            VoicePreference::parse("en_GB-cori-high"),
            VoicePreference::Piper("en_GB-cori-high".to_string())
        );
    }

    #[test]
    fn test_parse_full_toml() {
        let content = r#"
            voice = "en_GB-semaine-medium"
            allow_espeak = true
            auto_advance = true

            [coqui]
            model_dir = "/opt/models/vctk"
            speaker = "p273"

            [piper]
            binary = "/usr/local/bin/piper"

            [espeak]
            rate = 150
        "#;

        let config: TomlConfig = toml::from_str(content).unwrap();
        let config = config.resolve();

        assert_eq!(
            config.voice,
            VoicePreference::Piper("en_GB-semaine-medium".to_string())
        );
        assert!(config.allow_espeak);
        assert!(config.auto_advance);
        assert_eq!(config.coqui_model_dir, PathBuf::from("/opt/models/vctk"));
        assert_eq!(config.coqui_speaker, "p273");
        assert_eq!(config.piper_bin, Some(PathBuf::from("/usr/local/bin/piper")));
        assert_eq!(config.piper_model_dir, None);
        assert_eq!(config.espeak_rate, 150);
        // Unset fields keep their defaults
        assert_eq!(config.espeak_pitch, 50);
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: TomlConfig = toml::from_str("").unwrap();
        let config = config.resolve();
        assert_eq!(config.voice, VoicePreference::Coqui);
        assert_eq!(config.coqui_model_dir, PathBuf::from("models/vctk_vits"));
    }
}
