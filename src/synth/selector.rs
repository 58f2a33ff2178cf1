//! Backend selection with ordered fallback
//!
//! Tries a prioritized list of backend factories and returns the first one
//! that constructs successfully, together with a diagnostic entry for every
//! factory that failed along the way. The scan never aborts on a failure;
//! only an empty-handed pass through the whole list is an error.

use crate::config::{Config, VoicePreference, PIPER_VOICES};
use crate::error::{Error, Result};
use crate::synth::{CoquiBackend, EspeakBackend, PiperBackend, SynthesisBackend};
use std::sync::Arc;
use tracing::info;

/// One candidate backend: an identity plus a deferred constructor that
/// probes the host (binaries, model files) when invoked
pub struct BackendFactory {
    pub id: String,
    pub build: Box<dyn Fn() -> Result<Arc<dyn SynthesisBackend>> + Send + Sync>,
}

/// A recorded construction failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub backend: String,
    pub reason: String,
}

/// Outcome of a successful scan
pub struct Selection {
    /// The first backend that initialized
    pub backend: Arc<dyn SynthesisBackend>,

    /// Why each higher-priority candidate was passed over
    pub diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("backend", &self.backend.name())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// Scan the factories in priority order
pub fn select_backend(factories: Vec<BackendFactory>) -> Result<Selection> {
    let mut diagnostics = Vec::new();

    for factory in factories {
        match (factory.build)() {
            Ok(backend) => {
                info!("Selected speech backend: {}", backend.name());
                return Ok(Selection {
                    backend,
                    diagnostics,
                });
            }
            Err(e) => {
                let reason = match e {
                    Error::BackendInit { reason, .. } => reason,
                    other => other.to_string(),
                };
                info!("{} unavailable: {}", factory.id, reason);
                diagnostics.push(Diagnostic {
                    backend: factory.id,
                    reason,
                });
            }
        }
    }

    Err(Error::BackendUnavailable(
        diagnostics
            .iter()
            .map(|d| format!("{}: {}", d.backend, d.reason))
            .collect::<Vec<_>>()
            .join("\n"),
    ))
}

/// Build the factory list for a configuration.
///
/// Coqui preference: Coqui, then every Piper voice in fallback order, then
/// eSpeak if allowed. Piper preference: the selected voice first, then the
/// other Piper voices, then Coqui, then eSpeak if allowed.
pub fn default_factories(config: &Config) -> Vec<BackendFactory> {
    let mut factories = Vec::new();

    let piper_voices: Vec<String> = match &config.voice {
        VoicePreference::Piper(selected) => std::iter::once(selected.clone())
            .chain(
                PIPER_VOICES
                    .iter()
                    .filter(|&&v| v != selected.as_str())
                    .map(|v| v.to_string()),
            )
            .collect(),
        VoicePreference::Coqui => PIPER_VOICES.iter().map(|v| v.to_string()).collect(),
    };

    let coqui = coqui_factory(config);
    match &config.voice {
        VoicePreference::Coqui => {
            factories.push(coqui);
            factories.extend(piper_voices.iter().map(|v| piper_factory(config, v)));
        }
        VoicePreference::Piper(_) => {
            factories.extend(piper_voices.iter().map(|v| piper_factory(config, v)));
            factories.push(coqui);
        }
    }

    if config.allow_espeak {
        factories.push(espeak_factory(config));
    }

    factories
}

fn coqui_factory(config: &Config) -> BackendFactory {
    let model_dir = config.coqui_model_dir.clone();
    let speaker = config.coqui_speaker.clone();
    BackendFactory {
        id: "Coqui".to_string(),
        build: Box::new(move || {
            Ok(Arc::new(CoquiBackend::new(&model_dir, &speaker)?) as Arc<dyn SynthesisBackend>)
        }),
    }
}

fn piper_factory(config: &Config, voice: &str) -> BackendFactory {
    let voice = voice.to_string();
    let bin = config.piper_bin.clone();
    let model_dir = config.piper_model_dir.clone();
    BackendFactory {
        id: format!("Piper ({})", voice),
        build: Box::new(move || {
            Ok(
                Arc::new(PiperBackend::new(&voice, bin.as_deref(), model_dir.as_deref())?)
                    as Arc<dyn SynthesisBackend>,
            )
        }),
    }
}

fn espeak_factory(config: &Config) -> BackendFactory {
    let voice = config.espeak_voice.clone();
    let rate = config.espeak_rate;
    let pitch = config.espeak_pitch;
    BackendFactory {
        id: "eSpeak NG".to_string(),
        build: Box::new(move || {
            Ok(Arc::new(EspeakBackend::new(&voice, rate, pitch)?) as Arc<dyn SynthesisBackend>)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::AudioArtifact;

    struct FakeBackend {
        id: &'static str,
    }

    impl SynthesisBackend for FakeBackend {
        fn synthesize(&self, _text: &str) -> Result<AudioArtifact> {
            AudioArtifact::create()
        }

        fn name(&self) -> String {
            self.id.to_string()
        }
    }

    fn failing(id: &'static str) -> BackendFactory {
        BackendFactory {
            id: id.to_string(),
            build: Box::new(move || {
                Err(Error::BackendInit {
                    backend: id.to_string(),
                    reason: format!("{} is not installed", id),
                })
            }),
        }
    }

    fn succeeding(id: &'static str) -> BackendFactory {
        BackendFactory {
            id: id.to_string(),
            build: Box::new(move || Ok(Arc::new(FakeBackend { id }) as Arc<dyn SynthesisBackend>)),
        }
    }

    #[test]
    fn test_first_success_wins_with_diagnostics() {
        let selection = select_backend(vec![
            failing("first"),
            failing("second"),
            succeeding("third"),
            succeeding("fourth"),
        ])
        .unwrap();

        assert_eq!(selection.backend.name(), "third");
        assert_eq!(selection.diagnostics.len(), 2);
        assert_eq!(selection.diagnostics[0].backend, "first");
        assert_eq!(selection.diagnostics[1].backend, "second");
    }

    #[test]
    fn test_all_failures_joined() {
        let err = select_backend(vec![failing("one"), failing("two")]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("one: one is not installed"));
        assert!(message.contains("two: two is not installed"));
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }

    #[test]
    fn test_no_factories_is_unavailable() {
        assert!(matches!(
            select_backend(Vec::new()),
            Err(Error::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_default_priority_coqui_first() {
        let config = Config::default();
        let ids: Vec<String> = default_factories(&config)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "Coqui",
                "Piper (en_GB-cori-high)",
                "Piper (en_GB-semaine-medium)",
                "Piper (en_GB-southern_english_female-low)",
            ]
        );
    }

    #[test]
    fn test_selected_piper_voice_ordered_first() {
        let config = Config {
            voice: VoicePreference::Piper("en_GB-semaine-medium".to_string()),
            allow_espeak: true,
            ..Config::default()
        };
        let ids: Vec<String> = default_factories(&config)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "Piper (en_GB-semaine-medium)",
                "Piper (en_GB-cori-high)",
                "Piper (en_GB-southern_english_female-low)",
                "Coqui",
                "eSpeak NG",
            ]
        );
    }

    #[test]
    fn test_espeak_excluded_by_default() {
        let config = Config::default();
        assert!(!default_factories(&config)
            .iter()
            .any(|f| f.id == "eSpeak NG"));
    }
}
