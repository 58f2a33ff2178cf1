//! Session loading
//!
//! Turns a document path plus configuration into a running [`Player`]:
//! read, segment, load pronunciation rules, select a speech backend, and
//! synthesize the first two utterances so playback can begin immediately.
//!
//! Loading either returns a fully valid session or fails with one
//! descriptive error; a previously loaded session is untouched either way.

use crate::config::Config;
use crate::document;
use crate::error::{Error, Result};
use crate::playback::{Player, RodioSink};
use crate::pronunciation::PronunciationRules;
use crate::segment;
use crate::synth::selector::{self, Diagnostic};
use crate::synth::{AudioArtifact, SynthesisBackend};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Utterance shown before the document's first sentence, so the user hears
/// where playback begins
const PREAMBLE: &str = "(start)";

/// A loaded document with its running player
pub struct Session {
    pub player: Player,

    /// The utterance sequence, preamble included
    pub items: Arc<Vec<String>>,

    /// Identity of the backend that will speak this document
    pub backend_name: String,

    /// Why higher-priority backends were passed over (may be empty)
    pub diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("items", &self.items.len())
            .field("backend_name", &self.backend_name)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// Load a document and prepare it for playback
pub async fn load(
    config: &Config,
    document_path: &Path,
    rules_path: Option<&Path>,
) -> Result<Session> {
    let text = document::read_text(document_path)?;
    let mut items = segment::split_sentences(&text);
    if items.is_empty() {
        return Err(Error::Load(format!(
            "no sentences found in {}",
            document_path.display()
        )));
    }
    items.insert(0, PREAMBLE.to_string());
    let items = Arc::new(items);
    info!("Loaded {} utterances from {}", items.len(), document_path.display());

    let rules = match rules_path {
        Some(path) => {
            let rules = PronunciationRules::from_csv_path(path)?;
            info!("Loaded {} pronunciation rules", rules.len());
            rules
        }
        None => PronunciationRules::empty(),
    };
    let rules = Arc::new(rules);

    let selection = selector::select_backend(selector::default_factories(config))?;
    let backend = selection.backend;
    for diagnostic in &selection.diagnostics {
        debug!("Passed over {}: {}", diagnostic.backend, diagnostic.reason);
    }

    let (current, next) = synthesize_first_two(&items, &rules, &backend).await?;

    let (sink_tx, sink_rx) = mpsc::unbounded_channel();
    let sink = Arc::new(RodioSink::new(sink_tx));

    let backend_name = backend.name();
    let player = Player::new(
        Arc::clone(&items),
        rules,
        backend,
        sink,
        sink_rx,
        current,
        next,
        config.auto_advance,
    );

    Ok(Session {
        player,
        items,
        backend_name,
        diagnostics: selection.diagnostics,
    })
}

/// Synthesize the preamble and the first sentence concurrently.
///
/// The preamble failing is a load error: if the backend cannot speak the
/// canned opening line it will not speak anything. The first sentence
/// failing only leaves its slot empty; it plays as a silent step.
async fn synthesize_first_two(
    items: &Arc<Vec<String>>,
    rules: &Arc<PronunciationRules>,
    backend: &Arc<dyn SynthesisBackend>,
) -> Result<(Option<AudioArtifact>, Option<AudioArtifact>)> {
    let current_task = spawn_synthesis(items, rules, backend, 0);
    let next_task = (items.len() > 1).then(|| spawn_synthesis(items, rules, backend, 1));

    let current = join_synthesis(current_task, backend).await??;

    let next = match next_task {
        Some(task) => match join_synthesis(task, backend).await? {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Synthesis failed for first sentence: {}; it will play silently", e);
                None
            }
        },
        None => None,
    };

    Ok((Some(current), next))
}

fn spawn_synthesis(
    items: &Arc<Vec<String>>,
    rules: &Arc<PronunciationRules>,
    backend: &Arc<dyn SynthesisBackend>,
    index: usize,
) -> tokio::task::JoinHandle<Result<AudioArtifact>> {
    let items = Arc::clone(items);
    let rules = Arc::clone(rules);
    let backend = Arc::clone(backend);
    tokio::task::spawn_blocking(move || backend.synthesize(&rules.apply(&items[index])))
}

async fn join_synthesis(
    task: tokio::task::JoinHandle<Result<AudioArtifact>>,
    backend: &Arc<dyn SynthesisBackend>,
) -> Result<Result<AudioArtifact>> {
    task.await.map_err(|e| Error::Synthesis {
        backend: backend.name(),
        reason: format!("synthesis task failed: {}", e),
    })
}
