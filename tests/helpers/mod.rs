//! Shared test helpers: mock backend, mock sink, and a harness that wires
//! a Player the same way the session loader does

use readaloud::error::{Error, Result};
use readaloud::playback::{PlaybackSink, Player, SinkEvent};
use readaloud::pronunciation::PronunciationRules;
use readaloud::synth::{AudioArtifact, SynthesisBackend};
use readaloud::{PlaybackSnapshot, PlayerEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

/// Backend double: instant synthesis, with per-text simulated failures
#[derive(Default)]
pub struct MockBackend {
    fail_on: Mutex<HashSet<String>>,
    synthesized: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn fail_for(&self, text: &str) {
        self.fail_on.lock().unwrap().insert(text.to_string());
    }

    /// Every text this backend has been asked to synthesize, in order
    pub fn synthesized(&self) -> Vec<String> {
        self.synthesized.lock().unwrap().clone()
    }
}

impl SynthesisBackend for MockBackend {
    fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        self.synthesized.lock().unwrap().push(text.to_string());
        if self.fail_on.lock().unwrap().contains(text) {
            return Err(Error::Synthesis {
                backend: self.name(),
                reason: "simulated engine failure".to_string(),
            });
        }
        AudioArtifact::create()
    }

    fn name(&self) -> String {
        "Mock".to_string()
    }
}

/// Sink double: records calls, never produces audio. Tests inject
/// completion signals through the harness's `sink_tx`.
#[derive(Default)]
pub struct MockSink {
    plays: AtomicUsize,
    stops: AtomicUsize,
}

impl MockSink {
    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl PlaybackSink for MockSink {
    fn play(&self, _artifact: &AudioArtifact) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// A Player wired to mocks, assembled the way the session loader does it
pub struct Harness {
    pub player: Player,
    pub backend: Arc<MockBackend>,
    pub sink: Arc<MockSink>,
    /// Inject `SinkEvent::Completed` to simulate natural clip endings
    pub sink_tx: mpsc::UnboundedSender<SinkEvent>,
    pub events: broadcast::Receiver<PlayerEvent>,
}

pub fn spawn_player(texts: &[&str], auto_advance: bool) -> Harness {
    spawn_player_with(texts, auto_advance, MockBackend::default(), PronunciationRules::empty())
}

pub fn spawn_player_with(
    texts: &[&str],
    auto_advance: bool,
    backend: MockBackend,
    rules: PronunciationRules,
) -> Harness {
    let items: Arc<Vec<String>> = Arc::new(texts.iter().map(|t| t.to_string()).collect());
    let rules = Arc::new(rules);
    let backend = Arc::new(backend);
    let sink = Arc::new(MockSink::default());
    let (sink_tx, sink_rx) = mpsc::unbounded_channel();

    // Synthesize the first two utterances up front, like the loader
    let current = backend.synthesize(&rules.apply(&items[0])).ok();
    let next = items
        .get(1)
        .and_then(|text| backend.synthesize(&rules.apply(text)).ok());

    let player = Player::new(
        Arc::clone(&items),
        rules,
        Arc::clone(&backend) as Arc<dyn SynthesisBackend>,
        Arc::clone(&sink) as Arc<dyn PlaybackSink>,
        sink_rx,
        current,
        next,
        auto_advance,
    );
    let events = player.subscribe_events();

    Harness {
        player,
        backend,
        sink,
        sink_tx,
        events,
    }
}

/// Wait until the shared snapshot satisfies a condition
pub async fn wait_until<F>(player: &Player, description: &str, condition: F) -> PlaybackSnapshot
where
    F: Fn(&PlaybackSnapshot) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = player.snapshot().await;
            if condition(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for: {}", description))
}

/// Wait for the next event matching a predicate, skipping others
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<PlayerEvent>,
    description: &str,
    predicate: F,
) -> PlayerEvent
where
    F: Fn(&PlayerEvent) -> bool,
{
    timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for event: {}", description))
}

/// Assert that no event matching the predicate arrives within the window
pub async fn assert_no_event_within<F>(
    events: &mut broadcast::Receiver<PlayerEvent>,
    window: Duration,
    description: &str,
    predicate: F,
) where
    F: Fn(&PlayerEvent) -> bool,
{
    let result = timeout(window, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await;

    if let Ok(event) = result {
        panic!("unexpected event ({}): {:?}", description, event);
    }
}
