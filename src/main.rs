//! readaloud - Main entry point
//!
//! Interactive front end for the playback pipeline: load a document, then
//! step through it from the terminal. An empty line (or `n`) advances,
//! `a` toggles auto-advance, `q` quits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readaloud::config::{Config, VoicePreference};
use readaloud::session::{self, Session};
use readaloud::{PipelineState, PlayerEvent};

/// Command-line arguments for readaloud
#[derive(Parser, Debug)]
#[command(name = "readaloud")]
#[command(about = "Reads a document aloud, one sentence at a time")]
#[command(version)]
struct Args {
    /// Document to read (.txt)
    document: PathBuf,

    /// Pronunciation rules CSV (term,replacement)
    #[arg(short, long, env = "READALOUD_RULES")]
    rules: Option<PathBuf>,

    /// Voice: "coqui" or a Piper voice basename (e.g. en_GB-cori-high)
    #[arg(short, long, env = "READALOUD_VOICE")]
    voice: Option<String>,

    /// Allow the robotic eSpeak NG fallback
    #[arg(long)]
    allow_espeak: bool,

    /// Advance automatically when a clip finishes playing
    #[arg(long)]
    auto: bool,

    /// Emit status events as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(short, long, env = "READALOUD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for the reading display
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readaloud=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(voice) = &args.voice {
        config.voice = VoicePreference::parse(voice);
    }
    config.allow_espeak |= args.allow_espeak;
    config.auto_advance |= args.auto;

    info!("Loading {}", args.document.display());
    let session = session::load(&config, &args.document, args.rules.as_deref())
        .await
        .context("Failed to load document")?;

    println!("Backend: {}", session.backend_name);
    println!(
        "{} utterances loaded. Press Enter to start/advance, 'a' to toggle auto, 'q' to quit.",
        session.items.len()
    );
    print_position(&session).await;

    run(session, args.json).await
}

/// Interactive loop: stdin commands in, status events out
async fn run(session: Session, json: bool) -> Result<()> {
    let mut events = session.player.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break; // EOF
                };
                match line.trim() {
                    "" | "n" | "next" => next_or_play(&session).await,
                    "a" | "auto" => {
                        let enabled = !session.player.snapshot().await.auto_advance;
                        session.player.set_auto_advance(enabled);
                        println!("Auto-advance {}", if enabled { "on" } else { "off" });
                    }
                    "s" | "status" => print_position(&session).await,
                    "q" | "quit" => break,
                    other => println!("Unknown command: {:?}", other),
                }
            }
            event = events.recv() => {
                if let Ok(event) = event {
                    handle_event(&session, &event, json).await;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    session.player.shutdown();
    Ok(())
}

/// First request starts playback; every later one advances
async fn next_or_play(session: &Session) {
    let snapshot = session.player.snapshot().await;
    if snapshot.state == PipelineState::Idle {
        session.player.start();
    } else {
        session.player.advance();
    }
}

async fn handle_event(session: &Session, event: &PlayerEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{}", line);
        }
        return;
    }

    match event {
        PlayerEvent::UtteranceStarted { .. } => print_position(session).await,
        PlayerEvent::UtteranceSkipped { index, reason, .. } => {
            println!("[skipped utterance {}: {}]", index, reason);
        }
        PlayerEvent::UtteranceFinished { .. } => {}
        PlayerEvent::PlaybackFinished { .. } => println!("[end of document]"),
    }
}

async fn print_position(session: &Session) {
    let snapshot = session.player.snapshot().await;
    println!("Current: {}", snapshot.current_text);
    println!("Next:    {}", snapshot.next_text.as_deref().unwrap_or("(end)"));
}
