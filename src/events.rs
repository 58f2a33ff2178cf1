//! Status events for readaloud
//!
//! Components communicate three ways:
//! - **Status events** (tokio::broadcast): one-to-many, consumed by the
//!   front end for display or JSON output
//! - **Command channel** (tokio::mpsc): requests into the single control
//!   task that owns the pipeline
//! - **Shared snapshot** (Arc<RwLock<PlaybackSnapshot>>): read-heavy access
//!   to the pipeline's current position
//!
//! Events are serializable so the front end can emit them as JSON lines.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Player status events broadcast to all subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// The pipeline moved to a new utterance (its audio may be absent)
    UtteranceStarted {
        index: usize,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Synthesis failed for an utterance; it will play as a silent step
    UtteranceSkipped {
        index: usize,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The current clip played to its natural end
    UtteranceFinished {
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// The final utterance finished playing; no further advance is possible
    PlaybackFinished { timestamp: DateTime<Utc> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = PlayerEvent::UtteranceStarted {
            index: 2,
            text: "Hello.".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"utterance_started\""));
        assert!(json.contains("\"index\":2"));
        assert!(json.contains("Hello."));
    }

    #[test]
    fn test_skip_event_carries_reason() {
        let event = PlayerEvent::UtteranceSkipped {
            index: 1,
            reason: "piper exited with status 1".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("utterance_skipped"));
        assert!(json.contains("piper exited"));
    }
}
