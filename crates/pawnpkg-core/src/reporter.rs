//! Reporter trait for dependency injection
//!
//! The engine emits an ordered stream of progress events and never blocks
//! on whoever consumes them. Front-ends render the stream; tests record it.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Where in the pipeline an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Release,
    Listing,
    Guessed,
    Mirror,
    Direct,
    Extract,
    Place,
    Sweep,
    Ledger,
    Summary,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resolve => "resolve",
            Self::Release => "release",
            Self::Listing => "listing",
            Self::Guessed => "guessed",
            Self::Mirror => "mirror",
            Self::Direct => "direct",
            Self::Extract => "extract",
            Self::Place => "place",
            Self::Sweep => "sweep",
            Self::Ledger => "ledger",
            Self::Summary => "summary",
        };
        f.write_str(s)
    }
}

/// One record of the progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub message: String,
}

pub trait Reporter: Send + Sync {
    /// Receive the next event. Must not block.
    fn report(&self, stage: Stage, message: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn report(&self, stage: Stage, message: &str) {
        (**self).report(stage, message);
    }
}

/// A no-op reporter for silent operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _: Stage, _: &str) {}
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Messages recorded for one stage.
    pub fn messages(&self, stage: Stage) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.message)
            .collect()
    }
}

impl Reporter for EventLog {
    fn report(&self, stage: Stage, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(ProgressEvent {
                stage,
                message: message.to_string(),
            });
        }
    }
}

/// Forwards events into an unbounded channel for an external consumer.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its stream.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, stage: Stage, message: &str) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(ProgressEvent {
            stage,
            message: message.to_string(),
        });
    }
}
