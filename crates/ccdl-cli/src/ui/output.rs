//! Unified UI output interface.
//!
//! Commands and core operations talk to the console through [`Output`],
//! which forwards events to the UI actor for sequential rendering.

use super::actor::{UiActor, UiEvent};
use ccdl_core::Reporter;
use std::sync::{OnceLock, mpsc};

/// Singleton instance of the UI actor channel.
static UI_ACTOR: OnceLock<mpsc::Sender<UiEvent>> = OnceLock::new();

/// Lazily initializes the UI actor and returns a sender handle.
fn get_actor_sender() -> mpsc::Sender<UiEvent> {
    UI_ACTOR
        .get_or_init(|| {
            let actor = UiActor::spawn();
            let sender = actor.sender();

            // Keep actor alive for program duration
            std::mem::forget(actor);

            sender
        })
        .clone()
}

/// A cloneable handle for sending UI events to the terminal actor.
#[derive(Debug, Clone)]
pub struct Output {
    sender: mpsc::Sender<UiEvent>,
}

impl Output {
    pub fn new() -> Self {
        Self {
            sender: get_actor_sender(),
        }
    }

    fn send(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }

    /// Print a line without decoration.
    pub fn plain(&self, line: impl Into<String>) {
        self.send(UiEvent::Plain(line.into()));
    }

    /// Wait until every event sent so far is on screen. Call before
    /// reading from stdin.
    pub async fn sync(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(UiEvent::Sync(tx));
        let _ = rx.await;
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.send(UiEvent::Section(title.to_string()));
    }

    fn downloading(&self, file: &str, current: u64, total: Option<u64>) {
        self.send(UiEvent::Downloading {
            file: file.to_string(),
            current,
            total,
        });
    }

    fn extracting(&self, file: &str, current: u64, total: Option<u64>) {
        self.send(UiEvent::Extracting {
            file: file.to_string(),
            current,
            total,
        });
    }

    fn done(&self, file: &str, detail: &str, size: Option<u64>) {
        self.send(UiEvent::Done {
            file: file.to_string(),
            detail: detail.to_string(),
            size,
        });
    }

    fn failed(&self, file: &str, reason: &str) {
        self.send(UiEvent::Failed {
            file: file.to_string(),
            reason: reason.to_string(),
        });
    }

    fn info(&self, msg: &str) {
        self.send(UiEvent::Info(msg.to_string()));
    }

    fn success(&self, msg: &str) {
        self.send(UiEvent::Success(msg.to_string()));
    }

    fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }

    fn error(&self, msg: &str) {
        self.send(UiEvent::Error(msg.to_string()));
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        self.send(UiEvent::Summary {
            count,
            action: action.to_string(),
            elapsed_secs,
        });
    }
}
