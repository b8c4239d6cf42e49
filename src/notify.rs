use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Warning,
    Danger,
}

/// Short-lived user-facing message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Success, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Warning, message.into());
    }

    pub fn danger(&self, message: impl Into<String>) {
        self.emit(NoticeLevel::Danger, message.into());
    }

    fn emit(&self, level: NoticeLevel, message: String) {
        // Fails only when nobody is subscribed.
        let _ = self.tx.send(Notice {
            level,
            message,
            at: Utc::now(),
        });
    }
}
