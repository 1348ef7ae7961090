//! User-visible feedback for repository operations.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tokio::sync::broadcast;
use ts_rs::TS;

use crate::record::RecordKind;

pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Notification {
    pub level: NotificationLevel,
    pub kind: RecordKind,
    pub operation: Operation,
    pub message: String,
}

impl Notification {
    pub fn failure(kind: RecordKind, operation: Operation) -> Self {
        let verb = match operation {
            Operation::Fetch => "load",
            Operation::Create => "create",
            // Toggling is an update as far as the user is concerned.
            Operation::Update | Operation::Toggle => "update",
            Operation::Delete => "delete",
        };
        let noun = match kind {
            RecordKind::Personal => "task",
            RecordKind::Shared => "shared task",
        };
        Self {
            level: NotificationLevel::Error,
            kind,
            operation,
            message: format!("Failed to {verb} {noun}"),
        }
    }

    /// Confirmation text, if this kind of record confirms `operation`.
    pub fn success(kind: RecordKind, operation: Operation) -> Option<Self> {
        if kind != RecordKind::Shared {
            return None;
        }
        let message = match operation {
            Operation::Create => "Shared task created successfully!",
            Operation::Update | Operation::Toggle => "Shared task updated!",
            Operation::Delete => "Shared task deleted!",
            Operation::Fetch => return None,
        };
        Some(Self {
            level: NotificationLevel::Success,
            kind,
            operation,
            message: message.to_string(),
        })
    }
}

/// Fan-out of notifications. Sending with no subscribers is not an error.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn send(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }

    pub fn inbox(&self) -> NotificationInbox {
        NotificationInbox {
            rx: std::sync::Mutex::new(self.tx.subscribe()),
        }
    }
}

/// Buffered subscription that can be drained without awaiting.
pub struct NotificationInbox {
    rx: std::sync::Mutex<broadcast::Receiver<Notification>>,
}

impl NotificationInbox {
    pub fn drain(&self) -> Vec<Notification> {
        let mut rx = self.rx.lock().unwrap_or_else(|err| err.into_inner());
        let mut drained = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(notification) => drained.push(notification),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification inbox lagged");
                }
                Err(_) => break,
            }
        }
        drained
    }
}
