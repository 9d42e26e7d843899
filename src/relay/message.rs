//! Message types crossing the relay boundary.
//!
//! - [ChatEvent] is what the host observed (any line of chat, or a command).
//! - [QueuedMessage] is what sits in a pending queue, persisted as JSON.
//! - [Outbound] is what the relay asks the host to send.
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::identity::UserRef;

/// A message waiting for its recipient. Immutable once queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    /// Unix epoch milliseconds at enqueue time
    pub timestamp: i64,
    pub text: String,
    pub sender: UserRef,
    #[serde(default)]
    pub private: bool,
}

impl QueuedMessage {
    pub fn new(text: impl Into<String>, sender: UserRef, at: DateTime<Utc>, private: bool) -> Self {
        Self {
            timestamp: at.timestamp_millis(),
            text: text.into(),
            sender,
            private,
        }
    }

    pub fn queued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or_default()
    }
}

/// One observed chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub sender: UserRef,
    pub timestamp: DateTime<Utc>,
    /// Empty for pure presence pings
    pub text: String,
    pub private: bool,
}

impl ChatEvent {
    pub fn new(sender: UserRef, text: impl Into<String>, private: bool) -> Self {
        Self {
            sender,
            timestamp: Utc::now(),
            text: text.into(),
            private,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// A presence ping with no text, used to trigger a flush check.
    pub fn presence(sender: UserRef, private: bool) -> Self {
        Self::new(sender, String::new(), private)
    }
}

/// A message the host must deliver. `recipient: None` is a channel broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    pub recipient: Option<UserRef>,
    pub private: bool,
}

impl Outbound {
    pub fn to(recipient: UserRef, text: impl Into<String>, private: bool) -> Self {
        Self {
            text: text.into(),
            recipient: Some(recipient),
            private,
        }
    }

    pub fn broadcast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            recipient: None,
            private: false,
        }
    }
}
