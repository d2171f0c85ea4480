//! Chat transcript types
//!
//! Every spoken line and every user submission is mirrored as a
//! [`ChatEntry`]. Entries are only ever appended.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who authored a chat line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// A single line in the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::now(Role::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::now(Role::Bot, text)
    }

    fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    /// Two-digit hour and minute, as shown under a chat bubble
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Receives chat entries in append order
pub trait ChatSink {
    fn append(&mut self, entry: ChatEntry);
}

/// In-memory transcript for one session
#[derive(Debug, Default, Clone)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }
}

impl ChatSink for ChatLog {
    fn append(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }
}
