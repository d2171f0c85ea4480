//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::catalog::TopicId;
use crate::chat::ChatEntry;
use crate::events::SessionEvent;
use crate::session::{SessionStatus, Stage};

/// Requests from UI to kiosk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current kiosk status
    GetStatus,

    /// Submit a line of user text
    Submit { text: String },

    /// Set the mute flag
    SetMuted { muted: bool },

    /// Flip the mute flag
    ToggleMute,

    /// Fetch the chat transcript so far
    GetTranscript,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to session event notifications
    Subscribe,
}

/// Responses from kiosk to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current kiosk status
    Status(KioskStatus),

    /// Submission queued for the dialogue controller
    Accepted,

    /// Mute flag after a set/toggle request
    Muted { muted: bool },

    /// Chat transcript in append order
    Transcript { entries: Vec<ChatEntry> },

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from kiosk to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Session event occurred
    SessionEvent { event: SessionEvent },
}

/// Full kiosk status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskStatus {
    /// Kiosk version
    pub version: String,

    /// Current onboarding stage
    pub stage: Stage,

    /// Whether sound is off
    pub muted: bool,

    /// Whether a topic clip is on the talking surface
    pub speaking: bool,

    /// Topic currently speaking, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_topic: Option<TopicId>,

    /// Number of chat entries so far
    pub chat_entries: usize,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl KioskStatus {
    pub fn new(muted: bool) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            stage: Stage::default(),
            muted,
            speaking: false,
            active_topic: None,
            chat_entries: 0,
            uptime_secs: 0,
        }
    }
}

impl Default for KioskStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Fold a controller snapshot into the IPC status
impl From<SessionStatus> for KioskStatus {
    fn from(status: SessionStatus) -> Self {
        Self {
            stage: status.stage,
            muted: status.muted,
            speaking: status.speaking,
            active_topic: status.active_topic,
            ..Self::default()
        }
    }
}
