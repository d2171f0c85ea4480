//! Events module for session observers
//!
//! Everything the dialogue controller does is also broadcast as a
//! [`SessionEvent`] so the IPC server (and logs) can mirror the session.

use serde::{Deserialize, Serialize};

use crate::catalog::TopicId;
use crate::chat::ChatEntry;
use crate::session::Stage;

/// Events emitted by the dialogue controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Onboarding stage changed
    StageChanged { from: Stage, to: Stage },

    /// A topic clip started on the talking surface
    ClipStarted {
        topic: TopicId,
        looped: bool,
        muted: bool,
    },

    /// The talking clip ended and idle resumed
    ClipFinished { topic: TopicId },

    /// The surface refused the clip; idle resumed immediately
    PlaybackFailed { topic: TopicId, reason: String },

    /// A routed topic has no clip
    TopicUnavailable { topic: TopicId },

    /// A line was added to the chat transcript
    ChatAppended { entry: ChatEntry },

    /// Mute flag changed
    MuteChanged { muted: bool },

    /// A submission is being processed
    Typing { active: bool },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::StageChanged { from, to } => write!(f, "STAGE_CHANGED ({from} -> {to})"),
            SessionEvent::ClipStarted { topic, .. } => write!(f, "CLIP_STARTED ({topic})"),
            SessionEvent::ClipFinished { topic } => write!(f, "CLIP_FINISHED ({topic})"),
            SessionEvent::PlaybackFailed { topic, reason } => {
                write!(f, "PLAYBACK_FAILED ({topic}: {reason})")
            }
            SessionEvent::TopicUnavailable { topic } => write!(f, "TOPIC_UNAVAILABLE ({topic})"),
            SessionEvent::ChatAppended { entry } => write!(f, "CHAT_APPENDED ({})", entry.role),
            SessionEvent::MuteChanged { muted } => write!(f, "MUTE_CHANGED ({muted})"),
            SessionEvent::Typing { active } => write!(f, "TYPING ({active})"),
        }
    }
}
