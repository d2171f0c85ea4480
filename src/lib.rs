//! kiosk-assistant: conversation/video state machine for a kiosk assistant
//!
//! Plays pre-recorded clips keyed to a scripted onboarding flow and to
//! keyword-matched topics, mirroring every spoken line as a chat entry.
//!
//! - `session`: dialogue controller and onboarding script
//! - `playback`: talking/idle surfaces, continuations, mute flag
//! - `catalog`: topic table and priority-ordered keyword routes
//! - `chat`: append-only transcript
//! - `ipc`: Unix socket protocol for the UI

pub mod catalog;
pub mod chat;
pub mod config;
pub mod console;
pub mod events;
pub mod ipc;
pub mod lifecycle;
pub mod playback;
pub mod session;
