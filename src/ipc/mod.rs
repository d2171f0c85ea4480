//! IPC module for kiosk-UI communication

mod protocol;
mod server;

pub use protocol::{KioskStatus, Notification, Request, Response};
pub use server::{read_message, write_message, Server};
