//! Playback module
//!
//! Thin layer over two video surfaces (talking and idle):
//! - `surface`: the capabilities required from a video element
//! - `driver`: play once or looped, supersede, resume idle on completion
//! - `mute`: session-wide mute flag read at every play
//! - `simulated`: headless surface used by the daemon

mod driver;
mod mute;
mod simulated;
mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{Finished, PlayStatus, PlaybackDriver, PlaybackOptions, Showing};
pub use mute::MuteSwitch;
pub use simulated::SimulatedSurface;
pub use surface::{PlaybackTicket, SurfaceError, VideoSurface};
