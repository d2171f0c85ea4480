//! Video surface abstraction
//!
//! A surface is one video element: it can load a clip, loop it, mute it,
//! rewind, play, pause and be shown or hidden. Natural end of a
//! non-looping clip is reported back out-of-band with the
//! [`PlaybackTicket`] passed to [`VideoSurface::play`].

use serde::{Deserialize, Serialize};

use crate::catalog::ClipRef;

/// Identifies one `play` request; completion notifications carry it back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaybackTicket(u64);

impl PlaybackTicket {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PlaybackTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors a surface can report when asked to play
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("no clip loaded")]
    NothingLoaded,

    #[error("surface refused to play {clip}: {reason}")]
    Rejected { clip: ClipRef, reason: String },

    #[error("playback backend unavailable")]
    Unavailable,
}

/// Capabilities the playback driver needs from a video element
pub trait VideoSurface {
    fn load(&mut self, clip: &ClipRef);

    fn set_looping(&mut self, looping: bool);

    fn set_muted(&mut self, muted: bool);

    /// Seek back to the first frame
    fn rewind(&mut self);

    /// Start playing the loaded clip.
    ///
    /// For a non-looping clip the surface must later report natural end
    /// exactly once, tagged with `ticket`.
    fn play(&mut self, ticket: PlaybackTicket) -> Result<(), SurfaceError>;

    fn pause(&mut self);

    fn set_visible(&mut self, visible: bool);
}
