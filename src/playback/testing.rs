//! In-memory surface double for tests

use crate::catalog::ClipRef;

use super::surface::{PlaybackTicket, SurfaceError, VideoSurface};

/// Records every call made on it
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub clip: Option<ClipRef>,
    pub looping: bool,
    pub muted: bool,
    pub visible: bool,
    pub playing: bool,
    pub last_ticket: Option<PlaybackTicket>,
    /// Clips passed to successful `play` calls, in order
    pub plays: Vec<ClipRef>,
    /// Make the next `play` call fail
    pub fail_next: bool,
}

impl VideoSurface for RecordingSurface {
    fn load(&mut self, clip: &ClipRef) {
        self.clip = Some(clip.clone());
        self.playing = false;
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn rewind(&mut self) {}

    fn play(&mut self, ticket: PlaybackTicket) -> Result<(), SurfaceError> {
        let clip = self.clip.clone().ok_or(SurfaceError::NothingLoaded)?;
        if std::mem::take(&mut self.fail_next) {
            return Err(SurfaceError::Rejected {
                clip,
                reason: "autoplay blocked".to_string(),
            });
        }
        self.playing = true;
        self.last_ticket = Some(ticket);
        self.plays.push(clip);
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
