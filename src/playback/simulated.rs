//! Headless surface for running the kiosk without a display
//!
//! Logs what a real video element would do and reports natural end of a
//! non-looping clip after a fixed clip length.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::catalog::ClipRef;

use super::surface::{PlaybackTicket, SurfaceError, VideoSurface};

pub struct SimulatedSurface {
    name: &'static str,
    clip: Option<ClipRef>,
    looping: bool,
    muted: bool,
    clip_length: Duration,
    ended_tx: mpsc::UnboundedSender<PlaybackTicket>,
}

impl SimulatedSurface {
    pub fn new(
        name: &'static str,
        clip_length: Duration,
        ended_tx: mpsc::UnboundedSender<PlaybackTicket>,
    ) -> Self {
        Self {
            name,
            clip: None,
            looping: false,
            muted: true,
            clip_length,
            ended_tx,
        }
    }
}

impl VideoSurface for SimulatedSurface {
    fn load(&mut self, clip: &ClipRef) {
        debug!(surface = self.name, %clip, "load");
        self.clip = Some(clip.clone());
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn rewind(&mut self) {}

    fn play(&mut self, ticket: PlaybackTicket) -> Result<(), SurfaceError> {
        let clip = self.clip.as_ref().ok_or(SurfaceError::NothingLoaded)?;
        let handle = tokio::runtime::Handle::try_current().map_err(|_| SurfaceError::Unavailable)?;

        info!(
            surface = self.name,
            %clip,
            %ticket,
            looping = self.looping,
            muted = self.muted,
            "playing"
        );

        if !self.looping {
            let ended_tx = self.ended_tx.clone();
            let clip_length = self.clip_length;
            handle.spawn(async move {
                tokio::time::sleep(clip_length).await;
                let _ = ended_tx.send(ticket);
            });
        }

        Ok(())
    }

    fn pause(&mut self) {
        debug!(surface = self.name, "pause");
    }

    fn set_visible(&mut self, visible: bool) {
        debug!(surface = self.name, visible, "visibility");
    }
}
