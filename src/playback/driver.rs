//! Playback driver
//!
//! Owns the talking and idle surfaces. At most one talking clip is active;
//! a new `play` supersedes the previous one and silently drops its
//! continuation. When the active clip ends the talking surface is hidden
//! and the idle loop resumed *before* the continuation is handed back, so
//! a continuation that plays again starts from a consistent picture.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, TopicId};

use super::mute::MuteSwitch;
use super::surface::{PlaybackTicket, SurfaceError, VideoSurface};

/// Per-request playback flags; mute comes from the [`MuteSwitch`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub looped: bool,
}

impl PlaybackOptions {
    pub fn once() -> Self {
        Self { looped: false }
    }

    pub fn looped() -> Self {
        Self { looped: true }
    }
}

/// Which surface is currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Showing {
    Nothing,
    Talking,
    Idle,
}

/// A clip that has finished, with the continuation registered for it
#[derive(Debug)]
pub struct Finished<K> {
    pub ticket: PlaybackTicket,
    pub topic: TopicId,
    pub continuation: K,
}

/// Result of a `play` request
#[derive(Debug)]
pub enum PlayStatus<K> {
    /// Unknown topic; nothing changed and the continuation was dropped
    Ignored,
    /// The clip is playing; completion will arrive with this ticket
    Started(PlaybackTicket),
    /// The surface refused to play. Idle is already back on screen and the
    /// clip counts as finished.
    Failed {
        error: SurfaceError,
        finished: Finished<K>,
    },
}

#[derive(Debug)]
struct ActiveClip<K> {
    ticket: PlaybackTicket,
    topic: TopicId,
    looped: bool,
    continuation: K,
}

/// Drives a talking surface and an idle surface for one session
pub struct PlaybackDriver<S, K> {
    catalog: Arc<Catalog>,
    talking: S,
    idle: S,
    mute: MuteSwitch,
    next_ticket: u64,
    active: Option<ActiveClip<K>>,
    showing: Showing,
}

impl<S: VideoSurface, K> PlaybackDriver<S, K> {
    /// Create a driver. The idle clip is loaded but nothing is shown yet.
    pub fn new(catalog: Arc<Catalog>, mut talking: S, mut idle: S, mute: MuteSwitch) -> Self {
        talking.set_visible(false);
        idle.set_visible(false);
        idle.load(&catalog.idle);

        Self {
            catalog,
            talking,
            idle,
            mute,
            next_ticket: 0,
            active: None,
            showing: Showing::Nothing,
        }
    }

    /// Play a topic's clip on the talking surface.
    ///
    /// `continuation` is returned from [`PlaybackDriver::finish`] once the
    /// clip ends naturally, unless a later `play` supersedes it first.
    pub fn play(&mut self, topic: &TopicId, options: PlaybackOptions, continuation: K) -> PlayStatus<K> {
        let Some(entry) = self.catalog.topics.get(topic) else {
            warn!(topic = %topic, "no clip for topic, ignoring");
            return PlayStatus::Ignored;
        };
        let clip = entry.clip.clone();

        if let Some(previous) = self.active.take() {
            debug!(
                topic = %previous.topic,
                ticket = %previous.ticket,
                "superseding active clip"
            );
        }

        let ticket = self.issue_ticket();
        let muted = self.mute.is_muted();

        self.idle.pause();
        self.idle.set_visible(false);
        self.talking.load(&clip);
        self.talking.set_looping(options.looped);
        self.talking.set_muted(muted);
        self.talking.set_visible(true);
        self.talking.rewind();
        self.showing = Showing::Talking;

        match self.talking.play(ticket) {
            Ok(()) => {
                info!(
                    topic = %topic,
                    %clip,
                    %ticket,
                    looped = options.looped,
                    muted,
                    "clip started"
                );
                self.active = Some(ActiveClip {
                    ticket,
                    topic: topic.clone(),
                    looped: options.looped,
                    continuation,
                });
                PlayStatus::Started(ticket)
            }
            Err(error) => {
                warn!(topic = %topic, %clip, ?error, "clip failed to start, falling back to idle");
                self.resume_idle();
                PlayStatus::Failed {
                    error,
                    finished: Finished {
                        ticket,
                        topic: topic.clone(),
                        continuation,
                    },
                }
            }
        }
    }

    /// Handle a natural end-of-clip notification.
    ///
    /// Returns `None` for tickets that are not the active clip (superseded
    /// or idle playbacks).
    pub fn finish(&mut self, ticket: PlaybackTicket) -> Option<Finished<K>> {
        match &self.active {
            Some(active) if active.ticket == ticket && !active.looped => {}
            Some(active) if active.ticket == ticket => {
                debug!(%ticket, "ignoring end of looped clip");
                return None;
            }
            _ => {
                debug!(%ticket, "ignoring stale completion");
                return None;
            }
        }

        let active = self.active.take()?;
        self.resume_idle();

        debug!(topic = %active.topic, %ticket, "clip finished");
        Some(Finished {
            ticket,
            topic: active.topic,
            continuation: active.continuation,
        })
    }

    /// Hide the talking surface and loop the idle clip
    fn resume_idle(&mut self) {
        let ticket = self.issue_ticket();

        self.talking.pause();
        self.talking.set_visible(false);
        self.idle.set_looping(true);
        self.idle.set_muted(self.mute.is_muted());
        self.idle.set_visible(true);
        self.showing = Showing::Idle;

        if let Err(e) = self.idle.play(ticket) {
            warn!(?e, "idle clip failed to play");
        }
    }

    fn issue_ticket(&mut self) -> PlaybackTicket {
        self.next_ticket += 1;
        PlaybackTicket::new(self.next_ticket)
    }

    /// Whether a talking clip is active
    pub fn speaking(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_topic(&self) -> Option<&TopicId> {
        self.active.as_ref().map(|a| &a.topic)
    }

    pub fn showing(&self) -> Showing {
        self.showing
    }

    pub fn mute(&self) -> &MuteSwitch {
        &self.mute
    }

    pub fn talking(&self) -> &S {
        &self.talking
    }

    pub fn idle(&self) -> &S {
        &self.idle
    }

    pub fn talking_mut(&mut self) -> &mut S {
        &mut self.talking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::RecordingSurface;

    type Driver = PlaybackDriver<RecordingSurface, &'static str>;

    fn create_driver(muted: bool) -> Driver {
        let catalog = Arc::new(Catalog::builtin("/videos").unwrap());
        PlaybackDriver::new(
            catalog,
            RecordingSurface::default(),
            RecordingSurface::default(),
            MuteSwitch::new(muted),
        )
    }

    fn started(status: PlayStatus<&'static str>) -> PlaybackTicket {
        match status {
            PlayStatus::Started(ticket) => ticket,
            other => panic!("expected clip to start, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_state() {
        let driver = create_driver(true);
        assert_eq!(driver.showing(), Showing::Nothing);
        assert!(!driver.speaking());
        assert_eq!(driver.idle().clip.as_ref().unwrap().as_str(), "/videos/idle.mp4");
    }

    #[test]
    fn test_play_shows_talking_and_hides_idle() {
        let mut driver = create_driver(true);
        started(driver.play(&"phishing".into(), PlaybackOptions::once(), "k"));

        assert_eq!(driver.showing(), Showing::Talking);
        assert!(driver.talking().visible);
        assert!(driver.talking().playing);
        assert!(driver.talking().muted);
        assert!(!driver.idle().visible);
        assert_eq!(driver.active_topic().unwrap().as_str(), "phishing");
    }

    #[test]
    fn test_unknown_topic_is_ignored() {
        let mut driver = create_driver(true);
        let status = driver.play(&"firewall".into(), PlaybackOptions::once(), "k");

        assert!(matches!(status, PlayStatus::Ignored));
        assert_eq!(driver.showing(), Showing::Nothing);
        assert!(driver.talking().plays.is_empty());
    }

    #[test]
    fn test_finish_resumes_idle_then_returns_continuation() {
        let mut driver = create_driver(false);
        let ticket = started(driver.play(&"malware".into(), PlaybackOptions::once(), "after"));

        let finished = driver.finish(ticket).unwrap();
        assert_eq!(finished.continuation, "after");
        assert_eq!(finished.topic.as_str(), "malware");

        assert_eq!(driver.showing(), Showing::Idle);
        assert!(!driver.talking().visible);
        assert!(driver.idle().visible);
        assert!(driver.idle().looping);
        assert!(driver.idle().playing);
        assert!(!driver.speaking());
    }

    #[test]
    fn test_finish_only_once() {
        let mut driver = create_driver(true);
        let ticket = started(driver.play(&"malware".into(), PlaybackOptions::once(), "k"));

        assert!(driver.finish(ticket).is_some());
        assert!(driver.finish(ticket).is_none());
    }

    #[test]
    fn test_new_play_supersedes_previous_continuation() {
        let mut driver = create_driver(true);
        let first = started(driver.play(&"malware".into(), PlaybackOptions::once(), "first"));
        let second = started(driver.play(&"phishing".into(), PlaybackOptions::once(), "second"));

        assert!(driver.finish(first).is_none());
        assert_eq!(driver.showing(), Showing::Talking);

        let finished = driver.finish(second).unwrap();
        assert_eq!(finished.continuation, "second");
    }

    #[test]
    fn test_looped_clip_never_finishes() {
        let mut driver = create_driver(true);
        let ticket = started(driver.play(&"greeting".into(), PlaybackOptions::looped(), "k"));

        assert!(driver.talking().looping);
        assert!(driver.finish(ticket).is_none());
        assert!(driver.speaking());
    }

    #[test]
    fn test_mute_read_at_play_and_idle_resume() {
        let mut driver = create_driver(true);
        let ticket = started(driver.play(&"malware".into(), PlaybackOptions::once(), "k"));
        assert!(driver.talking().muted);

        driver.mute().set(false);
        // the clip in flight keeps its mute state
        assert!(driver.talking().muted);

        driver.finish(ticket).unwrap();
        assert!(!driver.idle().muted);

        started(driver.play(&"phishing".into(), PlaybackOptions::once(), "k"));
        assert!(!driver.talking().muted);
    }

    #[test]
    fn test_failed_play_falls_back_to_idle() {
        let mut driver = create_driver(true);
        driver.talking_mut().fail_next = true;

        match driver.play(&"zip".into(), PlaybackOptions::once(), "k") {
            PlayStatus::Failed { finished, .. } => assert_eq!(finished.continuation, "k"),
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(driver.showing(), Showing::Idle);
        assert!(!driver.talking().visible);
        assert!(driver.idle().visible);
        assert!(!driver.speaking());
    }
}
