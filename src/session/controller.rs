//! Dialogue controller
//!
//! Owns the onboarding stage and decides, for every start/submit, which
//! topic plays next. Completion of a clip comes back as a ticket; the
//! driver resumes idle and hands back the [`Continuation`] registered for
//! that clip, which the controller then runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, TopicId};
use crate::chat::{ChatEntry, ChatSink};
use crate::events::SessionEvent;
use crate::playback::{
    Finished, MuteSwitch, PlayStatus, PlaybackDriver, PlaybackOptions, PlaybackTicket,
    VideoSurface,
};

use super::stage::{scripted_step, Advance, Stage, Trigger};

/// What to do once a clip has finished and idle has resumed.
///
/// The clip's transcript line is always announced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Nothing beyond returning to idle
    ReturnToIdle,
    /// Move the onboarding stage forward
    EnterStage(Stage),
}

/// Inputs consumed by [`DialogueController::run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskInput {
    Start,
    Submit(String),
    ClipEnded(PlaybackTicket),
    SetMuted(bool),
    ToggleMute,
}

/// Snapshot of the session for status queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub stage: Stage,
    pub muted: bool,
    pub speaking: bool,
    pub active_topic: Option<TopicId>,
}

/// The conversation/video state machine for one kiosk session
pub struct DialogueController<S, C> {
    catalog: Arc<Catalog>,
    driver: PlaybackDriver<S, Continuation>,
    chat: C,
    stage: Stage,
    started: bool,
    /// One-shot latch for the "start" clip played on entering General
    start_clip_played: bool,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<S: VideoSurface, C: ChatSink> DialogueController<S, C> {
    pub fn new(
        catalog: Arc<Catalog>,
        talking: S,
        idle: S,
        mute: MuteSwitch,
        chat: C,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let driver = PlaybackDriver::new(Arc::clone(&catalog), talking, idle, mute);
        Self {
            catalog,
            driver,
            chat,
            stage: Stage::Greeting,
            started: false,
            start_clip_played: false,
            event_tx,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn driver(&self) -> &PlaybackDriver<S, Continuation> {
        &self.driver
    }

    pub fn muted(&self) -> bool {
        self.driver.mute().is_muted()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            stage: self.stage,
            muted: self.muted(),
            speaking: self.driver.speaking(),
            active_topic: self.driver.active_topic().cloned(),
        }
    }

    /// Run the controller, processing inputs until every sender is gone
    pub async fn run(
        &mut self,
        mut inputs: mpsc::Receiver<KioskInput>,
        mut clip_ended: mpsc::UnboundedReceiver<PlaybackTicket>,
    ) {
        info!(stage = %self.stage, "dialogue controller started");

        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                Some(ticket) = clip_ended.recv() => self.clip_ended(ticket),
            }
        }

        info!("dialogue controller stopped");
    }

    /// Dispatch a single input
    pub fn handle(&mut self, input: KioskInput) {
        match input {
            KioskInput::Start => self.start(),
            KioskInput::Submit(text) => self.submit(&text),
            KioskInput::ClipEnded(ticket) => self.clip_ended(ticket),
            KioskInput::SetMuted(muted) => self.set_muted(muted),
            KioskInput::ToggleMute => self.toggle_mute(),
        }
    }

    /// Play the greeting; the stage moves to AwaitingZip once it finishes
    pub fn start(&mut self) {
        if self.started {
            debug!("session already started");
            return;
        }
        self.started = true;

        if let Some(step) = scripted_step(self.stage, Trigger::Start) {
            self.take_step(step.topic, step.advance);
        }
    }

    /// Handle a line of user text
    pub fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.emit(SessionEvent::Typing { active: true });
        self.append(ChatEntry::user(text));

        let step = scripted_step(self.stage, Trigger::Submit)
            .filter(|step| step.stage != Stage::Ready || !self.start_clip_played);

        match step {
            Some(step) => {
                if step.stage == Stage::Ready {
                    self.start_clip_played = true;
                }
                self.take_step(step.topic, step.advance);
            }
            None if self.stage.routes_keywords() => self.route(text),
            None => debug!(stage = %self.stage, "no response for input in this stage"),
        }

        self.emit(SessionEvent::Typing { active: false });
    }

    /// Notification that a clip on the talking surface ended naturally
    pub fn clip_ended(&mut self, ticket: PlaybackTicket) {
        if let Some(finished) = self.driver.finish(ticket) {
            self.complete(finished);
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.driver.mute().set(muted);
        info!(muted, "mute changed");
        self.emit(SessionEvent::MuteChanged { muted });
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.driver.mute().toggle();
        info!(muted, "mute toggled");
        self.emit(SessionEvent::MuteChanged { muted });
    }

    fn take_step(&mut self, topic: &'static str, advance: Advance) {
        let continuation = match advance {
            Advance::Immediately(next) => {
                self.transition_to(next);
                Continuation::ReturnToIdle
            }
            Advance::OnFinish(next) => Continuation::EnterStage(next),
        };
        self.play(&TopicId::from(topic), continuation);
    }

    /// Keyword scan; first matching route wins
    fn route(&mut self, text: &str) {
        match self.catalog.router.route(text).cloned() {
            Some(topic) if self.catalog.topics.contains(&topic) => {
                debug!(topic = %topic, "routed input");
                self.play(&topic, Continuation::ReturnToIdle);
            }
            Some(topic) => {
                warn!(topic = %topic, "routed to a topic without media");
                self.emit(SessionEvent::TopicUnavailable { topic });
            }
            None => {
                debug!("no route matched, sending fallback");
                let fallback = self.catalog.fallback.clone();
                self.append(ChatEntry::bot(fallback));
            }
        }
    }

    fn play(&mut self, topic: &TopicId, continuation: Continuation) {
        let options = PlaybackOptions::once();
        match self.driver.play(topic, options, continuation) {
            PlayStatus::Ignored => {
                self.emit(SessionEvent::TopicUnavailable {
                    topic: topic.clone(),
                });
            }
            PlayStatus::Started(_) => {
                self.emit(SessionEvent::ClipStarted {
                    topic: topic.clone(),
                    looped: options.looped,
                    muted: self.muted(),
                });
            }
            PlayStatus::Failed { error, finished } => {
                self.emit(SessionEvent::PlaybackFailed {
                    topic: topic.clone(),
                    reason: error.to_string(),
                });
                self.complete(finished);
            }
        }
    }

    /// Announce the finished clip's transcript, then run its continuation
    fn complete(&mut self, finished: Finished<Continuation>) {
        self.emit(SessionEvent::ClipFinished {
            topic: finished.topic.clone(),
        });

        if let Some(line) = self.catalog.transcript(&finished.topic) {
            let entry = ChatEntry::bot(line);
            self.append(entry);
        }

        match finished.continuation {
            Continuation::ReturnToIdle => {}
            Continuation::EnterStage(next) => self.transition_to(next),
        }
    }

    fn transition_to(&mut self, new_stage: Stage) {
        let old_stage = self.stage;
        if !old_stage.can_transition_to(new_stage) {
            warn!(from = %old_stage, to = %new_stage, "refusing stage transition");
            return;
        }

        info!(from = %old_stage, to = %new_stage, "stage transition");
        self.stage = new_stage;
        self.emit(SessionEvent::StageChanged {
            from: old_stage,
            to: new_stage,
        });
    }

    fn append(&mut self, entry: ChatEntry) {
        self.chat.append(entry.clone());
        self.emit(SessionEvent::ChatAppended { entry });
    }

    fn emit(&self, event: SessionEvent) {
        debug!(%event, "emitting session event");
        let _ = self.event_tx.send(event);
    }
}
