//! Onboarding stages and the transition table
//!
//! The scripted part of the conversation is data: each row says which
//! clip a trigger plays in a stage and where the stage goes next.

use serde::{Deserialize, Serialize};

use crate::catalog::topics;

/// Point in the fixed onboarding sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Greeting clip is playing
    Greeting,
    AwaitingZip,
    AwaitingPhone,
    /// Onboarding done, the "start" clip has not played yet
    Ready,
    /// Free questions, routed by keyword; absorbing
    General,
}

impl Default for Stage {
    fn default() -> Self {
        Self::Greeting
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Greeting => write!(f, "Greeting"),
            Stage::AwaitingZip => write!(f, "AwaitingZip"),
            Stage::AwaitingPhone => write!(f, "AwaitingPhone"),
            Stage::Ready => write!(f, "Ready"),
            Stage::General => write!(f, "General"),
        }
    }
}

impl Stage {
    /// Stages only move forward, one step at a time
    pub fn can_transition_to(&self, target: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (Greeting, AwaitingZip)
                | (AwaitingZip, AwaitingPhone)
                | (AwaitingPhone, Ready)
                | (Ready, General)
        )
    }

    /// Whether free text in this stage goes through keyword routing
    pub fn routes_keywords(&self) -> bool {
        matches!(self, Stage::Ready | Stage::General)
    }
}

/// What causes a scripted step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Session start
    Start,
    /// Non-empty user text
    Submit,
}

/// When a scripted step moves the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// As soon as the step is taken
    Immediately(Stage),
    /// Once the step's clip finishes
    OnFinish(Stage),
}

impl Advance {
    pub fn target(&self) -> Stage {
        match self {
            Advance::Immediately(stage) | Advance::OnFinish(stage) => *stage,
        }
    }
}

/// One row of the onboarding script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub stage: Stage,
    pub trigger: Trigger,
    pub topic: &'static str,
    pub advance: Advance,
}

/// The onboarding script
pub const ONBOARDING: [Step; 4] = [
    Step {
        stage: Stage::Greeting,
        trigger: Trigger::Start,
        topic: topics::GREETING,
        advance: Advance::OnFinish(Stage::AwaitingZip),
    },
    Step {
        stage: Stage::AwaitingZip,
        trigger: Trigger::Submit,
        topic: topics::ZIP,
        advance: Advance::Immediately(Stage::AwaitingPhone),
    },
    Step {
        stage: Stage::AwaitingPhone,
        trigger: Trigger::Submit,
        topic: topics::PHONE,
        advance: Advance::Immediately(Stage::Ready),
    },
    Step {
        stage: Stage::Ready,
        trigger: Trigger::Submit,
        topic: topics::START,
        advance: Advance::Immediately(Stage::General),
    },
];

/// Scripted step for a stage and trigger, if any
pub fn scripted_step(stage: Stage, trigger: Trigger) -> Option<&'static Step> {
    ONBOARDING
        .iter()
        .find(|step| step.stage == stage && step.trigger == trigger)
}
