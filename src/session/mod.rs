//! Session module for the kiosk conversation
//!
//! Provides the dialogue controller and its onboarding script:
//! - Greeting: greeting clip plays once at session start
//! - AwaitingZip / AwaitingPhone: each submission plays the next prompt clip
//! - Ready: first submission plays the "start" clip
//! - General: submissions are routed to topic clips by keyword

mod controller;
mod stage;

pub use controller::{Continuation, DialogueController, KioskInput, SessionStatus};
pub use stage::{scripted_step, Advance, Stage, Step, Trigger, ONBOARDING};
