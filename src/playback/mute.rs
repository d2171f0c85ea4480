//! Session-wide mute flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared mute flag, toggled from the UI and read at every `play`
#[derive(Debug, Clone, Default)]
pub struct MuteSwitch {
    muted: Arc<AtomicBool>,
}

impl MuteSwitch {
    pub fn new(muted: bool) -> Self {
        Self {
            muted: Arc::new(AtomicBool::new(muted)),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn set(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }

    /// Flip the flag and return the new value
    pub fn toggle(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::SeqCst)
    }
}
