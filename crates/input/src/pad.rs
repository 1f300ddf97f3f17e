//! Game pad state shared between the host input loop and the frame thread.
//!
//! Supports terminals that do not emit key release events by using a timeout.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use crossterm::event::{KeyEvent, KeyEventKind};

use crate::map::button_for_key;
use crate::types::PadButtons;

/// Number of distinct pad buttons.
const BUTTON_COUNT: usize = 13;

// In terminals without key-release events, a short timeout prevents a single tap
// from turning into a sustained "held" state.
pub const DEFAULT_RELEASE_TIMEOUT_MS: u64 = 150;

/// Lock-free pad button state.
///
/// Clones share the same state: the host writes, the update callback reads.
#[derive(Debug, Clone, Default)]
pub struct Pad {
    state: Arc<AtomicU32>,
}

impl Pad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, buttons: PadButtons) {
        self.state.fetch_or(buttons.bits(), Ordering::AcqRel);
    }

    pub fn release(&self, buttons: PadButtons) {
        self.state.fetch_and(!buttons.bits(), Ordering::AcqRel);
    }

    pub fn clear(&self) {
        self.state.store(0, Ordering::Release);
    }

    pub fn buttons(&self) -> PadButtons {
        PadButtons::from_bits_truncate(self.state.load(Ordering::Acquire))
    }

    /// Whether all of `buttons` are held.
    pub fn is_pressed(&self, buttons: PadButtons) -> bool {
        self.buttons().contains(buttons)
    }
}

/// Feeds terminal key events into a [`Pad`].
#[derive(Debug, Clone)]
pub struct PadTracker {
    pad: Pad,
    held: ArrayVec<(PadButtons, Instant), BUTTON_COUNT>,
    release_timeout: Duration,
    /// Set once the terminal reports a release; timeouts are off from then on.
    release_events: bool,
}

impl PadTracker {
    pub fn new(pad: Pad) -> Self {
        Self {
            pad,
            held: ArrayVec::new(),
            release_timeout: Duration::from_millis(DEFAULT_RELEASE_TIMEOUT_MS),
            release_events: false,
        }
    }

    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = timeout;
        self
    }

    pub fn release_timeout(&self) -> Duration {
        self.release_timeout
    }

    pub fn pad(&self) -> &Pad {
        &self.pad
    }

    /// Apply one key event. Returns the affected button, if the key is mapped.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<PadButtons> {
        let button = button_for_key(key.code)?;
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                self.pad.press(button);
                match self.held.iter_mut().find(|(b, _)| *b == button) {
                    Some(entry) => entry.1 = now,
                    None => {
                        let _ = self.held.try_push((button, now));
                    }
                }
            }
            KeyEventKind::Release => {
                self.release_events = true;
                self.pad.release(button);
                self.held.retain(|(b, _)| *b != button);
            }
        }
        Some(button)
    }

    /// Release buttons whose last press is older than the release timeout.
    ///
    /// Does nothing once the terminal has reported a real release event.
    pub fn expire(&mut self, now: Instant) -> ArrayVec<PadButtons, BUTTON_COUNT> {
        let mut released = ArrayVec::new();
        if self.release_events {
            return released;
        }

        let pad = &self.pad;
        let timeout = self.release_timeout;
        self.held.retain(|(button, pressed_at)| {
            if now.saturating_duration_since(*pressed_at) > timeout {
                pad.release(*button);
                let _ = released.try_push(*button);
                false
            } else {
                true
            }
        });
        released
    }

    /// Release everything, e.g. when focus is lost.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.pad.clear();
    }
}
