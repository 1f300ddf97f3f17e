//! Terminal input module (engine-facing).
//!
//! This module is intentionally independent of any UI framework. It maps
//! `crossterm` key events onto [`crate::types::PadButtons`] and keeps the pad
//! state in a lock-free [`Pad`] the frame thread can read while the host
//! thread writes (including terminals without key-release events).

pub mod map;
pub mod pad;

pub use vsync_tiles_types as types;

pub use map::{button_for_key, should_quit};
pub use pad::{Pad, PadTracker, DEFAULT_RELEASE_TIMEOUT_MS};
