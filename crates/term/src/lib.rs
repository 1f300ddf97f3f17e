//! Terminal host module.
//!
//! This is a small presentation layer that lets the frame scheduler drive a
//! terminal as if it were a double-buffered display. It intentionally avoids
//! ratatui widgets/layout and instead renders into a simple framebuffer that
//! can be flushed to a terminal backend.
//!
//! Goals:
//! - Keep `core` and `engine` free of terminal I/O
//! - Present a fixed logical resolution at any terminal size (letterboxed)
//! - Only emit the cells that changed since the last present

pub mod fb;
pub mod guard;
pub mod halfblock;
pub mod renderer;
pub mod surface;

pub use vsync_tiles_core as core;
pub use vsync_tiles_engine as engine;
pub use vsync_tiles_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, UPPER_HALF};
pub use guard::TerminalGuard;
pub use halfblock::{fit_area, rasterize_half_blocks};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
pub use surface::TerminalSurface;
