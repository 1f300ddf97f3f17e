//! vsync-tiles (workspace facade crate).
//!
//! Re-exports the `vsync_tiles::{core,engine,input,term,types}` public API;
//! the implementation lives in dedicated crates under `crates/`.

pub use vsync_tiles_core as core;
pub use vsync_tiles_engine as engine;
pub use vsync_tiles_input as input;
pub use vsync_tiles_term as term;
pub use vsync_tiles_types as types;
