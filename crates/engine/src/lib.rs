//! Frame scheduler module - soft vertical blank for software rendering
//!
//! Runs a [`FrameHandler`] on a dedicated thread: update, render into the back
//! buffer of a [`PresentSurface`], wait for the next tick, present. Overrun
//! ticks are skipped and reported to the next update; sustained overload or a
//! clock running backwards resynchronizes to wall time.
//!
//! # Module Structure
//!
//! - [`config`]: frame rate as ticks per timing unit
//! - [`pacer`]: the pure pacing state machine
//! - [`clock`]: monotonic time and the interruptible stop signal
//! - [`surface`]: the host surface and callback capabilities
//! - [`scheduler`]: the session loop and thread lifecycle
//!
//! # Example
//!
//! ```no_run
//! use vsync_tiles_engine::{
//!     FrameHandler, FrameScheduler, PresentSurface, SchedulerConfig, SurfaceError,
//! };
//!
//! struct Null(());
//!
//! impl PresentSurface for Null {
//!     type Canvas = ();
//!     fn allocate(&mut self) -> Result<(), SurfaceError> { Ok(()) }
//!     fn back_buffer(&mut self) -> &mut () { &mut self.0 }
//!     fn contents_lost(&mut self) -> bool { false }
//!     fn present(&mut self) -> Result<(), SurfaceError> { Ok(()) }
//!     fn release(&mut self) {}
//! }
//!
//! struct Counter(u64);
//!
//! impl FrameHandler<()> for Counter {
//!     fn update(&mut self, skipped: u32) { self.0 += 1 + skipped as u64; }
//!     fn render(&mut self, _: &mut ()) {}
//! }
//!
//! let mut scheduler = FrameScheduler::new(SchedulerConfig::default(), Null(()), Counter(0));
//! scheduler.start().unwrap();
//! std::thread::sleep(std::time::Duration::from_millis(100));
//! scheduler.stop().unwrap();
//! println!("ticks: {}", scheduler.handler().unwrap().0);
//! ```

pub mod clock;
pub mod config;
pub mod pacer;
pub mod scheduler;
pub mod surface;

pub use vsync_tiles_types as types;

pub use clock::{Clock, MonotonicClock, StopSignal};
pub use config::{ConfigError, SchedulerConfig};
pub use pacer::{Elapsed, Pacer, PacerState};
pub use scheduler::{
    run_session, FrameScheduler, FrameStats, FrameStatsSnapshot, SchedulerError,
    SessionControl, SessionParts,
};
pub use surface::{FrameHandler, PresentSurface, SurfaceError};
