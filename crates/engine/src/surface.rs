//! Capabilities the frame scheduler consumes.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("presentation surface is not allocated")]
    NotAllocated,
    #[error("presentation failed: {0}")]
    Io(#[from] io::Error),
    #[error("presentation backend failed: {0}")]
    Backend(Box<dyn StdError + Send + Sync + 'static>),
}

/// Host-provided double-buffered presentation target.
///
/// The scheduler renders into [`PresentSurface::back_buffer`] and swaps it to
/// the screen with [`PresentSurface::present`] once the tick deadline has been
/// reached.
pub trait PresentSurface: Send {
    type Canvas: ?Sized;

    /// Set up the double buffer. Calling it on an allocated surface is a no-op.
    fn allocate(&mut self) -> Result<(), SurfaceError>;

    fn back_buffer(&mut self) -> &mut Self::Canvas;

    /// Whether the back buffer was invalidated since the last present.
    ///
    /// When it reports `true` the scheduler skips this present; the surface
    /// should consider the loss handled and redraw fully next time.
    fn contents_lost(&mut self) -> bool;

    /// Flush pending output to the display before a swap.
    fn sync(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError>;

    /// Drop the double buffer. Calling it on a released surface is a no-op.
    fn release(&mut self);
}

/// Per-frame callbacks, always invoked on the scheduler thread.
pub trait FrameHandler<C: ?Sized>: Send {
    /// Advance game state. `skipped` is the number of ticks consumed without
    /// presenting since the previous present.
    fn update(&mut self, skipped: u32);

    /// Draw the whole scene into the back buffer.
    fn render(&mut self, canvas: &mut C);

    /// Called once, before the first session starts.
    fn init(&mut self) {}

    /// Called once, when the scheduler is shut down.
    fn destroy(&mut self) {}

    /// Focus change reported by the host.
    fn activate(&mut self, _active: bool) {}
}
