//! Terminal presentation surface for the frame scheduler.
//!
//! The back buffer is a [`PixelCanvas`] at a fixed logical resolution. On
//! present it is scaled into the terminal as half-block cells and diffed
//! against the previously presented frame.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::core::PixelCanvas;
use crate::engine::{PresentSurface, SurfaceError};
use crate::fb::FrameBuffer;
use crate::halfblock::rasterize_half_blocks;
use crate::renderer::TerminalRenderer;

pub struct TerminalSurface<W: Write> {
    renderer: TerminalRenderer<W>,
    back: PixelCanvas,
    logical: (u32, u32),
    cells: FrameBuffer,
    fixed_size: Option<(u16, u16)>,
    invalidated: Arc<AtomicBool>,
    allocated: bool,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout(width: u32, height: u32) -> Self {
        Self::new(io::stdout(), width, height)
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Surface with a `width`x`height` pixel back buffer writing to `out`.
    pub fn new(out: W, width: u32, height: u32) -> Self {
        Self {
            renderer: TerminalRenderer::new(out),
            back: PixelCanvas::new(0, 0),
            logical: (width, height),
            cells: FrameBuffer::new(0, 0),
            fixed_size: None,
            invalidated: Arc::new(AtomicBool::new(false)),
            allocated: false,
        }
    }

    /// Use `cols`x`rows` instead of querying the terminal.
    pub fn with_fixed_size(mut self, cols: u16, rows: u16) -> Self {
        self.fixed_size = Some((cols, rows));
        self
    }

    /// Flag the host raises when the terminal contents were disturbed, e.g.
    /// on resize. The next present is dropped and the one after redraws fully.
    pub fn invalidation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.invalidated)
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn writer(&self) -> &W {
        self.renderer.writer()
    }

    fn terminal_size(&self) -> io::Result<(u16, u16)> {
        match self.fixed_size {
            Some(size) => Ok(size),
            None => crossterm::terminal::size(),
        }
    }
}

impl<W: Write + Send> PresentSurface for TerminalSurface<W> {
    type Canvas = PixelCanvas;

    fn allocate(&mut self) -> Result<(), SurfaceError> {
        if self.allocated {
            return Ok(());
        }
        let (w, h) = self.logical;
        self.back.resize(w, h);
        self.renderer.invalidate();
        self.allocated = true;
        debug!(width = w, height = h, "terminal surface allocated");
        Ok(())
    }

    fn back_buffer(&mut self) -> &mut PixelCanvas {
        &mut self.back
    }

    fn contents_lost(&mut self) -> bool {
        if self.invalidated.swap(false, Ordering::AcqRel) {
            self.renderer.invalidate();
            return true;
        }
        false
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        if !self.allocated {
            return Err(SurfaceError::NotAllocated);
        }
        let (cols, rows) = self.terminal_size()?;
        self.cells.resize(cols, rows);
        rasterize_half_blocks(self.back.as_bitmap(), &mut self.cells);
        self.renderer
            .draw_swap(&mut self.cells)
            .map_err(|err| SurfaceError::Backend(err.into()))
    }

    fn release(&mut self) {
        if !self.allocated {
            return;
        }
        self.back.resize(0, 0);
        self.renderer.invalidate();
        self.allocated = false;
        debug!("terminal surface released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DrawingContext;
    use crate::types::{Rect, Rgb};

    const UPPER_HALF_UTF8: &[u8] = "\u{2580}".as_bytes();

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn surface() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::new(Vec::new(), 4, 4).with_fixed_size(4, 2)
    }

    #[test]
    fn present_requires_allocation() {
        let mut s = surface();
        assert!(matches!(s.present(), Err(SurfaceError::NotAllocated)));
        s.allocate().unwrap();
        assert_eq!(s.back_buffer().width(), 4);
        s.present().unwrap();
        assert!(contains(s.writer(), UPPER_HALF_UTF8));
    }

    #[test]
    fn unchanged_frame_emits_no_cells() {
        let mut s = surface();
        s.allocate().unwrap();
        s.back_buffer().fill_rect(Rect::new(0, 0, 2, 2), Rgb::new(200, 0, 0));
        s.present().unwrap();
        let first = s.writer().len();

        s.present().unwrap();
        assert!(!contains(&s.writer()[first..], UPPER_HALF_UTF8));
    }

    #[test]
    fn invalidation_drops_one_present_then_redraws_fully() {
        let mut s = surface();
        s.allocate().unwrap();
        s.present().unwrap();

        s.invalidation_handle().store(true, Ordering::Release);
        assert!(s.contents_lost());
        assert!(!s.contents_lost());

        let before = s.writer().len();
        s.present().unwrap();
        assert!(contains(&s.writer()[before..], b"\x1b[2J"));
    }

    #[test]
    fn release_then_allocate_restores_back_buffer() {
        let mut s = surface();
        s.allocate().unwrap();
        s.release();
        assert!(!s.is_allocated());
        assert_eq!(s.back_buffer().width(), 0);
        s.allocate().unwrap();
        assert_eq!(s.back_buffer().height(), 4);
        assert_eq!(s.back_buffer().clip(), None);
    }
}
