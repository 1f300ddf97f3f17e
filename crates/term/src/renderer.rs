//! TerminalRenderer: flushes a half-block framebuffer to a terminal writer.
//!
//! Every cell carries two pixels as a foreground and a background color. The
//! renderer diffs each frame against the previously drawn one and repaints
//! only the changed spans of each row; the first frame after an invalidation
//! (or a size change) is a full redraw.

use std::io::{self, Write};
use std::ops::Range;

use anyhow::Result;

use crossterm::{
    cursor,
    style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal, QueueableCommand,
};

use crate::fb::{Cell, FrameBuffer};
use crate::types::Rgb;

/// Changed cells separated by at most this many unchanged ones are repainted
/// as a single span: a cursor move costs more bytes than a few cells.
const MAX_RUN_GAP: usize = 3;

pub struct TerminalRenderer<W: Write> {
    out: W,
    last: Option<FrameBuffer>,
    buf: Vec<u8>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            buf: Vec::with_capacity(64 * 1024),
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Force the next draw to be a full redraw.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Draw `fb`, then swap it with the previously drawn frame.
    ///
    /// On return `fb` holds stale contents that the caller overwrites for the
    /// next frame, so no buffer is ever cloned.
    pub fn draw_swap(&mut self, fb: &mut FrameBuffer) -> Result<()> {
        self.buf.clear();
        let mut prev = match self.last.take() {
            Some(prev) if prev.width() == fb.width() && prev.height() == fb.height() => {
                encode_diff_into(&prev, fb, &mut self.buf)?;
                prev
            }
            stale => {
                encode_full_into(fb, &mut self.buf)?;
                let mut prev = stale.unwrap_or_else(|| FrameBuffer::new(0, 0));
                prev.resize(fb.width(), fb.height());
                prev
            }
        };

        if !self.buf.is_empty() {
            self.out.write_all(&self.buf)?;
            self.out.flush()?;
        }

        std::mem::swap(&mut prev, fb);
        self.last = Some(prev);
        Ok(())
    }
}

/// Clear the screen and paint every row of `fb`.
pub fn encode_full_into(fb: &FrameBuffer, out: &mut Vec<u8>) -> io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    let mut pen = Pen::default();
    for (y, row) in fb.rows().enumerate() {
        out.queue(cursor::MoveTo(0, y as u16))?;
        pen.paint(out, row)?;
    }
    pen.finish(out)
}

/// Paint the spans of `next` that differ from `prev`.
///
/// Frames of different sizes fall back to a full redraw. An unchanged frame
/// encodes to nothing.
pub fn encode_diff_into(
    prev: &FrameBuffer,
    next: &FrameBuffer,
    out: &mut Vec<u8>,
) -> io::Result<()> {
    if prev.width() != next.width() || prev.height() != next.height() {
        return encode_full_into(next, out);
    }

    let mut pen = Pen::default();
    for (y, (old, new)) in prev.rows().zip(next.rows()).enumerate() {
        for_each_changed_run(old, new, |run| {
            out.queue(cursor::MoveTo(run.start as u16, y as u16))?;
            pen.paint(out, &new[run])
        })?;
    }
    pen.finish(out)
}

/// Colors last sent to the terminal; a color is only re-sent when it changes.
#[derive(Debug, Default)]
struct Pen {
    upper: Option<Rgb>,
    lower: Option<Rgb>,
}

impl Pen {
    fn paint(&mut self, out: &mut Vec<u8>, cells: &[Cell]) -> io::Result<()> {
        let mut utf8 = [0u8; 4];
        for cell in cells {
            if self.upper != Some(cell.style.fg) {
                out.queue(SetForegroundColor(color(cell.style.fg)))?;
                self.upper = Some(cell.style.fg);
            }
            if self.lower != Some(cell.style.bg) {
                out.queue(SetBackgroundColor(color(cell.style.bg)))?;
                self.lower = Some(cell.style.bg);
            }
            out.extend_from_slice(cell.ch.encode_utf8(&mut utf8).as_bytes());
        }
        Ok(())
    }

    /// Restore the terminal colors if anything was painted.
    fn finish(self, out: &mut Vec<u8>) -> io::Result<()> {
        if self.upper.is_some() || self.lower.is_some() {
            out.queue(ResetColor)?;
        }
        Ok(())
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// Call `f` with each span of one row that needs repainting.
fn for_each_changed_run(
    old: &[Cell],
    new: &[Cell],
    mut f: impl FnMut(Range<usize>) -> io::Result<()>,
) -> io::Result<()> {
    let mut run: Option<Range<usize>> = None;
    for (x, (a, b)) in old.iter().zip(new).enumerate() {
        if a == b {
            continue;
        }
        run = match run {
            Some(r) if x - r.end <= MAX_RUN_GAP => Some(r.start..x + 1),
            Some(r) => {
                f(r)?;
                Some(x..x + 1)
            }
            None => Some(x..x + 1),
        };
    }
    match run {
        Some(r) => f(r),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPPER_HALF_UTF8: &[u8] = "\u{2580}".as_bytes();
    const CLEAR_ALL: &[u8] = b"\x1b[2J";
    const SET_FG: &[u8] = b"\x1b[38;2;";
    const SET_BG: &[u8] = b"\x1b[48;2;";

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn red() -> Cell {
        Cell::half_block(Rgb::new(255, 0, 0), Rgb::BLACK)
    }

    fn runs(old: &[Cell], new: &[Cell]) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        for_each_changed_run(old, new, |r| {
            runs.push(r);
            Ok(())
        })
        .unwrap();
        runs
    }

    #[test]
    fn nearby_changes_merge_into_one_span() {
        let old = [Cell::default(); 12];
        let mut new = old;
        for x in [1, 2, 3, 6] {
            new[x] = red();
        }
        // Gap of two unchanged cells is repainted.
        assert_eq!(runs(&old, &new), vec![1..7]);

        new[11] = red();
        // Gap of four is not.
        assert_eq!(runs(&old, &new), vec![1..7, 11..12]);
        assert!(runs(&old, &old).is_empty());
    }

    #[test]
    fn pen_sends_each_color_once_per_change() {
        let mut out = Vec::new();
        let mut pen = Pen::default();
        let on_white = Cell::half_block(Rgb::new(255, 0, 0), Rgb::new(255, 255, 255));
        let cells = [red(), red(), red(), on_white];
        pen.paint(&mut out, &cells).unwrap();

        assert_eq!(count(&out, SET_FG), 1);
        assert_eq!(count(&out, SET_BG), 2);
        assert_eq!(count(&out, UPPER_HALF_UTF8), 4);
    }

    #[test]
    fn size_change_falls_back_to_full_redraw() {
        let a = FrameBuffer::new(2, 2);
        let b = FrameBuffer::new(3, 2);
        let mut out = Vec::new();
        encode_diff_into(&a, &b, &mut out).unwrap();
        assert_eq!(count(&out, CLEAR_ALL), 1);
    }

    #[test]
    fn first_draw_is_full_then_diffs() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        let mut fb = FrameBuffer::new(2, 1);
        fb.set(0, 0, Cell::half_block(Rgb::new(9, 9, 9), Rgb::BLACK));

        renderer.draw_swap(&mut fb).unwrap();
        let first = renderer.writer().len();
        assert_eq!(count(renderer.writer(), CLEAR_ALL), 1);
        assert!(count(renderer.writer(), UPPER_HALF_UTF8) >= 1);

        // `fb` now holds the stale buffer; redraw the same content.
        fb.clear(Cell::default());
        fb.set(0, 0, Cell::half_block(Rgb::new(9, 9, 9), Rgb::BLACK));
        renderer.draw_swap(&mut fb).unwrap();
        assert_eq!(renderer.writer().len(), first);

        renderer.invalidate();
        fb.clear(Cell::default());
        fb.set(0, 0, Cell::half_block(Rgb::new(9, 9, 9), Rgb::BLACK));
        renderer.draw_swap(&mut fb).unwrap();
        assert_eq!(count(&renderer.writer()[first..], CLEAR_ALL), 1);
    }
}
