//! Core types module - shared data structures and constants
//!
//! This module defines the plain data used throughout the workspace: pixel
//! rectangles, mirror attributes, colors, game pad buttons and the timing
//! defaults of the frame scheduler. Nothing here performs I/O, so the types are
//! usable from the compositor, the scheduler thread and the terminal host alike.
//!
//! # Timing Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_TICKS_PER_UNIT` | 60 | Frames per timing unit |
//! | `DEFAULT_UNIT_MS` | 1000 | Length of one timing unit |
//! | `MAX_CATCH_UP_SKIPS` | 8 | Overruns tolerated before resynchronizing |
//! | `NANOS_PER_MILLI` | 1_000_000 | Unit conversion |
//!
//! A unit of 1000ms with 60 ticks gives the classic 60 FPS. Odd rates such as
//! 50 ticks per 834ms are represented exactly, because the scheduler carries the
//! rounding remainder from tick to tick.
//!
//! # Mirror Attributes
//!
//! [`Mirror`] is a two-bit mask. Stacked flips compose with XOR, so flipping a
//! horizontally mirrored tile horizontally again draws it unflipped:
//!
//! ```
//! use vsync_tiles_types::Mirror;
//!
//! assert_eq!(Mirror::HORIZONTAL ^ Mirror::HORIZONTAL, Mirror::empty());
//! assert_eq!(Mirror::HORIZONTAL ^ Mirror::VERTICAL, Mirror::BOTH);
//! ```
//!
//! # Rectangles
//!
//! ```
//! use vsync_tiles_types::Rect;
//!
//! let view = Rect::new(0, 0, 32, 32);
//! let tile = Rect::new(-15, 0, 16, 16);
//! assert_eq!(view.intersection(tile), Rect::new(0, 0, 1, 16));
//! assert!(Rect::new(0, 0, 0, 10).is_empty());
//! ```

use bitflags::bitflags;

/// Default frames per timing unit (60 frames per second with the default unit).
pub const DEFAULT_TICKS_PER_UNIT: u32 = 60;

/// Default timing unit in milliseconds.
pub const DEFAULT_UNIT_MS: u32 = 1000;

/// Consecutive overruns after which the scheduler resynchronizes to wall time
/// instead of catching up further.
pub const MAX_CATCH_UP_SKIPS: u32 = 8;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: i64 = 1_000_000;

/// Axis-aligned pixel rectangle.
///
/// Width and height are signed so that intermediate results of clipping
/// arithmetic can go negative; any rectangle with a non-positive extent is
/// treated as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(w: i32, h: i32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }

    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Overlap of two rectangles.
    ///
    /// Disjoint rectangles produce a zero-sized rectangle anchored at the
    /// clamped corner, which [`Rect::is_empty`] reports as empty.
    pub fn intersection(&self, other: Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        Rect {
            x: x0,
            y: y0,
            w: x1.saturating_sub(x0).max(0),
            h: y1.saturating_sub(y0).max(0),
        }
    }

    pub fn intersects(&self, other: Rect) -> bool {
        !self.intersection(other).is_empty()
    }

    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            w: self.w,
            h: self.h,
        }
    }
}

bitflags! {
    /// Mirror attribute: horizontal and/or vertical flip of a drawn image.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mirror: u16 {
        const HORIZONTAL = 1;
        const VERTICAL = 2;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl Mirror {
    pub const fn flips_horizontal(self) -> bool {
        self.contains(Mirror::HORIZONTAL)
    }

    pub const fn flips_vertical(self) -> bool {
        self.contains(Mirror::VERTICAL)
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

bitflags! {
    /// Logical game pad buttons.
    ///
    /// Bit positions follow the classic pad layout: four directions, then
    /// nine numbered buttons.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PadButtons: u32 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const UP = 1 << 2;
        const DOWN = 1 << 3;
        const BUTTON1 = 1 << 4;
        const BUTTON2 = 1 << 5;
        const BUTTON3 = 1 << 6;
        const BUTTON4 = 1 << 7;
        const BUTTON5 = 1 << 8;
        const BUTTON6 = 1 << 9;
        const BUTTON7 = 1 << 10;
        const BUTTON8 = 1 << 11;
        const BUTTON9 = 1 << 12;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_defaults() {
        assert_eq!(DEFAULT_TICKS_PER_UNIT, 60);
        assert_eq!(DEFAULT_UNIT_MS, 1000);
        assert_eq!(MAX_CATCH_UP_SKIPS, 8);
    }

    #[test]
    fn intersection_of_disjoint_rects_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert!(a.intersection(b).is_empty());
        assert!(!a.intersects(b));
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = Rect::new(0, 0, 32, 32);
        let b = Rect::new(17, 17, 16, 16);
        assert_eq!(a.intersection(b), Rect::new(17, 17, 15, 15));
    }

    #[test]
    fn edges_saturate_at_the_end_of_the_range() {
        let r = Rect::new(i32::MAX - 20, 0, 32, 32);
        assert_eq!(r.right(), i32::MAX);
        let wide = Rect::new(i32::MIN, 0, i32::MAX, 1);
        assert_eq!(wide.intersection(Rect::new(0, 0, i32::MAX, 1)).w, 0);
        assert_eq!(r.intersection(Rect::new(0, 0, i32::MAX, 16)), Rect::new(i32::MAX - 20, 0, 20, 16));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(2, 2, 3, 3);
        assert!(r.contains(2, 2));
        assert!(r.contains(4, 4));
        assert!(!r.contains(5, 4));
        assert!(!r.contains(1, 2));
    }

    #[test]
    fn mirror_xor_cancels_on_same_axis() {
        assert_eq!(Mirror::HORIZONTAL ^ Mirror::HORIZONTAL, Mirror::empty());
        assert_eq!(Mirror::HORIZONTAL ^ Mirror::VERTICAL, Mirror::BOTH);
        assert!(Mirror::BOTH.flips_horizontal());
        assert!(Mirror::BOTH.flips_vertical());
        assert!(!Mirror::VERTICAL.flips_horizontal());
    }

    #[test]
    fn pad_buttons_bit_layout() {
        assert_eq!(PadButtons::LEFT.bits(), 1);
        assert_eq!(PadButtons::DOWN.bits(), 8);
        assert_eq!(PadButtons::BUTTON9.bits(), 1 << 12);
    }
}
