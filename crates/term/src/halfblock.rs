//! Pixel to cell conversion.
//!
//! Each terminal cell shows two vertically stacked pixels with an upper half
//! block glyph, so a `cols x rows` terminal is a `cols x 2*rows` pixel display
//! with roughly square pixels.

use crate::core::{letterbox, Bitmap};
use crate::fb::{Cell, FrameBuffer};
use crate::types::{Rect, Rgb};

/// Pixel area of `fb` that an image of `src_w`x`src_h` occupies.
pub fn fit_area(src_w: u32, src_h: u32, fb: &FrameBuffer) -> Rect {
    letterbox(
        src_w as i32,
        src_h as i32,
        fb.width() as i32,
        fb.height() as i32 * 2,
    )
}

/// Scale `src` into `fb`, preserving its aspect ratio. Bars are black.
pub fn rasterize_half_blocks(src: &Bitmap, fb: &mut FrameBuffer) {
    let area = fit_area(src.width(), src.height(), fb);
    for cy in 0..fb.height() {
        let py = cy as i32 * 2;
        for cx in 0..fb.width() {
            let px = cx as i32;
            let upper = sample(src, area, px, py);
            let lower = sample(src, area, px, py + 1);
            fb.set(cx, cy, Cell::half_block(upper, lower));
        }
    }
}

#[inline]
fn sample(src: &Bitmap, area: Rect, x: i32, y: i32) -> Rgb {
    if !area.contains(x, y) {
        return Rgb::BLACK;
    }
    let u = ((x - area.x) as i64 * src.width() as i64 / area.w as i64) as i32;
    let v = ((y - area.y) as i64 * src.height() as i64 / area.h as i64) as i32;
    src.get(u, v).unwrap_or(Rgb::BLACK)
}
