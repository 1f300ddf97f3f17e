//! Pixel storage and the blit primitive.
//!
//! [`DrawingContext`] is the single leaf capability every drawable renders
//! through: copy one source rectangle of a [`Bitmap`] into one destination
//! rectangle, optionally mirrored, honoring the context's clip. [`PixelCanvas`]
//! is the CPU implementation used by the terminal host and by tests.

use std::ops::{Deref, DerefMut};

use thiserror::Error;

use crate::types::{Mirror, Rect, Rgb};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitmapError {
    #[error("pixel buffer holds {actual} pixels, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// RGB image with an optional transparent color key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
    color_key: Option<Rgb>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; len],
            color_key: None,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb>) -> Result<Self, BitmapError> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(BitmapError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            color_key: None,
        })
    }

    /// Pixels equal to `key` are skipped when this bitmap is blitted.
    pub fn with_color_key(mut self, key: Rgb) -> Self {
        self.color_key = Some(key);
        self
    }

    pub fn color_key(&self) -> Option<Rgb> {
        self.color_key
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width as i32, self.height as i32)
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    #[inline(always)]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.idx(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.idx(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Resize, preserving the allocation when possible. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        let len = (width as usize) * (height as usize);
        self.pixels.clear();
        self.pixels.resize(len, Rgb::BLACK);
    }
}

/// Drawing target with a clip region and a blit primitive.
pub trait DrawingContext {
    /// Current clip, `None` meaning unclipped.
    fn clip(&self) -> Option<Rect>;

    fn set_clip(&mut self, clip: Option<Rect>);

    /// Drawable area of the target, `None` when unbounded.
    fn extent(&self) -> Option<Rect> {
        None
    }

    /// Copy `src` of `image` into `dst`, scaling to fit and flipping per `mirror`.
    fn blit(&mut self, image: &Bitmap, src: Rect, dst: Rect, mirror: Mirror);
}

/// Scoped clip installation.
///
/// Installs the intersection of `rect` and the context's current clip, and
/// restores the previous clip when dropped.
pub struct ClipScope<'a, C: DrawingContext + ?Sized> {
    ctx: &'a mut C,
    saved: Option<Rect>,
    effective: Rect,
}

impl<'a, C: DrawingContext + ?Sized> ClipScope<'a, C> {
    pub fn new(ctx: &'a mut C, rect: Rect) -> Self {
        let saved = ctx.clip();
        let effective = match saved {
            Some(old) => rect.intersection(old),
            None => rect,
        };
        ctx.set_clip(Some(effective));
        Self {
            ctx,
            saved,
            effective,
        }
    }

    /// The clip installed for the lifetime of this scope.
    pub fn effective(&self) -> Rect {
        self.effective
    }
}

impl<C: DrawingContext + ?Sized> Deref for ClipScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.ctx
    }
}

impl<C: DrawingContext + ?Sized> DerefMut for ClipScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.ctx
    }
}

impl<C: DrawingContext + ?Sized> Drop for ClipScope<'_, C> {
    fn drop(&mut self) {
        self.ctx.set_clip(self.saved);
    }
}

/// CPU drawing target backed by a [`Bitmap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelCanvas {
    surface: Bitmap,
    clip: Option<Rect>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: Bitmap::new(width, height),
            clip: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn as_bitmap(&self) -> &Bitmap {
        &self.surface
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.surface.get(x, y)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface.resize(width, height);
        self.clip = None;
    }

    /// Fill the whole canvas, ignoring the clip.
    pub fn clear(&mut self, color: Rgb) {
        self.surface.fill(color);
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let area = self.visible_area().intersection(rect);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.surface.set(x, y, color);
            }
        }
    }

    fn visible_area(&self) -> Rect {
        let full = self.surface.bounds();
        match self.clip {
            Some(clip) => full.intersection(clip),
            None => full,
        }
    }
}

impl DrawingContext for PixelCanvas {
    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    fn extent(&self) -> Option<Rect> {
        Some(self.surface.bounds())
    }

    fn blit(&mut self, image: &Bitmap, src: Rect, dst: Rect, mirror: Mirror) {
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let area = self.visible_area().intersection(dst);
        if area.is_empty() {
            return;
        }

        let key = image.color_key();
        for y in area.y..area.bottom() {
            // Nearest-neighbour: map each destination pixel back into `src`.
            let mut v = ((y - dst.y) as i64 * src.h as i64 / dst.h as i64) as i32;
            if mirror.flips_vertical() {
                v = src.h - 1 - v;
            }
            for x in area.x..area.right() {
                let mut u = ((x - dst.x) as i64 * src.w as i64 / dst.w as i64) as i32;
                if mirror.flips_horizontal() {
                    u = src.w - 1 - u;
                }
                let Some(color) = image.get(src.x + u, src.y + v) else {
                    continue;
                };
                if key == Some(color) {
                    continue;
                }
                self.surface.set(x, y, color);
            }
        }
    }
}
