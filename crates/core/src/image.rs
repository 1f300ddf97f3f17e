//! Drawable images.
//!
//! Everything that can be put on screen implements [`Paint`]. Drawables that
//! hold several frames (an array of sprites, a sheet of equally sized cells)
//! also implement [`PaintIndexed`], which is what the tile map consumes: it
//! does not care whether tile codes resolve to separate sprites or to cells of
//! a single sheet.

use std::sync::Arc;

use crate::canvas::{Bitmap, DrawingContext};
use crate::types::{Mirror, Rect};

/// A drawable with a natural size.
pub trait Paint {
    /// Natural size in pixels.
    fn size(&self) -> (i32, i32);

    /// Draw scaled into `dst`.
    fn paint_scaled(&self, ctx: &mut dyn DrawingContext, dst: Rect, mirror: Mirror);

    /// Draw at natural size with the top-left corner at `(x, y)`.
    fn paint(&self, ctx: &mut dyn DrawingContext, x: i32, y: i32, mirror: Mirror) {
        let (w, h) = self.size();
        self.paint_scaled(ctx, Rect::new(x, y, w, h), mirror);
    }
}

/// A drawable holding several frames addressed by index.
///
/// The plain [`Paint`] methods draw the current frame.
pub trait PaintIndexed: Paint {
    fn paint_index_scaled(
        &self,
        ctx: &mut dyn DrawingContext,
        index: usize,
        dst: Rect,
        mirror: Mirror,
    );

    fn paint_index(&self, ctx: &mut dyn DrawingContext, index: usize, x: i32, y: i32, mirror: Mirror) {
        let (w, h) = self.size();
        self.paint_index_scaled(ctx, index, Rect::new(x, y, w, h), mirror);
    }
}

/// One rectangle of a shared bitmap.
#[derive(Debug, Clone)]
pub struct Sprite {
    image: Arc<Bitmap>,
    src: Rect,
}

impl Sprite {
    pub fn new(image: Arc<Bitmap>, src: Rect) -> Self {
        Self { image, src }
    }

    /// The whole bitmap as one sprite.
    pub fn whole(image: Arc<Bitmap>) -> Self {
        let src = image.bounds();
        Self { image, src }
    }

    /// Slice `count` sprites of `w`x`h` starting at `(x, y)`, `columns` per row.
    pub fn grid(
        image: &Arc<Bitmap>,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        columns: usize,
        count: usize,
    ) -> Vec<Sprite> {
        let columns = columns.max(1);
        (0..count)
            .map(|i| {
                let cx = (i % columns) as i32;
                let cy = (i / columns) as i32;
                Sprite::new(Arc::clone(image), Rect::new(x + cx * w, y + cy * h, w, h))
            })
            .collect()
    }

    pub fn src(&self) -> Rect {
        self.src
    }
}

impl Paint for Sprite {
    fn size(&self) -> (i32, i32) {
        (self.src.w, self.src.h)
    }

    fn paint_scaled(&self, ctx: &mut dyn DrawingContext, dst: Rect, mirror: Mirror) {
        ctx.blit(&self.image, self.src, dst, mirror);
    }
}

/// Indexed list of sprites with a current frame.
#[derive(Debug, Clone)]
pub struct SpriteArray {
    sprites: Vec<Sprite>,
    index: usize,
}

impl SpriteArray {
    pub fn new(sprites: Vec<Sprite>) -> Self {
        Self { sprites, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl Paint for SpriteArray {
    fn size(&self) -> (i32, i32) {
        self.sprites.get(self.index).map_or((0, 0), Paint::size)
    }

    fn paint_scaled(&self, ctx: &mut dyn DrawingContext, dst: Rect, mirror: Mirror) {
        self.paint_index_scaled(ctx, self.index, dst, mirror);
    }
}

impl PaintIndexed for SpriteArray {
    fn paint_index_scaled(
        &self,
        ctx: &mut dyn DrawingContext,
        index: usize,
        dst: Rect,
        mirror: Mirror,
    ) {
        // Unknown frames draw nothing.
        if let Some(sprite) = self.sprites.get(index) {
            sprite.paint_scaled(ctx, dst, mirror);
        }
    }
}

/// Equally sized cells laid out in rows on one bitmap.
///
/// Cell `i` lives at column `i % columns`, row `i / columns`, relative to the
/// sheet origin. The draw size defaults to the cell size and can be changed
/// independently to scale every cell.
#[derive(Debug, Clone)]
pub struct TileSheet {
    image: Arc<Bitmap>,
    origin: (i32, i32),
    cell_w: i32,
    cell_h: i32,
    columns: usize,
    draw_w: i32,
    draw_h: i32,
    index: usize,
}

impl TileSheet {
    pub fn new(image: Arc<Bitmap>, cell_w: i32, cell_h: i32, columns: usize) -> Self {
        Self::with_origin(image, 0, 0, cell_w, cell_h, columns)
    }

    pub fn with_origin(
        image: Arc<Bitmap>,
        left: i32,
        top: i32,
        cell_w: i32,
        cell_h: i32,
        columns: usize,
    ) -> Self {
        Self {
            image,
            origin: (left, top),
            cell_w,
            cell_h,
            columns: columns.max(1),
            draw_w: cell_w,
            draw_h: cell_h,
            index: 0,
        }
    }

    pub fn set_draw_size(&mut self, w: i32, h: i32) {
        self.draw_w = w;
        self.draw_h = h;
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Source rectangle of cell `index`.
    pub fn cell_rect(&self, index: usize) -> Rect {
        let cx = (index % self.columns) as i32;
        let cy = (index / self.columns) as i32;
        Rect::new(
            self.origin.0 + cx * self.cell_w,
            self.origin.1 + cy * self.cell_h,
            self.cell_w,
            self.cell_h,
        )
    }
}

impl Paint for TileSheet {
    fn size(&self) -> (i32, i32) {
        (self.draw_w, self.draw_h)
    }

    fn paint_scaled(&self, ctx: &mut dyn DrawingContext, dst: Rect, mirror: Mirror) {
        self.paint_index_scaled(ctx, self.index, dst, mirror);
    }
}

impl PaintIndexed for TileSheet {
    fn paint_index_scaled(
        &self,
        ctx: &mut dyn DrawingContext,
        index: usize,
        dst: Rect,
        mirror: Mirror,
    ) {
        ctx.blit(&self.image, self.cell_rect(index), dst, mirror);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;
    use crate::types::Rgb;

    /// 4 cells of 2x2 in a 4x4 sheet, each cell filled with its index.
    fn sheet() -> Arc<Bitmap> {
        let mut bmp = Bitmap::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let cell = (y / 2) * 2 + (x / 2);
                bmp.set(x, y, Rgb::new(cell as u8 + 1, 0, 0));
            }
        }
        Arc::new(bmp)
    }

    #[test]
    fn grid_slices_row_major() {
        let sprites = Sprite::grid(&sheet(), 0, 0, 2, 2, 2, 4);
        assert_eq!(sprites.len(), 4);
        assert_eq!(sprites[1].src(), Rect::new(2, 0, 2, 2));
        assert_eq!(sprites[2].src(), Rect::new(0, 2, 2, 2));
    }

    #[test]
    fn tile_sheet_cell_rect_uses_columns_and_origin() {
        let ts = TileSheet::with_origin(sheet(), 1, 1, 2, 2, 3);
        assert_eq!(ts.cell_rect(0), Rect::new(1, 1, 2, 2));
        assert_eq!(ts.cell_rect(4), Rect::new(3, 3, 2, 2));
    }

    #[test]
    fn sprite_array_paints_requested_index() {
        let arr = SpriteArray::new(Sprite::grid(&sheet(), 0, 0, 2, 2, 2, 4));
        let mut canvas = PixelCanvas::new(2, 2);
        arr.paint_index(&mut canvas, 3, 0, 0, Mirror::empty());
        assert_eq!(canvas.get(1, 1), Some(Rgb::new(4, 0, 0)));

        // Out-of-range indices are ignored.
        arr.paint_index(&mut canvas, 9, 0, 0, Mirror::empty());
        assert_eq!(canvas.get(0, 0), Some(Rgb::new(4, 0, 0)));
    }

    #[test]
    fn tile_sheet_draw_size_scales_cells() {
        let mut ts = TileSheet::new(sheet(), 2, 2, 2);
        ts.set_draw_size(4, 4);
        ts.set_index(1);
        assert_eq!(ts.size(), (4, 4));

        let mut canvas = PixelCanvas::new(4, 4);
        ts.paint(&mut canvas, 0, 0, Mirror::empty());
        assert_eq!(canvas.get(3, 3), Some(Rgb::new(2, 0, 0)));
    }
}
