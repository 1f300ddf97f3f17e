//! Wrap-around tile-scroll engine.
//!
//! A [`Tilemap`] is a fixed grid of tile references drawn from an indexed
//! drawable. The grid tiles an unbounded world in both directions: scrolling
//! past any edge wraps back to the opposite one, so a finite map scrolls
//! forever.
//!
//! Each render pass:
//! 1. wraps the scroll origin into `[0, world)` with floor-mod semantics,
//! 2. finds the first visible tile and its (non-positive) pixel offset,
//! 3. walks `ceil(view / tile) + 1` tiles per axis, reversed when the whole view
//!    is mirrored,
//! 4. clips to the destination rectangle (restored afterwards),
//! 5. draws each non-empty cell with `cell mirror ^ view mirror`.
//!
//! The grid is not synchronized. It is read during render and must only be
//! mutated from the same thread between render passes (for a running frame
//! scheduler, that means from the update callback).

use std::ops::Range;

use thiserror::Error;

use crate::canvas::{ClipScope, DrawingContext};
use crate::image::{Paint, PaintIndexed};
use crate::types::{Mirror, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile grid must be at least 1x1, got {columns}x{rows}")]
    EmptyGrid { columns: usize, rows: usize },
    #[error("tile size must be positive, got {width}x{height}")]
    EmptyTile { width: i32, height: i32 },
    #[error("world size {columns}x{rows} tiles of {width}x{height} overflows pixel space")]
    WorldTooLarge {
        columns: usize,
        rows: usize,
        width: i32,
        height: i32,
    },
}

/// A non-empty grid cell: tile code plus the cell's own mirror attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRef {
    pub code: u16,
    pub mirror: Mirror,
}

impl TileRef {
    pub const fn new(code: u16, mirror: Mirror) -> Self {
        Self { code, mirror }
    }
}

/// Scrollable, wrap-around grid of tiles.
#[derive(Debug, Clone)]
pub struct Tilemap<T> {
    tiles: T,
    columns: usize,
    rows: usize,
    cells: Vec<Option<TileRef>>,
    tile_w: i32,
    tile_h: i32,
    world_w: i32,
    world_h: i32,
    origin: (i32, i32),
    bounds: Rect,
}

/// Floor modulo: the result is always in `[0, m)` for `m > 0`.
#[inline]
pub fn wrap(value: i32, m: i32) -> i32 {
    value.rem_euclid(m)
}

/// One axis of a render traversal.
///
/// Positions are `i64` so that views reaching the ends of the `i32` range
/// cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Axis {
    first_index: usize,
    /// Destination position of step 0, destination offset included.
    start: i64,
    pitch: i64,
    count: i64,
}

impl Axis {
    fn plan(origin: i32, world: i32, tile: i32, pos: i32, view: i32, flip: bool) -> Self {
        let scroll = wrap(origin, world);
        let first_index = (scroll / tile) as usize;
        let offset = -i64::from(scroll % tile);
        let (pos, tile, view) = (i64::from(pos), i64::from(tile), i64::from(view));
        // One extra tile of slack covers any sub-tile offset.
        let count = (view + tile - 1) / tile + 1;
        if flip {
            // Mirror the unflipped layout about the view extent: a tile at
            // [p, p + tile) lands on [view - p - tile, view - p).
            Self {
                first_index,
                start: pos + view - tile - offset,
                pitch: -tile,
                count,
            }
        } else {
            Self {
                first_index,
                start: pos + offset,
                pitch: tile,
                count,
            }
        }
    }

    /// Steps whose tile overlaps `[lo, hi)`.
    fn visible(&self, lo: i64, hi: i64) -> Range<i64> {
        let tile = self.pitch.abs();
        let (first, end) = if self.pitch > 0 {
            (
                (lo - tile - self.start).div_euclid(tile) + 1,
                ceil_div(hi - self.start, tile),
            )
        } else {
            (
                (self.start - hi).div_euclid(tile) + 1,
                ceil_div(self.start + tile - lo, tile),
            )
        };
        first.max(0)..end.min(self.count)
    }

    fn position(&self, step: i64) -> i64 {
        self.start + step * self.pitch
    }

    fn index(&self, step: i64, len: usize) -> usize {
        (self.first_index + step as usize % len) % len
    }
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -(-a).div_euclid(b)
}

impl<T: PaintIndexed> Tilemap<T> {
    /// Grid of `columns` x `rows` cells sized like the drawable's frames.
    pub fn new(tiles: T, columns: usize, rows: usize) -> Result<Self, TilemapError> {
        let (w, h) = tiles.size();
        Self::with_tile_size(tiles, columns, rows, w, h)
    }

    pub fn with_tile_size(
        tiles: T,
        columns: usize,
        rows: usize,
        tile_w: i32,
        tile_h: i32,
    ) -> Result<Self, TilemapError> {
        if columns == 0 || rows == 0 {
            return Err(TilemapError::EmptyGrid { columns, rows });
        }
        if tile_w <= 0 || tile_h <= 0 {
            return Err(TilemapError::EmptyTile {
                width: tile_w,
                height: tile_h,
            });
        }
        let too_large = TilemapError::WorldTooLarge {
            columns,
            rows,
            width: tile_w,
            height: tile_h,
        };
        let world_w = i32::try_from(columns)
            .ok()
            .and_then(|c| c.checked_mul(tile_w))
            .ok_or(too_large)?;
        let world_h = i32::try_from(rows)
            .ok()
            .and_then(|r| r.checked_mul(tile_h))
            .ok_or(too_large)?;

        Ok(Self {
            tiles,
            columns,
            rows,
            cells: vec![None; columns * rows],
            tile_w,
            tile_h,
            world_w,
            world_h,
            origin: (0, 0),
            bounds: Rect::default(),
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> (i32, i32) {
        (self.tile_w, self.tile_h)
    }

    /// Pixel size of one period of the wrap-around world.
    pub fn world_size(&self) -> (i32, i32) {
        (self.world_w, self.world_h)
    }

    pub fn tiles(&self) -> &T {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut T {
        &mut self.tiles
    }

    #[inline]
    fn idx(&self, col: usize, row: usize) -> usize {
        assert!(
            col < self.columns && row < self.rows,
            "tile ({col}, {row}) outside {}x{} grid",
            self.columns,
            self.rows
        );
        row * self.columns + col
    }

    /// Place tile `code` at `(col, row)`.
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the grid.
    pub fn set_tile(&mut self, col: usize, row: usize, code: u16, mirror: Mirror) {
        let i = self.idx(col, row);
        self.cells[i] = Some(TileRef::new(code, mirror));
    }

    /// Mark `(col, row)` empty; empty cells are not drawn.
    ///
    /// # Panics
    ///
    /// Panics if the cell lies outside the grid.
    pub fn clear_tile(&mut self, col: usize, row: usize) {
        let i = self.idx(col, row);
        self.cells[i] = None;
    }

    /// # Panics
    ///
    /// Panics if the cell lies outside the grid.
    pub fn tile(&self, col: usize, row: usize) -> Option<TileRef> {
        self.cells[self.idx(col, row)]
    }

    pub fn fill(&mut self, code: u16, mirror: Mirror) {
        self.cells.fill(Some(TileRef::new(code, mirror)));
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Scroll position in world pixels. Any value is valid; it wraps at render.
    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Scroll by a delta, keeping the stored origin wrapped so it never overflows.
    pub fn scroll_by(&mut self, dx: i32, dy: i32) {
        let x = wrap(self.origin.0, self.world_w) + wrap(dx, self.world_w);
        let y = wrap(self.origin.1, self.world_h) + wrap(dy, self.world_h);
        self.origin = (wrap(x, self.world_w), wrap(y, self.world_h));
    }

    pub fn set_bounds(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.bounds = Rect::new(x, y, w, h);
    }

    pub fn set_location(&mut self, x: i32, y: i32) {
        self.bounds.x = x;
        self.bounds.y = y;
    }

    pub fn set_size(&mut self, w: i32, h: i32) {
        self.bounds.w = w;
        self.bounds.h = h;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Render into the preset bounds.
    pub fn paint_bounds(&self, ctx: &mut dyn DrawingContext, mirror: Mirror) {
        self.render(ctx, self.bounds, mirror);
    }

    /// Compose the visible window of the world into `dst`.
    pub fn render(&self, ctx: &mut dyn DrawingContext, dst: Rect, mirror: Mirror) {
        if dst.is_empty() {
            return;
        }

        let xs = Axis::plan(
            self.origin.0,
            self.world_w,
            self.tile_w,
            dst.x,
            dst.w,
            mirror.flips_horizontal(),
        );
        let ys = Axis::plan(
            self.origin.1,
            self.world_h,
            self.tile_h,
            dst.y,
            dst.h,
            mirror.flips_vertical(),
        );

        let mut ctx = ClipScope::new(ctx, dst);
        let visible = match ctx.extent() {
            Some(extent) => ctx.effective().intersection(extent),
            None => ctx.effective(),
        };
        if visible.is_empty() {
            return;
        }

        // Tiles entirely outside the visible area are never visited.
        let cols = xs.visible(visible.x.into(), visible.right().into());
        let rows = ys.visible(visible.y.into(), visible.bottom().into());
        for sy in rows {
            let iy = ys.index(sy, self.rows);
            let Ok(y) = i32::try_from(ys.position(sy)) else {
                continue;
            };
            for sx in cols.clone() {
                let ix = xs.index(sx, self.columns);
                let Some(cell) = self.cells[iy * self.columns + ix] else {
                    continue;
                };
                let Ok(x) = i32::try_from(xs.position(sx)) else {
                    continue;
                };
                self.tiles.paint_index_scaled(
                    &mut *ctx,
                    cell.code as usize,
                    Rect::new(x, y, self.tile_w, self.tile_h),
                    cell.mirror ^ mirror,
                );
            }
        }
    }
}

impl<T: PaintIndexed> Paint for Tilemap<T> {
    /// The preset bounds' size.
    fn size(&self) -> (i32, i32) {
        (self.bounds.w, self.bounds.h)
    }

    fn paint_scaled(&self, ctx: &mut dyn DrawingContext, dst: Rect, mirror: Mirror) {
        self.render(ctx, dst, mirror);
    }
}
