//! Pixel composition core - pure, deterministic, and testable
//!
//! This crate turns tile references and scroll positions into pixels. It has
//! **zero dependencies** on timing, threads, or terminal I/O, which keeps it:
//!
//! - **Deterministic**: the same grid, origin and viewport always issue the
//!   same blits in the same order
//! - **Testable**: any [`DrawingContext`] can record the blits it receives
//! - **Portable**: the [`PixelCanvas`] target is plain memory
//!
//! # Module Structure
//!
//! - [`canvas`]: [`Bitmap`], the [`DrawingContext`] blit primitive, scoped clipping
//!   and the CPU [`PixelCanvas`]
//! - [`image`]: drawable variants: [`Sprite`], [`SpriteArray`], [`TileSheet`]
//! - [`tilemap`]: the wrap-around tile-scroll engine
//! - [`stretch`]: aspect-preserving placement of a fixed-size frame
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vsync_tiles_core::{Bitmap, PixelCanvas, TileSheet, Tilemap};
//! use vsync_tiles_types::{Mirror, Rect, Rgb};
//!
//! let mut sheet = Bitmap::new(32, 16);
//! sheet.set(16, 0, Rgb::new(255, 0, 0));
//! let tiles = TileSheet::new(Arc::new(sheet), 16, 16, 2);
//!
//! let mut map = Tilemap::new(tiles, 4, 4).unwrap();
//! map.fill(0, Mirror::empty());
//! map.set_tile(3, 0, 1, Mirror::empty());
//! map.set_origin(-16, 0);
//!
//! let mut canvas = PixelCanvas::new(32, 32);
//! map.render(&mut canvas, Rect::new(0, 0, 32, 32), Mirror::empty());
//! // Column 3 wrapped around to the left edge.
//! assert_eq!(canvas.get(0, 0), Some(Rgb::new(255, 0, 0)));
//! ```

pub mod canvas;
pub mod image;
pub mod stretch;
pub mod tilemap;

pub use vsync_tiles_types as types;

pub use canvas::{Bitmap, BitmapError, ClipScope, DrawingContext, PixelCanvas};
pub use image::{Paint, PaintIndexed, Sprite, SpriteArray, TileSheet};
pub use stretch::letterbox;
pub use tilemap::{wrap, TileRef, Tilemap, TilemapError};
