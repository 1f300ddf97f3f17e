//! Aspect-preserving placement of a fixed-size frame inside a surface.

use crate::types::Rect;

/// Largest rectangle with the aspect ratio of `src_w`x`src_h` that fits in
/// `dst_w`x`dst_h`, centered.
///
/// Any zero or negative size yields an empty rectangle.
pub fn letterbox(src_w: i32, src_h: i32, dst_w: i32, dst_h: i32) -> Rect {
    if src_w <= 0 || src_h <= 0 || dst_w <= 0 || dst_h <= 0 {
        return Rect::default();
    }
    // Compare dst_w / src_w against dst_h / src_h without floating point.
    let (w, h) = if (dst_w as i64) * (src_h as i64) > (dst_h as i64) * (src_w as i64) {
        (((src_w as i64) * (dst_h as i64) / (src_h as i64)) as i32, dst_h)
    } else {
        (dst_w, ((src_h as i64) * (dst_w as i64) / (src_w as i64)) as i32)
    };
    Rect::new((dst_w - w) / 2, (dst_h - h) / 2, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_surface_pillarboxes() {
        assert_eq!(letterbox(160, 120, 400, 120), Rect::new(120, 0, 160, 120));
    }

    #[test]
    fn taller_surface_letterboxes() {
        assert_eq!(letterbox(160, 120, 320, 480), Rect::new(0, 120, 320, 240));
    }

    #[test]
    fn exact_fit_fills() {
        assert_eq!(letterbox(16, 9, 32, 18), Rect::new(0, 0, 32, 18));
    }

    #[test]
    fn degenerate_sizes_are_empty() {
        assert!(letterbox(0, 10, 10, 10).is_empty());
        assert!(letterbox(10, 10, 10, 0).is_empty());
    }
}
