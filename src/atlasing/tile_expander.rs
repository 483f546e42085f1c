use std::sync::Arc;

use image::RgbaImage;

use super::tiling::TilingFactor;

/// Repeat `source` `tiling.x` times horizontally and `tiling.y` times vertically.
///
/// A single-tile factor returns the same `Arc` without copying pixels.
pub fn expand_tiled(source: &Arc<RgbaImage>, tiling: TilingFactor) -> Arc<RgbaImage> {
    if tiling.is_single() {
        return Arc::clone(source);
    }

    let (width, height) = source.dimensions();
    let tiled = RgbaImage::from_fn(width * tiling.x, height * tiling.y, |x, y| {
        *source.get_pixel(x % width, y % height)
    });
    Arc::new(tiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x as u8).wrapping_mul(10), (y as u8).wrapping_mul(10), 0, 255])
        }))
    }

    #[test]
    fn single_tile_returns_same_instance() {
        let src = gradient(4, 4);
        let out = expand_tiled(&src, TilingFactor::ONE);
        assert!(Arc::ptr_eq(&src, &out));
    }

    #[test]
    fn expanded_size() {
        let src = gradient(32, 32);
        let out = expand_tiled(&src, TilingFactor::new(2, 1));
        assert_eq!(out.dimensions(), (64, 32));
        assert!(!Arc::ptr_eq(&src, &out));
    }

    #[test]
    fn pixels_wrap_around_source() {
        let src = gradient(3, 5);
        let out = expand_tiled(&src, TilingFactor::new(3, 2));
        assert_eq!(out.dimensions(), (9, 10));

        for (x, y, pixel) in out.enumerate_pixels() {
            assert_eq!(pixel, src.get_pixel(x % 3, y % 5), "pixel ({x}, {y})");
        }
    }
}
