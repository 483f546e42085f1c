use std::cmp::Reverse;

use tracing::debug;

use crate::error::{CombinerError, Result};

/// Placement of one item inside the atlas, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Whether the two rectangles share any interior pixel.
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Result of packing: the square atlas side and one rect per input, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLayout {
    pub size: u32,
    pub rects: Vec<PixelRect>,
}

/// Pack `sizes` (width, height) into the smallest square power-of-two atlas
/// that holds them all, no larger than `max_size`.
///
/// Items are placed largest-first with a guillotine packer (best short side
/// fit); ties keep input order so identical input always yields the same
/// layout. Fails with [`CombinerError::PackingCapacityExceeded`] when the
/// items cannot fit.
pub fn pack(sizes: &[(u32, u32)], max_size: u32) -> Result<PackedLayout> {
    if sizes.is_empty() {
        return Ok(PackedLayout {
            size: 1,
            rects: Vec::new(),
        });
    }

    let required_area: u64 = sizes.iter().map(|&(w, h)| w as u64 * h as u64).sum();
    let capacity = max_size as u64 * max_size as u64;
    let largest_side = sizes.iter().map(|&(w, h)| w.max(h)).max().unwrap_or(0);

    let exceeded = || CombinerError::PackingCapacityExceeded {
        required_area,
        max_size,
    };

    if required_area > capacity || largest_side > max_size {
        return Err(exceeded());
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by_key(|&i| Reverse(sizes[i].0.max(sizes[i].1)));

    let min_side = (required_area as f64).sqrt().ceil() as u32;
    let mut size = largest_side
        .max(min_side)
        .max(1)
        .checked_next_power_of_two()
        .unwrap_or(max_size);

    loop {
        let side = size.min(max_size);
        if let Some(rects) = try_pack(&order, sizes, side) {
            debug!(atlas_size = side, items = sizes.len(), "Packed atlas");
            return Ok(PackedLayout { size: side, rects });
        }
        if side >= max_size {
            return Err(exceeded());
        }
        size = size.saturating_mul(2);
    }
}

/// A free rectangle in the guillotine packer.
#[derive(Clone)]
struct FreeRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

fn try_pack(order: &[usize], sizes: &[(u32, u32)], side: u32) -> Option<Vec<PixelRect>> {
    let mut free_rects = vec![FreeRect {
        x: 0,
        y: 0,
        w: side,
        h: side,
    }];
    let mut rects = vec![PixelRect::default(); sizes.len()];

    for &idx in order {
        let (w, h) = sizes[idx];
        if w == 0 || h == 0 {
            rects[idx] = PixelRect { x: 0, y: 0, w, h };
            continue;
        }

        let best = find_bssf(&free_rects, w, h)?;
        let rect = free_rects.remove(best);

        rects[idx] = PixelRect {
            x: rect.x,
            y: rect.y,
            w,
            h,
        };

        guillotine_split(&mut free_rects, &rect, w, h);
    }

    Some(rects)
}

/// Index of the free rect that leaves the shortest leftover side.
fn find_bssf(free_rects: &[FreeRect], w: u32, h: u32) -> Option<usize> {
    let mut best_idx = None;
    let mut best_short_side = u32::MAX;

    for (i, rect) in free_rects.iter().enumerate() {
        if rect.w >= w && rect.h >= h {
            let short_side = (rect.w - w).min(rect.h - h);
            if short_side < best_short_side {
                best_short_side = short_side;
                best_idx = Some(i);
            }
        }
    }

    best_idx
}

fn guillotine_split(free_rects: &mut Vec<FreeRect>, rect: &FreeRect, w: u32, h: u32) {
    let right_w = rect.w - w;
    let below_h = rect.h - h;

    if right_w > 0 {
        free_rects.push(FreeRect {
            x: rect.x + w,
            y: rect.y,
            w: right_w,
            h,
        });
    }

    if below_h > 0 {
        free_rects.push(FreeRect {
            x: rect.x,
            y: rect.y + h,
            w: rect.w,
            h: below_h,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(layout: &PackedLayout, sizes: &[(u32, u32)]) {
        assert_eq!(layout.rects.len(), sizes.len());
        for (rect, &(w, h)) in layout.rects.iter().zip(sizes) {
            assert_eq!((rect.w, rect.h), (w, h), "rect keeps its input size");
            assert!(rect.right() <= layout.size && rect.bottom() <= layout.size);
        }
        for (i, a) in layout.rects.iter().enumerate() {
            for b in &layout.rects[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        let used: u64 = layout.rects.iter().map(PixelRect::area).sum();
        assert!(used <= layout.size as u64 * layout.size as u64);
    }

    #[test]
    fn empty_input() {
        let layout = pack(&[], 2048).unwrap();
        assert!(layout.rects.is_empty());
        assert_eq!(layout.size, 1);
    }

    #[test]
    fn single_texture_fills_exact_power_of_two() {
        let layout = pack(&[(64, 64)], 2048).unwrap();
        assert_eq!(layout.size, 64);
        assert_eq!(layout.rects[0], PixelRect { x: 0, y: 0, w: 64, h: 64 });
    }

    #[test]
    fn mixed_sizes_do_not_overlap() {
        let sizes = [(64, 32), (128, 128), (16, 16), (32, 64), (100, 20), (7, 3)];
        let layout = pack(&sizes, 2048).unwrap();
        assert_valid(&layout, &sizes);
        assert!(layout.size.is_power_of_two());
    }

    #[test]
    fn results_follow_input_order() {
        let sizes = [(8, 8), (256, 256)];
        let layout = pack(&sizes, 1024).unwrap();
        assert_eq!((layout.rects[0].w, layout.rects[0].h), (8, 8));
        assert_eq!((layout.rects[1].w, layout.rects[1].h), (256, 256));
        // The larger item is placed first.
        assert_eq!((layout.rects[1].x, layout.rects[1].y), (0, 0));
    }

    #[test]
    fn starts_at_area_bound() {
        let sizes = [(128, 128); 5];
        let layout = pack(&sizes, 2048).unwrap();
        assert_eq!(layout.size, 512);
        assert_valid(&layout, &sizes);
    }

    #[test]
    fn grows_until_everything_fits() {
        // 128 holds the area but not the arrangement.
        let sizes = [(96, 96), (64, 64)];
        let layout = pack(&sizes, 1024).unwrap();
        assert_eq!(layout.size, 256);
        assert_valid(&layout, &sizes);
    }

    #[test]
    fn deterministic_layout() {
        let sizes = [(40, 40), (40, 40), (20, 60), (60, 20), (33, 17)];
        let a = pack(&sizes, 512).unwrap();
        let b = pack(&sizes, 512).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn total_area_over_capacity_fails() {
        let err = pack(&[(64, 64); 5], 128).unwrap_err();
        assert!(matches!(
            err,
            CombinerError::PackingCapacityExceeded {
                required_area: 20480,
                max_size: 128
            }
        ));
    }

    #[test]
    fn oversized_item_fails() {
        assert!(pack(&[(300, 10)], 256).is_err());
    }

    #[test]
    fn fragmented_fit_fails_at_max_size() {
        // Area fits (96² + 64² < 128²) but no arrangement does.
        let err = pack(&[(96, 96), (64, 64)], 128).unwrap_err();
        assert!(matches!(err, CombinerError::PackingCapacityExceeded { .. }));
    }

    #[test]
    fn non_power_of_two_max_is_respected() {
        let layout = pack(&[(100, 100), (100, 100)], 200).unwrap();
        assert_eq!(layout.size, 200);
        assert_valid(&layout, &[(100, 100), (100, 100)]);
    }

    #[test]
    fn growth_past_u32_half_clamps_to_max_size() {
        let sizes = [(1 << 31, 1), (1, 1 << 31)];
        let layout = pack(&sizes, u32::MAX).unwrap();
        assert_eq!(layout.size, u32::MAX);
        assert!(!layout.rects[0].overlaps(&layout.rects[1]));

        let layout = pack(&[((1 << 31) + 1, 1)], u32::MAX).unwrap();
        assert_eq!(layout.size, u32::MAX);
    }

    #[test]
    fn overlap_predicate() {
        let a = PixelRect { x: 0, y: 0, w: 10, h: 10 };
        let b = PixelRect { x: 10, y: 0, w: 5, h: 5 };
        let c = PixelRect { x: 9, y: 9, w: 5, h: 5 };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
    }
}
