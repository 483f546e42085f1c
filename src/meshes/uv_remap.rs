use glam::{IVec2, Vec2};

use crate::atlasing::{AtlasRegion, TilingFactor, UvRect};

/// Most negative whole tile crossed by any coordinate in `uvs`.
///
/// Starts at (0, 0); a coordinate more than `uv_error` below the current
/// offset moves it to `floor(coordinate)`.
pub fn negative_tiling_offset(uvs: &[f32], uv_error: f32) -> IVec2 {
    let mut offset = IVec2::ZERO;
    for uv in uvs.chunks_exact(2) {
        if uv[0] < offset.x as f32 - uv_error {
            offset.x = uv[0].floor() as i32;
        }
        if uv[1] < offset.y as f32 - uv_error {
            offset.y = uv[1].floor() as i32;
        }
    }
    offset
}

/// Rewrite `uvs` from tiled texture space into `rect`.
///
/// Each tile gets `rect.size / tiling` of the placement, and coordinates are
/// shifted by the negative tiling offset so the lowest tile starts at `rect.min`.
pub fn remap_uvs(uvs: &mut [f32], rect: UvRect, tiling: TilingFactor, uv_error: f32) {
    let offset = negative_tiling_offset(uvs, uv_error).as_vec2();
    let tile_size = rect.size / tiling.as_vec2();
    let shift = rect.min - offset * tile_size;

    for uv in uvs.chunks_exact_mut(2) {
        let remapped = Vec2::from_slice(uv) * tile_size + shift;
        remapped.write_to_slice(uv);
    }
}

/// Rewrite the UVs of an atlased submesh so they sample `region`.
pub fn adjust_atlased_uvs(uvs: &mut [f32], region: &AtlasRegion<'_>, uv_error: f32) {
    remap_uvs(uvs, region.rect(), region.tiling(), uv_error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f32 = 0.01;

    fn rect(min: [f32; 2], size: [f32; 2]) -> UvRect {
        UvRect {
            min: Vec2::from(min),
            size: Vec2::from(size),
        }
    }

    fn assert_uv(uvs: &[f32], index: usize, expected: [f32; 2]) {
        assert_relative_eq!(uvs[index * 2], expected[0], epsilon = 1e-6);
        assert_relative_eq!(uvs[index * 2 + 1], expected[1], epsilon = 1e-6);
    }

    #[test]
    fn offset_of_positive_uvs_is_zero() {
        assert_eq!(negative_tiling_offset(&[0.0, 0.0, 1.0, 1.0, 2.5, 0.3], EPS), IVec2::ZERO);
        assert_eq!(negative_tiling_offset(&[], EPS), IVec2::ZERO);
    }

    #[test]
    fn offset_tracks_most_negative_tile() {
        let uvs = [-0.5, 0.2, -1.5, 0.0, 0.0, -2.0];
        assert_eq!(negative_tiling_offset(&uvs, EPS), IVec2::new(-2, -2));
    }

    #[test]
    fn offset_ignores_values_within_tolerance() {
        let uvs = [-0.005, 0.0, 0.5, -0.009];
        assert_eq!(negative_tiling_offset(&uvs, EPS), IVec2::ZERO);
    }

    #[test]
    fn single_tile_is_affine_into_rect() {
        let mut uvs = vec![0.0, 0.0, 1.0, 1.0, 0.5, 0.25];
        remap_uvs(&mut uvs, rect([0.25, 0.5], [0.5, 0.25]), TilingFactor::ONE, EPS);

        assert_uv(&uvs, 0, [0.25, 0.5]);
        assert_uv(&uvs, 1, [0.75, 0.75]);
        assert_uv(&uvs, 2, [0.5, 0.5625]);
    }

    #[test]
    fn negative_span_lands_on_rect_corners() {
        // [-1, 1] x [0, 1] on a 32x32 texture expanded to 64x32 inside a 64 atlas.
        let placement = rect([0.0, 0.0], [1.0, 0.5]);
        let mut uvs = vec![-1.0, 0.0, 1.0, 1.0, 0.0, 0.5];
        remap_uvs(&mut uvs, placement, TilingFactor::new(2, 1), EPS);

        assert_uv(&uvs, 0, [0.0, 0.0]);
        assert_uv(&uvs, 1, [1.0, 0.5]);
        assert_uv(&uvs, 2, [0.5, 0.25]);
    }

    #[test]
    fn tiled_rect_is_split_per_tile() {
        let placement = rect([0.5, 0.0], [0.5, 0.5]);
        let mut uvs = vec![0.0, 0.0, 2.0, 2.0, 1.0, 1.0];
        remap_uvs(&mut uvs, placement, TilingFactor::new(2, 2), EPS);

        assert_uv(&uvs, 0, [0.5, 0.0]);
        assert_uv(&uvs, 1, [1.0, 0.5]);
        assert_uv(&uvs, 2, [0.75, 0.25]);
    }
}
