use glam::Vec2;
use image::RgbaImage;

use crate::config::PackingSettings;
use crate::types::Mesh;

/// How many times a texture repeats across the UV span a submesh references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilingFactor {
    pub x: u32,
    pub y: u32,
}

impl TilingFactor {
    pub const ONE: TilingFactor = TilingFactor { x: 1, y: 1 };

    /// Build a factor, clamping both axes to at least 1.
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x: x.max(1),
            y: y.max(1),
        }
    }

    /// Whether the texture is used without wrapping.
    pub fn is_single(&self) -> bool {
        self.x <= 1 && self.y <= 1
    }

    /// Per-axis maximum of two factors.
    pub fn max(self, other: TilingFactor) -> TilingFactor {
        TilingFactor {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

impl Default for TilingFactor {
    fn default() -> Self {
        Self::ONE
    }
}

/// Compute the tiling a submesh needs from the UVs of the vertices it references.
///
/// Bounds start at min = 1, max = 0 and only move when a coordinate lies
/// more than `uv_error` beyond them, so UVs inside [0, 1] give (1, 1).
/// The result is clamped to at least 1 per axis, which also covers
/// submeshes without triangles.
pub fn compute_tiling(uvs: &[f32], indices: &[u32], uv_error: f32) -> TilingFactor {
    let mut min = Vec2::ONE;
    let mut max = Vec2::ZERO;

    for &index in indices {
        let base = index as usize * 2;
        let Some(uv) = uvs.get(base..base + 2) else {
            continue;
        };
        let uv = Vec2::from_slice(uv);

        if uv.x < min.x - uv_error {
            min.x = uv.x;
        }
        if uv.x > max.x + uv_error {
            max.x = uv.x;
        }
        if uv.y < min.y - uv_error {
            min.y = uv.y;
        }
        if uv.y > max.y + uv_error {
            max.y = uv.y;
        }
    }

    let span = max.ceil() - min.floor();
    TilingFactor::new(span.x.max(1.0) as u32, span.y.max(1.0) as u32)
}

/// Whether a texture used with `tiling` is small enough to be expanded and atlased.
pub fn can_optimize_tiling(
    texture: &RgbaImage,
    tiling: TilingFactor,
    settings: &PackingSettings,
) -> bool {
    if tiling == TilingFactor::ONE {
        return true;
    }
    let chunk = settings.max_tiled_chunk_size as u64;
    tiling.x as u64 * texture.width() as u64 <= chunk
        && tiling.y as u64 * texture.height() as u64 <= chunk
}

/// Whether a mesh is worth splitting into per-submesh pieces.
///
/// Single-submesh meshes always qualify; larger ones only while
/// `submesh_count * vertex_count` stays under the configured limit.
pub fn can_optimize_submeshes(mesh: &Mesh, settings: &PackingSettings) -> bool {
    mesh.submesh_count() < 2
        || mesh.submesh_count() * mesh.vertex_count() < settings.max_splitted_mesh_vertices
}
