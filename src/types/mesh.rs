/// Stable handle of a mesh interned in a [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// Vertex colour used when a source mesh lacks one for a referenced vertex.
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// The fundamental geometry container.
///
/// Vertex buffers are shared by all submeshes; each submesh is a list of
/// triangle indices into them and is drawn with its own material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    /// Interleaved positions: [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Interleaved normals: [nx, ny, nz, ...] or empty
    pub normals: Vec<f32>,
    /// Interleaved UVs: [u, v, u, v, ...] or empty. (0, 0) is the top-left texel.
    pub uvs: Vec<f32>,
    /// Interleaved vertex colors: [r, g, b, a, ...] or empty
    pub colors: Vec<f32>,
    /// Triangle indices per submesh
    pub submeshes: Vec<Vec<u32>>,
}

impl Mesh {
    /// Number of vertices (positions / 3).
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of submeshes.
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Total number of triangles across all submeshes.
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.len() / 3).sum()
    }

    /// Triangle indices of one submesh.
    pub fn submesh(&self, index: usize) -> Option<&[u32]> {
        self.submeshes.get(index).map(Vec::as_slice)
    }

    /// Whether normals are present.
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Whether UV coordinates are present.
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Whether vertex colors are present.
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Whether the mesh contains no geometry.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Copy one submesh into a standalone, de-indexed mesh.
    ///
    /// Every referenced vertex is duplicated so the result has exactly one
    /// vertex per index and a single submesh `0..n`. Missing colors fall back
    /// to white, missing UVs to the origin. Returns `None` when the submesh
    /// does not exist or references a vertex outside the position buffer.
    pub fn extract_submesh(&self, index: usize) -> Option<Mesh> {
        let indices = self.submesh(index)?;
        let vertex_count = self.vertex_count();

        let mut out = Mesh {
            name: self.name.clone(),
            positions: Vec::with_capacity(indices.len() * 3),
            ..Default::default()
        };
        if self.has_normals() {
            out.normals.reserve(indices.len() * 3);
        }
        if self.has_uvs() {
            out.uvs.reserve(indices.len() * 2);
        }
        if self.has_colors() {
            out.colors.reserve(indices.len() * 4);
        }

        for &vi in indices {
            let vi = vi as usize;
            if vi >= vertex_count {
                return None;
            }
            out.positions.extend_from_slice(&self.positions[vi * 3..vi * 3 + 3]);
            if self.has_normals() {
                match self.normals.get(vi * 3..vi * 3 + 3) {
                    Some(n) => out.normals.extend_from_slice(n),
                    None => out.normals.extend_from_slice(&[0.0, 0.0, 1.0]),
                }
            }
            if self.has_uvs() {
                match self.uvs.get(vi * 2..vi * 2 + 2) {
                    Some(uv) => out.uvs.extend_from_slice(uv),
                    None => out.uvs.extend_from_slice(&[0.0, 0.0]),
                }
            }
            if self.has_colors() {
                match self.colors.get(vi * 4..vi * 4 + 4) {
                    Some(c) => out.colors.extend_from_slice(c),
                    None => out.colors.extend_from_slice(&WHITE),
                }
            }
        }

        out.submeshes = vec![(0..indices.len() as u32).collect()];
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quad split into two single-triangle submeshes.
    fn two_submesh_quad() -> Mesh {
        Mesh {
            name: "quad".into(),
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ],
            normals: vec![],
            uvs: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            colors: vec![0.5, 0.5, 0.5, 1.0],
            submeshes: vec![vec![0, 1, 2], vec![0, 2, 3]],
        }
    }

    #[test]
    fn empty_mesh() {
        let mesh = Mesh::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.submesh_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(!mesh.has_normals());
        assert!(!mesh.has_uvs());
        assert!(!mesh.has_colors());
        assert!(mesh.submesh(0).is_none());
    }

    #[test]
    fn counts() {
        let mesh = two_submesh_quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.submesh_count(), 2);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.submesh(1), Some(&[0u32, 2, 3][..]));
    }

    #[test]
    fn extract_submesh_deindexes() {
        let mesh = two_submesh_quad();
        let sub = mesh.extract_submesh(1).expect("submesh exists");

        assert_eq!(sub.vertex_count(), 3);
        assert_eq!(sub.submeshes, vec![vec![0, 1, 2]]);
        assert_eq!(sub.positions, vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(sub.uvs, vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        assert!(!sub.has_normals());
    }

    #[test]
    fn extract_submesh_pads_missing_colors_with_white() {
        let mesh = two_submesh_quad();
        let sub = mesh.extract_submesh(0).unwrap();

        assert_eq!(sub.colors.len(), 12);
        assert_eq!(&sub.colors[0..4], &[0.5, 0.5, 0.5, 1.0]);
        assert_eq!(&sub.colors[4..8], &WHITE);
    }

    #[test]
    fn extract_submesh_rejects_bad_input() {
        let mut mesh = two_submesh_quad();
        assert!(mesh.extract_submesh(5).is_none());

        mesh.submeshes.push(vec![0, 1, 9]);
        assert!(mesh.extract_submesh(2).is_none());
    }
}
