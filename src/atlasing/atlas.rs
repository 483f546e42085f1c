use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use glam::Vec2;
use image::RgbaImage;

use crate::assets::AssetHandle;
use crate::error::{CombinerError, Result};
use crate::types::{MaterialId, MeshId};

use super::rect_packer::PixelRect;
use super::tile_expander::expand_tiled;
use super::tiling::TilingFactor;

/// Normalized placement rectangle inside the atlas.
///
/// `min` is the top-left corner; both fields are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl UvRect {
    pub fn from_pixels(rect: PixelRect, atlas_size: u32) -> Self {
        let scale = atlas_size.max(1) as f32;
        Self {
            min: Vec2::new(rect.x as f32, rect.y as f32) / scale,
            size: Vec2::new(rect.w as f32, rect.h as f32) / scale,
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }
}

/// A whole mesh (`submesh: None`) or one of its submeshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubMeshKey {
    pub mesh: MeshId,
    pub submesh: Option<usize>,
}

impl SubMeshKey {
    pub fn whole(mesh: MeshId) -> Self {
        Self {
            mesh,
            submesh: None,
        }
    }

    pub fn submesh(mesh: MeshId, index: usize) -> Self {
        Self {
            mesh,
            submesh: Some(index),
        }
    }
}

/// Atlas bookkeeping while source textures are being analyzed.
///
/// `tilings` and `sub_textures` stay index-aligned; an index is handed out
/// per distinct material.
#[derive(Debug, Default)]
pub struct AtlasMetadataBuilder {
    indices_by_material: HashMap<MaterialId, usize>,
    tilings: Vec<TilingFactor>,
    sub_textures: Vec<Arc<RgbaImage>>,
    meshes_using_atlas: HashSet<SubMeshKey>,
}

impl AtlasMetadataBuilder {
    /// Mark a submesh, and the mesh that owns it, as sampling the atlas.
    pub fn mark_atlased(&mut self, mesh: MeshId, submesh: usize) {
        self.meshes_using_atlas.insert(SubMeshKey::whole(mesh));
        self.meshes_using_atlas.insert(SubMeshKey::submesh(mesh, submesh));
    }

    /// Register `texture` for `material`, or widen the tiling of an earlier
    /// registration of the same material. Returns the entry's index.
    pub fn register(
        &mut self,
        material: MaterialId,
        texture: &Arc<RgbaImage>,
        tiling: TilingFactor,
    ) -> usize {
        if let Some(&index) = self.indices_by_material.get(&material) {
            self.tilings[index] = self.tilings[index].max(tiling);
            return index;
        }

        self.sub_textures.push(Arc::clone(texture));
        self.tilings.push(tiling);
        let index = self.sub_textures.len() - 1;
        self.indices_by_material.insert(material, index);
        index
    }

    pub fn len(&self) -> usize {
        self.sub_textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_textures.is_empty()
    }

    pub fn tilings(&self) -> &[TilingFactor] {
        &self.tilings
    }

    pub fn sub_textures(&self) -> &[Arc<RgbaImage>] {
        &self.sub_textures
    }

    /// Replace every registered texture by its tiled expansion.
    pub fn expand_sub_textures(&mut self) {
        for (texture, &tiling) in self.sub_textures.iter_mut().zip(&self.tilings) {
            *texture = expand_tiled(texture, tiling);
        }
    }

    /// Attach the packed placements and freeze the metadata.
    pub fn freeze(self, rects: Vec<UvRect>) -> Result<AtlasMetadata> {
        if rects.len() != self.tilings.len() {
            return Err(CombinerError::Packing(format!(
                "{} placements for {} textures",
                rects.len(),
                self.tilings.len()
            )));
        }
        Ok(AtlasMetadata {
            indices_by_material: self.indices_by_material,
            tilings: self.tilings,
            rects,
            sub_textures: self.sub_textures,
            meshes_using_atlas: self.meshes_using_atlas,
        })
    }
}

/// Frozen atlas bookkeeping; `tilings`, `rects` and `sub_textures` are index-aligned.
#[derive(Debug)]
pub struct AtlasMetadata {
    indices_by_material: HashMap<MaterialId, usize>,
    tilings: Vec<TilingFactor>,
    rects: Vec<UvRect>,
    sub_textures: Vec<Arc<RgbaImage>>,
    meshes_using_atlas: HashSet<SubMeshKey>,
}

impl AtlasMetadata {
    pub fn index_of(&self, material: MaterialId) -> Option<usize> {
        self.indices_by_material.get(&material).copied()
    }

    pub fn uses_atlas(&self, key: &SubMeshKey) -> bool {
        self.meshes_using_atlas.contains(key)
    }

    pub fn tilings(&self) -> &[TilingFactor] {
        &self.tilings
    }

    pub fn rects(&self) -> &[UvRect] {
        &self.rects
    }

    /// Textures as submitted to the packer, after tiling expansion.
    pub fn sub_textures(&self) -> &[Arc<RgbaImage>] {
        &self.sub_textures
    }

    pub fn len(&self) -> usize {
        self.tilings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilings.is_empty()
    }
}

/// The packed atlas texture together with where everything landed in it.
#[derive(Debug)]
pub struct Atlas {
    texture: Arc<RgbaImage>,
    handle: AssetHandle,
    metadata: AtlasMetadata,
}

impl Atlas {
    pub fn new(texture: Arc<RgbaImage>, handle: AssetHandle, metadata: AtlasMetadata) -> Self {
        Self {
            texture,
            handle,
            metadata,
        }
    }

    pub fn texture(&self) -> &Arc<RgbaImage> {
        &self.texture
    }

    /// Where the atlas texture was persisted.
    pub fn handle(&self) -> &AssetHandle {
        &self.handle
    }

    pub fn metadata(&self) -> &AtlasMetadata {
        &self.metadata
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.texture.width()
    }

    /// Region holding the texture of `material`, if it was atlased.
    pub fn region(&self, material: MaterialId) -> Option<AtlasRegion<'_>> {
        self.metadata
            .index_of(material)
            .map(|index| AtlasRegion { atlas: self, index })
    }

    /// All regions in registration order.
    pub fn regions(&self) -> impl Iterator<Item = AtlasRegion<'_>> {
        (0..self.metadata.len()).map(move |index| AtlasRegion { atlas: self, index })
    }
}

/// Read-only view of one entry of an [`Atlas`].
#[derive(Debug, Clone, Copy)]
pub struct AtlasRegion<'a> {
    atlas: &'a Atlas,
    index: usize,
}

impl<'a> AtlasRegion<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn atlas(&self) -> &'a Atlas {
        self.atlas
    }

    pub fn rect(&self) -> UvRect {
        self.atlas.metadata.rects[self.index]
    }

    pub fn tiling(&self) -> TilingFactor {
        self.atlas.metadata.tilings[self.index]
    }
}

impl PartialEq for AtlasRegion<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.atlas, other.atlas) && self.index == other.index
    }
}

impl Eq for AtlasRegion<'_> {}

impl Hash for AtlasRegion<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.atlas, state);
        self.index.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetDir;

    fn texture(w: u32, h: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(w, h))
    }

    fn atlas_with(builder: AtlasMetadataBuilder, rects: Vec<UvRect>) -> Atlas {
        Atlas::new(
            texture(64, 64),
            AssetDir::Textures.join("Atlas.png").handle(),
            builder.freeze(rects).unwrap(),
        )
    }

    fn unit_rect() -> UvRect {
        UvRect {
            min: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }

    #[test]
    fn register_merges_tiling_per_material() {
        let mut builder = AtlasMetadataBuilder::default();
        let tex = texture(8, 8);

        assert_eq!(builder.register(MaterialId(3), &tex, TilingFactor::new(2, 1)), 0);
        assert_eq!(builder.register(MaterialId(3), &tex, TilingFactor::new(1, 3)), 0);
        assert_eq!(builder.register(MaterialId(5), &tex, TilingFactor::ONE), 1);

        assert_eq!(builder.len(), 2);
        assert_eq!(builder.tilings(), &[TilingFactor::new(2, 3), TilingFactor::ONE]);
    }

    #[test]
    fn mark_atlased_records_mesh_and_submesh() {
        let mut builder = AtlasMetadataBuilder::default();
        builder.mark_atlased(MeshId(1), 2);
        let metadata = builder.freeze(vec![]).unwrap();

        assert!(metadata.uses_atlas(&SubMeshKey::whole(MeshId(1))));
        assert!(metadata.uses_atlas(&SubMeshKey::submesh(MeshId(1), 2)));
        assert!(!metadata.uses_atlas(&SubMeshKey::submesh(MeshId(1), 0)));
        assert!(!metadata.uses_atlas(&SubMeshKey::whole(MeshId(0))));
    }

    #[test]
    fn expand_uses_final_tiling() {
        let mut builder = AtlasMetadataBuilder::default();
        let tex = texture(8, 4);
        builder.register(MaterialId(0), &tex, TilingFactor::new(2, 1));
        builder.register(MaterialId(0), &tex, TilingFactor::new(1, 2));
        builder.register(MaterialId(1), &tex, TilingFactor::ONE);
        builder.expand_sub_textures();

        assert_eq!(builder.sub_textures()[0].dimensions(), (16, 8));
        assert!(Arc::ptr_eq(&builder.sub_textures()[1], &tex));
    }

    #[test]
    fn freeze_rejects_misaligned_rects() {
        let mut builder = AtlasMetadataBuilder::default();
        builder.register(MaterialId(0), &texture(1, 1), TilingFactor::ONE);
        assert!(matches!(
            builder.freeze(vec![]),
            Err(CombinerError::Packing(_))
        ));
    }

    #[test]
    fn uv_rect_from_pixels() {
        let rect = UvRect::from_pixels(PixelRect { x: 64, y: 0, w: 32, h: 128 }, 256);
        assert_eq!(rect.min, Vec2::new(0.25, 0.0));
        assert_eq!(rect.size, Vec2::new(0.125, 0.5));
        assert_eq!(rect.max(), Vec2::new(0.375, 0.5));
    }

    #[test]
    fn regions_compare_by_atlas_and_index() {
        let mut builder = AtlasMetadataBuilder::default();
        builder.register(MaterialId(0), &texture(1, 1), TilingFactor::ONE);
        builder.register(MaterialId(1), &texture(1, 1), TilingFactor::new(2, 2));
        let atlas = atlas_with(builder, vec![unit_rect(), unit_rect()]);

        let mut other_builder = AtlasMetadataBuilder::default();
        other_builder.register(MaterialId(0), &texture(1, 1), TilingFactor::ONE);
        let other = atlas_with(other_builder, vec![unit_rect()]);

        let a = atlas.region(MaterialId(0)).unwrap();
        assert_eq!(a, atlas.region(MaterialId(0)).unwrap());
        assert_ne!(a, atlas.region(MaterialId(1)).unwrap());
        assert_ne!(a, other.region(MaterialId(0)).unwrap());
        assert!(atlas.region(MaterialId(7)).is_none());

        let b = atlas.region(MaterialId(1)).unwrap();
        assert_eq!(b.index(), 1);
        assert_eq!(b.tiling(), TilingFactor::new(2, 2));
        assert_eq!(atlas.regions().count(), 2);
    }
}
