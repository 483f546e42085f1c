use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::atlasing::CombinedMaterial;
use crate::error::Result;
use crate::meshes::CombinedObject;
use crate::types::Mesh;

use super::{AssetDir, AssetHandle, AssetPath, AssetStore};

/// An asset held by [`MemoryAssetStore`].
#[derive(Debug, Clone)]
pub enum StoredAsset {
    Texture(RgbaImage),
    Material(CombinedMaterial),
    Mesh(Mesh),
    Object(CombinedObject),
    /// Copy of an external file; only the source path is recorded.
    Copy(PathBuf),
}

/// Keeps every asset in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: BTreeMap<AssetHandle, StoredAsset>,
    directories: BTreeSet<AssetDir>,
}

impl MemoryAssetStore {
    pub fn get(&self, handle: &AssetHandle) -> Option<&StoredAsset> {
        self.assets.get(handle)
    }

    pub fn texture(&self, handle: &AssetHandle) -> Option<&RgbaImage> {
        match self.assets.get(handle)? {
            StoredAsset::Texture(image) => Some(image),
            _ => None,
        }
    }

    pub fn material(&self, handle: &AssetHandle) -> Option<&CombinedMaterial> {
        match self.assets.get(handle)? {
            StoredAsset::Material(material) => Some(material),
            _ => None,
        }
    }

    pub fn mesh(&self, handle: &AssetHandle) -> Option<&Mesh> {
        match self.assets.get(handle)? {
            StoredAsset::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn object(&self, handle: &AssetHandle) -> Option<&CombinedObject> {
        match self.assets.get(handle)? {
            StoredAsset::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Stored assets in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (&AssetHandle, &StoredAsset)> {
        self.assets.iter()
    }

    /// Number of assets stored under `dir`.
    pub fn count_in(&self, dir: AssetDir) -> usize {
        let prefix = format!("{}/", dir.as_str());
        self.assets
            .keys()
            .filter(|handle| handle.as_str().starts_with(&prefix))
            .count()
    }

    pub fn is_prepared(&self, dir: AssetDir) -> bool {
        self.directories.contains(&dir)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn insert(&mut self, path: &AssetPath, asset: StoredAsset) -> AssetHandle {
        let handle = path.handle();
        self.assets.insert(handle.clone(), asset);
        handle
    }

    fn insert_if_absent(
        &mut self,
        path: &AssetPath,
        asset: impl FnOnce() -> StoredAsset,
    ) -> AssetHandle {
        let handle = path.handle();
        self.assets.entry(handle.clone()).or_insert_with(asset);
        handle
    }
}

impl AssetStore for MemoryAssetStore {
    fn prepare_directory(&mut self, dir: AssetDir) -> Result<()> {
        self.directories.insert(dir);
        Ok(())
    }

    fn create_texture(&mut self, image: &RgbaImage, path: &AssetPath) -> Result<AssetHandle> {
        Ok(self.insert(path, StoredAsset::Texture(image.clone())))
    }

    fn duplicate_texture_if_absent(
        &mut self,
        image: &RgbaImage,
        path: &AssetPath,
    ) -> Result<AssetHandle> {
        Ok(self.insert_if_absent(path, || StoredAsset::Texture(image.clone())))
    }

    fn create_material(
        &mut self,
        material: &CombinedMaterial,
        path: &AssetPath,
    ) -> Result<AssetHandle> {
        Ok(self.insert(path, StoredAsset::Material(material.clone())))
    }

    fn create_mesh(&mut self, mesh: &Mesh, path: &AssetPath) -> Result<AssetHandle> {
        Ok(self.insert(path, StoredAsset::Mesh(mesh.clone())))
    }

    fn duplicate_mesh_if_absent(&mut self, mesh: &Mesh, path: &AssetPath) -> Result<AssetHandle> {
        Ok(self.insert_if_absent(path, || StoredAsset::Mesh(mesh.clone())))
    }

    fn duplicate_asset_if_absent(
        &mut self,
        source: &Path,
        path: &AssetPath,
    ) -> Result<AssetHandle> {
        Ok(self.insert_if_absent(path, || StoredAsset::Copy(source.to_path_buf())))
    }

    fn create_object(&mut self, object: &CombinedObject, path: &AssetPath) -> Result<AssetHandle> {
        Ok(self.insert(path, StoredAsset::Object(object.clone())))
    }

    /// Nothing outlives a run in memory, so there is never anything stale.
    fn clear_directory(&mut self, _dir: AssetDir) -> Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_if_absent_keeps_first() {
        let mut store = MemoryAssetStore::default();
        let path = AssetDir::Textures.join("wood_0.png");
        store
            .duplicate_texture_if_absent(&RgbaImage::new(2, 2), &path)
            .unwrap();
        let handle = store
            .duplicate_texture_if_absent(&RgbaImage::new(4, 4), &path)
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.texture(&handle).unwrap().dimensions(), (2, 2));
    }

    #[test]
    fn create_overwrites() {
        let mut store = MemoryAssetStore::default();
        let path = AssetDir::Textures.join("Atlas.png");
        store.create_texture(&RgbaImage::new(2, 2), &path).unwrap();
        let handle = store.create_texture(&RgbaImage::new(4, 4), &path).unwrap();
        assert_eq!(store.texture(&handle).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn typed_getters_and_counts() {
        let mut store = MemoryAssetStore::default();
        store.prepare_directory(AssetDir::Meshes).unwrap();
        let handle = store
            .create_mesh(&Mesh::default(), &AssetDir::Meshes.join("m.obj"))
            .unwrap();

        assert!(store.mesh(&handle).is_some());
        assert!(store.texture(&handle).is_none());
        assert_eq!(store.count_in(AssetDir::Meshes), 1);
        assert_eq!(store.count_in(AssetDir::Textures), 0);
        assert!(store.is_prepared(AssetDir::Meshes));
        assert_eq!(store.clear_directory(AssetDir::Meshes).unwrap(), 0);
    }
}
