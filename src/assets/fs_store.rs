use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info};

use crate::atlasing::CombinedMaterial;
use crate::error::{CombinerError, Result};
use crate::export;
use crate::meshes::CombinedObject;
use crate::types::Mesh;

use super::{AssetDir, AssetHandle, AssetPath, AssetStore};

/// Writes assets below an output root, one subdirectory per [`AssetDir`].
#[derive(Debug)]
pub struct FsAssetStore {
    root: PathBuf,
    /// Relative paths written or reused during this run.
    kept: HashSet<PathBuf>,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kept: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn full_path(&self, path: &AssetPath) -> PathBuf {
        self.root.join(path.relative())
    }

    /// Number of files written or reused so far.
    pub fn kept_count(&self) -> usize {
        self.kept.len()
    }

    fn keep(&mut self, path: &AssetPath) -> AssetHandle {
        self.kept.insert(path.relative());
        path.handle()
    }

    fn write(&mut self, path: &AssetPath, bytes: &[u8]) -> Result<AssetHandle> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CombinerError::Output(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&full, bytes)
            .map_err(|e| CombinerError::Output(format!("Failed to write {}: {e}", full.display())))?;
        debug!(path = %full.display(), bytes = bytes.len(), "Wrote asset");
        Ok(self.keep(path))
    }

    fn exists(&self, path: &AssetPath) -> bool {
        self.full_path(path).is_file()
    }
}

impl AssetStore for FsAssetStore {
    fn prepare_directory(&mut self, dir: AssetDir) -> Result<()> {
        let full = self.root.join(dir.as_str());
        fs::create_dir_all(&full)
            .map_err(|e| CombinerError::Output(format!("Failed to create {}: {e}", full.display())))
    }

    fn create_texture(&mut self, image: &RgbaImage, path: &AssetPath) -> Result<AssetHandle> {
        let bytes = export::encode_png(image)?;
        self.write(path, &bytes)
    }

    fn duplicate_texture_if_absent(
        &mut self,
        image: &RgbaImage,
        path: &AssetPath,
    ) -> Result<AssetHandle> {
        if self.exists(path) {
            return Ok(self.keep(path));
        }
        self.create_texture(image, path)
    }

    fn create_material(
        &mut self,
        material: &CombinedMaterial,
        path: &AssetPath,
    ) -> Result<AssetHandle> {
        let bytes = export::mtl_bytes(material)?;
        self.write(path, &bytes)
    }

    fn create_mesh(&mut self, mesh: &Mesh, path: &AssetPath) -> Result<AssetHandle> {
        let bytes = export::obj_bytes(mesh)?;
        self.write(path, &bytes)
    }

    fn duplicate_mesh_if_absent(&mut self, mesh: &Mesh, path: &AssetPath) -> Result<AssetHandle> {
        if self.exists(path) {
            return Ok(self.keep(path));
        }
        self.create_mesh(mesh, path)
    }

    fn duplicate_asset_if_absent(
        &mut self,
        source: &Path,
        path: &AssetPath,
    ) -> Result<AssetHandle> {
        if self.exists(path) {
            return Ok(self.keep(path));
        }
        let bytes = fs::read(source).map_err(|e| {
            CombinerError::Input(format!("Failed to read {}: {e}", source.display()))
        })?;
        self.write(path, &bytes)
    }

    fn create_object(&mut self, object: &CombinedObject, path: &AssetPath) -> Result<AssetHandle> {
        let json = serde_json::to_string_pretty(object).map_err(|e| {
            CombinerError::Output(format!("Failed to serialize object {}: {e}", object.name))
        })?;
        self.write(path, json.as_bytes())
    }

    fn clear_directory(&mut self, dir: AssetDir) -> Result<usize> {
        let full = self.root.join(dir.as_str());
        let entries = match fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let relative = Path::new(dir.as_str()).join(entry.file_name());
            if self.kept.contains(&relative) {
                continue;
            }
            fs::remove_file(entry.path())?;
            debug!(path = %entry.path().display(), "Removed stale asset");
            removed += 1;
        }

        if removed > 0 {
            info!(dir = %dir, removed, "Cleared stale assets");
        }
        Ok(removed)
    }
}
