//! Asset persistence.
//!
//! The combiner never touches files directly; everything it produces goes
//! through an [`AssetStore`]. [`FsAssetStore`] writes a directory tree,
//! [`MemoryAssetStore`] keeps results in memory for dry runs and tests.

pub mod fs_store;
pub mod memory_store;

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;

use crate::atlasing::materials::CombinedMaterial;
use crate::error::Result;
use crate::meshes::optimizer::CombinedObject;
use crate::types::Mesh;

pub use fs_store::FsAssetStore;
pub use memory_store::{MemoryAssetStore, StoredAsset};

/// Output subdirectory an asset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetDir {
    Textures,
    Materials,
    Meshes,
    Objects,
    Misc,
}

impl AssetDir {
    pub const ALL: [AssetDir; 5] = [
        AssetDir::Textures,
        AssetDir::Materials,
        AssetDir::Meshes,
        AssetDir::Objects,
        AssetDir::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetDir::Textures => "Textures",
            AssetDir::Materials => "Materials",
            AssetDir::Meshes => "Meshes",
            AssetDir::Objects => "Objects",
            AssetDir::Misc => "Misc",
        }
    }

    /// Path of a file named `name` inside this directory.
    pub fn join(self, name: impl AsRef<str>) -> AssetPath {
        AssetPath {
            dir: self,
            name: asset_name(name.as_ref()),
        }
    }
}

impl fmt::Display for AssetDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of an asset relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath {
    dir: AssetDir,
    name: String,
}

impl AssetPath {
    pub fn dir(&self) -> AssetDir {
        self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path relative to the output root, using the platform separator.
    pub fn relative(&self) -> PathBuf {
        Path::new(self.dir.as_str()).join(&self.name)
    }

    pub fn handle(&self) -> AssetHandle {
        AssetHandle(format!("{}/{}", self.dir.as_str(), self.name))
    }
}

/// Reference to a persisted asset: its `/`-separated path below the output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this asset as seen from a file inside `dir`.
    pub fn relative_to(&self, dir: AssetDir) -> String {
        match self.0.split_once('/') {
            Some((head, _)) if head == dir.as_str() => {
                self.0[head.len() + 1..].to_string()
            }
            _ => format!("../{}", self.0),
        }
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Make `name` safe to use as a single file name.
pub fn asset_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c => c,
        })
        .collect()
}

/// Persistence collaborator used by every stage of a combine run.
///
/// Implementations remember which paths were written during the run so that
/// [`AssetStore::clear_directory`] can drop stale leftovers from earlier runs.
pub trait AssetStore {
    /// Make sure `dir` exists.
    fn prepare_directory(&mut self, dir: AssetDir) -> Result<()>;

    /// Persist a newly generated texture, replacing any previous file.
    fn create_texture(&mut self, image: &RgbaImage, path: &AssetPath) -> Result<AssetHandle>;

    /// Persist a copy of a source texture unless `path` already holds one.
    fn duplicate_texture_if_absent(
        &mut self,
        image: &RgbaImage,
        path: &AssetPath,
    ) -> Result<AssetHandle>;

    fn create_material(
        &mut self,
        material: &CombinedMaterial,
        path: &AssetPath,
    ) -> Result<AssetHandle>;

    fn create_mesh(&mut self, mesh: &Mesh, path: &AssetPath) -> Result<AssetHandle>;

    /// Persist a copy of an unmodified source mesh unless `path` already holds one.
    fn duplicate_mesh_if_absent(&mut self, mesh: &Mesh, path: &AssetPath) -> Result<AssetHandle>;

    /// Copy an opaque external asset unless `path` already holds one.
    fn duplicate_asset_if_absent(&mut self, source: &Path, path: &AssetPath)
    -> Result<AssetHandle>;

    fn create_object(&mut self, object: &CombinedObject, path: &AssetPath)
    -> Result<AssetHandle>;

    /// Remove assets in `dir` that were not written during this run.
    /// Returns how many were removed.
    fn clear_directory(&mut self, dir: AssetDir) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_path_handle() {
        let path = AssetDir::Textures.join("Atlas.png");
        assert_eq!(path.dir(), AssetDir::Textures);
        assert_eq!(path.name(), "Atlas.png");
        assert_eq!(path.handle().as_str(), "Textures/Atlas.png");
        assert_eq!(path.relative(), Path::new("Textures").join("Atlas.png"));
    }

    #[test]
    fn names_are_sanitized() {
        let path = AssetDir::Materials.join("Material-Legacy/Diffuse.mtl");
        assert_eq!(path.name(), "Material-Legacy-Diffuse.mtl");
        assert_eq!(asset_name(r"a\b:c"), "a-b-c");
    }

    #[test]
    fn handle_relative_to_directory() {
        let handle = AssetDir::Textures.join("Atlas.png").handle();
        assert_eq!(handle.relative_to(AssetDir::Materials), "../Textures/Atlas.png");
        assert_eq!(handle.relative_to(AssetDir::Textures), "Atlas.png");
    }

    #[test]
    fn dir_display() {
        let names: Vec<String> = AssetDir::ALL.iter().map(|d| d.to_string()).collect();
        assert_eq!(names, ["Textures", "Materials", "Meshes", "Objects", "Misc"]);
    }
}
