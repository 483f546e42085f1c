use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::assets::{AssetDir, AssetHandle, AssetStore};
use crate::error::{CombinerError, Result};
use crate::types::{Material, MaterialId, MeshId, Scene, TextureId};

use super::atlas::{Atlas, SubMeshKey};

/// Texture a merged material samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRef {
    Source(TextureId),
    Atlas,
}

/// Deduplication key of a merged material.
///
/// Colors are compared by bit pattern so the key can be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialSignature {
    pub shader: String,
    color: [u32; 4],
    pub main_texture: Option<TextureRef>,
}

impl MaterialSignature {
    pub fn new(shader: impl Into<String>, color: [f32; 4], main_texture: Option<TextureRef>) -> Self {
        Self {
            shader: shader.into(),
            color: color.map(f32::to_bits),
            main_texture,
        }
    }

    /// Signature of `material` as drawn by a submesh that does (or does not)
    /// sample the atlas.
    pub fn effective(material: &Material, atlased: bool) -> Self {
        let main_texture = material.main_texture.map(|id| {
            if atlased {
                TextureRef::Atlas
            } else {
                TextureRef::Source(id)
            }
        });
        Self::new(material.shader.clone(), material.color, main_texture)
    }

    /// Signature used for submesh `submesh` of `mesh` drawn with `material`.
    pub fn for_submesh(
        scene: &Scene,
        atlas: &Atlas,
        mesh: MeshId,
        submesh: usize,
        material: MaterialId,
    ) -> Result<Self> {
        let atlased = atlas
            .metadata()
            .uses_atlas(&SubMeshKey::submesh(mesh, submesh));
        Ok(Self::effective(scene.material(material)?, atlased))
    }

    pub fn color(&self) -> [f32; 4] {
        self.color.map(f32::from_bits)
    }
}

impl fmt::Display for MaterialSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.color();
        write!(f, "{} ({r}, {g}, {b}, {a}) ", self.shader)?;
        match self.main_texture {
            None => f.write_str("untextured"),
            Some(TextureRef::Atlas) => f.write_str("atlas"),
            Some(TextureRef::Source(id)) => write!(f, "texture #{}", id.0),
        }
    }
}

/// A merged output material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedMaterial {
    pub name: String,
    pub shader: String,
    pub color: [f32; 4],
    pub main_texture: Option<AssetHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    pub handle: AssetHandle,
    pub material: CombinedMaterial,
}

/// Merged materials in creation order, looked up by signature.
#[derive(Debug, Default)]
pub struct MaterialTable {
    entries: Vec<MaterialEntry>,
    by_signature: HashMap<MaterialSignature, usize>,
}

impl MaterialTable {
    pub fn get(&self, signature: &MaterialSignature) -> Result<&MaterialEntry> {
        self.index_of(signature)
            .map(|index| &self.entries[index])
            .ok_or_else(|| CombinerError::MissingMaterialSignature(signature.to_string()))
    }

    pub fn index_of(&self, signature: &MaterialSignature) -> Option<usize> {
        self.by_signature.get(signature).copied()
    }

    pub fn contains(&self, signature: &MaterialSignature) -> bool {
        self.by_signature.contains_key(signature)
    }

    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, signature: MaterialSignature, entry: MaterialEntry) -> usize {
        self.entries.push(entry);
        let index = self.entries.len() - 1;
        self.by_signature.insert(signature, index);
        index
    }
}

/// Create one merged material per distinct signature used by the scene.
pub fn create_materials(
    scene: &Scene,
    atlas: &Atlas,
    store: &mut dyn AssetStore,
) -> Result<MaterialTable> {
    let mut table = MaterialTable::default();
    let mut used_names = HashSet::new();

    for object in scene.objects() {
        for renderer in &object.renderers {
            for (submesh, &material_id) in renderer.materials.iter().enumerate() {
                let signature =
                    MaterialSignature::for_submesh(scene, atlas, renderer.mesh, submesh, material_id)?;
                if table.contains(&signature) {
                    continue;
                }

                let name = unique_name(
                    material_name(scene, &signature)?,
                    table.len(),
                    &mut used_names,
                );

                let main_texture = match signature.main_texture {
                    None => None,
                    Some(TextureRef::Atlas) => Some(atlas.handle().clone()),
                    Some(TextureRef::Source(id)) => {
                        let texture = scene.texture(id)?;
                        let path = AssetDir::Textures.join(format!("{}_{}.png", texture.name, id.0));
                        Some(store.duplicate_texture_if_absent(&texture.image, &path)?)
                    }
                };

                let material = CombinedMaterial {
                    name: name.clone(),
                    shader: signature.shader.clone(),
                    color: signature.color(),
                    main_texture,
                };
                let handle =
                    store.create_material(&material, &AssetDir::Materials.join(format!("{name}.mtl")))?;
                debug!(material = %handle, signature = %signature, "Created merged material");

                table.insert(signature, MaterialEntry { handle, material });
            }
        }
    }

    info!(materials = table.len(), "Materials merged");
    Ok(table)
}

/// Claim `base`, or the first free `base-<n>` counting up from `start`.
fn unique_name(base: String, start: usize, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = start;
    loop {
        let candidate = format!("{base}-{suffix}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn material_name(scene: &Scene, signature: &MaterialSignature) -> Result<String> {
    let texture = match signature.main_texture {
        None => "empty".to_string(),
        Some(TextureRef::Atlas) => "Atlas".to_string(),
        Some(TextureRef::Source(id)) => format!("{}-{}", scene.texture(id)?.name, id.0),
    };
    Ok(format!(
        "Material-{}-{texture}",
        signature.shader.replace('/', "-")
    ))
}
