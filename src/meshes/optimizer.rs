use serde::Serialize;
use tracing::debug;

use crate::assets::{AssetDir, AssetHandle, AssetStore};
use crate::atlasing::{Atlas, MaterialSignature, MaterialTable, SubMeshKey};
use crate::config::PackingSettings;
use crate::error::{CombinerError, Result};
use crate::types::{Mesh, MeshRenderer, Scene, SceneObject};

use super::uv_remap::adjust_atlased_uvs;

/// One drawable piece of a combined object: a mesh asset and the merged
/// materials for its submeshes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedPart {
    pub name: String,
    /// Index of the source renderer this part replaces.
    pub renderer: usize,
    /// Source submesh when the renderer was split, `None` when the whole mesh was kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submesh: Option<usize>,
    pub mesh: AssetHandle,
    pub materials: Vec<AssetHandle>,
}

/// Output descriptor of one input object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedObject {
    pub name: String,
    pub parts: Vec<CombinedPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig: Option<AssetHandle>,
}

/// Rewrites the meshes of input objects against an atlas and material table.
#[derive(Debug, Default)]
pub struct MeshOptimizer {
    meshes_optimized: usize,
}

impl MeshOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submeshes whose UVs were remapped into the atlas so far.
    pub fn meshes_optimized(&self) -> usize {
        self.meshes_optimized
    }

    pub fn reset_optimized_count(&mut self) {
        self.meshes_optimized = 0;
    }

    /// Replace every renderer of `object` by parts that reference merged
    /// materials and, where the atlas is used, split per-submesh meshes.
    pub fn replace_meshes(
        &mut self,
        object: &SceneObject,
        scene: &Scene,
        materials: &MaterialTable,
        atlas: &Atlas,
        settings: &PackingSettings,
        store: &mut dyn AssetStore,
    ) -> Result<Vec<CombinedPart>> {
        let mut parts = Vec::new();
        for (index, renderer) in object.renderers.iter().enumerate() {
            let mesh = check_renderer(object, index, renderer, scene)?;

            if atlas.metadata().uses_atlas(&SubMeshKey::whole(renderer.mesh)) {
                self.split_mesh(
                    object, index, renderer, mesh, scene, materials, atlas, settings, store,
                    &mut parts,
                )?;
            } else {
                parts.push(duplicate_original_mesh(
                    index, renderer, mesh, scene, materials, atlas, store,
                )?);
            }
        }
        Ok(parts)
    }

    /// Duplicate the rig referenced by `object` into `Misc/`.
    pub fn replace_rig(
        &self,
        object: &SceneObject,
        scene: &Scene,
        store: &mut dyn AssetStore,
    ) -> Result<Option<AssetHandle>> {
        let Some(rig_id) = object.rig else {
            return Ok(None);
        };
        let rig = scene.rig(rig_id)?;
        let name = match rig.source.extension() {
            Some(ext) => format!("{}_{}.{}", rig.name, rig_id.0, ext.to_string_lossy()),
            None => format!("{}_{}", rig.name, rig_id.0),
        };
        let handle = store.duplicate_asset_if_absent(&rig.source, &AssetDir::Misc.join(name))?;
        Ok(Some(handle))
    }

    /// Build the full output descriptor for `object`.
    pub fn combine_object(
        &mut self,
        object: &SceneObject,
        scene: &Scene,
        materials: &MaterialTable,
        atlas: &Atlas,
        settings: &PackingSettings,
        store: &mut dyn AssetStore,
    ) -> Result<CombinedObject> {
        let parts = self.replace_meshes(object, scene, materials, atlas, settings, store)?;
        let rig = self.replace_rig(object, scene, store)?;
        Ok(CombinedObject {
            name: object.name.clone(),
            parts,
            rig,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn split_mesh(
        &mut self,
        object: &SceneObject,
        renderer_index: usize,
        renderer: &MeshRenderer,
        mesh: &Mesh,
        scene: &Scene,
        materials: &MaterialTable,
        atlas: &Atlas,
        settings: &PackingSettings,
        store: &mut dyn AssetStore,
        parts: &mut Vec<CombinedPart>,
    ) -> Result<()> {
        let keep_renderer = mesh.submesh_count() == 1;

        for submesh in 0..mesh.submesh_count() {
            let material_id = renderer.materials[submesh];
            let mut piece = mesh.extract_submesh(submesh).ok_or_else(|| {
                CombinerError::Scene(format!(
                    "submesh {submesh} of mesh '{}' references a missing vertex",
                    mesh.name
                ))
            })?;

            let signature =
                MaterialSignature::for_submesh(scene, atlas, renderer.mesh, submesh, material_id)?;
            let material = materials.get(&signature)?;

            let atlased = atlas
                .metadata()
                .uses_atlas(&SubMeshKey::submesh(renderer.mesh, submesh));
            if atlased {
                if let Some(region) = atlas.region(material_id) {
                    adjust_atlased_uvs(&mut piece.uvs, &region, settings.uv_error);
                    self.meshes_optimized += 1;
                }
            }

            let name = if keep_renderer {
                mesh.name.clone()
            } else {
                format!("SubMesh_{submesh}")
            };
            piece.name = name.clone();

            let path = AssetDir::Meshes.join(format!(
                "Mesh_{}_{renderer_index}_{submesh}.obj",
                object.name
            ));
            let handle = store.create_mesh(&piece, &path)?;
            debug!(mesh = %handle, atlased, "Wrote submesh");

            parts.push(CombinedPart {
                name,
                renderer: renderer_index,
                submesh: (!keep_renderer).then_some(submesh),
                mesh: handle,
                materials: vec![material.handle.clone()],
            });
        }
        Ok(())
    }
}

/// Check that every renderer in `scene` references a known mesh and has a
/// material for each of its submeshes.
///
/// Runs before anything is persisted so a malformed scene leaves no output.
pub fn validate_renderers(scene: &Scene) -> Result<()> {
    for object in scene.objects() {
        for (index, renderer) in object.renderers.iter().enumerate() {
            check_renderer(object, index, renderer, scene)?;
        }
    }
    Ok(())
}

fn check_renderer<'s>(
    object: &SceneObject,
    index: usize,
    renderer: &MeshRenderer,
    scene: &'s Scene,
) -> Result<&'s Mesh> {
    let mesh = scene.mesh(renderer.mesh)?;
    if renderer.materials.len() < mesh.submesh_count() {
        return Err(CombinerError::Scene(format!(
            "renderer {index} of '{}' has {} materials for {} submeshes",
            object.name,
            renderer.materials.len(),
            mesh.submesh_count()
        )));
    }
    Ok(mesh)
}

fn duplicate_original_mesh(
    renderer_index: usize,
    renderer: &MeshRenderer,
    mesh: &Mesh,
    scene: &Scene,
    materials: &MaterialTable,
    atlas: &Atlas,
    store: &mut dyn AssetStore,
) -> Result<CombinedPart> {
    let path = AssetDir::Meshes.join(format!("{}_{}.obj", mesh.name, renderer.mesh.0));
    let handle = store.duplicate_mesh_if_absent(mesh, &path)?;

    let handles = renderer
        .materials
        .iter()
        .enumerate()
        .map(|(submesh, &material_id)| {
            let signature =
                MaterialSignature::for_submesh(scene, atlas, renderer.mesh, submesh, material_id)?;
            Ok(materials.get(&signature)?.handle.clone())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CombinedPart {
        name: mesh.name.clone(),
        renderer: renderer_index,
        submesh: None,
        mesh: handle,
        materials: handles,
    })
}
