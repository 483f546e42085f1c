use std::sync::Arc;

use image::{RgbaImage, imageops};
use tracing::{debug, info};

use crate::assets::{AssetDir, AssetStore};
use crate::config::PackingSettings;
use crate::error::Result;
use crate::types::{Mesh, MeshRenderer, Scene};

use super::atlas::{Atlas, AtlasMetadataBuilder, UvRect};
use super::rect_packer;
use super::tiling::{can_optimize_submeshes, can_optimize_tiling, compute_tiling};

pub const ATLAS_FILE_NAME: &str = "Atlas.png";

/// Build the shared atlas for every eligible textured submesh in `scene`.
///
/// Analysis visits objects, renderers and submeshes in order, so identical
/// input produces an identical layout. The packed texture is persisted as
/// `Textures/Atlas.png`.
pub fn create_atlas(
    scene: &Scene,
    settings: &PackingSettings,
    store: &mut dyn AssetStore,
) -> Result<Atlas> {
    let mut builder = AtlasMetadataBuilder::default();
    analyze_original_textures(scene, settings, &mut builder)?;
    builder.expand_sub_textures();
    pack_tiled_textures(builder, settings, store)
}

fn analyze_original_textures(
    scene: &Scene,
    settings: &PackingSettings,
    builder: &mut AtlasMetadataBuilder,
) -> Result<()> {
    for object in scene.objects() {
        for renderer in &object.renderers {
            let mesh = scene.mesh(renderer.mesh)?;
            if !can_optimize_submeshes(mesh, settings) {
                debug!(
                    object = %object.name,
                    mesh = %mesh.name,
                    submeshes = mesh.submesh_count(),
                    vertices = mesh.vertex_count(),
                    "Mesh too large to split, skipping atlas"
                );
                continue;
            }
            analyze_mesh_textures(scene, renderer, mesh, settings, builder)?;
        }
    }
    Ok(())
}

fn analyze_mesh_textures(
    scene: &Scene,
    renderer: &MeshRenderer,
    mesh: &Mesh,
    settings: &PackingSettings,
    builder: &mut AtlasMetadataBuilder,
) -> Result<()> {
    for (submesh, &material_id) in renderer.materials.iter().enumerate() {
        let material = scene.material(material_id)?;
        let Some(texture_id) = material.main_texture else {
            continue;
        };
        let texture = scene.texture(texture_id)?;

        let indices = match mesh.submesh(submesh) {
            Some(indices) if !indices.is_empty() => indices,
            _ => {
                debug!(mesh = %mesh.name, submesh, "Submesh has no triangles, skipping");
                continue;
            }
        };

        let tiling = compute_tiling(&mesh.uvs, indices, settings.uv_error);
        if !can_optimize_tiling(&texture.image, tiling, settings) {
            debug!(
                mesh = %mesh.name,
                submesh,
                texture = %texture.name,
                tiling_x = tiling.x,
                tiling_y = tiling.y,
                "Tiled texture too large for atlas"
            );
            continue;
        }

        builder.mark_atlased(renderer.mesh, submesh);
        builder.register(material_id, &texture.image, tiling);
    }
    Ok(())
}

fn pack_tiled_textures(
    builder: AtlasMetadataBuilder,
    settings: &PackingSettings,
    store: &mut dyn AssetStore,
) -> Result<Atlas> {
    let sizes: Vec<(u32, u32)> = builder
        .sub_textures()
        .iter()
        .map(|t| t.dimensions())
        .collect();
    let layout = rect_packer::pack(&sizes, settings.max_atlas_size)?;

    let mut image = RgbaImage::new(layout.size, layout.size);
    for (texture, rect) in builder.sub_textures().iter().zip(&layout.rects) {
        let texture: &RgbaImage = texture;
        imageops::replace(&mut image, texture, rect.x as i64, rect.y as i64);
    }

    let rects = layout
        .rects
        .iter()
        .map(|&rect| UvRect::from_pixels(rect, layout.size))
        .collect();
    let metadata = builder.freeze(rects)?;

    let handle = store.create_texture(&image, &AssetDir::Textures.join(ATLAS_FILE_NAME))?;
    info!(
        atlas = %handle,
        size = layout.size,
        textures = metadata.len(),
        "Atlas packed"
    );

    Ok(Atlas::new(Arc::new(image), handle, metadata))
}
