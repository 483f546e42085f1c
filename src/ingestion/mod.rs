pub mod obj_loader;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CombinerError, Result};
use crate::types::Scene;

pub use obj_loader::ObjLoader;

/// Result of the ingestion stage.
#[derive(Debug)]
pub struct IngestionResult {
    pub scene: Scene,
    pub stats: IngestionStats,
}

/// Statistics about the ingested data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStats {
    pub objects: usize,
    pub meshes: usize,
    pub submeshes: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
    pub material_count: usize,
    pub texture_count: usize,
    pub rig_count: usize,
}

/// Reject anything that is not an existing `.obj` file.
pub fn validate_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CombinerError::Input(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if ext != "obj" {
        return Err(CombinerError::Input(format!(
            "Unsupported file format: .{ext}"
        )));
    }
    Ok(())
}

/// Run the full ingestion stage: every input becomes one scene object.
pub fn ingest(inputs: &[PathBuf]) -> Result<IngestionResult> {
    if inputs.is_empty() {
        return Err(CombinerError::Input("No input models given".into()));
    }

    let mut scene = Scene::default();
    let mut loader = ObjLoader::new();
    for input in inputs {
        validate_input(input)?;
        info!(path = %input.display(), "Loading model");
        loader.load_object(input, &mut scene)?;
    }

    let stats = compute_stats(&scene);
    debug!(
        objects = stats.objects,
        vertices = stats.total_vertices,
        triangles = stats.total_triangles,
        materials = stats.material_count,
        textures = stats.texture_count,
        "Ingestion stats"
    );

    Ok(IngestionResult { scene, stats })
}

/// Compute summary statistics of a loaded scene.
pub fn compute_stats(scene: &Scene) -> IngestionStats {
    IngestionStats {
        objects: scene.objects().len(),
        meshes: scene.meshes().len(),
        submeshes: scene.meshes().iter().map(|m| m.submesh_count()).sum(),
        total_vertices: scene.meshes().iter().map(|m| m.vertex_count()).sum(),
        total_triangles: scene.meshes().iter().map(|m| m.triangle_count()).sum(),
        material_count: scene.materials().len(),
        texture_count: scene.textures().len(),
        rig_count: scene.rigs().len(),
    }
}
