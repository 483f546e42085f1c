use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::atlasing::{Atlas, MaterialTable};
use crate::error::{CombinerError, Result};
use crate::meshes::CombinedObject;

pub const REPORT_FILE_NAME: &str = "combine_report.json";

/// Build the `combine_report.json` manifest of one combine run.
pub fn build_report(
    atlas: &Atlas,
    materials: &MaterialTable,
    objects: &[CombinedObject],
    meshes_optimized: usize,
) -> serde_json::Value {
    let size = atlas.size() as f32;
    let regions: Vec<serde_json::Value> = atlas
        .regions()
        .map(|region| {
            let rect = region.rect();
            let tiling = region.tiling();
            json!({
                "index": region.index(),
                "pixels": {
                    "x": (rect.min.x * size).round() as u32,
                    "y": (rect.min.y * size).round() as u32,
                    "width": (rect.size.x * size).round() as u32,
                    "height": (rect.size.y * size).round() as u32,
                },
                "uv": {
                    "min": rect.min.to_array(),
                    "size": rect.size.to_array(),
                },
                "tiling": [tiling.x, tiling.y],
            })
        })
        .collect();

    let materials: Vec<serde_json::Value> = materials
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "asset": entry.handle,
                "name": entry.material.name,
                "shader": entry.material.shader,
                "color": entry.material.color,
                "mainTexture": entry.material.main_texture,
            })
        })
        .collect();

    json!({
        "generator": concat!("material-combiner ", env!("CARGO_PKG_VERSION")),
        "atlas": {
            "asset": atlas.handle(),
            "size": atlas.size(),
            "regions": regions,
        },
        "materials": materials,
        "objects": objects,
        "meshesOptimized": meshes_optimized,
    })
}

/// Write `report` to `combine_report.json` in `out_dir`.
pub fn write_report(report: &serde_json::Value, out_dir: &Path) -> Result<PathBuf> {
    let path = out_dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CombinerError::Output(format!("Failed to serialize report: {e}")))?;
    fs::write(&path, json)
        .map_err(|e| CombinerError::Output(format!("Failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), "Wrote combine report");
    Ok(path)
}
