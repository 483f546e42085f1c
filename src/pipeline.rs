use std::time::{Duration, Instant};

use tracing::info;

use crate::assets::{AssetDir, AssetHandle, AssetStore, FsAssetStore, MemoryAssetStore};
use crate::atlasing::{self, Atlas, MaterialTable};
use crate::config::{CombineConfig, PackingSettings};
use crate::error::Result;
use crate::ingestion::{self, IngestionStats};
use crate::meshes::{self, CombinedObject, MeshOptimizer};
use crate::report;
use crate::types::Scene;

/// Summary of a completed combine run.
#[derive(Debug)]
pub struct CombineResult {
    pub objects: usize,
    pub materials: usize,
    pub atlas_regions: usize,
    pub atlas_size: u32,
    pub meshes_optimized: usize,
    /// Stale files removed by `--clear-directory`.
    pub removed: usize,
    pub duration: Duration,
}

/// Everything produced by [`Combiner::combine`].
#[derive(Debug)]
pub struct CombineOutcome {
    pub atlas: Atlas,
    pub materials: MaterialTable,
    pub objects: Vec<CombinedObject>,
    /// Where each entry of `objects` was persisted.
    pub object_handles: Vec<AssetHandle>,
    pub meshes_optimized: usize,
}

impl CombineOutcome {
    pub fn report(&self) -> serde_json::Value {
        report::build_report(
            &self.atlas,
            &self.materials,
            &self.objects,
            self.meshes_optimized,
        )
    }

    fn summary(&self, removed: usize, duration: Duration) -> CombineResult {
        CombineResult {
            objects: self.objects.len(),
            materials: self.materials.len(),
            atlas_regions: self.atlas.metadata().len(),
            atlas_size: self.atlas.size(),
            meshes_optimized: self.meshes_optimized,
            removed,
            duration,
        }
    }
}

/// Combiner orchestrator -- drives ingestion, atlasing, material merging
/// and mesh replacement.
pub struct Combiner;

impl Combiner {
    /// Run the full combine over the configured inputs.
    pub fn run(config: &CombineConfig) -> Result<CombineResult> {
        let start = Instant::now();

        info!(inputs = config.inputs.len(), output = %config.output.display(), "Starting combine");

        info!("Stage 1/4: Ingestion");
        let ingestion = ingestion::ingest(&config.inputs)?;

        if config.dry_run {
            info!("--dry-run: combining in memory");
            let mut store = MemoryAssetStore::default();
            let outcome = Self::combine(&ingestion.scene, &config.packing, &mut store)?;
            print_dry_run_summary(&ingestion.stats, &outcome, &store);
            return Ok(outcome.summary(0, start.elapsed()));
        }

        info!("Stage 2/4: Atlas and materials");
        let mut store = FsAssetStore::new(&config.output);
        let outcome = Self::combine(&ingestion.scene, &config.packing, &mut store)?;
        print_combine_summary(&outcome);

        info!("Stage 3/4: Report");
        report::write_report(&outcome.report(), &config.output)?;

        let mut removed = 0;
        if config.clear_directory {
            info!("Stage 4/4: Clearing stale assets");
            for dir in AssetDir::ALL {
                removed += store.clear_directory(dir)?;
            }
        }

        let duration = start.elapsed();
        info!(
            objects = outcome.objects.len(),
            meshes_optimized = outcome.meshes_optimized,
            elapsed = ?duration,
            "Combine complete"
        );

        Ok(outcome.summary(removed, duration))
    }

    /// Combine an already loaded scene, persisting through `store`.
    ///
    /// Fails without persisting anything when the scene is malformed or the
    /// textures do not fit.
    pub fn combine(
        scene: &Scene,
        settings: &PackingSettings,
        store: &mut dyn AssetStore,
    ) -> Result<CombineOutcome> {
        meshes::validate_renderers(scene)?;

        for dir in AssetDir::ALL {
            store.prepare_directory(dir)?;
        }

        let atlas = atlasing::create_atlas(scene, settings, store)?;
        let materials = atlasing::create_materials(scene, &atlas, store)?;

        let mut optimizer = MeshOptimizer::new();
        let mut objects = Vec::with_capacity(scene.objects().len());
        let mut object_handles = Vec::with_capacity(scene.objects().len());
        for (index, object) in scene.objects().iter().enumerate() {
            let combined =
                optimizer.combine_object(object, scene, &materials, &atlas, settings, store)?;
            let path = AssetDir::Objects.join(format!("{}_{index}.json", object.name));
            let handle = store.create_object(&combined, &path)?;
            info!(
                object = %object.name,
                parts = combined.parts.len(),
                asset = %handle,
                "Object combined"
            );
            objects.push(combined);
            object_handles.push(handle);
        }

        Ok(CombineOutcome {
            atlas,
            materials,
            objects,
            object_handles,
            meshes_optimized: optimizer.meshes_optimized(),
        })
    }
}

/// Print atlas and material summary after a combine.
fn print_combine_summary(outcome: &CombineOutcome) {
    let atlas = &outcome.atlas;
    println!("=== Combine ===");
    println!(
        "  Atlas:            {}x{} ({} textures)",
        atlas.size(),
        atlas.size(),
        atlas.metadata().len()
    );
    for region in atlas.regions() {
        let rect = region.rect();
        let tiling = region.tiling();
        println!(
            "    #{:<3} ({:.4}, {:.4}) size ({:.4}, {:.4}) tiling {}x{}",
            region.index(),
            rect.min.x,
            rect.min.y,
            rect.size.x,
            rect.size.y,
            tiling.x,
            tiling.y
        );
    }
    println!("  Materials:        {}", outcome.materials.len());
    println!("  Objects:          {}", outcome.objects.len());
    println!("  Meshes optimized: {}", outcome.meshes_optimized);
}

/// Print dry-run summary with input stats and what would be written.
fn print_dry_run_summary(stats: &IngestionStats, outcome: &CombineOutcome, store: &MemoryAssetStore) {
    println!("=== Dry Run Summary ===");
    println!("  Objects:   {}", stats.objects);
    println!("  Submeshes: {}", stats.submeshes);
    println!("  Vertices:  {}", stats.total_vertices);
    println!("  Triangles: {}", stats.total_triangles);
    println!("  Materials: {}", stats.material_count);
    println!("  Textures:  {}", stats.texture_count);
    println!("  Rigs:      {}", stats.rig_count);
    println!();
    print_combine_summary(outcome);
    println!();
    println!("=== Would write ===");
    for dir in AssetDir::ALL {
        println!("  {:<10} {}", format!("{dir}/"), store.count_in(dir));
    }
}
