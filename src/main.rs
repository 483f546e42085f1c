use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use material_combiner::config::{CliArgs, CombineConfig};
use material_combiner::pipeline::Combiner;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("material_combiner=debug")
    } else {
        EnvFilter::new("material_combiner=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: CombineConfig = args.into();

    match Combiner::run(&config) {
        Ok(result) => {
            println!(
                "Done: {} objects, {} materials, {} atlas regions ({}x{}), {} meshes optimized in {:.2}s",
                result.objects,
                result.materials,
                result.atlas_regions,
                result.atlas_size,
                result.atlas_size,
                result.meshes_optimized,
                result.duration.as_secs_f64()
            );
            if result.removed > 0 {
                println!("Removed {} stale assets", result.removed);
            }
            Ok(())
        }
        Err(e) => {
            error!(%e, "Combine failed");
            Err(anyhow::anyhow!(e)).context("material-combiner failed")
        }
    }
}
