use std::path::PathBuf;

use clap::Parser;

/// Atlas packing parameters.
///
/// Immutable for the duration of one combine run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackingSettings {
    /// Side length of the square atlas, in pixels.
    pub max_atlas_size: u32,
    /// Meshes with several submeshes are only atlased while
    /// `submesh_count * vertex_count` stays below this.
    pub max_splitted_mesh_vertices: usize,
    /// Largest side, in pixels, a tiled texture may grow to and still be atlased.
    pub max_tiled_chunk_size: u32,
    /// Tolerance for UV boundary comparisons.
    pub uv_error: f32,
}

impl Default for PackingSettings {
    fn default() -> Self {
        Self {
            max_atlas_size: 2048,
            max_splitted_mesh_vertices: 1000,
            max_tiled_chunk_size: 512,
            uv_error: 0.01,
        }
    }
}

/// Fully resolved combiner configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct CombineConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub clear_directory: bool,
    pub packing: PackingSettings,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from("Generated"),
            clear_directory: false,
            packing: PackingSettings::default(),
            dry_run: false,
            verbose: false,
        }
    }
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "material-combiner",
    about = "Merge model textures into a shared atlas and consolidate materials",
    version
)]
pub struct CliArgs {
    /// Input models (OBJ with MTL); each file becomes one object
    #[arg(short = 'i', long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short = 'o', long, default_value = "Generated")]
    pub output: PathBuf,

    /// Remove files in the output directories not written by this run
    #[arg(long)]
    pub clear_directory: bool,

    /// Atlas side length in pixels
    #[arg(long, default_value_t = 2048)]
    pub max_atlas_size: u32,

    /// Largest side of a tiled texture that may still be atlased
    #[arg(long, default_value_t = 512)]
    pub max_tiled_chunk_size: u32,

    /// Submesh-count times vertex-count limit for multi-submesh meshes
    #[arg(long, default_value_t = 1000)]
    pub max_splitted_mesh_vertices: usize,

    /// UV comparison tolerance
    #[arg(long, default_value_t = 0.01)]
    pub uv_error: f32,

    /// Analyze and pack in memory without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl From<CliArgs> for CombineConfig {
    fn from(args: CliArgs) -> Self {
        CombineConfig {
            inputs: args.inputs,
            output: args.output,
            clear_directory: args.clear_directory,
            packing: PackingSettings {
                max_atlas_size: args.max_atlas_size,
                max_splitted_mesh_vertices: args.max_splitted_mesh_vertices,
                max_tiled_chunk_size: args.max_tiled_chunk_size,
                uv_error: args.uv_error,
            },
            dry_run: args.dry_run,
            verbose: args.verbose,
        }
    }
}
