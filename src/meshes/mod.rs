pub mod optimizer;
pub mod uv_remap;

pub use optimizer::{CombinedObject, CombinedPart, MeshOptimizer, validate_renderers};
pub use uv_remap::{adjust_atlased_uvs, negative_tiling_offset, remap_uvs};
