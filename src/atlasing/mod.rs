pub mod atlas;
pub mod materials;
pub mod packer;
pub mod rect_packer;
pub mod tile_expander;
pub mod tiling;

pub use atlas::{Atlas, AtlasMetadata, AtlasMetadataBuilder, AtlasRegion, SubMeshKey, UvRect};
pub use materials::{
    CombinedMaterial, MaterialEntry, MaterialSignature, MaterialTable, TextureRef,
    create_materials,
};
pub use packer::create_atlas;
pub use tiling::TilingFactor;
