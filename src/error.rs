use std::io;

/// All error types for the material combiner.
#[derive(thiserror::Error, Debug)]
pub enum CombinerError {
    #[error("Input error: {0}")]
    Input(String),
    #[error("Scene error: {0}")]
    Scene(String),
    #[error("Packing error: {0}")]
    Packing(String),
    #[error(
        "Packing capacity exceeded: {required_area} px² of textures do not fit a {max_size}x{max_size} atlas"
    )]
    PackingCapacityExceeded { required_area: u64, max_size: u32 },
    #[error("Missing material signature: {0}")]
    MissingMaterialSignature(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CombinerError>;
