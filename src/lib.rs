pub mod assets;
pub mod atlasing;
pub mod config;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod meshes;
pub mod pipeline;
pub mod report;
pub mod types;

pub use config::{CombineConfig, PackingSettings};
pub use error::{CombinerError, Result};
pub use pipeline::Combiner;
