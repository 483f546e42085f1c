pub mod material;
pub mod mesh;
pub mod scene;

pub use material::{Material, MaterialId, Texture, TextureId};
pub use mesh::{Mesh, MeshId};
pub use scene::{MeshRenderer, Rig, RigId, Scene, SceneObject};
