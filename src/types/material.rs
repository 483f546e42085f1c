use std::sync::Arc;

use image::RgbaImage;

/// Stable handle of a texture interned in a [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// Stable handle of a material interned in a [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub usize);

/// Decoded texture. Identity is the [`TextureId`] it was interned under.
#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub image: Arc<RgbaImage>,
}

impl Texture {
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Source material as supplied by the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Shader identity.
    pub shader: String,
    /// Base color factor [r, g, b, a].
    pub color: [f32; 4],
    pub main_texture: Option<TextureId>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            shader: "Standard".into(),
            color: [1.0, 1.0, 1.0, 1.0],
            main_texture: None,
        }
    }
}
