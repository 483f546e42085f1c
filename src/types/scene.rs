use std::path::PathBuf;

use crate::error::{CombinerError, Result};

use super::material::{Material, MaterialId, Texture, TextureId};
use super::mesh::{Mesh, MeshId};

/// Stable handle of an animation rig asset referenced by scene objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RigId(pub usize);

/// A rig asset living outside the combiner; it is only ever duplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct Rig {
    pub name: String,
    pub source: PathBuf,
}

/// A mesh drawn with one material per submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    pub mesh: MeshId,
    /// `materials[i]` is used by submesh `i`.
    pub materials: Vec<MaterialId>,
}

/// One input model: the renderers and rig already extracted from its hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub renderers: Vec<MeshRenderer>,
    pub rig: Option<RigId>,
}

/// Arena holding every resource of one combine batch.
///
/// Resources are addressed by the integer ids handed out on insertion, so
/// two renderers sharing a mesh or material share the same id.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    textures: Vec<Texture>,
    materials: Vec<Material>,
    meshes: Vec<Mesh>,
    rigs: Vec<Rig>,
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_rig(&mut self, rig: Rig) -> RigId {
        self.rigs.push(rig);
        RigId(self.rigs.len() - 1)
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture> {
        self.textures
            .get(id.0)
            .ok_or_else(|| CombinerError::Scene(format!("unknown texture {}", id.0)))
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material> {
        self.materials
            .get(id.0)
            .ok_or_else(|| CombinerError::Scene(format!("unknown material {}", id.0)))
    }

    pub fn mesh(&self, id: MeshId) -> Result<&Mesh> {
        self.meshes
            .get(id.0)
            .ok_or_else(|| CombinerError::Scene(format!("unknown mesh {}", id.0)))
    }

    pub fn rig(&self, id: RigId) -> Result<&Rig> {
        self.rigs
            .get(id.0)
            .ok_or_else(|| CombinerError::Scene(format!("unknown rig {}", id.0)))
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn rigs(&self) -> &[Rig] {
        &self.rigs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn ids_are_sequential() {
        let mut scene = Scene::default();
        let t0 = scene.add_texture(Texture::new("a", RgbaImage::new(1, 1)));
        let t1 = scene.add_texture(Texture::new("b", RgbaImage::new(1, 1)));
        assert_eq!(t0, TextureId(0));
        assert_eq!(t1, TextureId(1));

        let m = scene.add_material(Material {
            main_texture: Some(t1),
            ..Default::default()
        });
        assert_eq!(scene.material(m).unwrap().main_texture, Some(t1));
        assert_eq!(scene.texture(t1).unwrap().name, "b");
    }

    #[test]
    fn unknown_ids_are_scene_errors() {
        let scene = Scene::default();
        assert!(matches!(
            scene.mesh(MeshId(0)),
            Err(CombinerError::Scene(_))
        ));
        assert!(scene.material(MaterialId(2)).is_err());
        assert!(scene.texture(TextureId(1)).is_err());
        assert!(scene.rig(RigId(0)).is_err());
    }

    #[test]
    fn objects_keep_insertion_order() {
        let mut scene = Scene::default();
        let mesh = scene.add_mesh(Mesh::default());
        for name in ["first", "second"] {
            scene.add_object(SceneObject {
                name: name.into(),
                renderers: vec![MeshRenderer {
                    mesh,
                    materials: vec![],
                }],
                rig: None,
            });
        }
        let names: Vec<_> = scene.objects().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }
}
