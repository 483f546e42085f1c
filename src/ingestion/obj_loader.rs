use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::{CombinerError, Result};
use crate::types::{
    Material, MaterialId, Mesh, MeshRenderer, Rig, Scene, SceneObject, Texture, TextureId,
};

/// Shader name given to every OBJ material; MTL has no notion of shaders.
pub const OBJ_SHADER: &str = "Standard";

/// Extension of a skeleton file picked up next to an OBJ as the object's rig.
pub const RIG_EXTENSION: &str = "bvh";

/// Loads OBJ files into a shared [`Scene`].
///
/// Materials are interned per (directory, name) and textures per path, so
/// OBJ files sharing an MTL library share material ids.
#[derive(Debug, Default)]
pub struct ObjLoader {
    materials: HashMap<(PathBuf, String), MaterialId>,
    textures: HashMap<PathBuf, TextureId>,
    default_material: Option<MaterialId>,
}

impl ObjLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` (+ MTL and diffuse textures) as one scene object whose
    /// models become the submeshes of a single mesh.
    pub fn load_object(&mut self, path: &Path, scene: &mut Scene) -> Result<()> {
        let (models, materials_result) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
            .map_err(|e| CombinerError::Input(format!("Failed to load OBJ {}: {e}", path.display())))?;

        debug!(model_count = models.len(), path = %path.display(), "Loaded OBJ models");

        let obj_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".into());

        let tobj_materials = match materials_result {
            Ok(mats) => mats,
            Err(e) => {
                warn!(path = %path.display(), "Failed to load MTL: {e}");
                Vec::new()
            }
        };
        let material_ids: Vec<MaterialId> = tobj_materials
            .iter()
            .map(|mat| self.intern_material(mat, obj_dir, scene))
            .collect();

        let mut parts = Vec::new();
        for model in models {
            if model.mesh.indices.is_empty() {
                debug!(model = %model.name, "Model has no faces, skipping");
                continue;
            }
            let material = match model.mesh.material_id.and_then(|i| material_ids.get(i)) {
                Some(&id) => id,
                None => self.default_material(scene),
            };
            parts.push((convert_mesh(model.mesh), material));
        }

        if parts.is_empty() {
            return Err(CombinerError::Input(format!(
                "{} contains no triangles",
                path.display()
            )));
        }

        let materials = parts.iter().map(|(_, material)| *material).collect();
        let mesh = merge_submeshes(&name, parts.into_iter().map(|(mesh, _)| mesh).collect());
        let mesh = scene.add_mesh(mesh);

        let rig_path = path.with_extension(RIG_EXTENSION);
        let rig = rig_path.is_file().then(|| {
            debug!(path = %rig_path.display(), "Found rig");
            scene.add_rig(Rig {
                name: name.clone(),
                source: rig_path,
            })
        });

        scene.add_object(SceneObject {
            name,
            renderers: vec![MeshRenderer { mesh, materials }],
            rig,
        });
        Ok(())
    }

    fn intern_material(&mut self, mat: &tobj::Material, obj_dir: &Path, scene: &mut Scene) -> MaterialId {
        let key = (obj_dir.to_path_buf(), mat.name.clone());
        if let Some(&id) = self.materials.get(&key) {
            return id;
        }

        let mut material = Material {
            name: mat.name.clone(),
            shader: OBJ_SHADER.into(),
            ..Default::default()
        };

        // Kd + d -> color
        if let Some(diffuse) = mat.diffuse {
            material.color = [
                diffuse[0],
                diffuse[1],
                diffuse[2],
                mat.dissolve.unwrap_or(1.0),
            ];
        }

        // map_Kd -> main texture
        if let Some(ref tex_name) = mat.diffuse_texture {
            let tex_path = obj_dir.join(tex_name);
            match self.intern_texture(&tex_path, scene) {
                Ok(id) => material.main_texture = Some(id),
                Err(e) => warn!(texture = %tex_name, material = %mat.name, "Failed to load texture: {e}"),
            }
        }

        let id = scene.add_material(material);
        self.materials.insert(key, id);
        id
    }

    fn intern_texture(&mut self, path: &Path, scene: &mut Scene) -> Result<TextureId> {
        if let Some(&id) = self.textures.get(path) {
            return Ok(id);
        }
        let image = load_texture(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "texture".into());
        let id = scene.add_texture(Texture::new(name, image));
        self.textures.insert(path.to_path_buf(), id);
        Ok(id)
    }

    fn default_material(&mut self, scene: &mut Scene) -> MaterialId {
        *self.default_material.get_or_insert_with(|| {
            scene.add_material(Material {
                name: "Default".into(),
                shader: OBJ_SHADER.into(),
                ..Default::default()
            })
        })
    }
}

/// Decode a texture file into RGBA8.
pub fn load_texture(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|e| {
        CombinerError::Input(format!("Failed to decode texture {}: {e}", path.display()))
    })?;

    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "Loaded texture"
    );

    Ok(img.to_rgba8())
}

/// Convert one `tobj::Mesh` into a single-submesh [`Mesh`].
fn convert_mesh(mesh: tobj::Mesh) -> Mesh {
    // UV V-flip: OBJ uses bottom-left origin, images are addressed from the top-left
    let uvs: Vec<f32> = mesh
        .texcoords
        .chunks_exact(2)
        .flat_map(|uv| [uv[0], 1.0 - uv[1]])
        .collect();

    // Vertex colors: expand RGB (3 components) to RGBA (4 components, alpha=1.0)
    let colors: Vec<f32> = mesh
        .vertex_color
        .chunks_exact(3)
        .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 1.0])
        .collect();

    Mesh {
        name: String::new(),
        positions: mesh.positions,
        normals: mesh.normals,
        uvs,
        colors,
        submeshes: vec![mesh.indices],
    }
}

/// Append single-submesh meshes into one mesh with one submesh each.
///
/// An attribute present on any part is padded for the parts lacking it.
fn merge_submeshes(name: &str, parts: Vec<Mesh>) -> Mesh {
    let with_normals = parts.iter().any(Mesh::has_normals);
    let with_uvs = parts.iter().any(Mesh::has_uvs);
    let with_colors = parts.iter().any(Mesh::has_colors);

    let mut merged = Mesh {
        name: name.to_string(),
        ..Default::default()
    };

    for part in parts {
        let base = merged.vertex_count() as u32;
        let count = part.vertex_count();

        merged.positions.extend_from_slice(&part.positions);
        if with_normals {
            pad_attribute(&mut merged.normals, &part.normals, count, &[0.0, 0.0, 1.0]);
        }
        if with_uvs {
            pad_attribute(&mut merged.uvs, &part.uvs, count, &[0.0, 0.0]);
        }
        if with_colors {
            pad_attribute(&mut merged.colors, &part.colors, count, &[1.0, 1.0, 1.0, 1.0]);
        }

        for indices in part.submeshes {
            merged
                .submeshes
                .push(indices.into_iter().map(|i| i + base).collect());
        }
    }
    merged
}

fn pad_attribute(dst: &mut Vec<f32>, src: &[f32], count: usize, fill: &[f32]) {
    let len = count * fill.len();
    if src.len() >= len {
        dst.extend_from_slice(&src[..len]);
    } else {
        dst.extend_from_slice(src);
        let missing = (len - src.len()) / fill.len();
        for _ in 0..missing {
            dst.extend_from_slice(fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tobj_triangle(texcoords: Vec<f32>, vertex_color: Vec<f32>) -> tobj::Mesh {
        tobj::Mesh {
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![],
            texcoords,
            indices: vec![0, 1, 2],
            vertex_color,
            face_arities: vec![],
            texcoord_indices: vec![],
            normal_indices: vec![],
            material_id: None,
        }
    }

    #[test]
    fn convert_mesh_uv_vflip() {
        let mesh = convert_mesh(tobj_triangle(vec![0.0, 0.0, 1.0, 0.3, 0.5, 1.0], vec![]));
        // Flipped UVs: (0.0,1.0), (1.0,0.7), (0.5,0.0)
        assert!((mesh.uvs[1] - 1.0).abs() < f32::EPSILON);
        assert!((mesh.uvs[3] - 0.7).abs() < 1e-6);
        assert!((mesh.uvs[5] - 0.0).abs() < f32::EPSILON);
        assert_eq!(mesh.submeshes, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn convert_mesh_vertex_color_rgb_to_rgba() {
        let mesh = convert_mesh(tobj_triangle(
            vec![],
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        ));
        assert_eq!(mesh.colors.len(), 12);
        assert_eq!(&mesh.colors[..4], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&mesh.colors[8..], &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn merge_offsets_indices_and_pads_attributes() {
        let with_uvs = convert_mesh(tobj_triangle(vec![0.0; 6], vec![]));
        let without = convert_mesh(tobj_triangle(vec![], vec![]));

        let merged = merge_submeshes("pair", vec![with_uvs, without]);

        assert_eq!(merged.name, "pair");
        assert_eq!(merged.vertex_count(), 6);
        assert_eq!(merged.uvs.len(), 12);
        assert!(merged.normals.is_empty());
        assert_eq!(merged.submeshes, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn pad_attribute_fills_missing_vertices() {
        let mut dst = Vec::new();
        pad_attribute(&mut dst, &[0.5, 0.5], 2, &[0.0, 0.0]);
        assert_eq!(dst, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn missing_obj_is_an_input_error() {
        let mut scene = Scene::default();
        let err = ObjLoader::new()
            .load_object(Path::new("/nonexistent/model.obj"), &mut scene)
            .unwrap_err();
        assert!(matches!(err, CombinerError::Input(_)));
    }
}
