//! Text and image encodings of combined assets.

use std::io::{self, Cursor, Write};

use image::{ImageFormat, RgbaImage};

use crate::assets::AssetDir;
use crate::atlasing::CombinedMaterial;
use crate::error::{CombinerError, Result};
use crate::types::Mesh;

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| CombinerError::Output(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Write `mesh` as Wavefront OBJ, one group per submesh.
///
/// V is flipped back to OBJ's bottom-left origin. Vertex colors use the
/// common `v x y z r g b` extension; alpha is dropped.
pub fn write_obj<W: Write>(mesh: &Mesh, out: &mut W) -> io::Result<()> {
    writeln!(out, "# material-combiner")?;
    writeln!(out, "o {}", mesh.name)?;

    let has_colors = mesh.colors.len() >= mesh.vertex_count() * 4;
    for (i, p) in mesh.positions.chunks_exact(3).enumerate() {
        if has_colors {
            let c = &mesh.colors[i * 4..i * 4 + 3];
            writeln!(out, "v {} {} {} {} {} {}", p[0], p[1], p[2], c[0], c[1], c[2])?;
        } else {
            writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
        }
    }
    for uv in mesh.uvs.chunks_exact(2) {
        writeln!(out, "vt {} {}", uv[0], 1.0 - uv[1])?;
    }
    for n in mesh.normals.chunks_exact(3) {
        writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
    }

    let has_uvs = mesh.has_uvs();
    let has_normals = mesh.has_normals();
    for (index, submesh) in mesh.submeshes.iter().enumerate() {
        writeln!(out, "g submesh_{index}")?;
        for tri in submesh.chunks_exact(3) {
            write!(out, "f")?;
            for &i in tri {
                let i = i + 1;
                match (has_uvs, has_normals) {
                    (true, true) => write!(out, " {i}/{i}/{i}")?,
                    (true, false) => write!(out, " {i}/{i}")?,
                    (false, true) => write!(out, " {i}//{i}")?,
                    (false, false) => write!(out, " {i}")?,
                }
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Write `material` as a single-entry MTL file living in `Materials/`.
pub fn write_mtl<W: Write>(material: &CombinedMaterial, out: &mut W) -> io::Result<()> {
    let [r, g, b, a] = material.color;
    writeln!(out, "# shader: {}", material.shader)?;
    writeln!(out, "newmtl {}", material.name)?;
    writeln!(out, "Kd {r} {g} {b}")?;
    writeln!(out, "d {a}")?;
    if let Some(texture) = &material.main_texture {
        writeln!(out, "map_Kd {}", texture.relative_to(AssetDir::Materials))?;
    }
    Ok(())
}

pub fn obj_bytes(mesh: &Mesh) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_obj(mesh, &mut buf)?;
    Ok(buf)
}

pub fn mtl_bytes(material: &CombinedMaterial) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_mtl(material, &mut buf)?;
    Ok(buf)
}
