//! Wavefront OBJ export.
//!
//! OBJ is a simple, widely-supported text-based 3D format.
//! This exports positions with vertex colors, UVs and normals, and one
//! material per material group.

use crate::error::{MesherError, Result};
use crate::mesh_output::{MaterialGroup, MeshOutput};
use std::fmt::{self, Write};
use std::fs;
use std::path::{Path, PathBuf};

/// OBJ and companion MTL text for one mesh.
#[derive(Debug, Clone)]
pub struct ObjExport {
    pub name: String,
    pub obj: String,
    pub mtl: String,
}

impl ObjExport {
    /// Write `<name>.obj` and `<name>.mtl` into `dir`, returning the OBJ path.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let obj_path = dir.join(format!("{}.obj", self.name));
        fs::write(&obj_path, &self.obj)?;
        fs::write(dir.join(format!("{}.mtl", self.name)), &self.mtl)?;
        Ok(obj_path)
    }
}

/// Export a mesh to OBJ format.
pub fn export_obj(output: &MeshOutput, name: &str) -> Result<ObjExport> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(MesherError::Export(format!(
            "invalid OBJ object name: {:?}",
            name
        )));
    }

    // ~60 bytes per v/vt/vn line and ~40 per face
    let mut obj = String::with_capacity(256 + output.vertex_count() * 180 + output.triangle_count() * 40);
    let mut mtl = String::with_capacity(128 + output.groups.len() * 128);

    write_obj(&mut obj, output, name).map_err(|e| MesherError::Export(e.to_string()))?;
    write_mtl(&mut mtl, output, name).map_err(|e| MesherError::Export(e.to_string()))?;

    Ok(ObjExport {
        name: name.to_string(),
        obj,
        mtl,
    })
}

fn material_name(name: &str, group: &MaterialGroup) -> String {
    match group.material {
        Some(material) => format!("{}_material_{}", name, material),
        None => format!("{}_untextured", name),
    }
}

fn write_obj(obj: &mut String, output: &MeshOutput, name: &str) -> fmt::Result {
    writeln!(obj, "# Static Mesher OBJ Export")?;
    writeln!(obj, "# Vertices: {}", output.vertex_count())?;
    writeln!(obj, "# Triangles: {}", output.triangle_count())?;
    writeln!(obj, "# Strips: {}", output.strips.len())?;
    writeln!(obj)?;

    writeln!(obj, "mtllib {}.mtl", name)?;
    writeln!(obj)?;
    writeln!(obj, "o {}", name)?;
    writeln!(obj)?;

    for (position, color) in output.positions.iter().zip(&output.colors) {
        writeln!(
            obj,
            "v {} {} {} {} {} {}",
            position[0], position[1], position[2], color[0], color[1], color[2]
        )?;
    }
    writeln!(obj)?;

    for uv in &output.uvs {
        writeln!(obj, "vt {} {}", uv[0], uv[1])?;
    }
    writeln!(obj)?;

    for normal in &output.normals {
        writeln!(obj, "vn {} {} {}", normal[0], normal[1], normal[2])?;
    }

    for group in &output.groups {
        writeln!(obj)?;
        writeln!(obj, "usemtl {}", material_name(name, group))?;
        let indices = &output.indices[group.first_index..group.first_index + group.index_count];
        for triangle in indices.chunks_exact(3) {
            // OBJ indices are 1-based
            let [i0, i1, i2] = [triangle[0] + 1, triangle[1] + 1, triangle[2] + 1];
            writeln!(
                obj,
                "f {}/{}/{} {}/{}/{} {}/{}/{}",
                i0, i0, i0, i1, i1, i1, i2, i2, i2
            )?;
        }
    }

    Ok(())
}

fn write_mtl(mtl: &mut String, output: &MeshOutput, name: &str) -> fmt::Result {
    writeln!(mtl, "# Static Mesher Material")?;

    for group in &output.groups {
        writeln!(mtl)?;
        writeln!(mtl, "newmtl {}", material_name(name, group))?;
        writeln!(mtl, "Ka 1.0 1.0 1.0")?;
        writeln!(mtl, "Kd 1.0 1.0 1.0")?;
        writeln!(mtl, "Ks 0.0 0.0 0.0")?;
        writeln!(mtl, "Ns 10.0")?;
        writeln!(mtl, "d 1.0")?;
        writeln!(mtl, "illum 1")?;
        if let Some(material) = group.material {
            writeln!(mtl, "map_Kd texture_{}.png", material)?;
        }
    }

    Ok(())
}
