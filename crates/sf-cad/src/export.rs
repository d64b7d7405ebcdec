//! STL export

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::kernel::TessellatedMesh;

/// STL-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Write error: {0}")]
    Write(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Nothing to export: the mesh is empty")]
    EmptyMesh,
}

/// Write a mesh as binary STL
pub fn save_stl(mesh: &TessellatedMesh, path: impl AsRef<Path>) -> Result<(), ExportError> {
    if mesh.is_empty() {
        return Err(ExportError::EmptyMesh);
    }

    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|[v0, v1, v2]| {
            let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
            stl_io::Triangle {
                normal: stl_io::Normal::new(normal.to_array()),
                vertices: [
                    stl_io::Vertex::new(v0.to_array()),
                    stl_io::Vertex::new(v1.to_array()),
                    stl_io::Vertex::new(v2.to_array()),
                ],
            }
        })
        .collect();

    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ExportError::Io(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| ExportError::Write(e.to_string()))?;

    tracing::info!("Wrote {} triangles to {}", triangles.len(), path.display());
    Ok(())
}

/// Read an STL file back into an indexed mesh
pub fn load_stl(path: impl AsRef<Path>) -> Result<TessellatedMesh, ExportError> {
    let file = File::open(path.as_ref()).map_err(|e| ExportError::Io(e.to_string()))?;
    let mut reader = BufReader::new(file);
    let stl = stl_io::read_stl(&mut reader).map_err(|e| ExportError::Parse(e.to_string()))?;

    let vertices: Vec<[f32; 3]> = stl.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect();
    let mut normals = vec![[0.0; 3]; vertices.len()];
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);
    for face in &stl.faces {
        for &i in &face.vertices {
            normals[i] = [face.normal[0], face.normal[1], face.normal[2]];
            indices.push(i as u32);
        }
    }

    Ok(TessellatedMesh {
        vertices,
        normals,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{CadKernel, LayeredKernel};
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn test_save_and_reload_box() {
        let kernel = LayeredKernel::new();
        let solid = kernel
            .create_box(Vec3::new(0.0, 0.0, 1.0), Vec3::new(4.0, 2.0, 2.0))
            .unwrap();
        let mesh = kernel.tessellate(&solid, 0.0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box.stl");
        save_stl(&mesh, &path).unwrap();

        let loaded = load_stl(&path).unwrap();
        assert_eq!(loaded.triangle_count(), mesh.triangle_count());
        assert_relative_eq!(loaded.volume(), 16.0, epsilon = 1e-4);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_stl(&TessellatedMesh::new(), dir.path().join("empty.stl"));
        assert!(matches!(result, Err(ExportError::EmptyMesh)));
    }
}
