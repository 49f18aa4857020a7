//! Mesh payload loaded from Wavefront OBJ text
//!
//! Only geometry that matters to the core is kept: positions, triangle
//! indices and the bounding box. Normals, texture coordinates and materials
//! are skipped.

use crate::foundation::math::Vec3;
use crate::resources::{ResourceError, ResourceFactory, ResourceParams, ResourcePayload};
use crate::scene::AABB;
use std::any::Any;
use std::io::{BufRead, BufReader, Read};

/// Triangle mesh geometry
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
    bounds: Option<AABB>,
}

impl MeshData {
    /// Type name used by the mesh manager
    pub const RESOURCE_TYPE: &'static str = "Mesh";

    /// Vertex positions
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Triangle list indices into [`positions`](Self::positions)
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounding box of all positions (`None` when unloaded)
    pub fn bounds(&self) -> Option<AABB> {
        self.bounds
    }

    fn parse_float(part: Option<&str>, what: &str, line_no: usize) -> Result<f32, ResourceError> {
        part.ok_or_else(|| ResourceError::InvalidData(format!("line {}: missing {}", line_no, what)))?
            .parse()
            .map_err(|_| ResourceError::InvalidData(format!("line {}: invalid {}", line_no, what)))
    }

    /// Resolve an OBJ position reference (1-based, negative = relative)
    fn parse_index(token: &str, vertex_count: usize, line_no: usize) -> Result<u32, ResourceError> {
        let position = token.split('/').next().unwrap_or_default();
        let raw: i64 = position
            .parse()
            .map_err(|_| ResourceError::InvalidData(format!("line {}: invalid face index '{}'", line_no, token)))?;

        let count = vertex_count as i64;
        let resolved = if raw < 0 { count + raw } else { raw - 1 };
        if resolved < 0 || resolved >= count {
            return Err(ResourceError::InvalidData(format!(
                "line {}: face index {} out of range ({} vertices)",
                line_no, raw, vertex_count
            )));
        }
        u32::try_from(resolved)
            .map_err(|_| ResourceError::InvalidData(format!("line {}: face index {} too large", line_no, raw)))
    }
}

impl ResourcePayload for MeshData {
    fn load_from_stream(&mut self, stream: &mut dyn Read) -> Result<(), ResourceError> {
        let reader = BufReader::new(stream);
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();

        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_no = line_index + 1;

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let x = Self::parse_float(parts.next(), "vertex x", line_no)?;
                    let y = Self::parse_float(parts.next(), "vertex y", line_no)?;
                    let z = Self::parse_float(parts.next(), "vertex z", line_no)?;
                    positions.push([x, y, z]);
                }
                Some("f") => {
                    let face = parts
                        .map(|token| Self::parse_index(token, positions.len(), line_no))
                        .collect::<Result<Vec<u32>, _>>()?;
                    if face.len() < 3 {
                        return Err(ResourceError::InvalidData(format!(
                            "line {}: face needs at least 3 vertices",
                            line_no
                        )));
                    }

                    // Fan triangulation
                    for i in 1..face.len() - 1 {
                        indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                    }
                }
                _ => {
                    // Normals, texture coordinates, groups and materials are not needed
                }
            }
        }

        if positions.is_empty() {
            return Err(ResourceError::InvalidData("no vertices found in mesh".to_string()));
        }

        self.bounds = positions
            .iter()
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .fold(None, |acc: Option<AABB>, p| {
                let point = AABB::new(p, p);
                Some(acc.map_or(point, |b| b.merged(&point)))
            });
        self.positions = positions;
        self.indices = indices;
        Ok(())
    }

    fn unload(&mut self) {
        self.positions = Vec::new();
        self.indices = Vec::new();
        self.bounds = None;
    }

    fn size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<[f32; 3]>() + self.indices.len() * std::mem::size_of::<u32>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Factory for [`MeshData`] payloads
#[derive(Debug, Default)]
pub struct MeshFactory;

impl ResourceFactory for MeshFactory {
    fn create(&self, _params: &ResourceParams<'_>) -> Result<Box<dyn ResourcePayload>, ResourceError> {
        Ok(Box::new(MeshData::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "# unit quad\nv 0 0 0\nv 2 0 0\nv 2 1 0\nv 0 1 -3\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1 4/4/1\n";

    #[test]
    fn test_quad_is_fan_triangulated() {
        let mut mesh = MeshData::default();
        mesh.load_from_stream(&mut QUAD.as_bytes()).unwrap();

        assert_eq!(mesh.positions().len(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.size(), 4 * 12 + 6 * 4);

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let mut mesh = MeshData::default();
        mesh.load_from_stream(&mut "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n".as_bytes()).unwrap();
        assert_eq!(mesh.indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_invalid_content_is_rejected() {
        let mut mesh = MeshData::default();
        assert!(matches!(
            mesh.load_from_stream(&mut "v 0 0 0\nf 1 2 3\n".as_bytes()),
            Err(ResourceError::InvalidData(_))
        ));
        assert!(matches!(
            mesh.load_from_stream(&mut "# empty\n".as_bytes()),
            Err(ResourceError::InvalidData(_))
        ));
    }

    #[test]
    fn test_unload_releases_geometry() {
        let mut mesh = MeshData::default();
        mesh.load_from_stream(&mut QUAD.as_bytes()).unwrap();
        mesh.unload();

        assert_eq!(mesh.size(), 0);
        assert!(mesh.bounds().is_none());
    }
}
