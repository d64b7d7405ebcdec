//! Tessellation of layered solids
//!
//! Side walls are stitched between consecutive cross-sections and caps are
//! triangulated with earcut. Triangles are flat shaded, so every triangle
//! carries its own three vertices.

use glam::{Vec2, Vec3};

use super::solid::SolidData;
use super::{CadError, CadResult, Frame, TessellatedMesh};
use crate::config::KernelConfig;

/// Triangles smaller than this (twice the area, squared) are dropped
const DEGENERATE_AREA_SQ: f32 = 1e-12;

struct MeshBuilder {
    frame: Frame,
    mesh: TessellatedMesh,
}

impl MeshBuilder {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            mesh: TessellatedMesh::new(),
        }
    }

    /// Add a triangle given in local coordinates, counter-clockwise seen from outside
    fn triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let [a, b, c] = [a, b, c].map(|p| self.frame.to_world(p.truncate(), p.z));
        let normal = (b - a).cross(c - a);
        if normal.length_squared() <= DEGENERATE_AREA_SQ {
            return;
        }
        let normal = normal.normalize().to_array();
        let base = self.mesh.vertices.len() as u32;
        for p in [a, b, c] {
            self.mesh.vertices.push(p.to_array());
            self.mesh.normals.push(normal);
        }
        self.mesh.indices.extend([base, base + 1, base + 2]);
    }

    fn finish(self) -> TessellatedMesh {
        self.mesh
    }
}

/// Triangulate a polygon (outer ring first, then holes)
fn triangulate(rings: &[Vec<Vec2>]) -> CadResult<Vec<[Vec2; 3]>> {
    let mut coords: Vec<f64> = Vec::new();
    let mut holes = Vec::with_capacity(rings.len().saturating_sub(1));
    let mut points: Vec<Vec2> = Vec::new();

    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            holes.push(points.len());
        }
        for p in ring {
            coords.push(p.x as f64);
            coords.push(p.y as f64);
            points.push(*p);
        }
    }

    let indices = earcutr::earcut(&coords, &holes, 2)
        .map_err(|e| CadError::TessellationFailed(format!("cap triangulation: {:?}", e)))?;

    Ok(indices
        .chunks_exact(3)
        .map(|t| [points[t[0]], points[t[1]], points[t[2]]])
        .collect())
}

/// Tessellate a solid into an outward-facing triangle mesh
pub(crate) fn tessellate(data: &SolidData, config: &KernelConfig) -> CadResult<TessellatedMesh> {
    let mut builder = MeshBuilder::new(data.frame);

    for layer in &data.layers {
        let sections = layer.sections(config);
        for pair in sections.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            for (a, b) in lower.rings.iter().zip(&upper.rings) {
                let n = a.points.len();
                for i in 0..n {
                    let j = (i + 1) % n;
                    let a0 = a.points[i].extend(lower.w);
                    let a1 = a.points[j].extend(lower.w);
                    let b0 = b.points[i].extend(upper.w);
                    let b1 = b.points[j].extend(upper.w);
                    builder.triangle(a0, a1, b1);
                    builder.triangle(a0, b1, b0);
                }
            }
        }
    }

    for cap in data.caps(config)? {
        for [p, q, r] in triangulate(&cap.rings)? {
            let ccw = (q - p).perp_dot(r - p) > 0.0;
            let (q, r) = if ccw == cap.up { (q, r) } else { (r, q) };
            builder.triangle(p.extend(cap.w), q.extend(cap.w), r.extend(cap.w));
        }
    }

    let mesh = builder.finish();
    tracing::debug!("Tessellated solid into {} triangles", mesh.triangle_count());
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Loop, Region};
    use approx::assert_relative_eq;

    #[test]
    fn test_box_volume_and_bounds() {
        let config = KernelConfig::default();
        let data = SolidData::prism(
            Frame::world(),
            Region::from_loop(Loop::rectangle(Vec2::ZERO, Vec2::new(2.0, 3.0))),
            0.0,
            4.0,
        );
        let mesh = tessellate(&data, &config).unwrap();
        // 4 walls and 2 caps, two triangles each
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.volume(), 24.0, epsilon = 1e-4);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_tube_volume() {
        let config = KernelConfig::default();
        let region = Region::from_loops(
            vec![Loop::circle(Vec2::ZERO, 25.0), Loop::circle(Vec2::ZERO, 20.0)],
            &config,
        );
        let data = SolidData::prism(Frame::world(), region, 0.0, 10.0);
        let mesh = tessellate(&data, &config).unwrap();
        let expected = std::f32::consts::PI * (625.0 - 400.0) * 10.0;
        assert_relative_eq!(mesh.volume(), expected, max_relative = 1e-2);
    }

    #[test]
    fn test_downward_frame_keeps_outward_normals() {
        let config = KernelConfig::default();
        let frame = Frame::new(Vec3::ZERO, Vec3::X, Vec3::NEG_Y);
        let data = SolidData::prism(
            frame,
            Region::from_loop(Loop::rectangle(Vec2::ZERO, Vec2::ONE)),
            0.0,
            1.0,
        );
        let mesh = tessellate(&data, &config).unwrap();
        assert_relative_eq!(mesh.volume(), 1.0, epsilon = 1e-5);
    }
}
