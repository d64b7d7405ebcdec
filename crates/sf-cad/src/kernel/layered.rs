//! Layered CAD Kernel Backend
//!
//! Pure Rust kernel for extruded bodies. Solids are stacks of prism layers
//! along a sketch normal; fillets and chamfers turn a prism into a stack of
//! cross-sections.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use parking_lot::Mutex;
use uuid::Uuid;

use super::blend::{BlendKind, blend};
use super::mesh;
use super::solid::SolidData;
use super::{
    BooleanType, CadError, CadKernel, CadResult, EdgeId, EdgeInfo, FaceId, FaceInfo, Frame, Solid,
    TessellatedMesh,
};
use crate::config::KernelConfig;
use crate::profile::{Loop, Region};

/// Layered-prism CAD kernel
pub struct LayeredKernel {
    config: KernelConfig,
    /// Storage for solid data (keyed by UUID)
    solids: Mutex<HashMap<Uuid, SolidData>>,
}

impl LayeredKernel {
    /// Create a new kernel with the default configuration
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Create a new kernel with the given configuration
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            config,
            solids: Mutex::new(HashMap::new()),
        }
    }

    /// Number of solids held by the kernel
    pub fn solid_count(&self) -> usize {
        self.solids.lock().len()
    }

    /// Store solid data and return a Solid reference
    fn store_solid(&self, data: SolidData) -> Solid {
        let id = Uuid::new_v4();
        self.solids.lock().insert(id, data);
        Solid::new(id)
    }

    /// Get a copy of the stored data of a solid
    fn get_solid(&self, solid: &Solid) -> CadResult<SolidData> {
        self.solids
            .lock()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }

    fn blend_edges(
        &self,
        solid: &Solid,
        edges: &[EdgeId],
        size: f32,
        kind: BlendKind,
    ) -> CadResult<Solid> {
        let data = self.get_solid(solid)?;
        let topology = data.edges(&self.config);
        let sources = edges
            .iter()
            .map(|edge| {
                if edge.solid_id != solid.id {
                    return Err(CadError::InvalidEdge(format!(
                        "edge {} belongs to solid {}",
                        edge.index, edge.solid_id
                    )));
                }
                topology
                    .get(edge.index as usize)
                    .map(|e| e.source)
                    .ok_or_else(|| {
                        CadError::InvalidEdge(format!(
                            "edge index {} out of range ({} edges)",
                            edge.index,
                            topology.len()
                        ))
                    })
            })
            .collect::<CadResult<Vec<_>>>()?;

        let result = blend(&data, &sources, size, kind, &self.config)?;
        Ok(self.store_solid(result))
    }
}

impl Default for LayeredKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl CadKernel for LayeredKernel {
    fn name(&self) -> &str {
        "layered"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn extrude(
        &self,
        region: &Region,
        frame: &Frame,
        direction: Vec3,
        distance: f32,
    ) -> CadResult<Solid> {
        if region.is_empty() {
            return Err(CadError::InvalidProfile("Profile region is empty".into()));
        }
        if !(distance > self.config.linear_tolerance) {
            return Err(CadError::InvalidProfile(format!(
                "Extrusion distance must be positive, got {}",
                distance
            )));
        }

        let alignment = direction.normalize_or_zero().dot(frame.normal);
        if (alignment.abs() - 1.0).abs() > 1e-4 {
            return Err(CadError::Unsupported(
                "extrusion direction must follow the sketch normal".into(),
            ));
        }
        let (bottom, top) = if alignment > 0.0 {
            (0.0, distance)
        } else {
            (-distance, 0.0)
        };

        tracing::debug!(
            "Extruding region with {} loops from {} to {}",
            region.loops().len(),
            bottom,
            top
        );
        Ok(self.store_solid(SolidData::prism(*frame, region.clone(), bottom, top)))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let target = self.get_solid(a)?;
        let tool = self.get_solid(b)?;
        let result = target.boolean(&tool, op, &self.config)?;
        tracing::debug!("Boolean {:?} produced {} layers", op, result.layers.len());
        Ok(self.store_solid(result))
    }

    fn tessellate(&self, solid: &Solid, tolerance: f32) -> CadResult<TessellatedMesh> {
        let data = self.get_solid(solid)?;
        if tolerance > 0.0 {
            let config = KernelConfig {
                chord_tolerance: tolerance,
                ..self.config.clone()
            };
            mesh::tessellate(&data, &config)
        } else {
            mesh::tessellate(&data, &self.config)
        }
    }

    fn create_box(&self, center: Vec3, size: Vec3) -> CadResult<Solid> {
        if size.min_element() <= 0.0 {
            return Err(CadError::InvalidProfile(format!(
                "Box size must be positive, got {}",
                size
            )));
        }
        let frame = Frame::new(center - Vec3::Z * (size.z * 0.5), Vec3::X, Vec3::Y);
        let half = Vec2::new(size.x, size.y) * 0.5;
        let region = Region::from_loop(Loop::rectangle(-half, half));
        self.extrude(&region, &frame, frame.normal, size.z)
    }

    fn create_cylinder(
        &self,
        center: Vec3,
        radius: f32,
        height: f32,
        axis: Vec3,
    ) -> CadResult<Solid> {
        if radius <= 0.0 {
            return Err(CadError::InvalidProfile(format!(
                "Cylinder radius must be positive, got {}",
                radius
            )));
        }
        if axis.length_squared() <= f32::EPSILON {
            return Err(CadError::InvalidProfile("Cylinder axis is zero".into()));
        }
        let axis = axis.normalize();
        let frame = Frame::from_normal(center - axis * (height * 0.5), axis);
        let region = Region::from_loop(Loop::circle(Vec2::ZERO, radius));
        self.extrude(&region, &frame, frame.normal, height)
    }

    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        let data = self.get_solid(solid)?;
        let frame = data.frame;
        let world = |p: Vec3| frame.to_world(p.truncate(), p.z);
        Ok(data
            .edges(&self.config)
            .into_iter()
            .enumerate()
            .map(|(i, e)| {
                EdgeInfo::curved(
                    EdgeId::new(solid.id, i as u32),
                    world(e.start),
                    world(e.end),
                    world(e.midpoint),
                    e.length,
                    e.kind,
                )
            })
            .collect())
    }

    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        let data = self.get_solid(solid)?;
        let frame = data.frame;
        Ok(data
            .faces(&self.config)?
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                FaceInfo::new(
                    FaceId::new(solid.id, i as u32),
                    frame.to_world(f.center.truncate(), f.center.z),
                    frame.vector_to_world(f.normal.truncate(), f.normal.z),
                    f.area,
                    f.kind,
                )
            })
            .collect())
    }

    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f32) -> CadResult<Solid> {
        self.blend_edges(solid, edges, radius, BlendKind::Fillet)
    }

    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f32) -> CadResult<Solid> {
        self.blend_edges(solid, edges, distance, BlendKind::Chamfer)
    }

    fn release(&self, solid: &Solid) -> bool {
        self.solids.lock().remove(&solid.id).is_some()
    }
}
