//! CAD Kernel trait definitions
//!
//! These traits define the interface that all CAD kernels must implement.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::KernelConfig;
use crate::profile::{Region, RegionError};

/// Unique identifier for an edge within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    /// ID of the solid this edge belongs to
    pub solid_id: Uuid,
    /// Index of the edge within the solid
    pub index: u32,
}

impl EdgeId {
    /// Create a new edge ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Unique identifier for a face within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId {
    /// ID of the solid this face belongs to
    pub solid_id: Uuid,
    /// Index of the face within the solid
    pub index: u32,
}

impl FaceId {
    /// Create a new face ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Where an edge sits on a layered solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Boundary curve between a cap face and the side faces
    Rim,
    /// Straight edge along the body normal at a sharp profile corner
    Vertical,
}

/// Information about an edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Start point of the edge
    pub start: Vec3,
    /// End point of the edge
    pub end: Vec3,
    /// Midpoint of the edge
    pub midpoint: Vec3,
    /// Length of the edge
    pub length: f32,
    /// Kind of edge
    pub kind: EdgeKind,
}

impl EdgeInfo {
    /// Create a new straight edge info
    pub fn new(id: EdgeId, start: Vec3, end: Vec3, kind: EdgeKind) -> Self {
        let midpoint = (start + end) * 0.5;
        let length = (end - start).length();
        Self {
            id,
            start,
            end,
            midpoint,
            length,
            kind,
        }
    }

    /// Create an edge info for a curved edge
    pub fn curved(
        id: EdgeId,
        start: Vec3,
        end: Vec3,
        midpoint: Vec3,
        length: f32,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id,
            start,
            end,
            midpoint,
            length,
            kind,
        }
    }

    /// Check if the edge closes on itself (a full circle)
    pub fn is_closed(&self) -> bool {
        self.length > 0.0 && self.start.distance(self.end) <= self.length * 1e-4
    }
}

/// Surface type of a face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceKind {
    /// Flat face
    Planar,
    /// Side face swept from a circular arc
    Cylindrical,
    /// Face produced by a fillet or chamfer
    Blend,
}

/// Information about a face
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceInfo {
    /// Unique identifier for this face
    pub id: FaceId,
    /// Center point of the face
    pub center: Vec3,
    /// Normal vector of the face
    pub normal: Vec3,
    /// Approximate area of the face
    pub area: f32,
    /// Surface type
    pub kind: FaceKind,
}

impl FaceInfo {
    /// Create a new face info
    pub fn new(id: FaceId, center: Vec3, normal: Vec3, area: f32, kind: FaceKind) -> Self {
        Self {
            id,
            center,
            normal: normal.normalize_or_zero(),
            area,
            kind,
        }
    }
}

/// A right-handed coordinate frame: a sketch plane plus its normal
///
/// Solids are built in frame coordinates `(u, v, w)` where `w` runs along the
/// normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame origin
    pub origin: Vec3,
    /// First in-plane axis
    pub x_axis: Vec3,
    /// Second in-plane axis
    pub y_axis: Vec3,
    /// Normal (x_axis cross y_axis)
    pub normal: Vec3,
}

impl Frame {
    /// Create a frame from an origin and two in-plane axes
    pub fn new(origin: Vec3, x_axis: Vec3, y_axis: Vec3) -> Self {
        let x_axis = x_axis.normalize();
        let normal = x_axis.cross(y_axis).normalize();
        let y_axis = normal.cross(x_axis);
        Self {
            origin,
            x_axis,
            y_axis,
            normal,
        }
    }

    /// The world XY frame
    pub fn world() -> Self {
        Self::new(Vec3::ZERO, Vec3::X, Vec3::Y)
    }

    /// A frame whose normal points along `axis`
    pub fn from_normal(origin: Vec3, axis: Vec3) -> Self {
        let normal = axis.normalize();
        let reference = if normal.dot(Vec3::X).abs() < 0.99 {
            Vec3::X
        } else {
            Vec3::Y
        };
        let x_axis = (reference - normal * normal.dot(reference)).normalize();
        Self::new(origin, x_axis, normal.cross(x_axis))
    }

    /// Convert frame coordinates to a world point
    pub fn to_world(&self, point: Vec2, w: f32) -> Vec3 {
        self.origin + self.x_axis * point.x + self.y_axis * point.y + self.normal * w
    }

    /// Convert a frame-local direction to world space
    pub fn vector_to_world(&self, v: Vec2, w: f32) -> Vec3 {
        self.x_axis * v.x + self.y_axis * v.y + self.normal * w
    }

    /// Convert a world point to frame coordinates
    pub fn to_local(&self, point: Vec3) -> (Vec2, f32) {
        let d = point - self.origin;
        (
            Vec2::new(d.dot(self.x_axis), d.dot(self.y_axis)),
            d.dot(self.normal),
        )
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::world()
    }
}

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Region error: {0}")]
    Region(#[from] RegionError),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// A tessellated mesh output from the CAD kernel
#[derive(Debug, Clone, Default)]
pub struct TessellatedMesh {
    /// Vertex positions (3 floats per vertex)
    pub vertices: Vec<[f32; 3]>,
    /// Vertex normals (3 floats per vertex)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (3 indices per triangle)
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    /// Create an empty tessellated mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangles as vertex positions
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.vertices[tri[0] as usize]),
                Vec3::from(self.vertices[tri[1] as usize]),
                Vec3::from(self.vertices[tri[2] as usize]),
            ]
        })
    }

    /// Enclosed volume (divergence theorem; requires a closed, outward mesh)
    pub fn volume(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| a.dot(b.cross(c)) as f64)
            .sum::<f64>() as f32
            / 6.0
    }

    /// Axis-aligned bounding box, or None for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.vertices.is_empty() {
            return None;
        }
        Some(self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| (min.min(Vec3::from(*v)), max.max(Vec3::from(*v))),
        ))
    }

    /// Append another mesh
    pub fn merge(&mut self, other: &TessellatedMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }
}

/// Handle to a solid whose geometry is stored in the kernel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solid {
    /// Key of the kernel's stored geometry
    pub id: Uuid,
}

impl Solid {
    /// Create a handle for the given ID
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (add)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

/// The main CAD kernel trait
///
/// Implementations of this trait provide the actual geometry operations.
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Tolerances and discretization settings in use
    fn config(&self) -> &KernelConfig;

    /// Extrude a planar region along the frame normal
    ///
    /// # Arguments
    /// * `region` - The region to extrude, in frame coordinates
    /// * `frame` - The sketch frame
    /// * `direction` - The extrusion direction (parallel to the frame normal)
    /// * `distance` - The extrusion distance
    fn extrude(
        &self,
        region: &Region,
        frame: &Frame,
        direction: Vec3,
        distance: f32,
    ) -> CadResult<Solid>;

    /// Perform a boolean operation on two solids
    ///
    /// # Arguments
    /// * `a` - The target solid
    /// * `b` - The tool solid
    /// * `op` - The boolean operation type
    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid>;

    /// Tessellate a solid into triangles
    ///
    /// # Arguments
    /// * `solid` - The solid to tessellate
    /// * `tolerance` - Chord tolerance; zero or negative uses the kernel default
    fn tessellate(&self, solid: &Solid, tolerance: f32) -> CadResult<TessellatedMesh>;

    /// Create a box primitive
    fn create_box(&self, center: Vec3, size: Vec3) -> CadResult<Solid>;

    /// Create a cylinder primitive
    fn create_cylinder(
        &self,
        center: Vec3,
        radius: f32,
        height: f32,
        axis: Vec3,
    ) -> CadResult<Solid>;

    // ========== Edge/Face Query Methods ==========

    /// Get all edges of a solid with their geometric information
    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>>;

    /// Get all faces of a solid with their geometric information
    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>>;

    // ========== Fillet/Chamfer Methods ==========

    /// Apply fillet (rounded edge) to selected edges
    ///
    /// # Arguments
    /// * `solid` - The solid to modify
    /// * `edges` - Edge IDs to fillet
    /// * `radius` - Fillet radius
    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f32) -> CadResult<Solid>;

    /// Apply chamfer (beveled edge) to selected edges
    ///
    /// # Arguments
    /// * `solid` - The solid to modify
    /// * `edges` - Edge IDs to chamfer
    /// * `distance` - Chamfer distance
    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f32) -> CadResult<Solid>;

    /// Drop the stored geometry of a solid, returning whether it existed
    fn release(&self, solid: &Solid) -> bool;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel {
    config: KernelConfig,
}

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn config(&self) -> &KernelConfig {
        &self.config
    }

    fn extrude(
        &self,
        _region: &Region,
        _frame: &Frame,
        _direction: Vec3,
        _distance: f32,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn tessellate(&self, _solid: &Solid, _tolerance: f32) -> CadResult<TessellatedMesh> {
        Self::unavailable()
    }

    fn create_box(&self, _center: Vec3, _size: Vec3) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn create_cylinder(
        &self,
        _center: Vec3,
        _radius: f32,
        _height: f32,
        _axis: Vec3,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn get_edges(&self, _solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        Self::unavailable()
    }

    fn get_faces(&self, _solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        Self::unavailable()
    }

    fn fillet(&self, _solid: &Solid, _edges: &[EdgeId], _radius: f32) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn chamfer(&self, _solid: &Solid, _edges: &[EdgeId], _distance: f32) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn release(&self, _solid: &Solid) -> bool {
        false
    }
}

/// Get the default CAD kernel
pub fn default_kernel() -> Box<dyn CadKernel> {
    Box::new(super::LayeredKernel::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_round_trip() {
        let frame = Frame::new(Vec3::new(1.0, 2.0, 3.0), Vec3::X, Vec3::Z);
        assert_relative_eq!(frame.normal.y, -1.0, epsilon = 1e-6);
        let world = frame.to_world(Vec2::new(2.0, 5.0), 1.5);
        let (local, w) = frame.to_local(world);
        assert_relative_eq!(local.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(local.y, 5.0, epsilon = 1e-5);
        assert_relative_eq!(w, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_frame_from_normal_is_orthonormal() {
        let frame = Frame::from_normal(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(frame.normal.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(frame.x_axis.dot(frame.normal), 0.0, epsilon = 1e-6);
        assert_relative_eq!(frame.y_axis.dot(frame.normal), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mesh_volume_of_tetrahedron() {
        let mesh = TessellatedMesh {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            normals: vec![[0.0; 3]; 4],
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
        };
        assert_relative_eq!(mesh.volume(), 1.0 / 6.0, epsilon = 1e-6);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::ONE);
    }

    #[test]
    fn test_null_kernel_is_unavailable() {
        let kernel = NullKernel::default();
        assert!(!kernel.is_available());
        let result = kernel.create_box(Vec3::ZERO, Vec3::ONE);
        assert!(matches!(result, Err(CadError::KernelNotAvailable(_))));
    }
}
