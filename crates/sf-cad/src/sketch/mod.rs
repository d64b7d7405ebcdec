//! 2D Sketch System
//!
//! Sketches hold points and curves on a plane in 3D space. Closed chains of
//! curves are turned into profiles by the profile resolver.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::KernelConfig;
use crate::kernel::{FaceInfo, FaceKind, Frame};
use crate::profile::{Profile, resolve_profiles};

/// Sketch-related errors
#[derive(Debug, Clone, Error)]
pub enum SketchError {
    #[error("Entity not found: {0}")]
    EntityNotFound(Uuid),

    #[error("Invalid radius: {0}")]
    InvalidRadius(f32),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Sketch curves cross each other; split them into separate sketches")]
    CrossingCurves,
}

/// Result type for sketch operations
pub type SketchResult<T> = Result<T, SketchError>;

/// A plane in 3D space that a sketch is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    /// Origin of the sketch coordinate system
    pub origin: Vec3,
    /// Direction of the sketch X axis
    pub x_axis: Vec3,
    /// Direction of the sketch Y axis
    pub y_axis: Vec3,
    /// Plane normal (x_axis cross y_axis)
    pub normal: Vec3,
}

impl SketchPlane {
    /// Create a plane from an origin and two in-plane axes
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

    /// The XY construction plane (normal +Z)
    pub fn xy() -> Self {
        Self::new(Vec3::ZERO, Vec3::X, Vec3::Y)
    }

    /// The XZ construction plane (normal -Y)
    pub fn xz() -> Self {
        Self::new(Vec3::ZERO, Vec3::X, Vec3::Z)
    }

    /// The YZ construction plane (normal +X)
    pub fn yz() -> Self {
        Self::new(Vec3::ZERO, Vec3::Y, Vec3::Z)
    }

    /// This plane moved along its normal
    pub fn offset(&self, distance: f32) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            ..*self
        }
    }

    /// A plane lying on a planar face
    ///
    /// The origin is the projection of the world origin onto the face plane and
    /// the X axis follows world X (or world Y when X is normal to the face).
    pub fn from_face(face: &FaceInfo) -> Option<Self> {
        if face.kind != FaceKind::Planar {
            return None;
        }
        let normal = face.normal.normalize();
        let origin = normal * normal.dot(face.center);
        let reference = if normal.dot(Vec3::X).abs() < 0.99 {
            Vec3::X
        } else {
            Vec3::Y
        };
        let x_axis = (reference - normal * normal.dot(reference)).normalize();
        let y_axis = normal.cross(x_axis);
        Some(Self {
            origin,
            x_axis,
            y_axis,
            normal,
        })
    }

    /// Convert a sketch point to world coordinates
    pub fn to_world(&self, point: Vec2) -> Vec3 {
        self.origin + self.x_axis * point.x + self.y_axis * point.y
    }

    /// Project a world point into sketch coordinates
    pub fn to_local(&self, point: Vec3) -> Vec2 {
        let d = point - self.origin;
        Vec2::new(d.dot(self.x_axis), d.dot(self.y_axis))
    }

    /// The kernel frame of this plane
    pub fn frame(&self) -> Frame {
        Frame {
            origin: self.origin,
            x_axis: self.x_axis,
            y_axis: self.y_axis,
            normal: self.normal,
        }
    }
}

impl Default for SketchPlane {
    fn default() -> Self {
        Self::xy()
    }
}

/// An entity in a sketch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SketchEntity {
    /// A point
    Point {
        /// Unique identifier
        id: Uuid,
        /// Position in sketch coordinates
        position: Vec2,
    },

    /// A line between two points
    Line {
        /// Unique identifier
        id: Uuid,
        /// Start point
        start: Uuid,
        /// End point
        end: Uuid,
        /// Construction geometry is ignored by profiles
        #[serde(default)]
        construction: bool,
    },

    /// A full circle
    Circle {
        /// Unique identifier
        id: Uuid,
        /// Center point
        center: Uuid,
        /// Radius
        radius: f32,
        /// Construction geometry is ignored by profiles
        #[serde(default)]
        construction: bool,
    },

    /// A counter-clockwise arc from start to end around center
    Arc {
        /// Unique identifier
        id: Uuid,
        /// Center point
        center: Uuid,
        /// Start point (defines the radius)
        start: Uuid,
        /// End point
        end: Uuid,
        /// Construction geometry is ignored by profiles
        #[serde(default)]
        construction: bool,
    },
}

impl SketchEntity {
    /// Get the unique ID of this entity
    pub fn id(&self) -> Uuid {
        match self {
            SketchEntity::Point { id, .. } => *id,
            SketchEntity::Line { id, .. } => *id,
            SketchEntity::Circle { id, .. } => *id,
            SketchEntity::Arc { id, .. } => *id,
        }
    }

    /// Get the type name of this entity
    pub fn type_name(&self) -> &'static str {
        match self {
            SketchEntity::Point { .. } => "Point",
            SketchEntity::Line { .. } => "Line",
            SketchEntity::Circle { .. } => "Circle",
            SketchEntity::Arc { .. } => "Arc",
        }
    }

    /// Whether this entity is a curve usable in profiles
    pub fn is_profile_curve(&self) -> bool {
        match self {
            SketchEntity::Point { .. } => false,
            SketchEntity::Line { construction, .. }
            | SketchEntity::Circle { construction, .. }
            | SketchEntity::Arc { construction, .. } => !construction,
        }
    }

    /// Mark a curve as construction geometry
    pub fn set_construction(&mut self, value: bool) {
        match self {
            SketchEntity::Point { .. } => {}
            SketchEntity::Line { construction, .. }
            | SketchEntity::Circle { construction, .. }
            | SketchEntity::Arc { construction, .. } => *construction = value,
        }
    }
}

/// A 2D sketch on a plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sketch {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the sketch
    pub name: String,
    /// Plane the sketch lies on
    pub plane: SketchPlane,
    /// Entities in insertion order
    entities: Vec<SketchEntity>,
}

impl Sketch {
    /// Create an empty sketch
    pub fn new(name: impl Into<String>, plane: SketchPlane) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            plane,
            entities: Vec::new(),
        }
    }

    /// All entities in insertion order
    pub fn entities(&self) -> &[SketchEntity] {
        &self.entities
    }

    /// Get an entity by ID
    pub fn get_entity(&self, id: Uuid) -> Option<&SketchEntity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Get a mutable entity by ID
    pub fn get_entity_mut(&mut self, id: Uuid) -> Option<&mut SketchEntity> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    /// Number of profile-capable curves
    pub fn curve_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_profile_curve()).count()
    }

    /// Add an entity
    pub fn add_entity(&mut self, entity: SketchEntity) -> Uuid {
        let id = entity.id();
        self.entities.push(entity);
        id
    }

    /// Position of a point entity
    pub fn point_position(&self, id: Uuid) -> SketchResult<Vec2> {
        match self.get_entity(id) {
            Some(SketchEntity::Point { position, .. }) => Ok(*position),
            _ => Err(SketchError::EntityNotFound(id)),
        }
    }

    /// Add a point
    pub fn add_point(&mut self, position: Vec2) -> Uuid {
        self.add_entity(SketchEntity::Point {
            id: Uuid::new_v4(),
            position,
        })
    }

    /// Add a line between two existing points
    pub fn add_line(&mut self, start: Uuid, end: Uuid) -> Uuid {
        self.add_entity(SketchEntity::Line {
            id: Uuid::new_v4(),
            start,
            end,
            construction: false,
        })
    }

    /// Add a circle around an existing center point
    pub fn add_circle(&mut self, center: Uuid, radius: f32) -> Uuid {
        self.add_entity(SketchEntity::Circle {
            id: Uuid::new_v4(),
            center,
            radius,
            construction: false,
        })
    }

    /// Add an arc between existing points
    pub fn add_arc(&mut self, center: Uuid, start: Uuid, end: Uuid) -> Uuid {
        self.add_entity(SketchEntity::Arc {
            id: Uuid::new_v4(),
            center,
            start,
            end,
            construction: false,
        })
    }

    /// Add a line between two new points
    pub fn add_line_by_points(&mut self, start: Vec2, end: Vec2) -> SketchResult<Uuid> {
        if start.distance(end) <= f32::EPSILON {
            return Err(SketchError::DegenerateGeometry(
                "line start and end coincide".into(),
            ));
        }
        let p1 = self.add_point(start);
        let p2 = self.add_point(end);
        Ok(self.add_line(p1, p2))
    }

    /// Add a circle from a center position and radius
    pub fn add_circle_by_center_radius(&mut self, center: Vec2, radius: f32) -> SketchResult<Uuid> {
        if !(radius > 0.0) {
            return Err(SketchError::InvalidRadius(radius));
        }
        let c = self.add_point(center);
        Ok(self.add_circle(c, radius))
    }

    /// Add an axis-aligned rectangle from two opposite corners
    ///
    /// Returns the four lines: bottom, right, top, left.
    pub fn add_two_point_rectangle(
        &mut self,
        corner1: Vec2,
        corner2: Vec2,
    ) -> SketchResult<[Uuid; 4]> {
        let min = corner1.min(corner2);
        let max = corner1.max(corner2);
        if max.x - min.x <= f32::EPSILON || max.y - min.y <= f32::EPSILON {
            return Err(SketchError::DegenerateGeometry(
                "rectangle has zero width or height".into(),
            ));
        }

        let p0 = self.add_point(min);
        let p1 = self.add_point(Vec2::new(max.x, min.y));
        let p2 = self.add_point(max);
        let p3 = self.add_point(Vec2::new(min.x, max.y));

        Ok([
            self.add_line(p0, p1),
            self.add_line(p1, p2),
            self.add_line(p2, p3),
            self.add_line(p3, p0),
        ])
    }

    /// Add a counter-clockwise arc from positions
    pub fn add_arc_by_center(&mut self, center: Vec2, start: Vec2, end: Vec2) -> SketchResult<Uuid> {
        let radius = start.distance(center);
        if radius <= f32::EPSILON {
            return Err(SketchError::InvalidRadius(radius));
        }
        if (end.distance(center) - radius).abs() > 1e-4 * radius.max(1.0) {
            return Err(SketchError::DegenerateGeometry(
                "arc end point is not on the arc circle".into(),
            ));
        }
        let c = self.add_point(center);
        let s = self.add_point(start);
        let e = self.add_point(end);
        Ok(self.add_arc(c, s, e))
    }

    /// Resolve the closed profiles of this sketch
    ///
    /// Profile 0 is the outermost loop together with its holes.
    pub fn extract_profiles(&self, config: &KernelConfig) -> SketchResult<Vec<Profile>> {
        resolve_profiles(self, config)
    }
}
