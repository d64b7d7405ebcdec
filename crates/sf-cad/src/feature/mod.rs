//! Feature Operations
//!
//! Provides parametric feature operations like extrude, fillet and boolean
//! that operate on sketches and bodies to create 3D solids.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::kernel::{BooleanType, CadError, CadKernel, EdgeId, EdgeKind, Solid, TessellatedMesh};
use crate::profile::{Region, RegionOp};
use crate::sketch::Sketch;

/// Feature-related errors
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Sketch error: {0}")]
    SketchError(#[from] crate::sketch::SketchError),

    #[error("CAD kernel error: {0}")]
    CadError(#[from] CadError),

    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(Uuid),

    #[error("Sketch not found: {0}")]
    SketchNotFound(Uuid),

    #[error("Body not found: {0}")]
    BodyNotFound(Uuid),
}

/// Result type for feature operations
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Direction for extrusion
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ExtrudeDirection {
    /// Extrude in the positive normal direction
    #[default]
    Positive,
    /// Extrude in the negative normal direction
    Negative,
    /// Extrude symmetrically in both directions
    Symmetric,
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BooleanOp {
    /// Create new body
    #[default]
    New,
    /// Add to existing body
    Join,
    /// Remove from existing body
    Cut,
    /// Keep only intersection
    Intersect,
}

impl From<BooleanOp> for Option<BooleanType> {
    fn from(op: BooleanOp) -> Self {
        match op {
            BooleanOp::New => None,
            BooleanOp::Join => Some(BooleanType::Union),
            BooleanOp::Cut => Some(BooleanType::Subtract),
            BooleanOp::Intersect => Some(BooleanType::Intersect),
        }
    }
}

/// Which profiles of a sketch an extrusion uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProfileSelection {
    /// The outermost profile with its holes
    #[default]
    First,
    /// A single profile by index
    Index(usize),
    /// Every profile of the sketch
    All,
}

/// Which edges of a body a fillet or chamfer applies to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeSelection {
    /// Every edge of the body
    #[default]
    All,
    /// Edges by index in the body's edge list
    Indices(Vec<u32>),
    /// Rim edges only
    Rims,
    /// Vertical edges only
    Vertical,
}

impl EdgeSelection {
    /// Resolve the selection against the current edges of a body
    pub fn resolve(&self, kernel: &dyn CadKernel, solid: &Solid) -> FeatureResult<Vec<EdgeId>> {
        let edges = match self {
            EdgeSelection::Indices(indices) => indices
                .iter()
                .map(|&i| EdgeId::new(solid.id, i))
                .collect::<Vec<_>>(),
            selection => kernel
                .get_edges(solid)?
                .into_iter()
                .filter(|e| match selection {
                    EdgeSelection::Rims => e.kind == EdgeKind::Rim,
                    EdgeSelection::Vertical => e.kind == EdgeKind::Vertical,
                    _ => true,
                })
                .map(|e| e.id)
                .collect(),
        };

        if edges.is_empty() {
            return Err(FeatureError::InvalidFeature("No edges selected".into()));
        }
        Ok(edges)
    }
}

/// A parametric feature that modifies geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Feature {
    /// Extrude sketch profiles
    Extrude {
        /// Unique identifier
        id: Uuid,
        /// Name of the feature
        name: String,
        /// Reference to the sketch
        sketch_id: Uuid,
        /// Profiles to extrude
        #[serde(default)]
        profiles: ProfileSelection,
        /// Extrusion distance
        distance: f32,
        /// Extrusion direction
        direction: ExtrudeDirection,
        /// Boolean operation with existing body
        boolean_op: BooleanOp,
        /// Target body ID (for boolean operations)
        target_body: Option<Uuid>,
        /// Whether the feature is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Boolean operation between two bodies
    Boolean {
        /// Unique identifier
        id: Uuid,
        /// Name of the feature
        name: String,
        /// Target body
        target_body: Uuid,
        /// Tool body
        tool_body: Uuid,
        /// Operation type
        operation: BooleanOp,
        /// Whether the feature is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Fillet edges
    Fillet {
        /// Unique identifier
        id: Uuid,
        /// Name of the feature
        name: String,
        /// Body to modify
        body_id: Uuid,
        /// Fillet radius
        radius: f32,
        /// Edges to fillet
        edges: EdgeSelection,
        /// Whether the feature is suppressed
        #[serde(default)]
        suppressed: bool,
    },

    /// Chamfer edges
    Chamfer {
        /// Unique identifier
        id: Uuid,
        /// Name of the feature
        name: String,
        /// Body to modify
        body_id: Uuid,
        /// Chamfer distance
        distance: f32,
        /// Edges to chamfer
        edges: EdgeSelection,
        /// Whether the feature is suppressed
        #[serde(default)]
        suppressed: bool,
    },
}

/// The solid produced by executing a feature
#[derive(Debug, Clone)]
pub struct FeatureOutput {
    /// Body the solid belongs to (the feature id for new bodies)
    pub body_id: Uuid,
    /// The resulting solid
    pub solid: Solid,
    /// Bodies absorbed into the result
    pub consumed: Vec<Uuid>,
}

impl Feature {
    /// Get the unique ID of this feature
    pub fn id(&self) -> Uuid {
        match self {
            Feature::Extrude { id, .. } => *id,
            Feature::Boolean { id, .. } => *id,
            Feature::Fillet { id, .. } => *id,
            Feature::Chamfer { id, .. } => *id,
        }
    }

    /// Get the name of this feature
    pub fn name(&self) -> &str {
        match self {
            Feature::Extrude { name, .. } => name,
            Feature::Boolean { name, .. } => name,
            Feature::Fillet { name, .. } => name,
            Feature::Chamfer { name, .. } => name,
        }
    }

    /// Get the type name of this feature
    pub fn type_name(&self) -> &'static str {
        match self {
            Feature::Extrude { .. } => "Extrude",
            Feature::Boolean { .. } => "Boolean",
            Feature::Fillet { .. } => "Fillet",
            Feature::Chamfer { .. } => "Chamfer",
        }
    }

    /// Check if the feature is suppressed
    pub fn is_suppressed(&self) -> bool {
        match self {
            Feature::Extrude { suppressed, .. } => *suppressed,
            Feature::Boolean { suppressed, .. } => *suppressed,
            Feature::Fillet { suppressed, .. } => *suppressed,
            Feature::Chamfer { suppressed, .. } => *suppressed,
        }
    }

    /// Set the suppressed state
    pub fn set_suppressed(&mut self, value: bool) {
        match self {
            Feature::Extrude { suppressed, .. } => *suppressed = value,
            Feature::Boolean { suppressed, .. } => *suppressed = value,
            Feature::Fillet { suppressed, .. } => *suppressed = value,
            Feature::Chamfer { suppressed, .. } => *suppressed = value,
        }
    }

    /// Create a new extrude feature
    pub fn extrude(
        name: impl Into<String>,
        sketch_id: Uuid,
        distance: f32,
        direction: ExtrudeDirection,
    ) -> Self {
        Self::extrude_with_boolean(name, sketch_id, distance, direction, BooleanOp::New, None)
    }

    /// Create a new extrude feature with boolean operation
    pub fn extrude_with_boolean(
        name: impl Into<String>,
        sketch_id: Uuid,
        distance: f32,
        direction: ExtrudeDirection,
        boolean_op: BooleanOp,
        target_body: Option<Uuid>,
    ) -> Self {
        Feature::Extrude {
            id: Uuid::new_v4(),
            name: name.into(),
            sketch_id,
            profiles: ProfileSelection::First,
            distance,
            direction,
            boolean_op,
            target_body,
            suppressed: false,
        }
    }

    /// Set the profile selection of an extrude feature
    pub fn with_profiles(mut self, selection: ProfileSelection) -> Self {
        if let Feature::Extrude { profiles, .. } = &mut self {
            *profiles = selection;
        }
        self
    }

    /// Create a new boolean feature
    pub fn boolean(
        name: impl Into<String>,
        target_body: Uuid,
        tool_body: Uuid,
        operation: BooleanOp,
    ) -> Self {
        Feature::Boolean {
            id: Uuid::new_v4(),
            name: name.into(),
            target_body,
            tool_body,
            operation,
            suppressed: false,
        }
    }

    /// Create a new fillet feature
    pub fn fillet(
        name: impl Into<String>,
        body_id: Uuid,
        edges: EdgeSelection,
        radius: f32,
    ) -> Self {
        Feature::Fillet {
            id: Uuid::new_v4(),
            name: name.into(),
            body_id,
            radius,
            edges,
            suppressed: false,
        }
    }

    /// Create a new chamfer feature
    pub fn chamfer(
        name: impl Into<String>,
        body_id: Uuid,
        edges: EdgeSelection,
        distance: f32,
    ) -> Self {
        Feature::Chamfer {
            id: Uuid::new_v4(),
            name: name.into(),
            body_id,
            distance,
            edges,
            suppressed: false,
        }
    }

    /// Execute this feature against the existing bodies
    pub fn execute(
        &self,
        kernel: &dyn CadKernel,
        sketches: &HashMap<Uuid, Sketch>,
        existing_bodies: &HashMap<Uuid, Solid>,
    ) -> FeatureResult<FeatureOutput> {
        if self.is_suppressed() {
            return Err(FeatureError::InvalidFeature("Feature is suppressed".into()));
        }

        match self {
            Feature::Extrude {
                id,
                sketch_id,
                profiles,
                distance,
                direction,
                boolean_op,
                target_body,
                ..
            } => {
                let sketch = sketches
                    .get(sketch_id)
                    .ok_or(FeatureError::SketchNotFound(*sketch_id))?;
                let region = select_region(sketch, *profiles, kernel)?;
                let frame = sketch.plane.frame();

                let solid = match direction {
                    ExtrudeDirection::Positive => {
                        kernel.extrude(&region, &frame, frame.normal, *distance)?
                    }
                    ExtrudeDirection::Negative => {
                        kernel.extrude(&region, &frame, -frame.normal, *distance)?
                    }
                    ExtrudeDirection::Symmetric => {
                        let half = *distance / 2.0;
                        let front = kernel.extrude(&region, &frame, frame.normal, half)?;
                        let back = match kernel.extrude(&region, &frame, -frame.normal, half) {
                            Ok(back) => back,
                            Err(e) => {
                                kernel.release(&front);
                                return Err(e.into());
                            }
                        };
                        let merged = kernel.boolean(&front, &back, BooleanType::Union);
                        kernel.release(&front);
                        kernel.release(&back);
                        merged?
                    }
                };

                let Some(op) = Option::<BooleanType>::from(*boolean_op) else {
                    return Ok(FeatureOutput {
                        body_id: *id,
                        solid,
                        consumed: Vec::new(),
                    });
                };

                // The extruded tool only lives until it is combined
                let combined = resolve_target(*target_body, existing_bodies).and_then(
                    |(target_id, target)| {
                        Ok((target_id, kernel.boolean(target, &solid, op)?))
                    },
                );
                kernel.release(&solid);
                let (target_id, solid) = combined?;
                Ok(FeatureOutput {
                    body_id: target_id,
                    solid,
                    consumed: Vec::new(),
                })
            }

            Feature::Boolean {
                target_body,
                tool_body,
                operation,
                ..
            } => {
                let target = existing_bodies
                    .get(target_body)
                    .ok_or(FeatureError::BodyNotFound(*target_body))?;
                let tool = existing_bodies
                    .get(tool_body)
                    .ok_or(FeatureError::BodyNotFound(*tool_body))?;

                let op = Option::<BooleanType>::from(*operation).ok_or(
                    FeatureError::InvalidFeature("Invalid boolean operation".into()),
                )?;

                Ok(FeatureOutput {
                    body_id: *target_body,
                    solid: kernel.boolean(target, tool, op)?,
                    consumed: vec![*tool_body],
                })
            }

            Feature::Fillet {
                body_id,
                radius,
                edges,
                ..
            } => {
                let body = existing_bodies
                    .get(body_id)
                    .ok_or(FeatureError::BodyNotFound(*body_id))?;
                let edges = edges.resolve(kernel, body)?;

                Ok(FeatureOutput {
                    body_id: *body_id,
                    solid: kernel.fillet(body, &edges, *radius)?,
                    consumed: Vec::new(),
                })
            }

            Feature::Chamfer {
                body_id,
                distance,
                edges,
                ..
            } => {
                let body = existing_bodies
                    .get(body_id)
                    .ok_or(FeatureError::BodyNotFound(*body_id))?;
                let edges = edges.resolve(kernel, body)?;

                Ok(FeatureOutput {
                    body_id: *body_id,
                    solid: kernel.chamfer(body, &edges, *distance)?,
                    consumed: Vec::new(),
                })
            }
        }
    }
}

/// Build the region an extrusion sweeps
fn select_region(
    sketch: &Sketch,
    selection: ProfileSelection,
    kernel: &dyn CadKernel,
) -> FeatureResult<Region> {
    let config = kernel.config();
    let profiles = sketch.extract_profiles(config)?;

    if profiles.is_empty() {
        return Err(FeatureError::InvalidFeature(format!(
            "No closed profiles found in sketch '{}'",
            sketch.name
        )));
    }

    match selection {
        ProfileSelection::First => Ok(profiles[0].region()),
        ProfileSelection::Index(index) => profiles
            .get(index)
            .map(|p| p.region())
            .ok_or_else(|| {
                FeatureError::InvalidFeature(format!(
                    "Profile index {} out of range ({} profiles)",
                    index,
                    profiles.len()
                ))
            }),
        ProfileSelection::All => profiles.iter().try_fold(Region::new(), |acc, profile| {
            acc.combine(&profile.region(), RegionOp::Union, config)
                .map_err(|e| FeatureError::CadError(e.into()))
        }),
    }
}

/// Find the body a modifying extrusion applies to
fn resolve_target(
    target: Option<Uuid>,
    bodies: &HashMap<Uuid, Solid>,
) -> FeatureResult<(Uuid, &Solid)> {
    match target {
        Some(id) => bodies
            .get(&id)
            .map(|solid| (id, solid))
            .ok_or(FeatureError::BodyNotFound(id)),
        None if bodies.len() == 1 => bodies
            .iter()
            .next()
            .map(|(id, solid)| (*id, solid))
            .ok_or_else(|| FeatureError::InvalidFeature("No target body".into())),
        None => Err(FeatureError::InvalidFeature(format!(
            "No target body given and {} bodies exist",
            bodies.len()
        ))),
    }
}

/// A body produced by features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadBody {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the body
    pub name: String,
    /// The solid geometry (not serialized)
    #[serde(skip)]
    pub solid: Option<Solid>,
    /// Cached tessellation
    #[serde(skip)]
    pub mesh_cache: Option<TessellatedMesh>,
    /// Feature that created this body
    pub source_feature: Option<Uuid>,
}

impl Default for CadBody {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::from("Body"),
            solid: None,
            mesh_cache: None,
            source_feature: None,
        }
    }
}

impl CadBody {
    /// Create a new body with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Replace the solid of this body, dropping the cached mesh
    pub fn set_solid(&mut self, solid: Solid) {
        self.solid = Some(solid);
        self.invalidate_cache();
    }

    /// Get the tessellated mesh, tessellating if needed
    pub fn get_mesh(&mut self, kernel: &dyn CadKernel, tolerance: f32) -> Option<&TessellatedMesh> {
        if self.mesh_cache.is_none()
            && let Some(ref solid) = self.solid
            && let Ok(mesh) = kernel.tessellate(solid, tolerance)
        {
            self.mesh_cache = Some(mesh);
        }
        self.mesh_cache.as_ref()
    }

    /// Invalidate the mesh cache
    pub fn invalidate_cache(&mut self) {
        self.mesh_cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::LayeredKernel;
    use crate::sketch::SketchPlane;
    use approx::assert_relative_eq;
    use glam::Vec2;
    use std::f32::consts::PI;

    fn plate_sketch() -> Sketch {
        let mut sketch = Sketch::new("Plate", SketchPlane::xy());
        sketch
            .add_two_point_rectangle(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0))
            .unwrap();
        sketch
            .add_circle_by_center_radius(Vec2::ZERO, 3.0)
            .unwrap();
        sketch
    }

    fn volume(kernel: &dyn CadKernel, solid: &Solid) -> f32 {
        kernel.tessellate(solid, 0.0).unwrap().volume()
    }

    #[test]
    fn test_feature_id() {
        let feature = Feature::extrude("Test", Uuid::new_v4(), 10.0, ExtrudeDirection::Positive);
        let id = feature.id();
        assert_eq!(feature.id(), id);
    }

    #[test]
    fn test_feature_suppression() {
        let mut feature =
            Feature::extrude("Test", Uuid::new_v4(), 10.0, ExtrudeDirection::Positive);
        assert!(!feature.is_suppressed());

        feature.set_suppressed(true);
        assert!(feature.is_suppressed());
    }

    #[test]
    fn test_extrude_first_profile_keeps_hole() {
        let kernel = LayeredKernel::new();
        let sketch = plate_sketch();
        let sketches = HashMap::from([(sketch.id, sketch.clone())]);
        let feature = Feature::extrude("Plate", sketch.id, 5.0, ExtrudeDirection::Positive);

        let output = feature.execute(&kernel, &sketches, &HashMap::new()).unwrap();
        assert_eq!(output.body_id, feature.id());
        let expected = (200.0 - PI * 9.0) * 5.0;
        assert_relative_eq!(volume(&kernel, &output.solid), expected, max_relative = 1e-2);
    }

    #[test]
    fn test_extrude_all_profiles_fills_hole() {
        let kernel = LayeredKernel::new();
        let sketch = plate_sketch();
        let sketches = HashMap::from([(sketch.id, sketch.clone())]);
        let feature = Feature::extrude("Block", sketch.id, 5.0, ExtrudeDirection::Positive)
            .with_profiles(ProfileSelection::All);

        let output = feature.execute(&kernel, &sketches, &HashMap::new()).unwrap();
        assert_relative_eq!(volume(&kernel, &output.solid), 1000.0, max_relative = 1e-3);
    }

    #[test]
    fn test_profile_index_out_of_range() {
        let kernel = LayeredKernel::new();
        let sketch = plate_sketch();
        let sketches = HashMap::from([(sketch.id, sketch.clone())]);
        let feature = Feature::extrude("Plate", sketch.id, 5.0, ExtrudeDirection::Positive)
            .with_profiles(ProfileSelection::Index(5));
        assert!(matches!(
            feature.execute(&kernel, &sketches, &HashMap::new()),
            Err(FeatureError::InvalidFeature(_))
        ));
    }

    #[test]
    fn test_symmetric_extrude_is_centered() {
        let kernel = LayeredKernel::new();
        let sketch = plate_sketch();
        let sketches = HashMap::from([(sketch.id, sketch.clone())]);
        let feature = Feature::extrude("Plate", sketch.id, 4.0, ExtrudeDirection::Symmetric);

        let output = feature.execute(&kernel, &sketches, &HashMap::new()).unwrap();
        let (min, max) = kernel.tessellate(&output.solid, 0.0).unwrap().bounds().unwrap();
        assert_relative_eq!(min.z, -2.0, epsilon = 1e-5);
        assert_relative_eq!(max.z, 2.0, epsilon = 1e-5);
        assert_eq!(kernel.get_faces(&output.solid).unwrap().len(), 7);
        // Only the merged solid is kept
        assert_eq!(kernel.solid_count(), 1);
    }

    #[test]
    fn test_cut_resolves_single_body() {
        let kernel = LayeredKernel::new();
        let base = plate_sketch();
        let mut pocket = Sketch::new("Pocket", SketchPlane::xy().offset(5.0));
        pocket
            .add_circle_by_center_radius(Vec2::new(6.0, 0.0), 2.0)
            .unwrap();
        let sketches = HashMap::from([(base.id, base.clone()), (pocket.id, pocket.clone())]);

        let plate = Feature::extrude("Plate", base.id, 5.0, ExtrudeDirection::Positive);
        let plate_out = plate.execute(&kernel, &sketches, &HashMap::new()).unwrap();
        let bodies = HashMap::from([(plate_out.body_id, plate_out.solid.clone())]);

        let cut = Feature::extrude_with_boolean(
            "Pocket",
            pocket.id,
            2.0,
            ExtrudeDirection::Negative,
            BooleanOp::Cut,
            None,
        );
        let output = cut.execute(&kernel, &sketches, &bodies).unwrap();
        assert_eq!(output.body_id, plate.id());
        let expected = volume(&kernel, &plate_out.solid) - PI * 4.0 * 2.0;
        assert_relative_eq!(volume(&kernel, &output.solid), expected, max_relative = 1e-2);
        assert_eq!(kernel.solid_count(), 2);
    }

    #[test]
    fn test_join_without_target_among_many_fails() {
        let kernel = LayeredKernel::new();
        let sketch = plate_sketch();
        let sketches = HashMap::from([(sketch.id, sketch.clone())]);
        let a = kernel.create_box(glam::Vec3::ZERO, glam::Vec3::ONE).unwrap();
        let b = kernel.create_box(glam::Vec3::ZERO, glam::Vec3::ONE).unwrap();
        let bodies = HashMap::from([(Uuid::new_v4(), a), (Uuid::new_v4(), b)]);

        let join = Feature::extrude_with_boolean(
            "Join",
            sketch.id,
            1.0,
            ExtrudeDirection::Positive,
            BooleanOp::Join,
            None,
        );
        assert!(matches!(
            join.execute(&kernel, &sketches, &bodies),
            Err(FeatureError::InvalidFeature(_))
        ));
        assert_eq!(kernel.solid_count(), 2);
    }

    #[test]
    fn test_chamfer_vertical_edges() {
        let kernel = LayeredKernel::new();
        let body_id = Uuid::new_v4();
        let solid = kernel
            .create_box(glam::Vec3::new(0.0, 0.0, 5.0), glam::Vec3::splat(10.0))
            .unwrap();
        let bodies = HashMap::from([(body_id, solid)]);

        let chamfer = Feature::chamfer("Chamfer", body_id, EdgeSelection::Vertical, 1.0);
        let output = chamfer.execute(&kernel, &HashMap::new(), &bodies).unwrap();
        assert_eq!(output.body_id, body_id);
        assert_relative_eq!(volume(&kernel, &output.solid), 980.0, epsilon = 1e-1);
    }

    #[test]
    fn test_boolean_feature_consumes_tool() {
        let kernel = LayeredKernel::new();
        let (target_id, tool_id) = (Uuid::new_v4(), Uuid::new_v4());
        let target = kernel
            .create_box(glam::Vec3::ZERO, glam::Vec3::splat(2.0))
            .unwrap();
        let tool = kernel
            .create_box(glam::Vec3::new(1.0, 0.0, 0.0), glam::Vec3::splat(2.0))
            .unwrap();
        let bodies = HashMap::from([(target_id, target), (tool_id, tool)]);

        let feature = Feature::boolean("Common", target_id, tool_id, BooleanOp::Intersect);
        let output = feature.execute(&kernel, &HashMap::new(), &bodies).unwrap();
        assert_eq!(output.consumed, vec![tool_id]);
        assert_relative_eq!(volume(&kernel, &output.solid), 4.0, epsilon = 1e-4);
    }

    #[test]
    fn test_missing_sketch() {
        let kernel = LayeredKernel::new();
        let feature = Feature::extrude("Lost", Uuid::new_v4(), 1.0, ExtrudeDirection::Positive);
        assert!(matches!(
            feature.execute(&kernel, &HashMap::new(), &HashMap::new()),
            Err(FeatureError::SketchNotFound(_))
        ));
    }
}
