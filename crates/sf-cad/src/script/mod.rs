//! Modeling Scripts
//!
//! A script is a linear list of modeling steps: open a sketch, draw curves,
//! extrude, fillet. Steps run in order and the first failure aborts the run.

mod builtin;

use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::feature::{
    BooleanOp, EdgeSelection, ExtrudeDirection, Feature, FeatureError, ProfileSelection,
};
use crate::history::FeatureHistory;
use crate::kernel::{CadError, CadKernel, FaceKind, TessellatedMesh};
use crate::sketch::{Sketch, SketchError, SketchPlane};

pub use builtin::{BUILTIN_NAMES, builtin, builtins};

/// Error raised by a single step
#[derive(Debug, Clone, Error)]
pub enum StepError {
    #[error(transparent)]
    Sketch(#[from] SketchError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Cad(#[from] CadError),

    #[error("No active sketch; add a Sketch step first")]
    NoActiveSketch,

    #[error("No body to operate on")]
    NoBody,

    #[error("Unknown body '{0}'")]
    UnknownBody(String),

    #[error("No planar face with normal {0}")]
    NoMatchingFace(Vec3),
}

/// Script-related errors
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    #[error("Step {index} ({kind}) failed: {source}")]
    Step {
        index: usize,
        kind: &'static str,
        source: StepError,
    },

    #[error("Unknown script: {0}")]
    UnknownScript(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Plane a sketch step is placed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaneRef {
    /// World XY plane
    Xy,
    /// World XZ plane
    Xz,
    /// World YZ plane
    Yz,
    /// Another plane moved along its normal
    Offset { base: Box<PlaneRef>, distance: f32 },
    /// The planar face of a body whose normal matches, farthest along the normal
    FaceWithNormal {
        /// Body name; the most recent body when omitted
        #[serde(default)]
        body: Option<String>,
        normal: Vec3,
    },
}

/// One modeling step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Start a new sketch; following drawing steps go into it
    Sketch { name: String, plane: PlaneRef },
    /// Axis-aligned rectangle from two opposite corners
    TwoPointRectangle { corner1: Vec2, corner2: Vec2 },
    /// Circle by center and radius
    Circle { center: Vec2, radius: f32 },
    /// Line segment
    Line { start: Vec2, end: Vec2 },
    /// Counter-clockwise arc from `start` to `end`
    Arc { center: Vec2, start: Vec2, end: Vec2 },
    /// Extrude profiles of the active sketch
    Extrude {
        name: String,
        #[serde(default)]
        profiles: ProfileSelection,
        distance: f32,
        #[serde(default)]
        direction: ExtrudeDirection,
        #[serde(default)]
        operation: BooleanOp,
        /// Body name for join/cut/intersect; the most recent body when omitted
        #[serde(default)]
        target: Option<String>,
    },
    /// Constant-radius fillet
    Fillet {
        #[serde(default)]
        name: String,
        #[serde(default)]
        body: Option<String>,
        radius: f32,
        #[serde(default)]
        edges: EdgeSelection,
    },
    /// Equal-distance chamfer
    Chamfer {
        #[serde(default)]
        name: String,
        #[serde(default)]
        body: Option<String>,
        distance: f32,
        #[serde(default)]
        edges: EdgeSelection,
    },
}

impl Step {
    /// Short name of the step kind
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Sketch { .. } => "Sketch",
            Step::TwoPointRectangle { .. } => "TwoPointRectangle",
            Step::Circle { .. } => "Circle",
            Step::Line { .. } => "Line",
            Step::Arc { .. } => "Arc",
            Step::Extrude { .. } => "Extrude",
            Step::Fillet { .. } => "Fillet",
            Step::Chamfer { .. } => "Chamfer",
        }
    }
}

/// A named modeling script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Script name
    pub name: String,
    /// What the script builds
    #[serde(default)]
    pub description: String,
    /// Message reported when every step succeeds
    pub success_message: String,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from RON
    pub fn from_ron(content: &str) -> Result<Self, ScriptError> {
        ron::from_str(content).map_err(|e| ScriptError::Deserialize(e.to_string()))
    }

    /// Parse a script from JSON
    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(content).map_err(|e| ScriptError::Deserialize(e.to_string()))
    }

    /// Serialize the script as pretty RON
    pub fn to_ron(&self) -> Result<String, ScriptError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScriptError::Serialize(e.to_string()))
    }

    /// Load a script file; `.json` files are read as JSON, everything else as RON
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ScriptError::Io(e.to_string()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_ron(&content),
        }
    }
}

/// Geometry and mesh of one body after a run
#[derive(Debug, Clone)]
pub struct BodyReport {
    /// Body id (the id of the feature that created it)
    pub id: Uuid,
    /// Body name
    pub name: String,
    /// Tessellated geometry
    pub mesh: TessellatedMesh,
}

impl BodyReport {
    /// Enclosed volume
    pub fn volume(&self) -> f32 {
        self.mesh.volume()
    }
}

/// Result of a successful script run
#[derive(Debug, Clone)]
pub struct ScriptReport {
    /// Name of the script
    pub script: String,
    /// The script's success message
    pub message: String,
    /// Resulting bodies in creation order
    pub bodies: Vec<BodyReport>,
    /// Feature history built by the run
    pub history: FeatureHistory,
}

impl ScriptReport {
    /// All bodies merged into one mesh
    pub fn combined_mesh(&self) -> TessellatedMesh {
        let mut mesh = TessellatedMesh::new();
        for body in &self.bodies {
            mesh.merge(&body.mesh);
        }
        mesh
    }
}

/// Mutable state of a run
#[derive(Default)]
struct RunState {
    history: FeatureHistory,
    sketch: Option<Uuid>,
    current_body: Option<Uuid>,
    names: HashMap<String, Uuid>,
}

impl RunState {
    fn body(&self, name: Option<&str>) -> Result<Uuid, StepError> {
        match name {
            Some(name) => self
                .names
                .get(name)
                .copied()
                .ok_or_else(|| StepError::UnknownBody(name.to_string())),
            None => self.current_body.ok_or(StepError::NoBody),
        }
    }

    fn sketch_mut(&mut self) -> Result<&mut Sketch, StepError> {
        let id = self.sketch.ok_or(StepError::NoActiveSketch)?;
        self.history
            .get_sketch_mut(id)
            .ok_or(StepError::NoActiveSketch)
    }

    fn resolve_plane(
        &self,
        kernel: &dyn CadKernel,
        plane: &PlaneRef,
    ) -> Result<SketchPlane, StepError> {
        match plane {
            PlaneRef::Xy => Ok(SketchPlane::xy()),
            PlaneRef::Xz => Ok(SketchPlane::xz()),
            PlaneRef::Yz => Ok(SketchPlane::yz()),
            PlaneRef::Offset { base, distance } => {
                Ok(self.resolve_plane(kernel, base)?.offset(*distance))
            }
            PlaneRef::FaceWithNormal { body, normal } => {
                let body_id = self.body(body.as_deref())?;
                let solid = self
                    .history
                    .get_body(body_id)
                    .and_then(|b| b.solid.clone())
                    .ok_or(StepError::NoBody)?;
                let normal = normal.normalize_or_zero();

                kernel
                    .get_faces(&solid)?
                    .into_iter()
                    .filter(|f| f.kind == FaceKind::Planar && f.normal.dot(normal) > 1.0 - 1e-3)
                    .max_by(|a, b| a.center.dot(normal).total_cmp(&b.center.dot(normal)))
                    .and_then(|face| SketchPlane::from_face(&face))
                    .ok_or(StepError::NoMatchingFace(normal))
            }
        }
    }

    fn apply(&mut self, kernel: &dyn CadKernel, step: &Step) -> Result<(), StepError> {
        match step {
            Step::Sketch { name, plane } => {
                let plane = self.resolve_plane(kernel, plane)?;
                let id = self.history.add_sketch(Sketch::new(name.clone(), plane));
                self.sketch = Some(id);
            }
            Step::TwoPointRectangle { corner1, corner2 } => {
                self.sketch_mut()?.add_two_point_rectangle(*corner1, *corner2)?;
            }
            Step::Circle { center, radius } => {
                self.sketch_mut()?
                    .add_circle_by_center_radius(*center, *radius)?;
            }
            Step::Line { start, end } => {
                self.sketch_mut()?.add_line_by_points(*start, *end)?;
            }
            Step::Arc { center, start, end } => {
                self.sketch_mut()?.add_arc_by_center(*center, *start, *end)?;
            }
            Step::Extrude {
                name,
                profiles,
                distance,
                direction,
                operation,
                target,
            } => {
                let sketch_id = self.sketch.ok_or(StepError::NoActiveSketch)?;
                let target_body = match operation {
                    BooleanOp::New => None,
                    _ => Some(self.body(target.as_deref())?),
                };
                let feature = Feature::extrude_with_boolean(
                    name.clone(),
                    sketch_id,
                    *distance,
                    *direction,
                    *operation,
                    target_body,
                )
                .with_profiles(*profiles);

                let body = self.history.apply_feature(feature, kernel)?;
                if *operation == BooleanOp::New {
                    self.names.insert(name.clone(), body);
                }
                self.current_body = Some(body);
            }
            Step::Fillet {
                name,
                body,
                radius,
                edges,
            } => {
                let body_id = self.body(body.as_deref())?;
                let name = if name.is_empty() { "Fillet" } else { name.as_str() };
                let feature = Feature::fillet(name, body_id, edges.clone(), *radius);
                self.current_body = Some(self.history.apply_feature(feature, kernel)?);
            }
            Step::Chamfer {
                name,
                body,
                distance,
                edges,
            } => {
                let body_id = self.body(body.as_deref())?;
                let name = if name.is_empty() { "Chamfer" } else { name.as_str() };
                let feature = Feature::chamfer(name, body_id, edges.clone(), *distance);
                self.current_body = Some(self.history.apply_feature(feature, kernel)?);
            }
        }
        Ok(())
    }
}

/// Runs scripts against a kernel
pub struct ScriptRunner<'a> {
    kernel: &'a dyn CadKernel,
}

impl<'a> ScriptRunner<'a> {
    /// Create a runner using the given kernel
    pub fn new(kernel: &'a dyn CadKernel) -> Self {
        Self { kernel }
    }

    /// Run every step in order, stopping at the first failure
    pub fn run(&self, script: &Script) -> Result<ScriptReport, ScriptError> {
        tracing::info!(
            "Running script '{}' ({} steps)",
            script.name,
            script.steps.len()
        );

        let mut state = RunState::default();
        for (index, step) in script.steps.iter().enumerate() {
            tracing::debug!("Step {}: {}", index, step.kind());
            state
                .apply(self.kernel, step)
                .map_err(|source| ScriptError::Step {
                    index,
                    kind: step.kind(),
                    source,
                })?;
        }

        let mut bodies = Vec::new();
        for body in state.history.ordered_bodies() {
            let Some(solid) = &body.solid else {
                continue;
            };
            let mesh = self
                .kernel
                .tessellate(solid, 0.0)
                .map_err(|e| ScriptError::Step {
                    index: script.steps.len(),
                    kind: "Tessellate",
                    source: e.into(),
                })?;
            bodies.push(BodyReport {
                id: body.id,
                name: body.name.clone(),
                mesh,
            });
        }

        tracing::info!("{}", script.success_message);
        Ok(ScriptReport {
            script: script.name.clone(),
            message: script.success_message.clone(),
            bodies,
            history: state.history,
        })
    }

    /// Run a built-in script by name
    pub fn run_builtin(&self, name: &str) -> Result<ScriptReport, ScriptError> {
        let script = builtin(name).ok_or_else(|| ScriptError::UnknownScript(name.to_string()))?;
        self.run(&script)
    }
}
