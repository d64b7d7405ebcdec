//! Sketch-Based Solid Modeling
//!
//! This crate provides:
//! - 2D sketches of lines, arcs and circles on planes
//! - Profile resolution and planar region algebra
//! - A layered solid kernel (extrude, boolean, fillet, chamfer, tessellation)
//! - Feature operations and a parametric history
//! - Modeling scripts with built-in examples, and STL export

pub mod config;
pub mod export;
pub mod feature;
pub mod history;
pub mod kernel;
pub mod profile;
pub mod script;
pub mod sketch;

// Re-exports for convenience
pub use config::{ConfigError, KernelConfig};
pub use export::{ExportError, load_stl, save_stl};
pub use feature::{
    BooleanOp, CadBody, EdgeSelection, ExtrudeDirection, Feature, FeatureError, FeatureOutput,
    FeatureResult, ProfileSelection,
};
pub use history::{CadData, FeatureHistory, HistoryEntry};
pub use kernel::{
    BooleanType, CadError, CadKernel, CadResult, EdgeId, EdgeInfo, EdgeKind, FaceId, FaceInfo,
    FaceKind, Frame, LayeredKernel, NullKernel, Solid, TessellatedMesh, default_kernel,
};
pub use profile::{Loop, Profile, Region, RegionError, RegionOp, Segment};
pub use script::{
    BUILTIN_NAMES, BodyReport, PlaneRef, Script, ScriptError, ScriptReport, ScriptRunner, Step,
    StepError, builtin, builtins,
};
pub use sketch::{Sketch, SketchEntity, SketchError, SketchPlane, SketchResult};
