//! CAD Kernel Abstraction Layer
//!
//! Provides a trait-based abstraction over geometry kernels. The layered
//! kernel builds solids as stacks of extruded profile regions.

mod traits;

mod blend;
mod layered;
mod mesh;
mod solid;

pub use traits::*;

pub use layered::LayeredKernel;
