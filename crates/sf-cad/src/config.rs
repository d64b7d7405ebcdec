//! Kernel configuration
//!
//! Tolerances and discretization settings shared by the profile resolver,
//! the layered kernel and the tessellator. Loaded from RON files by the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Geometric tolerances and discretization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Distance below which two points are considered coincident (mm)
    pub linear_tolerance: f32,
    /// Maximum deviation between an arc and its chords (mm)
    pub chord_tolerance: f32,
    /// Minimum number of segments used for a full circle
    pub min_circle_segments: u32,
    /// Maximum number of segments used for a full circle
    pub max_circle_segments: u32,
    /// Maximum number of cross-sections along a quarter-circle fillet
    pub max_blend_steps: u32,
}

impl KernelConfig {
    /// Default configuration, usable in const contexts
    pub const DEFAULT: KernelConfig = KernelConfig {
        linear_tolerance: 1e-4,
        chord_tolerance: 0.01,
        min_circle_segments: 16,
        max_circle_segments: 256,
        max_blend_steps: 16,
    };

    /// Load a configuration from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_ron(&text)
    }

    /// Parse a configuration from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: KernelConfig =
            ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.linear_tolerance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "linear_tolerance",
                reason: "must be positive".into(),
            });
        }
        if !(self.chord_tolerance > 0.0) {
            return Err(ConfigError::Invalid {
                field: "chord_tolerance",
                reason: "must be positive".into(),
            });
        }
        if self.min_circle_segments < 3 {
            return Err(ConfigError::Invalid {
                field: "min_circle_segments",
                reason: "must be at least 3".into(),
            });
        }
        if self.max_circle_segments < self.min_circle_segments {
            return Err(ConfigError::Invalid {
                field: "max_circle_segments",
                reason: "must not be smaller than min_circle_segments".into(),
            });
        }
        if self.max_blend_steps < 1 {
            return Err(ConfigError::Invalid {
                field: "max_blend_steps",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Number of chords used to approximate an arc of the given radius and sweep
    pub fn arc_segments(&self, radius: f32, sweep: f32) -> usize {
        let fraction = (sweep.abs() / std::f32::consts::TAU).clamp(0.0, 1.0);
        let min = ((self.min_circle_segments as f32 * fraction).ceil() as usize).max(1);
        let max = ((self.max_circle_segments as f32 * fraction).ceil() as usize).max(min);

        if radius <= self.chord_tolerance {
            return min;
        }

        // Chord sagitta: r * (1 - cos(step / 2)) <= tolerance
        let step = 2.0 * (1.0 - self.chord_tolerance / radius).acos();
        if step <= f32::EPSILON {
            return max;
        }
        ((sweep.abs() / step).ceil() as usize).clamp(min, max)
    }

    /// Number of cross-sections along a quarter-circle blend of the given radius
    pub fn blend_steps(&self, radius: f32) -> usize {
        let quarter = std::f32::consts::FRAC_PI_2;
        let segments = self.arc_segments(radius, quarter);
        segments.clamp(2, self.max_blend_steps.max(2) as usize)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_arc_segments_bounds() {
        let config = KernelConfig::default();
        // Tiny circle: minimum count
        assert_eq!(config.arc_segments(0.001, std::f32::consts::TAU), 16);
        // Huge circle: capped
        assert_eq!(config.arc_segments(10_000.0, std::f32::consts::TAU), 256);
        // Half circle uses half the bounds
        let half = config.arc_segments(10_000.0, std::f32::consts::PI);
        assert_eq!(half, 128);
    }

    #[test]
    fn test_from_ron_partial() {
        let config = KernelConfig::from_ron("(chord_tolerance: 0.05)").unwrap();
        assert_eq!(config.chord_tolerance, 0.05);
        assert_eq!(config.min_circle_segments, 16);
    }

    #[test]
    fn test_from_ron_rejects_invalid() {
        let result = KernelConfig::from_ron("(min_circle_segments: 2)");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
