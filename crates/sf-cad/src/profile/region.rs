//! Planar regions bounded by non-crossing loops
//!
//! A region uses the even-odd rule: a point is inside when an odd number of
//! loops enclose it. Loops are stored with material on their left, so outer
//! boundaries run counter-clockwise and holes clockwise.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::shape::Loop;
use crate::config::KernelConfig;

/// Region algebra errors
#[derive(Debug, Clone, Error)]
pub enum RegionError {
    #[error("Profile loops cross each other")]
    CrossingLoops,
}

/// Set operation between two regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionOp {
    Union,
    Difference,
    Intersection,
}

impl RegionOp {
    fn apply(self, a: bool, b: bool) -> bool {
        match self {
            RegionOp::Union => a || b,
            RegionOp::Difference => a && !b,
            RegionOp::Intersection => a && b,
        }
    }
}

/// One outer loop with the holes directly inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonIndices {
    pub outer: usize,
    pub holes: Vec<usize>,
}

/// A planar region bounded by non-crossing loops
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    loops: Vec<Loop>,
}

impl Region {
    /// Create an empty region
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a region from loops, fixing their orientation by nesting depth
    pub fn from_loops(loops: Vec<Loop>, config: &KernelConfig) -> Self {
        let parents = nesting_parents(&loops, config);
        let depths = nesting_depths(&parents);
        let loops = loops
            .into_iter()
            .zip(depths)
            .map(|(l, depth)| l.oriented(depth % 2 == 0))
            .collect();
        Self { loops }
    }

    /// Build a region from loops that are already oriented by nesting depth
    pub(crate) fn from_oriented(loops: Vec<Loop>) -> Self {
        Self { loops }
    }

    /// Build a single-loop region
    pub fn from_loop(outer: Loop) -> Self {
        Self {
            loops: vec![outer.oriented(true)],
        }
    }

    /// The boundary loops
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Check if the region has no boundary
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Enclosed area (holes subtracted)
    pub fn area(&self) -> f32 {
        self.loops.iter().map(Loop::signed_area).sum()
    }

    /// Even-odd point membership
    pub fn contains_point(&self, point: Vec2, config: &KernelConfig) -> bool {
        self.loops
            .iter()
            .filter(|l| l.contains_point(point, config))
            .count()
            % 2
            == 1
    }

    /// Parent loop index of every loop (None for outermost loops)
    pub fn parents(&self, config: &KernelConfig) -> Vec<Option<usize>> {
        nesting_parents(&self.loops, config)
    }

    /// Group loops into outer boundaries with their direct holes
    pub fn polygons(&self, config: &KernelConfig) -> Vec<PolygonIndices> {
        let parents = self.parents(config);
        let depths = nesting_depths(&parents);
        (0..self.loops.len())
            .filter(|&i| depths[i] % 2 == 0)
            .map(|outer| PolygonIndices {
                outer,
                holes: (0..self.loops.len())
                    .filter(|&j| parents[j] == Some(outer))
                    .collect(),
            })
            .collect()
    }

    /// Geometric equality of two regions
    pub fn same_geometry(&self, other: &Region, tol: f32) -> bool {
        self.loops.len() == other.loops.len()
            && self
                .loops
                .iter()
                .all(|a| other.loops.iter().any(|b| a.same_geometry(b, tol)))
    }

    /// Apply a rigid 2D transform
    pub fn map(&self, f: &impl Fn(Vec2) -> Vec2, reflect: bool, config: &KernelConfig) -> Self {
        Self::from_loops(self.loops.iter().map(|l| l.map(f, reflect)).collect(), config)
    }

    /// Combine with another region
    ///
    /// Loops of the two operands must not cross; identical loops are merged.
    pub fn combine(
        &self,
        other: &Region,
        op: RegionOp,
        config: &KernelConfig,
    ) -> Result<Region, RegionError> {
        // (loop, bounds a cell of self, bounds a cell of other)
        let mut entries: Vec<(Loop, bool, bool)> =
            self.loops.iter().map(|l| (l.clone(), true, false)).collect();
        for l in &other.loops {
            match entries
                .iter_mut()
                .find(|(existing, in_a, _)| *in_a && existing.same_geometry(l, config.linear_tolerance))
            {
                Some(entry) => entry.2 = true,
                None => entries.push((l.clone(), false, true)),
            }
        }

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let from_different_operands =
                    (entries[i].1 && entries[j].2) || (entries[i].2 && entries[j].1);
                if from_different_operands && entries[i].0.crosses(&entries[j].0, config) {
                    return Err(RegionError::CrossingLoops);
                }
            }
        }

        let loops: Vec<Loop> = entries.iter().map(|e| e.0.clone()).collect();
        let parents = nesting_parents(&loops, config);

        // Membership of the cell just inside each loop
        let membership: Vec<bool> = (0..loops.len())
            .map(|i| {
                let (mut in_a, mut in_b) = (false, false);
                let mut cursor = Some(i);
                while let Some(k) = cursor {
                    in_a ^= entries[k].1;
                    in_b ^= entries[k].2;
                    cursor = parents[k];
                }
                op.apply(in_a, in_b)
            })
            .collect();

        let kept = loops
            .into_iter()
            .enumerate()
            .filter(|(i, _)| {
                let outside = parents[*i].map(|p| membership[p]).unwrap_or(false);
                membership[*i] != outside
            })
            .map(|(_, l)| l)
            .collect();

        Ok(Region::from_loops(kept, config))
    }
}

/// For every loop, the smallest other loop that encloses it
pub fn nesting_parents(loops: &[Loop], config: &KernelConfig) -> Vec<Option<usize>> {
    let areas: Vec<f32> = loops.iter().map(Loop::area).collect();
    let polylines: Vec<Vec<Vec2>> = loops.iter().map(|l| l.polyline(config)).collect();

    (0..loops.len())
        .map(|i| {
            let sample = loops[i].sample_point();
            (0..loops.len())
                .filter(|&j| {
                    j != i
                        && areas[j] > areas[i]
                        && super::shape::point_in_polygon(sample, &polylines[j])
                })
                .min_by(|&a, &b| areas[a].total_cmp(&areas[b]))
        })
        .collect()
}

/// Nesting depth of every loop given its parent links
pub fn nesting_depths(parents: &[Option<usize>]) -> Vec<usize> {
    (0..parents.len())
        .map(|i| {
            let mut depth = 0;
            let mut cursor = parents[i];
            while let Some(p) = cursor {
                depth += 1;
                cursor = parents[p];
            }
            depth
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn config() -> KernelConfig {
        KernelConfig::default()
    }

    fn plate_with_hole() -> Region {
        Region::from_loops(
            vec![
                Loop::circle(Vec2::ZERO, 3.0),
                Loop::rectangle(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0)),
            ],
            &config(),
        )
    }

    #[test]
    fn test_from_loops_orients_holes() {
        let region = plate_with_hole();
        assert!(!region.loops()[0].is_ccw());
        assert!(region.loops()[1].is_ccw());
        assert_relative_eq!(region.area(), 200.0 - PI * 9.0, epsilon = 1e-3);
    }

    #[test]
    fn test_polygons_group_holes() {
        let region = plate_with_hole();
        let polygons = region.polygons(&config());
        assert_eq!(
            polygons,
            vec![PolygonIndices {
                outer: 1,
                holes: vec![0]
            }]
        );
    }

    #[test]
    fn test_difference_adds_hole() {
        let disk = Region::from_loop(Loop::circle(Vec2::ZERO, 25.0));
        let eye = Region::from_loop(Loop::circle(Vec2::new(10.0, 10.0), 2.5));
        let result = disk.combine(&eye, RegionOp::Difference, &config()).unwrap();
        assert_eq!(result.loops().len(), 2);
        assert_relative_eq!(result.area(), PI * (625.0 - 6.25), epsilon = 1e-2);
    }

    #[test]
    fn test_union_of_ring_and_core_is_disk() {
        let c = config();
        let ring = Region::from_loops(
            vec![Loop::circle(Vec2::ZERO, 25.0), Loop::circle(Vec2::ZERO, 20.0)],
            &c,
        );
        let core = Region::from_loop(Loop::circle(Vec2::ZERO, 20.0));
        let disk = ring.combine(&core, RegionOp::Union, &c).unwrap();
        assert_eq!(disk.loops().len(), 1);
        assert_relative_eq!(disk.area(), PI * 625.0, epsilon = 1e-2);
    }

    #[test]
    fn test_intersection_of_disjoint_is_empty() {
        let c = config();
        let a = Region::from_loop(Loop::circle(Vec2::ZERO, 1.0));
        let b = Region::from_loop(Loop::circle(Vec2::new(5.0, 0.0), 1.0));
        assert!(a.combine(&b, RegionOp::Intersection, &c).unwrap().is_empty());
    }

    #[test]
    fn test_difference_swallowing_hole() {
        let c = config();
        let plate = plate_with_hole();
        let big_cut = Region::from_loop(Loop::circle(Vec2::ZERO, 4.0));
        let result = plate.combine(&big_cut, RegionOp::Difference, &c).unwrap();
        assert_eq!(result.loops().len(), 2);
        assert_relative_eq!(result.area(), 200.0 - PI * 16.0, epsilon = 1e-2);
    }

    #[test]
    fn test_crossing_loops_rejected() {
        let c = config();
        let a = Region::from_loop(Loop::circle(Vec2::ZERO, 2.0));
        let b = Region::from_loop(Loop::circle(Vec2::new(3.0, 0.0), 2.0));
        assert!(matches!(
            a.combine(&b, RegionOp::Union, &c),
            Err(RegionError::CrossingLoops)
        ));
    }
}
