//! Profile Resolution
//!
//! Turns sketch curves into closed loops and profiles, and provides the
//! planar region algebra used by the kernel.

mod curve;
mod region;
mod shape;

use std::collections::HashSet;
use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::KernelConfig;
use crate::sketch::{Sketch, SketchEntity, SketchError, SketchResult};

pub use curve::{Segment, TANGENT_ANGLE_TOLERANCE, is_sharp, segments_cross};
pub use region::{PolygonIndices, Region, RegionError, RegionOp, nesting_depths, nesting_parents};
pub use shape::{Loop, Ring, bounds, point_in_polygon, polyline_area};

/// A closed region of a sketch: one outer loop minus the loops directly inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Outer boundary (counter-clockwise)
    pub outer: Loop,
    /// Holes (clockwise)
    pub holes: Vec<Loop>,
}

impl Profile {
    /// Enclosed area
    pub fn area(&self) -> f32 {
        self.outer.area() - self.holes.iter().map(Loop::area).sum::<f32>()
    }

    /// The profile as a region
    pub fn region(&self) -> Region {
        let mut loops = Vec::with_capacity(self.holes.len() + 1);
        loops.push(self.outer.clone().oriented(true));
        loops.extend(self.holes.iter().map(|h| h.clone().oriented(false)));
        Region::from_oriented(loops)
    }
}

/// A curve between two graph nodes, oriented from `from` to `to`
struct GraphEdge {
    from: usize,
    to: usize,
    segment: Segment,
}

/// Collect the closed loops formed by the sketch curves
///
/// Circles become single-segment loops. Lines and arcs are chained through
/// endpoints that coincide within the linear tolerance; chains that are open
/// or branch are skipped.
pub fn resolve_loops(sketch: &Sketch, config: &KernelConfig) -> SketchResult<Vec<Loop>> {
    let tol = config.linear_tolerance;
    let mut loops = Vec::new();
    let mut nodes: Vec<Vec2> = Vec::new();
    let mut edges: Vec<GraphEdge> = Vec::new();

    let node_at = |position: Vec2, nodes: &mut Vec<Vec2>| -> usize {
        match nodes.iter().position(|n| n.distance(position) <= tol) {
            Some(index) => index,
            None => {
                nodes.push(position);
                nodes.len() - 1
            }
        }
    };

    for entity in sketch.entities().iter().filter(|e| e.is_profile_curve()) {
        match entity {
            SketchEntity::Line { id, start, end, .. } => {
                let a = sketch.point_position(*start)?;
                let b = sketch.point_position(*end)?;
                if a.distance(b) <= tol {
                    tracing::warn!("Skipping zero-length line {}", id);
                    continue;
                }
                let from = node_at(a, &mut nodes);
                let to = node_at(b, &mut nodes);
                edges.push(GraphEdge {
                    from,
                    to,
                    segment: Segment::line(a, b),
                });
            }
            SketchEntity::Circle { id, center, radius, .. } => {
                if radius.is_nan() || *radius <= tol {
                    tracing::warn!("Skipping circle {} with radius {}", id, radius);
                    continue;
                }
                loops.push(Loop::circle(sketch.point_position(*center)?, *radius));
            }
            SketchEntity::Arc {
                id,
                center,
                start,
                end,
                ..
            } => {
                let c = sketch.point_position(*center)?;
                let s = sketch.point_position(*start)?;
                let e = sketch.point_position(*end)?;
                let radius = s.distance(c);
                if radius <= tol {
                    tracing::warn!("Skipping arc {} with zero radius", id);
                    continue;
                }
                let start_angle = (s - c).y.atan2((s - c).x);
                let end_angle = (e - c).y.atan2((e - c).x);
                let sweep = (end_angle - start_angle).rem_euclid(TAU);
                if s.distance(e) <= tol {
                    loops.push(Loop::new(vec![Segment::arc(c, radius, start_angle, TAU)]));
                    continue;
                }
                let from = node_at(s, &mut nodes);
                let to = node_at(e, &mut nodes);
                edges.push(GraphEdge {
                    from,
                    to,
                    segment: Segment::arc(c, radius, start_angle, sweep),
                });
            }
            SketchEntity::Point { .. } => {}
        }
    }

    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (index, edge) in edges.iter().enumerate() {
        incident[edge.from].push(index);
        incident[edge.to].push(index);
    }

    let mut visited = vec![false; edges.len()];
    for first in 0..edges.len() {
        if visited[first] {
            continue;
        }

        // Gather the connected component
        let mut component_edges = Vec::new();
        let mut component_nodes = HashSet::new();
        let mut stack = vec![first];
        visited[first] = true;
        while let Some(e) = stack.pop() {
            component_edges.push(e);
            for node in [edges[e].from, edges[e].to] {
                if component_nodes.insert(node) {
                    for &next in &incident[node] {
                        if !visited[next] {
                            visited[next] = true;
                            stack.push(next);
                        }
                    }
                }
            }
        }

        if component_nodes.iter().any(|&n| incident[n].len() != 2) {
            tracing::warn!(
                "Ignoring open or branching chain of {} curves in sketch '{}'",
                component_edges.len(),
                sketch.name
            );
            continue;
        }

        // Walk the cycle
        let start_node = edges[first].from;
        let mut segments = vec![edges[first].segment];
        let mut current_edge = first;
        let mut current_node = edges[first].to;
        while current_node != start_node {
            let next_edge = incident[current_node]
                .iter()
                .copied()
                .find(|&e| e != current_edge)
                .unwrap_or(current_edge);
            let edge = &edges[next_edge];
            if edge.from == current_node {
                segments.push(edge.segment);
                current_node = edge.to;
            } else {
                segments.push(edge.segment.reversed());
                current_node = edge.from;
            }
            current_edge = next_edge;
        }
        loops.push(Loop::new(segments));
    }

    Ok(loops)
}

/// Resolve the profiles of a sketch
///
/// Every loop bounds one profile: the loop minus the loops directly nested in
/// it. Profiles are ordered by nesting depth, then by decreasing area, so the
/// first profile is the outermost loop with its holes.
pub fn resolve_profiles(sketch: &Sketch, config: &KernelConfig) -> SketchResult<Vec<Profile>> {
    let mut loops: Vec<Loop> = Vec::new();
    for candidate in resolve_loops(sketch, config)? {
        if loops
            .iter()
            .any(|l| l.same_geometry(&candidate, config.linear_tolerance))
        {
            tracing::warn!("Ignoring duplicate loop in sketch '{}'", sketch.name);
            continue;
        }
        loops.push(candidate);
    }

    for i in 0..loops.len() {
        for j in (i + 1)..loops.len() {
            if loops[i].crosses(&loops[j], config) {
                return Err(SketchError::CrossingCurves);
            }
        }
    }

    let parents = nesting_parents(&loops, config);
    let depths = nesting_depths(&parents);

    let mut order: Vec<usize> = (0..loops.len()).collect();
    order.sort_by(|&a, &b| {
        depths[a]
            .cmp(&depths[b])
            .then(loops[b].area().total_cmp(&loops[a].area()))
    });

    let profiles = order
        .into_iter()
        .map(|i| Profile {
            outer: loops[i].clone().oriented(true),
            holes: (0..loops.len())
                .filter(|&j| parents[j] == Some(i))
                .map(|j| loops[j].clone().oriented(false))
                .collect(),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Resolved {} profiles from {} curves in sketch '{}'",
        profiles.len(),
        sketch.curve_count(),
        sketch.name
    );

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::SketchPlane;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn config() -> KernelConfig {
        KernelConfig::default()
    }

    #[test]
    fn test_rectangle_with_hole_profiles() {
        let mut sketch = Sketch::new("plate", SketchPlane::xy());
        sketch
            .add_two_point_rectangle(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0))
            .unwrap();
        sketch.add_circle_by_center_radius(Vec2::ZERO, 3.0).unwrap();

        let profiles = sketch.extract_profiles(&config()).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].holes.len(), 1);
        assert_relative_eq!(profiles[0].area(), 200.0 - 9.0 * PI, epsilon = 1e-3);
        assert!(profiles[1].holes.is_empty());
        assert_relative_eq!(profiles[1].area(), 9.0 * PI, epsilon = 1e-3);
    }

    #[test]
    fn test_separate_lines_are_chained() {
        let mut sketch = Sketch::new("triangle", SketchPlane::xy());
        sketch
            .add_line_by_points(Vec2::ZERO, Vec2::new(4.0, 0.0))
            .unwrap();
        // Drawn in the opposite direction on purpose
        sketch
            .add_line_by_points(Vec2::new(0.0, 3.0), Vec2::new(4.0, 0.0))
            .unwrap();
        sketch
            .add_line_by_points(Vec2::new(0.0, 3.0), Vec2::ZERO)
            .unwrap();

        let loops = resolve_loops(&sketch, &config()).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 3);
        assert_relative_eq!(loops[0].area(), 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_open_chain_is_ignored() {
        let mut sketch = Sketch::new("open", SketchPlane::xy());
        sketch
            .add_line_by_points(Vec2::ZERO, Vec2::new(4.0, 0.0))
            .unwrap();
        sketch
            .add_line_by_points(Vec2::new(4.0, 0.0), Vec2::new(4.0, 4.0))
            .unwrap();
        assert!(sketch.extract_profiles(&config()).unwrap().is_empty());
    }

    #[test]
    fn test_slot_from_lines_and_arcs() {
        let mut sketch = Sketch::new("slot", SketchPlane::xy());
        sketch
            .add_line_by_points(Vec2::new(-5.0, -2.0), Vec2::new(5.0, -2.0))
            .unwrap();
        sketch
            .add_arc_by_center(Vec2::new(5.0, 0.0), Vec2::new(5.0, -2.0), Vec2::new(5.0, 2.0))
            .unwrap();
        sketch
            .add_line_by_points(Vec2::new(5.0, 2.0), Vec2::new(-5.0, 2.0))
            .unwrap();
        sketch
            .add_arc_by_center(Vec2::new(-5.0, 0.0), Vec2::new(-5.0, 2.0), Vec2::new(-5.0, -2.0))
            .unwrap();

        let profiles = sketch.extract_profiles(&config()).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_relative_eq!(profiles[0].area(), 40.0 + 4.0 * PI, epsilon = 1e-3);
        assert!(profiles[0].outer.sharp_joins().is_empty());
    }

    #[test]
    fn test_smiley_profiles_ordered_by_area() {
        let mut sketch = Sketch::new("features", SketchPlane::xy());
        sketch
            .add_circle_by_center_radius(Vec2::new(-10.0, 10.0), 2.5)
            .unwrap();
        sketch
            .add_circle_by_center_radius(Vec2::new(0.0, -10.0), 7.5)
            .unwrap();
        sketch
            .add_circle_by_center_radius(Vec2::new(10.0, 10.0), 2.5)
            .unwrap();

        let profiles = sketch.extract_profiles(&config()).unwrap();
        assert_eq!(profiles.len(), 3);
        assert_relative_eq!(profiles[0].area(), PI * 56.25, epsilon = 1e-3);
    }

    #[test]
    fn test_crossing_circles_rejected() {
        let mut sketch = Sketch::new("venn", SketchPlane::xy());
        sketch.add_circle_by_center_radius(Vec2::ZERO, 2.0).unwrap();
        sketch
            .add_circle_by_center_radius(Vec2::new(3.0, 0.0), 2.0)
            .unwrap();
        assert!(matches!(
            sketch.extract_profiles(&config()),
            Err(SketchError::CrossingCurves)
        ));
    }

    #[test]
    fn test_duplicate_circle_ignored() {
        let mut sketch = Sketch::new("dup", SketchPlane::xy());
        sketch.add_circle_by_center_radius(Vec2::ZERO, 2.0).unwrap();
        sketch.add_circle_by_center_radius(Vec2::ZERO, 2.0).unwrap();
        assert_eq!(sketch.extract_profiles(&config()).unwrap().len(), 1);
    }
}
