//! Closed loops of segments

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::curve::{Segment, is_sharp, segments_cross};
use crate::config::KernelConfig;

/// A loop discretized into a closed polyline
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    /// Polyline points (closing edge is implicit)
    pub points: Vec<Vec2>,
    /// Index of the first point of each loop segment
    pub seg_starts: Vec<usize>,
}

impl Ring {
    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the ring has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points covered by segment `seg`, including the shared end point
    pub fn segment_points(&self, seg: usize) -> Vec<Vec2> {
        let n = self.points.len();
        let start = self.seg_starts[seg];
        let end = if seg + 1 < self.seg_starts.len() {
            self.seg_starts[seg + 1]
        } else {
            n
        };
        (start..=end).map(|i| self.points[i % n]).collect()
    }
}

/// A closed chain of segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    segments: Vec<Segment>,
}

impl Loop {
    /// Create a loop from segments (end of each meets start of the next)
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A full circle, counter-clockwise
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::new(vec![Segment::circle(center, radius)])
    }

    /// An axis-aligned rectangle from two opposite corners, counter-clockwise
    pub fn rectangle(corner1: Vec2, corner2: Vec2) -> Self {
        let min = corner1.min(corner2);
        let max = corner1.max(corner2);
        Self::polygon(&[
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ])
    }

    /// A closed polygon through the given points
    pub fn polygon(points: &[Vec2]) -> Self {
        let n = points.len();
        Self::new(
            (0..n)
                .map(|i| Segment::line(points[i], points[(i + 1) % n]))
                .collect(),
        )
    }

    /// The segments of this loop
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the loop has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Signed area (positive when counter-clockwise)
    pub fn signed_area(&self) -> f32 {
        self.segments.iter().map(Segment::area_term).sum()
    }

    /// Unsigned enclosed area
    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    /// Whether the loop runs counter-clockwise
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Total boundary length
    pub fn perimeter(&self) -> f32 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// The loop traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        Self::new(self.segments.iter().rev().map(Segment::reversed).collect())
    }

    /// This loop with the requested orientation
    pub fn oriented(self, ccw: bool) -> Self {
        if self.is_ccw() == ccw {
            self
        } else {
            self.reversed()
        }
    }

    /// A point on the loop used for containment tests
    pub fn sample_point(&self) -> Vec2 {
        self.segments
            .first()
            .map(|s| s.point_at(0.5))
            .unwrap_or(Vec2::ZERO)
    }

    /// Discretize into a closed polyline
    pub fn ring(&self, config: &KernelConfig) -> Ring {
        let mut points = Vec::new();
        let mut seg_starts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            seg_starts.push(points.len());
            points.extend(segment.tessellate(config));
        }
        Ring { points, seg_starts }
    }

    /// Discretize into a closed polyline, points only
    pub fn polyline(&self, config: &KernelConfig) -> Vec<Vec2> {
        self.ring(config).points
    }

    /// Point-in-loop test (boundary points may go either way)
    pub fn contains_point(&self, point: Vec2, config: &KernelConfig) -> bool {
        point_in_polygon(point, &self.polyline(config))
    }

    /// Indices of joins with a visible corner
    ///
    /// Join `j` sits between the end of segment `j - 1` and the start of segment `j`.
    pub fn sharp_joins(&self) -> Vec<usize> {
        let n = self.segments.len();
        (0..n)
            .filter(|&j| {
                let prev = &self.segments[(j + n - 1) % n];
                is_sharp(prev.end_tangent(), self.segments[j].start_tangent())
            })
            .collect()
    }

    /// Whether the two loops' boundaries cross
    pub fn crosses(&self, other: &Loop, config: &KernelConfig) -> bool {
        let a = self.polyline(config);
        let b = other.polyline(config);
        let (a_min, a_max) = bounds(&a);
        let (b_min, b_max) = bounds(&b);
        if a_max.x < b_min.x || b_max.x < a_min.x || a_max.y < b_min.y || b_max.y < a_min.y {
            return false;
        }

        for i in 0..a.len() {
            let a0 = a[i];
            let a1 = a[(i + 1) % a.len()];
            for j in 0..b.len() {
                if segments_cross(a0, a1, b[j], b[(j + 1) % b.len()]) {
                    return true;
                }
            }
        }
        false
    }

    /// Geometric equality ignoring start segment and direction
    pub fn same_geometry(&self, other: &Loop, tol: f32) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }
        self.matches_cyclic(other, tol) || self.matches_cyclic(&other.reversed(), tol)
    }

    fn matches_cyclic(&self, other: &Loop, tol: f32) -> bool {
        let n = self.segments.len();
        (0..n).any(|offset| {
            (0..n).all(|i| self.segments[i].approx_eq(&other.segments[(i + offset) % n], tol))
        })
    }

    /// Apply a rigid 2D transform
    pub fn map(&self, f: &impl Fn(Vec2) -> Vec2, reflect: bool) -> Self {
        Self::new(self.segments.iter().map(|s| s.map(f, reflect)).collect())
    }
}

/// Axis-aligned bounds of a point set
pub fn bounds(points: &[Vec2]) -> (Vec2, Vec2) {
    points.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    )
}

/// Even-odd ray casting test against a closed polyline
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x = pj.x + (point.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed area of a closed polyline
pub fn polyline_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_orientation_and_area() {
        let rect = Loop::rectangle(Vec2::new(10.0, 5.0), Vec2::new(-10.0, -5.0));
        assert!(rect.is_ccw());
        assert_relative_eq!(rect.area(), 200.0, epsilon = 1e-4);
        assert_eq!(rect.sharp_joins(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_circle_has_no_sharp_joins() {
        let circle = Loop::circle(Vec2::ZERO, 3.0);
        assert!(circle.sharp_joins().is_empty());
        assert!(circle.reversed().sharp_joins().is_empty());
    }

    #[test]
    fn test_ring_segment_starts() {
        let config = KernelConfig::default();
        let rect = Loop::rectangle(Vec2::ZERO, Vec2::new(2.0, 1.0));
        let ring = rect.ring(&config);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.seg_starts, vec![0, 1, 2, 3]);
        assert_eq!(ring.segment_points(3), vec![Vec2::new(0.0, 1.0), Vec2::ZERO]);
    }

    #[test]
    fn test_contains_point() {
        let config = KernelConfig::default();
        let circle = Loop::circle(Vec2::ZERO, 3.0);
        assert!(circle.contains_point(Vec2::new(1.0, 1.0), &config));
        assert!(!circle.contains_point(Vec2::new(3.0, 3.0), &config));
    }

    #[test]
    fn test_same_geometry_ignores_start_and_direction() {
        let a = Loop::rectangle(Vec2::ZERO, Vec2::new(2.0, 1.0));
        let b = Loop::polygon(&[
            Vec2::new(2.0, 1.0),
            Vec2::new(2.0, 0.0),
            Vec2::ZERO,
            Vec2::new(0.0, 1.0),
        ]);
        assert!(a.same_geometry(&b, 1e-4));
        assert!(!a.same_geometry(&Loop::circle(Vec2::ZERO, 1.0), 1e-4));
    }

    #[test]
    fn test_crossing_circles() {
        let config = KernelConfig::default();
        let a = Loop::circle(Vec2::ZERO, 2.0);
        let b = Loop::circle(Vec2::new(3.0, 0.0), 2.0);
        let c = Loop::circle(Vec2::ZERO, 1.0);
        assert!(a.crosses(&b, &config));
        assert!(!a.crosses(&c, &config));
    }
}
