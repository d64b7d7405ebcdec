//! Curve primitives for profile loops

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::KernelConfig;

/// Angle (radians) below which two tangents are treated as continuous
pub const TANGENT_ANGLE_TOLERANCE: f32 = 1e-3;

/// A boundary segment of a profile loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Straight line from start to end
    Line { start: Vec2, end: Vec2 },
    /// Circular arc; positive sweep runs counter-clockwise
    Arc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        sweep: f32,
    },
}

impl Segment {
    /// Create a line segment
    pub fn line(start: Vec2, end: Vec2) -> Self {
        Segment::Line { start, end }
    }

    /// Create an arc segment
    pub fn arc(center: Vec2, radius: f32, start_angle: f32, sweep: f32) -> Self {
        Segment::Arc {
            center,
            radius,
            start_angle,
            sweep,
        }
    }

    /// Create a full counter-clockwise circle
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::arc(center, radius, 0.0, TAU)
    }

    /// Start point of the segment
    pub fn start_point(&self) -> Vec2 {
        match *self {
            Segment::Line { start, .. } => start,
            Segment::Arc {
                center,
                radius,
                start_angle,
                ..
            } => center + Vec2::from_angle(start_angle) * radius,
        }
    }

    /// End point of the segment
    pub fn end_point(&self) -> Vec2 {
        match *self {
            Segment::Line { end, .. } => end,
            Segment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => center + Vec2::from_angle(start_angle + sweep) * radius,
        }
    }

    /// Point at parameter `t` in [0, 1]
    pub fn point_at(&self, t: f32) -> Vec2 {
        match *self {
            Segment::Line { start, end } => start.lerp(end, t),
            Segment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => center + Vec2::from_angle(start_angle + sweep * t) * radius,
        }
    }

    /// Unit direction of travel at the start
    pub fn start_tangent(&self) -> Vec2 {
        match *self {
            Segment::Line { start, end } => (end - start).normalize_or_zero(),
            Segment::Arc {
                start_angle, sweep, ..
            } => Vec2::from_angle(start_angle).perp() * sweep.signum(),
        }
    }

    /// Unit direction of travel at the end
    pub fn end_tangent(&self) -> Vec2 {
        match *self {
            Segment::Line { start, end } => (end - start).normalize_or_zero(),
            Segment::Arc {
                start_angle, sweep, ..
            } => Vec2::from_angle(start_angle + sweep).perp() * sweep.signum(),
        }
    }

    /// Unit direction of travel at parameter `t` in [0, 1]
    pub fn tangent_at(&self, t: f32) -> Vec2 {
        match *self {
            Segment::Line { start, end } => (end - start).normalize_or_zero(),
            Segment::Arc {
                start_angle, sweep, ..
            } => Vec2::from_angle(start_angle + sweep * t).perp() * sweep.signum(),
        }
    }

    /// Arc length of the segment
    pub fn length(&self) -> f32 {
        match *self {
            Segment::Line { start, end } => (end - start).length(),
            Segment::Arc { radius, sweep, .. } => radius * sweep.abs(),
        }
    }

    /// Whether this segment closes on itself (a full circle)
    pub fn is_closed(&self) -> bool {
        matches!(*self, Segment::Arc { sweep, .. } if sweep.abs() >= TAU - 1e-5)
    }

    /// The same segment traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        match *self {
            Segment::Line { start, end } => Segment::Line {
                start: end,
                end: start,
            },
            Segment::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Segment::Arc {
                center,
                radius,
                start_angle: start_angle + sweep,
                sweep: -sweep,
            },
        }
    }

    /// Contribution of this segment to the signed (shoelace) area of a loop
    pub fn area_term(&self) -> f32 {
        match *self {
            Segment::Line { start, end } => 0.5 * start.perp_dot(end),
            Segment::Arc { center, radius, sweep, .. } => {
                let chord = self.end_point() - self.start_point();
                0.5 * (center.perp_dot(chord) + radius * radius * sweep)
            }
        }
    }

    /// Sample points from the start, excluding the end point
    pub fn tessellate(&self, config: &KernelConfig) -> Vec<Vec2> {
        match *self {
            Segment::Line { start, .. } => vec![start],
            Segment::Arc { radius, sweep, .. } => {
                let n = config.arc_segments(radius, sweep);
                (0..n).map(|i| self.point_at(i as f32 / n as f32)).collect()
            }
        }
    }

    /// Apply a rigid 2D transform; `reflect` flips the orientation of arcs
    pub fn map(&self, f: &impl Fn(Vec2) -> Vec2, reflect: bool) -> Self {
        match *self {
            Segment::Line { start, end } => Segment::Line {
                start: f(start),
                end: f(end),
            },
            Segment::Arc { center, radius, sweep, .. } => {
                let new_center = f(center);
                let new_start = f(self.start_point()) - new_center;
                Segment::Arc {
                    center: new_center,
                    radius,
                    start_angle: new_start.y.atan2(new_start.x),
                    sweep: if reflect { -sweep } else { sweep },
                }
            }
        }
    }

    /// Geometric equality within `tol`, respecting direction
    pub fn approx_eq(&self, other: &Segment, tol: f32) -> bool {
        match (*self, *other) {
            (Segment::Line { start: a0, end: a1 }, Segment::Line { start: b0, end: b1 }) => {
                a0.distance(b0) <= tol && a1.distance(b1) <= tol
            }
            (
                Segment::Arc {
                    center: c0,
                    radius: r0,
                    sweep: s0,
                    ..
                },
                Segment::Arc {
                    center: c1,
                    radius: r1,
                    sweep: s1,
                    ..
                },
            ) => {
                if c0.distance(c1) > tol || (r0 - r1).abs() > tol || s0.signum() != s1.signum() {
                    return false;
                }
                if self.is_closed() && other.is_closed() {
                    return true;
                }
                self.start_point().distance(other.start_point()) <= tol
                    && self.end_point().distance(other.end_point()) <= tol
                    && (s0 - s1).abs() <= 1e-3
            }
            _ => false,
        }
    }
}

/// Whether two tangents meet at a visible corner
pub fn is_sharp(incoming: Vec2, outgoing: Vec2) -> bool {
    let angle = incoming.perp_dot(outgoing).atan2(incoming.dot(outgoing)).abs();
    angle > TANGENT_ANGLE_TOLERANCE
}

/// Distance below which a point counts as touching a segment in crossing tests
const TOUCH_DISTANCE: f64 = 1e-5;

/// Proper crossing test between segments `a0-a1` and `b0-b1`
///
/// Touching endpoints, tangent contacts and collinear overlaps are not crossings.
pub fn segments_cross(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
    // Signed distance of r from the line through p and q
    let side = |p: Vec2, q: Vec2, r: Vec2| -> f64 {
        let (px, py) = (p.x as f64, p.y as f64);
        let (dx, dy) = (q.x as f64 - px, q.y as f64 - py);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            return 0.0;
        }
        (dx * (r.y as f64 - py) - dy * (r.x as f64 - px)) / len
    };
    let opposite = |d0: f64, d1: f64| {
        (d0 > TOUCH_DISTANCE && d1 < -TOUCH_DISTANCE) || (d0 < -TOUCH_DISTANCE && d1 > TOUCH_DISTANCE)
    };
    opposite(side(a0, a1, b0), side(a0, a1, b1)) && opposite(side(b0, b1, a0), side(b0, b1, a1))
}
