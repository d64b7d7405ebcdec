//! Constant-size fillets and chamfers on extruded bodies
//!
//! Vertical edges are rounded by replacing the profile corner with a tangent
//! arc (or a bevel line). Rim edges are rounded by insetting the whole loop
//! near the cap, following a quarter circle (or a 45 degree line) across a
//! stack of cross-sections.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;

use super::solid::{BlendedLayer, EdgeSource, Layer, Section, SolidData};
use super::{CadError, CadResult};
use crate::config::KernelConfig;
use crate::profile::{Loop, Region, Ring, Segment, segments_cross};

/// Edge treatment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlendKind {
    Fillet,
    Chamfer,
}

impl BlendKind {
    fn noun(self) -> &'static str {
        match self {
            BlendKind::Fillet => "fillet radius",
            BlendKind::Chamfer => "chamfer distance",
        }
    }

    /// Cross-section heights measured from the cap towards the straight wall
    fn stations(self, size: f32, config: &KernelConfig) -> Vec<f32> {
        match self {
            BlendKind::Fillet => {
                let steps = config.blend_steps(size);
                (0..=steps)
                    .map(|k| size * (1.0 - (FRAC_PI_2 * k as f32 / steps as f32).cos()))
                    .collect()
            }
            BlendKind::Chamfer => vec![0.0, size],
        }
    }

    /// Inset at a height `t` from the cap
    fn inset_at(self, size: f32, t: f32) -> f32 {
        let t = t.clamp(0.0, size);
        match self {
            BlendKind::Fillet => size - (t * (2.0 * size - t)).max(0.0).sqrt(),
            BlendKind::Chamfer => size - t,
        }
    }
}

/// Selected edges of one solid, grouped per loop
#[derive(Debug, Default)]
struct Selection {
    corners: BTreeMap<usize, BTreeSet<usize>>,
    bottom_rims: BTreeMap<usize, BTreeSet<usize>>,
    top_rims: BTreeMap<usize, BTreeSet<usize>>,
}

impl Selection {
    fn new(sources: &[EdgeSource]) -> Self {
        let mut selection = Self::default();
        for source in sources {
            match *source {
                EdgeSource::Vertical {
                    loop_index, join, ..
                } => {
                    selection.corners.entry(loop_index).or_default().insert(join);
                }
                EdgeSource::Rim {
                    loop_index,
                    segment,
                    top,
                    ..
                } => {
                    let rims = if top {
                        &mut selection.top_rims
                    } else {
                        &mut selection.bottom_rims
                    };
                    rims.entry(loop_index).or_default().insert(segment);
                }
            }
        }
        selection
    }
}

/// Apply a fillet or chamfer to the selected edges of a single-prism solid
pub(crate) fn blend(
    data: &SolidData,
    sources: &[EdgeSource],
    size: f32,
    kind: BlendKind,
    config: &KernelConfig,
) -> CadResult<SolidData> {
    let tol = config.linear_tolerance;
    if !(size > tol) {
        return Err(CadError::OperationFailed(format!(
            "{} must be positive, got {}",
            kind.noun(),
            size
        )));
    }
    if sources.is_empty() {
        return Err(CadError::InvalidEdge("no edges selected".into()));
    }

    let (bottom, top, region) = match data.layers.as_slice() {
        [
            Layer::Prism {
                bottom,
                top,
                region,
            },
        ] => (*bottom, *top, region),
        _ => {
            return Err(CadError::Unsupported(
                "fillets and chamfers on bodies with steps, pockets or earlier blends".into(),
            ));
        }
    };

    let selection = Selection::new(sources);
    let loops = region.loops();

    for (rims, side) in [(&selection.bottom_rims, "bottom"), (&selection.top_rims, "top")] {
        for (&loop_index, segments) in rims {
            if segments.len() != loops[loop_index].len() {
                return Err(CadError::InvalidEdge(format!(
                    "{} rim of loop {} is only partly selected ({} of {} edges); \
                     select the whole rim",
                    side,
                    loop_index,
                    segments.len(),
                    loops[loop_index].len()
                )));
            }
        }
    }

    let rounded: Vec<Loop> = loops
        .iter()
        .enumerate()
        .map(|(i, l)| match selection.corners.get(&i) {
            Some(joins) => round_corners(l, joins, size, kind, tol),
            None => Ok(l.clone()),
        })
        .collect::<CadResult<_>>()?;

    for i in 0..rounded.len() {
        for j in (i + 1)..rounded.len() {
            if rounded[i].crosses(&rounded[j], config) {
                return Err(CadError::OperationFailed(format!(
                    "{} {} makes profile loops collide",
                    kind.noun(),
                    size
                )));
            }
        }
    }

    if selection.bottom_rims.is_empty() && selection.top_rims.is_empty() {
        tracing::debug!("Rounded {} corners", sources.len());
        return Ok(SolidData::prism(
            data.frame,
            Region::from_loops(rounded, config),
            bottom,
            top,
        ));
    }

    let height = top - bottom;
    let at_bottom: Vec<bool> = (0..rounded.len())
        .map(|i| selection.bottom_rims.contains_key(&i))
        .collect();
    let at_top: Vec<bool> = (0..rounded.len())
        .map(|i| selection.top_rims.contains_key(&i))
        .collect();

    for i in 0..rounded.len() {
        let needed = size * (at_bottom[i] as u8 + at_top[i] as u8) as f32;
        if needed > height + tol {
            return Err(CadError::OperationFailed(format!(
                "{} {} does not fit the body height {}",
                kind.noun(),
                size,
                height
            )));
        }
    }

    let stations = kind.stations(size, config);
    let mut heights = vec![bottom, top];
    if at_bottom.iter().any(|b| *b) {
        heights.extend(stations.iter().map(|t| bottom + t));
    }
    if at_top.iter().any(|b| *b) {
        heights.extend(stations.iter().map(|t| top - t));
    }
    heights.sort_by(f32::total_cmp);
    heights.dedup_by(|a, b| (*a - *b).abs() <= tol);

    let base_rings: Vec<Ring> = rounded.iter().map(|l| l.ring(config)).collect();
    let mut sections = Vec::with_capacity(heights.len());

    for w in heights {
        let insets: Vec<f32> = (0..rounded.len())
            .map(|i| {
                if at_bottom[i] && w - bottom <= size + tol {
                    kind.inset_at(size, w - bottom)
                } else if at_top[i] && top - w <= size + tol {
                    kind.inset_at(size, top - w)
                } else {
                    0.0
                }
            })
            .collect();

        let rings = rounded
            .iter()
            .zip(&base_rings)
            .zip(&insets)
            .map(|((l, ring), d)| offset_ring(l, ring, *d))
            .collect::<CadResult<Vec<Ring>>>()?;

        for (ring, base) in rings.iter().zip(&base_rings) {
            if is_inverted(base, ring) {
                return Err(CadError::OperationFailed(format!(
                    "{} {} is too large for the profile",
                    kind.noun(),
                    size
                )));
            }
        }
        if insets.iter().any(|d| *d > 0.0) && rings_collide(&rings) {
            return Err(CadError::OperationFailed(format!(
                "{} {} makes neighbouring blends collide",
                kind.noun(),
                size
            )));
        }

        sections.push(Section { w, rings });
    }

    tracing::debug!(
        "Blended {} edges with {} cross-sections",
        sources.len(),
        sections.len()
    );

    let blended = at_bottom
        .iter()
        .zip(&at_top)
        .map(|(b, t)| *b || *t)
        .collect();

    Ok(SolidData {
        frame: data.frame,
        layers: vec![Layer::Blended(BlendedLayer {
            base: rounded,
            blended,
            sections,
        })],
    })
}

/// Replace the selected sharp corners of a loop with fillet arcs or bevels
///
/// Join `j` sits between segment `j - 1` and segment `j`.
fn round_corners(
    l: &Loop,
    joins: &BTreeSet<usize>,
    size: f32,
    kind: BlendKind,
    tol: f32,
) -> CadResult<Loop> {
    let segments = l.segments();
    let n = segments.len();
    // Per join: (point where the incoming edge stops, point where the outgoing edge resumes, corner)
    let mut corners: Vec<Option<(Vec2, Vec2, Segment)>> = vec![None; n];

    for &j in joins {
        let incoming = segments[(j + n - 1) % n];
        let outgoing = segments[j];
        if !matches!(incoming, Segment::Line { .. }) || !matches!(outgoing, Segment::Line { .. }) {
            return Err(CadError::Unsupported(
                "rounding a corner between a line and an arc".into(),
            ));
        }

        let corner = outgoing.start_point();
        let ta = incoming.end_tangent();
        let tb = outgoing.start_tangent();
        // Interior angle between the two edges
        let back = -ta;
        let angle = back.perp_dot(tb).atan2(back.dot(tb)).abs();
        if angle < 1e-3 || angle > PI - 1e-3 {
            return Err(CadError::OperationFailed(format!(
                "corner at ({}, {}) is degenerate",
                corner.x, corner.y
            )));
        }

        let setback = match kind {
            BlendKind::Fillet => size / (0.5 * angle).tan(),
            BlendKind::Chamfer => size,
        };
        let stop = corner - ta * setback;
        let resume = corner + tb * setback;

        let segment = match kind {
            BlendKind::Fillet => {
                let center = corner + (back + tb).normalize() * (size / (0.5 * angle).sin());
                let start = stop - center;
                let sweep = ta.perp_dot(tb).signum() * (PI - angle);
                Segment::arc(center, size, start.y.atan2(start.x), sweep)
            }
            BlendKind::Chamfer => Segment::line(stop, resume),
        };
        corners[j] = Some((stop, resume, segment));
    }

    let mut result = Vec::with_capacity(n + joins.len());
    for (s, segment) in segments.iter().enumerate() {
        if let Some((_, _, corner)) = corners[s] {
            result.push(corner);
        }

        let Segment::Line { start, end } = *segment else {
            result.push(*segment);
            continue;
        };
        let new_start = corners[s].map(|c| c.1).unwrap_or(start);
        let new_end = corners[(s + 1) % n].map(|c| c.0).unwrap_or(end);
        let remaining = (new_end - new_start).dot(end - start) / (end - start).length();
        if remaining < -tol {
            return Err(CadError::OperationFailed(format!(
                "{} {} is too large for an edge of length {}",
                kind.noun(),
                size,
                segment.length()
            )));
        }
        if remaining > tol {
            result.push(Segment::line(new_start, new_end));
        }
    }

    Ok(Loop::new(result))
}

/// Move every ring point a distance `d` towards the material side of the loop
///
/// Points at segment joins follow the miter of the adjacent tangents; points
/// inside arcs stay on the concentric arc.
fn offset_ring(l: &Loop, ring: &Ring, d: f32) -> CadResult<Ring> {
    if d == 0.0 {
        return Ok(ring.clone());
    }

    let segments = l.segments();
    let n = segments.len();
    let total = ring.points.len();
    let mut points = Vec::with_capacity(total);

    for (s, segment) in segments.iter().enumerate() {
        let first = ring.seg_starts[s];
        let last = ring.seg_starts.get(s + 1).copied().unwrap_or(total);

        for i in first..last {
            let p = ring.points[i];
            let q = if i == first {
                let previous = segments[(s + n - 1) % n];
                let n0 = previous.end_tangent().perp();
                let n1 = segment.start_tangent().perp();
                let denom = 1.0 + n0.dot(n1);
                if denom < 1e-3 {
                    return Err(CadError::OperationFailed(
                        "cannot offset a profile with a hairpin corner".into(),
                    ));
                }
                p + (n0 + n1) * (d / denom)
            } else {
                match *segment {
                    Segment::Arc {
                        center,
                        radius,
                        sweep,
                        ..
                    } => center + (p - center) * ((radius - d * sweep.signum()) / radius),
                    Segment::Line { start, end } => p + (end - start).normalize_or_zero().perp() * d,
                }
            };
            points.push(q);
        }
    }

    Ok(Ring {
        points,
        seg_starts: ring.seg_starts.clone(),
    })
}

/// Whether any ring edge reversed its direction relative to the base ring
fn is_inverted(base: &Ring, offset: &Ring) -> bool {
    let n = base.points.len();
    (0..n).any(|i| {
        let e = base.points[(i + 1) % n] - base.points[i];
        let f = offset.points[(i + 1) % n] - offset.points[i];
        f.dot(e) < -1e-4 * e.length_squared()
    })
}

fn rings_collide(rings: &[Ring]) -> bool {
    for i in 0..rings.len() {
        for j in (i + 1)..rings.len() {
            let a = &rings[i].points;
            let b = &rings[j].points;
            for k in 0..a.len() {
                let (a0, a1) = (a[k], a[(k + 1) % a.len()]);
                for m in 0..b.len() {
                    if segments_cross(a0, a1, b[m], b[(m + 1) % b.len()]) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{EdgeKind, Frame};
    use approx::assert_relative_eq;

    fn config() -> KernelConfig {
        KernelConfig::default()
    }

    fn block() -> SolidData {
        SolidData::prism(
            Frame::world(),
            Region::from_loop(Loop::rectangle(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0))),
            0.0,
            5.0,
        )
    }

    fn vertical_sources(data: &SolidData) -> Vec<EdgeSource> {
        data.edges(&config())
            .into_iter()
            .filter(|e| e.kind == EdgeKind::Vertical)
            .map(|e| e.source)
            .collect()
    }

    #[test]
    fn test_round_corner_geometry() {
        let square = Loop::rectangle(Vec2::ZERO, Vec2::new(4.0, 4.0));
        let joins: BTreeSet<usize> = [1].into_iter().collect();
        let rounded = round_corners(&square, &joins, 1.0, BlendKind::Fillet, 1e-4).unwrap();
        assert_eq!(rounded.len(), 5);
        let arc = rounded.segments()[1];
        assert_relative_eq!(arc.start_point().x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(arc.end_point().y, 1.0, epsilon = 1e-5);
        assert!(rounded.sharp_joins().len() == 3);
        // Quarter of a 2x2 square minus a quarter disk is removed
        let removed = 1.0 - std::f32::consts::PI / 4.0;
        assert_relative_eq!(rounded.area(), 16.0 - removed, epsilon = 1e-4);
    }

    #[test]
    fn test_vertical_fillet_keeps_prism() {
        let data = block();
        let sources = vertical_sources(&data);
        let result = blend(&data, &sources, 1.0, BlendKind::Fillet, &config()).unwrap();
        assert!(result.is_prismatic());
        assert_eq!(result.layers[0].loops()[0].len(), 8);
        assert!(result.layers[0].loops()[0].sharp_joins().is_empty());
    }

    #[test]
    fn test_chamfer_corners() {
        let data = block();
        let sources = vertical_sources(&data);
        let result = blend(&data, &sources, 1.0, BlendKind::Chamfer, &config()).unwrap();
        let outline = &result.layers[0].loops()[0];
        assert_relative_eq!(outline.area(), 200.0 - 4.0 * 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_partial_rim_rejected() {
        let data = block();
        let one_rim = vec![EdgeSource::Rim {
            layer: 0,
            loop_index: 0,
            segment: 0,
            top: true,
        }];
        let result = blend(&data, &one_rim, 1.0, BlendKind::Fillet, &config());
        assert!(matches!(result, Err(CadError::InvalidEdge(_))));
    }

    #[test]
    fn test_rim_fillet_insets_top_section() {
        let data = block();
        let sources: Vec<EdgeSource> = data.edges(&config()).into_iter().map(|e| e.source).collect();
        let result = blend(&data, &sources, 1.0, BlendKind::Fillet, &config()).unwrap();
        let Layer::Blended(layer) = &result.layers[0] else {
            panic!("expected a blended layer");
        };
        let top = layer.sections.last().unwrap();
        assert_relative_eq!(top.w, 5.0);
        let max_x = top.rings[0]
            .points
            .iter()
            .map(|p| p.x)
            .fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(max_x, 9.0, epsilon = 1e-4);
        // The fillet ends one radius above the bottom with the full outline
        let wall = layer
            .sections
            .iter()
            .find(|s| (s.w - 1.0).abs() < 1e-4)
            .unwrap();
        let wall_x = wall.rings[0]
            .points
            .iter()
            .map(|p| p.x)
            .fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(wall_x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_fillet_taller_than_body_rejected() {
        let data = block();
        let sources: Vec<EdgeSource> = data.edges(&config()).into_iter().map(|e| e.source).collect();
        let result = blend(&data, &sources, 3.0, BlendKind::Fillet, &config());
        assert!(matches!(result, Err(CadError::OperationFailed(_))));
    }

    #[test]
    fn test_nonpositive_radius_rejected() {
        let data = block();
        let sources = vertical_sources(&data);
        assert!(blend(&data, &sources, 0.0, BlendKind::Fillet, &config()).is_err());
    }
}
