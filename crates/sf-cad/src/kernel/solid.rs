//! Layered solid representation
//!
//! A solid is a stack of layers along the normal of its frame. Prism layers
//! sweep a region between two heights. Blended layers interpolate between
//! cross-section rings produced by fillets and chamfers.
//!
//! Local coordinates are `Vec3(u, v, w)` with `w` along the frame normal.

use glam::{Vec2, Vec3};

use super::{BooleanType, CadError, CadResult, EdgeKind, FaceKind, Frame};
use crate::config::KernelConfig;
use crate::profile::{Loop, Region, RegionOp, Ring, Segment, polyline_area};

/// Cross-section of a layer at one height; rings follow the layer's loop order
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Section {
    pub w: f32,
    pub rings: Vec<Ring>,
}

/// A layer whose cross-section changes along its height
#[derive(Debug, Clone)]
pub(crate) struct BlendedLayer {
    /// Loops at zero inset
    pub base: Vec<Loop>,
    /// Whether each loop is inset somewhere along the layer
    pub blended: Vec<bool>,
    /// Cross-sections in ascending height
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone)]
pub(crate) enum Layer {
    Prism {
        bottom: f32,
        top: f32,
        region: Region,
    },
    Blended(BlendedLayer),
}

impl Layer {
    pub fn bottom(&self) -> f32 {
        match self {
            Layer::Prism { bottom, .. } => *bottom,
            Layer::Blended(layer) => layer.sections.first().map(|s| s.w).unwrap_or(0.0),
        }
    }

    pub fn top(&self) -> f32 {
        match self {
            Layer::Prism { top, .. } => *top,
            Layer::Blended(layer) => layer.sections.last().map(|s| s.w).unwrap_or(0.0),
        }
    }

    /// Boundary loops at zero inset
    pub fn loops(&self) -> &[Loop] {
        match self {
            Layer::Prism { region, .. } => region.loops(),
            Layer::Blended(layer) => &layer.base,
        }
    }

    /// Discretized cross-sections from bottom to top
    pub fn sections(&self, config: &KernelConfig) -> Vec<Section> {
        match self {
            Layer::Prism {
                bottom,
                top,
                region,
            } => {
                let rings: Vec<Ring> = region.loops().iter().map(|l| l.ring(config)).collect();
                vec![
                    Section {
                        w: *bottom,
                        rings: rings.clone(),
                    },
                    Section { w: *top, rings },
                ]
            }
            Layer::Blended(layer) => layer.sections.clone(),
        }
    }
}

/// Where an edge comes from, used to map edge selections back to loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeSource {
    Rim {
        layer: usize,
        loop_index: usize,
        segment: usize,
        top: bool,
    },
    Vertical {
        layer: usize,
        loop_index: usize,
        join: usize,
    },
}

/// An edge in local coordinates
#[derive(Debug, Clone)]
pub(crate) struct TopoEdge {
    pub source: EdgeSource,
    pub kind: EdgeKind,
    pub start: Vec3,
    pub end: Vec3,
    pub midpoint: Vec3,
    pub length: f32,
}

impl TopoEdge {
    fn from_segment(source: EdgeSource, segment: &Segment, w: f32) -> Self {
        Self {
            source,
            kind: EdgeKind::Rim,
            start: segment.start_point().extend(w),
            end: segment.end_point().extend(w),
            midpoint: segment.point_at(0.5).extend(w),
            length: segment.length(),
        }
    }

    fn from_polyline(source: EdgeSource, kind: EdgeKind, points: &[Vec3]) -> Self {
        let (midpoint, length) = polyline_midpoint(points);
        Self {
            source,
            kind,
            start: points.first().copied().unwrap_or(Vec3::ZERO),
            end: points.last().copied().unwrap_or(Vec3::ZERO),
            midpoint,
            length,
        }
    }
}

/// A face in local coordinates
#[derive(Debug, Clone)]
pub(crate) struct TopoFace {
    pub kind: FaceKind,
    pub center: Vec3,
    pub normal: Vec3,
    pub area: f32,
}

/// A planar cap: outer ring first, then holes
#[derive(Debug, Clone)]
pub(crate) struct CapFace {
    pub w: f32,
    /// Whether the cap faces along +w
    pub up: bool,
    pub rings: Vec<Vec<Vec2>>,
}

/// Kernel-side data of a solid
#[derive(Debug, Clone)]
pub(crate) struct SolidData {
    pub frame: Frame,
    pub layers: Vec<Layer>,
}

impl SolidData {
    /// A single prism between two heights
    pub fn prism(frame: Frame, region: Region, bottom: f32, top: f32) -> Self {
        Self {
            frame,
            layers: vec![Layer::Prism {
                bottom,
                top,
                region,
            }],
        }
    }

    /// Whether every layer is a prism
    pub fn is_prismatic(&self) -> bool {
        self.layers.iter().all(|l| matches!(l, Layer::Prism { .. }))
    }

    /// Distinct layer boundaries in ascending order
    fn levels(&self, tol: f32) -> Vec<f32> {
        let mut levels: Vec<f32> = self
            .layers
            .iter()
            .flat_map(|l| [l.bottom(), l.top()])
            .collect();
        levels.sort_by(f32::total_cmp);
        levels.dedup_by(|a, b| (*a - *b).abs() <= tol);
        levels
    }

    fn layer_ending_at(&self, w: f32, tol: f32) -> Option<usize> {
        self.layers.iter().position(|l| (l.top() - w).abs() <= tol)
    }

    fn layer_starting_at(&self, w: f32, tol: f32) -> Option<usize> {
        self.layers.iter().position(|l| (l.bottom() - w).abs() <= tol)
    }

    fn loop_continues(&self, layer: Option<usize>, candidate: &Loop, tol: f32) -> bool {
        match layer.map(|i| &self.layers[i]) {
            Some(Layer::Prism { region, .. }) => {
                region.loops().iter().any(|l| l.same_geometry(candidate, tol))
            }
            _ => false,
        }
    }

    /// Rim edges of one loop at the bottom or top of a layer
    fn rim_edges(
        &self,
        layer_index: usize,
        loop_index: usize,
        top: bool,
    ) -> Vec<TopoEdge> {
        let layer = &self.layers[layer_index];
        let source = |segment| EdgeSource::Rim {
            layer: layer_index,
            loop_index,
            segment,
            top,
        };
        match layer {
            Layer::Prism { region, .. } => {
                let w = if top { layer.top() } else { layer.bottom() };
                region.loops()[loop_index]
                    .segments()
                    .iter()
                    .enumerate()
                    .map(|(s, seg)| TopoEdge::from_segment(source(s), seg, w))
                    .collect()
            }
            Layer::Blended(blended) => {
                let section = if top {
                    blended.sections.last()
                } else {
                    blended.sections.first()
                };
                let Some(section) = section else {
                    return Vec::new();
                };
                let ring = &section.rings[loop_index];
                (0..ring.seg_starts.len())
                    .map(|s| {
                        let points: Vec<Vec3> = ring
                            .segment_points(s)
                            .into_iter()
                            .map(|p| p.extend(section.w))
                            .collect();
                        TopoEdge::from_polyline(source(s), EdgeKind::Rim, &points)
                    })
                    .collect()
            }
        }
    }

    /// Edges in their stable enumeration order
    ///
    /// Rim edges come first, level by level from the bottom. At a level the
    /// loops of the layer above precede those of the layer below; loops that
    /// continue straight through the level carry no edge. Vertical edges at
    /// sharp profile corners follow, layer by layer.
    pub fn edges(&self, config: &KernelConfig) -> Vec<TopoEdge> {
        let tol = config.linear_tolerance;
        let mut edges = Vec::new();

        for w in self.levels(tol) {
            let below = self.layer_ending_at(w, tol);
            let above = self.layer_starting_at(w, tol);

            if let Some(a) = above {
                for (i, l) in self.layers[a].loops().iter().enumerate() {
                    if !self.loop_continues(below, l, tol) {
                        edges.extend(self.rim_edges(a, i, false));
                    }
                }
            }
            if let Some(b) = below {
                for (i, l) in self.layers[b].loops().iter().enumerate() {
                    if !self.loop_continues(above, l, tol) {
                        edges.extend(self.rim_edges(b, i, true));
                    }
                }
            }
        }

        for (layer_index, layer) in self.layers.iter().enumerate() {
            let sections = layer.sections(config);
            for (loop_index, l) in layer.loops().iter().enumerate() {
                for join in l.sharp_joins() {
                    let points: Vec<Vec3> = sections
                        .iter()
                        .map(|s| {
                            let ring = &s.rings[loop_index];
                            ring.points[ring.seg_starts[join]].extend(s.w)
                        })
                        .collect();
                    let source = EdgeSource::Vertical {
                        layer: layer_index,
                        loop_index,
                        join,
                    };
                    edges.push(TopoEdge::from_polyline(source, EdgeKind::Vertical, &points));
                }
            }
        }

        edges
    }

    /// Planar caps, level by level from the bottom
    pub fn caps(&self, config: &KernelConfig) -> CadResult<Vec<CapFace>> {
        if let [Layer::Blended(layer)] = self.layers.as_slice() {
            return Ok(blended_caps(layer, config));
        }

        let tol = config.linear_tolerance;
        let empty = Region::new();
        let mut caps = Vec::new();

        for w in self.levels(tol) {
            let below = self.prism_region(self.layer_ending_at(w, tol)).unwrap_or(&empty);
            let above = self.prism_region(self.layer_starting_at(w, tol)).unwrap_or(&empty);

            let facing_down = above.combine(below, RegionOp::Difference, config)?;
            let facing_up = below.combine(above, RegionOp::Difference, config)?;

            for (region, up) in [(facing_down, false), (facing_up, true)] {
                for polygon in region.polygons(config) {
                    let rings = std::iter::once(polygon.outer)
                        .chain(polygon.holes)
                        .map(|i| region.loops()[i].polyline(config))
                        .collect();
                    caps.push(CapFace { w, up, rings });
                }
            }
        }

        Ok(caps)
    }

    fn prism_region(&self, layer: Option<usize>) -> Option<&Region> {
        match layer.map(|i| &self.layers[i]) {
            Some(Layer::Prism { region, .. }) => Some(region),
            _ => None,
        }
    }

    /// Faces in their stable enumeration order: caps, then side faces
    pub fn faces(&self, config: &KernelConfig) -> CadResult<Vec<TopoFace>> {
        let mut faces = Vec::new();

        for cap in self.caps(config)? {
            let (area, centroid) = rings_centroid(&cap.rings);
            faces.push(TopoFace {
                kind: FaceKind::Planar,
                center: centroid.extend(cap.w),
                normal: if cap.up { Vec3::Z } else { Vec3::NEG_Z },
                area,
            });
        }

        for layer in &self.layers {
            let sections = layer.sections(config);
            for (loop_index, l) in layer.loops().iter().enumerate() {
                let blended = match layer {
                    Layer::Blended(b) => b.blended.get(loop_index).copied().unwrap_or(false),
                    Layer::Prism { .. } => false,
                };
                for (s, seg) in l.segments().iter().enumerate() {
                    let t = seg.tangent_at(0.5);
                    let normal = Vec3::new(t.y, -t.x, 0.0);
                    let kind = if blended {
                        FaceKind::Blend
                    } else {
                        match seg {
                            Segment::Line { .. } => FaceKind::Planar,
                            Segment::Arc { .. } => FaceKind::Cylindrical,
                        }
                    };
                    let (center, area) = if blended {
                        side_center_and_area(&sections, loop_index, s)
                    } else {
                        let height = layer.top() - layer.bottom();
                        (
                            seg.point_at(0.5).extend(0.5 * (layer.bottom() + layer.top())),
                            seg.length() * height,
                        )
                    };
                    faces.push(TopoFace {
                        kind,
                        center,
                        normal,
                        area,
                    });
                }
            }
        }

        Ok(faces)
    }

    /// Prism slabs as (bottom, top, region)
    fn slabs(&self) -> Vec<(f32, f32, Region)> {
        self.layers
            .iter()
            .filter_map(|l| match l {
                Layer::Prism {
                    bottom,
                    top,
                    region,
                } => Some((*bottom, *top, region.clone())),
                Layer::Blended(_) => None,
            })
            .collect()
    }

    /// Prism slabs expressed in another frame with a parallel normal
    fn reframed(&self, target: &Frame, config: &KernelConfig) -> CadResult<Vec<(f32, f32, Region)>> {
        if self.frame == *target {
            return Ok(self.slabs());
        }

        let alignment = self.frame.normal.dot(target.normal);
        if (alignment.abs() - 1.0).abs() > 1e-4 {
            return Err(CadError::Unsupported(
                "boolean between bodies built on non-parallel planes".into(),
            ));
        }
        let flipped = alignment < 0.0;

        let delta = self.frame.origin - target.origin;
        let w_offset = delta.dot(target.normal);
        let offset = Vec2::new(delta.dot(target.x_axis), delta.dot(target.y_axis));
        let (m00, m01) = (
            self.frame.x_axis.dot(target.x_axis),
            self.frame.y_axis.dot(target.x_axis),
        );
        let (m10, m11) = (
            self.frame.x_axis.dot(target.y_axis),
            self.frame.y_axis.dot(target.y_axis),
        );
        let reflect = m00 * m11 - m01 * m10 < 0.0;
        let map = |p: Vec2| offset + Vec2::new(m00 * p.x + m01 * p.y, m10 * p.x + m11 * p.y);

        Ok(self
            .slabs()
            .into_iter()
            .map(|(bottom, top, region)| {
                let (bottom, top) = if flipped {
                    (w_offset - top, w_offset - bottom)
                } else {
                    (w_offset + bottom, w_offset + top)
                };
                (bottom, top, region.map(&map, reflect, config))
            })
            .collect())
    }

    /// Combine with another prismatic solid, slab by slab
    pub fn boolean(
        &self,
        other: &SolidData,
        op: BooleanType,
        config: &KernelConfig,
    ) -> CadResult<SolidData> {
        if !self.is_prismatic() || !other.is_prismatic() {
            return Err(CadError::Unsupported(
                "boolean operations on filleted or chamfered bodies".into(),
            ));
        }

        let tol = config.linear_tolerance;
        let target = self.slabs();
        let tool = other.reframed(&self.frame, config)?;

        let mut cuts: Vec<f32> = target
            .iter()
            .chain(tool.iter())
            .flat_map(|(bottom, top, _)| [*bottom, *top])
            .collect();
        cuts.sort_by(f32::total_cmp);
        cuts.dedup_by(|a, b| (*a - *b).abs() <= tol);

        let region_op = match op {
            BooleanType::Union => RegionOp::Union,
            BooleanType::Subtract => RegionOp::Difference,
            BooleanType::Intersect => RegionOp::Intersection,
        };
        let boolean_failed = |e: crate::profile::RegionError| CadError::BooleanFailed(e.to_string());

        let empty = Region::new();
        let mut overlap = false;
        let mut layers: Vec<Layer> = Vec::new();

        for pair in cuts.windows(2) {
            let (w0, w1) = (pair[0], pair[1]);
            let mid = 0.5 * (w0 + w1);
            let a = slab_at(&target, mid);
            let b = slab_at(&tool, mid);
            if a.is_none() && b.is_none() {
                continue;
            }
            let a = a.unwrap_or(&empty);
            let b = b.unwrap_or(&empty);

            if !a.is_empty() && !b.is_empty() {
                let common = a
                    .combine(b, RegionOp::Intersection, config)
                    .map_err(boolean_failed)?;
                if common.area() > tol {
                    overlap = true;
                }
            }

            let region = a.combine(b, region_op, config).map_err(boolean_failed)?;
            if region.is_empty() {
                continue;
            }

            if let Some(Layer::Prism {
                top,
                region: previous,
                ..
            }) = layers.last_mut()
                && (*top - w0).abs() <= tol
                && previous.same_geometry(&region, tol)
            {
                *top = w1;
                continue;
            }
            layers.push(Layer::Prism {
                bottom: w0,
                top: w1,
                region,
            });
        }

        if matches!(op, BooleanType::Subtract | BooleanType::Intersect) && !overlap {
            return Err(CadError::BooleanFailed(
                "tool body does not intersect the target".into(),
            ));
        }
        if layers.is_empty() {
            return Err(CadError::BooleanFailed("the result is empty".into()));
        }

        Ok(SolidData {
            frame: self.frame,
            layers,
        })
    }
}

fn slab_at(slabs: &[(f32, f32, Region)], w: f32) -> Option<&Region> {
    slabs
        .iter()
        .find(|(bottom, top, _)| *bottom < w && w < *top)
        .map(|(_, _, region)| region)
}

fn blended_caps(layer: &BlendedLayer, config: &KernelConfig) -> Vec<CapFace> {
    let polygons = Region::from_oriented(layer.base.clone()).polygons(config);
    let ends = [
        (layer.sections.first(), false),
        (layer.sections.last(), true),
    ];
    let mut caps = Vec::new();
    for (section, up) in ends {
        let Some(section) = section else {
            continue;
        };
        for polygon in &polygons {
            let rings = std::iter::once(polygon.outer)
                .chain(polygon.holes.iter().copied())
                .map(|i| section.rings[i].points.clone())
                .collect();
            caps.push(CapFace {
                w: section.w,
                up,
                rings,
            });
        }
    }
    caps
}

/// Net area and centroid of material-left oriented rings
fn rings_centroid(rings: &[Vec<Vec2>]) -> (f32, Vec2) {
    let mut area = 0.0;
    let mut moment = Vec2::ZERO;
    for ring in rings {
        let n = ring.len();
        for i in 0..n {
            let p = ring[i];
            let q = ring[(i + 1) % n];
            let cross = p.perp_dot(q);
            moment += (p + q) * cross;
        }
        area += polyline_area(ring);
    }
    if area.abs() <= f32::EPSILON {
        let first = rings.first().and_then(|r| r.first()).copied().unwrap_or(Vec2::ZERO);
        return (0.0, first);
    }
    (area, moment / (6.0 * area))
}

/// Point halfway along a polyline, and its length
fn polyline_midpoint(points: &[Vec3]) -> (Vec3, f32) {
    let length: f32 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut remaining = length * 0.5;
    for w in points.windows(2) {
        let step = w[0].distance(w[1]);
        if step >= remaining && step > 0.0 {
            return (w[0].lerp(w[1], remaining / step), length);
        }
        remaining -= step;
    }
    (points.first().copied().unwrap_or(Vec3::ZERO), length)
}

/// Center and area of the side face of one loop segment across all sections
fn side_center_and_area(sections: &[Section], loop_index: usize, segment: usize) -> (Vec3, f32) {
    let mut area = 0.0;
    for pair in sections.windows(2) {
        let lower: Vec<Vec3> = pair[0].rings[loop_index]
            .segment_points(segment)
            .into_iter()
            .map(|p| p.extend(pair[0].w))
            .collect();
        let upper: Vec<Vec3> = pair[1].rings[loop_index]
            .segment_points(segment)
            .into_iter()
            .map(|p| p.extend(pair[1].w))
            .collect();
        for i in 0..lower.len().saturating_sub(1) {
            area += 0.5 * (lower[i + 1] - lower[i]).cross(upper[i + 1] - lower[i]).length();
            area += 0.5 * (upper[i + 1] - lower[i]).cross(upper[i] - lower[i]).length();
        }
    }

    let middle = &sections[sections.len() / 2];
    let points: Vec<Vec3> = middle.rings[loop_index]
        .segment_points(segment)
        .into_iter()
        .map(|p| p.extend(middle.w))
        .collect();
    (polyline_midpoint(&points).0, area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn config() -> KernelConfig {
        KernelConfig::default()
    }

    fn plate() -> SolidData {
        let region = Region::from_loops(
            vec![
                Loop::rectangle(Vec2::new(-10.0, -5.0), Vec2::new(10.0, 5.0)),
                Loop::circle(Vec2::ZERO, 3.0),
            ],
            &config(),
        );
        SolidData::prism(Frame::world(), region, 0.0, 5.0)
    }

    fn disk(radius: f32, bottom: f32, top: f32) -> SolidData {
        SolidData::prism(
            Frame::world(),
            Region::from_loop(Loop::circle(Vec2::ZERO, radius)),
            bottom,
            top,
        )
    }

    #[test]
    fn test_plate_edges() {
        let edges = plate().edges(&config());
        let rims = edges.iter().filter(|e| e.kind == EdgeKind::Rim).count();
        let verticals = edges.iter().filter(|e| e.kind == EdgeKind::Vertical).count();
        assert_eq!(rims, 10);
        assert_eq!(verticals, 4);
        // Bottom rims first
        assert_relative_eq!(edges[0].start.z, 0.0);
        assert_relative_eq!(edges[9].start.z, 5.0);
        assert_relative_eq!(edges[13].length, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_plate_faces() {
        let faces = plate().faces(&config()).unwrap();
        // bottom, top, four walls, one bore
        assert_eq!(faces.len(), 7);
        assert_eq!(faces[0].normal, Vec3::NEG_Z);
        assert_eq!(faces[1].normal, Vec3::Z);
        assert_relative_eq!(faces[1].area, 200.0 - 9.0 * PI, epsilon = 0.2);
        assert_eq!(
            faces.iter().filter(|f| f.kind == FaceKind::Cylindrical).count(),
            1
        );
    }

    #[test]
    fn test_union_of_stacked_disks_merges() {
        let c = config();
        let result = disk(5.0, 0.0, 2.0)
            .boolean(&disk(5.0, 2.0, 4.0), BooleanType::Union, &c)
            .unwrap();
        assert_eq!(result.layers.len(), 1);
        assert_relative_eq!(result.layers[0].top(), 4.0);
    }

    #[test]
    fn test_pocket_cut_creates_two_layers() {
        let c = config();
        let pocket = SolidData::prism(
            Frame::world(),
            Region::from_loop(Loop::circle(Vec2::new(1.0, 1.0), 1.0)),
            3.0,
            6.0,
        );
        let result = disk(5.0, 0.0, 5.0)
            .boolean(&pocket, BooleanType::Subtract, &c)
            .unwrap();
        assert_eq!(result.layers.len(), 2);
        assert_relative_eq!(result.layers[1].bottom(), 3.0);
        assert_eq!(result.layers[1].loops().len(), 2);

        // Pocket floor faces up at w = 3
        let caps = result.caps(&c).unwrap();
        assert!(caps.iter().any(|cap| cap.up && (cap.w - 3.0).abs() < 1e-5));
    }

    #[test]
    fn test_subtract_without_overlap_fails() {
        let c = config();
        let far = SolidData::prism(
            Frame::world(),
            Region::from_loop(Loop::circle(Vec2::new(20.0, 0.0), 1.0)),
            0.0,
            5.0,
        );
        let result = disk(5.0, 0.0, 5.0).boolean(&far, BooleanType::Subtract, &c);
        assert!(matches!(result, Err(CadError::BooleanFailed(_))));
    }

    #[test]
    fn test_flipped_frame_tool() {
        let c = config();
        // Tool sketched on the top face, pointing down, extruded 3 along its normal
        let frame = Frame::new(Vec3::new(0.0, 0.0, 5.0), Vec3::X, Vec3::NEG_Y);
        let tool = SolidData::prism(frame, Region::from_loop(Loop::circle(Vec2::ZERO, 1.0)), 0.0, 3.0);
        let result = disk(5.0, 0.0, 5.0)
            .boolean(&tool, BooleanType::Subtract, &c)
            .unwrap();
        assert_relative_eq!(result.layers[0].top(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(result.layers[1].bottom(), 2.0, epsilon = 1e-5);
    }
}
