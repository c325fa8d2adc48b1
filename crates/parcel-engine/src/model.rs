//! Editable document: boundary, parcels, linear features, plus the read-only
//! reference features used as snap and fill sources.
//!
//! Invariants maintained by the tools (checked by `Document::check_invariants`):
//! - complete rings are closed, have ≥ 4 coordinates and do not self-intersect;
//! - every parcel lies within the boundary and no two parcels overlap;
//! - every linear feature lies within the boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::boolean::{overlaps_significantly, AreaThreshold, PolygonSetOps};
use crate::geom::{
    do_polygons_overlap, is_closed, is_line_within_boundary, is_polygon_within_boundary,
    is_ring_self_intersecting, line_length, ring_area, Coord, Extent, GeomCfg,
};

/// Free-form feature properties carried through import/export.
pub type Metadata = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outer limit for parcels.
#[derive(Clone, Debug, PartialEq)]
pub struct Boundary {
    pub ring: Vec<Coord>,
    pub metadata: Metadata,
}

impl Boundary {
    pub fn new(ring: Vec<Coord>) -> Self {
        Self {
            ring,
            metadata: Metadata::new(),
        }
    }

    pub fn area(&self) -> f64 {
        ring_area(&self.ring)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parcel {
    pub id: FeatureId,
    pub ring: Vec<Coord>,
    pub color_index: usize,
    pub metadata: Metadata,
}

impl Parcel {
    pub fn area(&self) -> f64 {
        ring_area(&self.ring)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearKind {
    Hedgerow,
    Watercourse,
}

impl LinearKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinearKind::Hedgerow => "hedgerow",
            LinearKind::Watercourse => "watercourse",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LinearFeature {
    pub id: FeatureId,
    pub kind: LinearKind,
    pub coordinates: Vec<Coord>,
    pub metadata: Metadata,
}

impl LinearFeature {
    pub fn length(&self) -> f64 {
        line_length(&self.coordinates)
    }
}

/// Geometry of an externally supplied reference feature.
#[derive(Clone, Debug, PartialEq)]
pub enum RefGeometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Coord>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Coord>>),
}

/// One single-part piece of a reference geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RefPart<'a> {
    Point(Coord),
    Line(&'a [Coord]),
    Ring(&'a [Coord]),
}

impl RefGeometry {
    /// Decompose into single parts.
    pub fn parts(&self) -> Vec<RefPart<'_>> {
        match self {
            RefGeometry::Point(p) => vec![RefPart::Point(*p)],
            RefGeometry::LineString(l) => vec![RefPart::Line(l)],
            RefGeometry::Polygon(r) => vec![RefPart::Ring(r)],
            RefGeometry::MultiPoint(ps) => ps.iter().map(|p| RefPart::Point(*p)).collect(),
            RefGeometry::MultiLineString(ls) => ls.iter().map(|l| RefPart::Line(l)).collect(),
            RefGeometry::MultiPolygon(rs) => rs.iter().map(|r| RefPart::Ring(r)).collect(),
        }
    }

    /// Polygon rings only (multi-polygons decomposed).
    pub fn rings(&self) -> Vec<&[Coord]> {
        match self {
            RefGeometry::Polygon(r) => vec![r.as_slice()],
            RefGeometry::MultiPolygon(rs) => rs.iter().map(|r| r.as_slice()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn extent(&self) -> Option<Extent> {
        let pts: Vec<Coord> = match self {
            RefGeometry::Point(p) => vec![*p],
            RefGeometry::LineString(v) | RefGeometry::Polygon(v) | RefGeometry::MultiPoint(v) => {
                v.clone()
            }
            RefGeometry::MultiLineString(vs) | RefGeometry::MultiPolygon(vs) => {
                vs.iter().flatten().copied().collect()
            }
        };
        Extent::from_points(&pts)
    }
}

/// Read-only feature from an external source, tagged with its layer type.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceFeature {
    pub id: FeatureId,
    pub layer: String,
    pub geometry: RefGeometry,
}

/// A broken invariant found by `Document::check_invariants`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    OpenRing { feature: String },
    SelfIntersecting { feature: String },
    OutsideBoundary { feature: String },
    Overlap { a: String, b: String },
    NoBoundary { feature: String },
    TooFewPoints { feature: String },
}

/// Everything the user edits.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub boundary: Option<Boundary>,
    pub parcels: Vec<Parcel>,
    pub hedgerows: Vec<LinearFeature>,
    pub watercourses: Vec<LinearFeature>,
    next_id: u64,
    next_color: usize,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh feature id.
    pub fn allocate_id(&mut self) -> FeatureId {
        self.next_id += 1;
        FeatureId(self.next_id)
    }

    /// Make sure future ids do not collide with `id` (used by import).
    pub fn reserve_id(&mut self, id: FeatureId) {
        self.next_id = self.next_id.max(id.0);
    }

    pub fn boundary_ring(&self) -> Option<&[Coord]> {
        self.boundary.as_ref().map(|b| b.ring.as_slice())
    }

    /// Append a parcel with a fresh id and the next palette colour. Returns its index.
    pub fn push_parcel(&mut self, ring: Vec<Coord>, metadata: Metadata, palette: usize) -> usize {
        let id = self.allocate_id();
        let color_index = self.next_color % palette.max(1);
        self.next_color += 1;
        self.parcels.push(Parcel {
            id,
            ring,
            color_index,
            metadata,
        });
        self.parcels.len() - 1
    }

    /// Append an already identified parcel (import); keeps id and colour counters ahead of it.
    pub fn restore_parcel(&mut self, parcel: Parcel) {
        self.reserve_id(parcel.id);
        self.next_color = self.next_color.max(parcel.color_index + 1);
        self.parcels.push(parcel);
    }

    pub fn parcel_index(&self, id: FeatureId) -> Option<usize> {
        self.parcels.iter().position(|p| p.id == id)
    }

    pub fn linear(&self, kind: LinearKind) -> &Vec<LinearFeature> {
        match kind {
            LinearKind::Hedgerow => &self.hedgerows,
            LinearKind::Watercourse => &self.watercourses,
        }
    }

    pub fn linear_mut(&mut self, kind: LinearKind) -> &mut Vec<LinearFeature> {
        match kind {
            LinearKind::Hedgerow => &mut self.hedgerows,
            LinearKind::Watercourse => &mut self.watercourses,
        }
    }

    pub fn parcel_rings_except(&self, skip: Option<usize>) -> Vec<Vec<Coord>> {
        self.parcels
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, p)| p.ring.clone())
            .collect()
    }

    /// Audit every invariant; an empty result means the document is consistent.
    pub fn check_invariants(
        &self,
        cfg: GeomCfg,
        ops: &dyn PolygonSetOps,
        threshold: AreaThreshold,
    ) -> Vec<Violation> {
        let mut out = Vec::new();
        let check_ring = |name: String, ring: &[Coord], out: &mut Vec<Violation>| {
            if !is_closed(ring, cfg.eps) {
                out.push(Violation::OpenRing { feature: name });
            } else if is_ring_self_intersecting(ring, cfg) {
                out.push(Violation::SelfIntersecting { feature: name });
            }
        };
        if let Some(b) = &self.boundary {
            check_ring("boundary".to_string(), &b.ring, &mut out);
        }
        for p in &self.parcels {
            let name = format!("parcel {}", p.id);
            check_ring(name.clone(), &p.ring, &mut out);
            match self.boundary_ring() {
                Some(b) if !is_polygon_within_boundary(&p.ring, b, cfg) => {
                    out.push(Violation::OutsideBoundary { feature: name });
                }
                None => out.push(Violation::NoBoundary { feature: name }),
                _ => {}
            }
        }
        for (i, a) in self.parcels.iter().enumerate() {
            for b in &self.parcels[i + 1..] {
                if do_polygons_overlap(&a.ring, &b.ring, cfg)
                    && overlaps_significantly(ops, &a.ring, &b.ring, threshold)
                {
                    out.push(Violation::Overlap {
                        a: format!("parcel {}", a.id),
                        b: format!("parcel {}", b.id),
                    });
                }
            }
        }
        for f in self.hedgerows.iter().chain(self.watercourses.iter()) {
            let name = format!("{} {}", f.kind.as_str(), f.id);
            if f.coordinates.len() < 2 {
                out.push(Violation::TooFewPoints { feature: name });
                continue;
            }
            if let Some(b) = self.boundary_ring() {
                if !is_line_within_boundary(&f.coordinates, b, cfg) {
                    out.push(Violation::OutsideBoundary { feature: name });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boolean::GeoClipper;
    use nalgebra::vector;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Coord> {
        vec![
            vector![x0, y0],
            vector![x1, y0],
            vector![x1, y1],
            vector![x0, y1],
            vector![x0, y0],
        ]
    }

    #[test]
    fn ids_and_colours_advance() {
        let mut doc = Document::new();
        let a = doc.push_parcel(rect(0.0, 0.0, 1.0, 1.0), Metadata::new(), 2);
        let b = doc.push_parcel(rect(1.0, 0.0, 2.0, 1.0), Metadata::new(), 2);
        let c = doc.push_parcel(rect(2.0, 0.0, 3.0, 1.0), Metadata::new(), 2);
        assert_eq!((a, b, c), (0, 1, 2));
        assert_ne!(doc.parcels[0].id, doc.parcels[1].id);
        assert_eq!(doc.parcels[2].color_index, 0);
        doc.reserve_id(FeatureId(40));
        assert_eq!(doc.allocate_id(), FeatureId(41));
    }

    #[test]
    fn invariant_audit_reports_overlap_and_escape() {
        let cfg = GeomCfg::default();
        let mut doc = Document::new();
        doc.boundary = Some(Boundary::new(rect(0.0, 0.0, 10.0, 10.0)));
        doc.push_parcel(rect(0.0, 0.0, 6.0, 10.0), Metadata::new(), 8);
        doc.push_parcel(rect(5.0, 0.0, 10.0, 10.0), Metadata::new(), 8);
        doc.push_parcel(rect(8.0, 8.0, 12.0, 12.0), Metadata::new(), 8);
        let v = doc.check_invariants(cfg, &GeoClipper, AreaThreshold::default());
        assert!(v.iter().any(|x| matches!(x, Violation::Overlap { .. })));
        assert!(v
            .iter()
            .any(|x| matches!(x, Violation::OutsideBoundary { feature } if feature == "parcel 3")));
    }

    #[test]
    fn multi_geometry_decomposes_into_parts() {
        let g = RefGeometry::MultiPolygon(vec![rect(0.0, 0.0, 1.0, 1.0), rect(2.0, 0.0, 3.0, 1.0)]);
        assert_eq!(g.parts().len(), 2);
        assert_eq!(g.rings().len(), 2);
        let e = g.extent().unwrap();
        assert_eq!(e.max, vector![3.0, 1.0]);
        assert!(RefGeometry::Point(vector![1.0, 1.0]).rings().is_empty());
    }
}
