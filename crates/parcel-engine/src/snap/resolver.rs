use crate::config::EditorCfg;
use crate::geom::{
    closest_point_on_line, closest_point_on_ring, is_point_inside_or_on_boundary, open_ring, Coord,
};
use crate::model::{Document, RefPart};
use crate::reference::ReferenceIndex;

use super::{SnapLayer, SnapResult, SnapSource, SnapToggles};

/// Per-call context of a snap request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapQuery {
    /// Map units per pixel.
    pub resolution: f64,
    /// Parcel currently being edited; its own vertices are not snap targets.
    pub exclude_parcel: Option<usize>,
    /// Parcel editing: project results that fall outside the boundary back onto it.
    pub clamp_to_boundary: bool,
}

impl SnapQuery {
    pub fn at(resolution: f64) -> Self {
        Self {
            resolution,
            exclude_parcel: None,
            clamp_to_boundary: false,
        }
    }
}

/// Snap onto a single ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingHit {
    pub coord: Coord,
    /// Edge the point lies on (for a vertex hit: the edge starting at it).
    pub edge: usize,
    /// Index into the open ring when an existing vertex was hit.
    pub vertex: Option<usize>,
    pub dist: f64,
}

/// Nearest vertex of `ring` within `vertex_tol`, else nearest edge point within `edge_tol`.
pub fn snap_to_ring(
    raw: Coord,
    ring: &[Coord],
    edge_tol: f64,
    vertex_tol: f64,
    eps: f64,
) -> Option<RingHit> {
    let verts = open_ring(ring, eps);
    let mut best: Option<RingHit> = None;
    for (i, &v) in verts.iter().enumerate() {
        let d = (v - raw).norm();
        if d <= vertex_tol && best.is_none_or(|b| d < b.dist) {
            best = Some(RingHit {
                coord: v,
                edge: i,
                vertex: Some(i),
                dist: d,
            });
        }
    }
    if best.is_some() {
        return best;
    }
    match closest_point_on_ring(raw, ring, eps) {
        Some((q, edge, d)) if d <= edge_tol => Some(RingHit {
            coord: q,
            edge,
            vertex: None,
            dist: d,
        }),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    coord: Coord,
    source: SnapSource,
    parcel: Option<usize>,
    dist: f64,
}

impl Candidate {
    fn into_result(self) -> SnapResult {
        SnapResult {
            coord: self.coord,
            source: self.source,
            parcel: self.parcel,
        }
    }
}

/// Keep `cand` if within `tol` and strictly closer than the current best.
fn offer(best: &mut Option<Candidate>, cand: Candidate, tol: f64) {
    if cand.dist <= tol && best.is_none_or(|b| cand.dist < b.dist) {
        *best = Some(cand);
    }
}

#[derive(Clone, Debug)]
pub struct SnapResolver {
    toggles: SnapToggles,
    edge_px: f64,
    vertex_factor: f64,
    eps: f64,
}

impl SnapResolver {
    pub fn new(cfg: &EditorCfg) -> Self {
        Self {
            toggles: SnapToggles::default(),
            edge_px: cfg.snap_tolerance_px,
            vertex_factor: cfg.vertex_tolerance_factor,
            eps: cfg.eps,
        }
    }

    pub fn toggles(&self) -> SnapToggles {
        self.toggles
    }

    pub fn is_enabled(&self, layer: SnapLayer) -> bool {
        self.toggles.get(layer)
    }

    /// Returns `true` when the toggle changed.
    pub fn set_enabled(&mut self, layer: SnapLayer, enabled: bool) -> bool {
        self.toggles.set(layer, enabled)
    }

    pub fn edge_tolerance(&self, resolution: f64) -> f64 {
        self.edge_px * resolution
    }

    pub fn vertex_tolerance(&self, resolution: f64) -> f64 {
        self.edge_tolerance(resolution) * self.vertex_factor
    }

    /// Resolve `raw` against every enabled source.
    ///
    /// Tiers, first hit wins: editable vertices (boundary, then parcels),
    /// editable edges, reference vertices, reference edges. Inside a tier the
    /// strictly closest candidate within tolerance is kept. Without any hit
    /// the raw coordinate is returned with `SnapSource::None`.
    pub fn resolve(
        &self,
        raw: Coord,
        q: &SnapQuery,
        doc: &Document,
        refs: &ReferenceIndex,
    ) -> SnapResult {
        let resolved = self
            .resolve_sources(raw, q, doc, refs)
            .map(Candidate::into_result)
            .unwrap_or_else(|| SnapResult::unsnapped(raw));
        if !q.clamp_to_boundary {
            return resolved;
        }
        match doc.boundary_ring() {
            Some(b) if !is_point_inside_or_on_boundary(resolved.coord, b, self.eps) => {
                match closest_point_on_ring(resolved.coord, b, self.eps) {
                    Some((c, _, _)) => SnapResult {
                        coord: c,
                        source: SnapSource::BoundaryEdge,
                        parcel: None,
                    },
                    None => resolved,
                }
            }
            _ => resolved,
        }
    }

    fn resolve_sources(
        &self,
        raw: Coord,
        q: &SnapQuery,
        doc: &Document,
        refs: &ReferenceIndex,
    ) -> Option<Candidate> {
        let eps = self.eps;
        let edge_tol = self.edge_tolerance(q.resolution);
        let vertex_tol = self.vertex_tolerance(q.resolution);
        let boundary = doc.boundary_ring().filter(|_| self.toggles.boundary);
        let parcels: Vec<(usize, &[Coord])> = if self.toggles.parcels {
            doc.parcels
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != q.exclude_parcel)
                .map(|(i, p)| (i, p.ring.as_slice()))
                .collect()
        } else {
            Vec::new()
        };

        let mut best = None;
        if let Some(b) = boundary {
            for &v in open_ring(b, eps) {
                offer(
                    &mut best,
                    Candidate {
                        coord: v,
                        source: SnapSource::BoundaryVertex,
                        parcel: None,
                        dist: (v - raw).norm(),
                    },
                    vertex_tol,
                );
            }
        }
        for &(i, ring) in &parcels {
            for &v in open_ring(ring, eps) {
                offer(
                    &mut best,
                    Candidate {
                        coord: v,
                        source: SnapSource::ParcelVertex,
                        parcel: Some(i),
                        dist: (v - raw).norm(),
                    },
                    vertex_tol,
                );
            }
        }
        if best.is_some() {
            return best;
        }

        if let Some(b) = boundary {
            if let Some((c, _, d)) = closest_point_on_ring(raw, b, eps) {
                offer(
                    &mut best,
                    Candidate {
                        coord: c,
                        source: SnapSource::BoundaryEdge,
                        parcel: None,
                        dist: d,
                    },
                    edge_tol,
                );
            }
        }
        for &(i, ring) in &parcels {
            if let Some((c, _, d)) = closest_point_on_ring(raw, ring, eps) {
                offer(
                    &mut best,
                    Candidate {
                        coord: c,
                        source: SnapSource::ParcelEdge,
                        parcel: Some(i),
                        dist: d,
                    },
                    edge_tol,
                );
            }
        }
        if best.is_some() || !self.toggles.references {
            return best;
        }

        let nearby: Vec<_> = refs.near(raw, vertex_tol).collect();
        let reference = |coord: Coord, dist: f64| Candidate {
            coord,
            source: SnapSource::ReferenceFeature,
            parcel: None,
            dist,
        };
        for f in &nearby {
            for part in f.geometry.parts() {
                let verts: &[Coord] = match part {
                    RefPart::Point(p) => {
                        offer(&mut best, reference(p, (p - raw).norm()), vertex_tol);
                        continue;
                    }
                    RefPart::Line(l) => l,
                    RefPart::Ring(r) => open_ring(r, eps),
                };
                for &v in verts {
                    offer(&mut best, reference(v, (v - raw).norm()), vertex_tol);
                }
            }
        }
        if best.is_some() {
            return best;
        }
        for f in &nearby {
            for part in f.geometry.parts() {
                let hit = match part {
                    RefPart::Point(_) => None,
                    RefPart::Line(l) => closest_point_on_line(raw, l),
                    RefPart::Ring(r) => closest_point_on_ring(raw, r, eps),
                };
                if let Some((c, _, d)) = hit {
                    offer(&mut best, reference(c, d), edge_tol);
                }
            }
        }
        best
    }
}
