//! Two-point polygon split.
//!
//! The first point pins a source ring (a parcel, or the boundary when no
//! parcel is within reach); the second point is snapped onto that ring only.
//! A boundary source yields two new parcels and leaves the boundary alone; a
//! parcel source is replaced by its two halves.

use tracing::{debug, info};

use crate::error::EditError;
use crate::events::EditorEvent;
use crate::geom::{
    closed_ring, closest_point_on_ring, is_point_inside_polygon, is_point_on_segment, open_ring,
    points_equal, ring_edges, segments_intersect_properly, Coord, GeomCfg,
};
use crate::model::FeatureId;
use crate::snap::{snap_to_ring, RingHit};

use super::{check_simple_ring, Ctx, DrawMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceSource {
    Boundary,
    Parcel(FeatureId),
}

#[derive(Clone, Debug)]
struct Pinned {
    source: SliceSource,
    ring: Vec<Coord>,
    first: Coord,
}

#[derive(Clone, Debug, Default)]
pub struct SliceTool {
    active: bool,
    pinned: Option<Pinned>,
    cursor: Option<Coord>,
}

impl SliceTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn source(&self) -> Option<SliceSource> {
        self.pinned.as_ref().map(|p| p.source)
    }

    pub fn first_point(&self) -> Option<Coord> {
        self.pinned.as_ref().map(|p| p.first)
    }

    /// Cut line from the first point to the snapped pointer.
    pub fn preview(&self) -> Option<[Coord; 2]> {
        Some([self.pinned.as_ref()?.first, self.cursor?])
    }

    pub fn start(&mut self, ctx: &mut Ctx, mode: DrawMode) -> Result<(), EditError> {
        if mode != DrawMode::Parcel {
            return Err(EditError::WrongMode("boundary"));
        }
        if ctx.doc.boundary.is_none() {
            return Err(EditError::NoBoundary);
        }
        *self = Self {
            active: true,
            ..Self::default()
        };
        ctx.emit(EditorEvent::SliceStarted);
        Ok(())
    }

    pub fn pointer_move(&mut self, ctx: &Ctx, raw: Coord) {
        let Some(pinned) = &self.pinned else { return };
        let (edge_tol, vertex_tol) = tolerances(ctx);
        self.cursor = Some(
            snap_to_ring(raw, &pinned.ring, edge_tol, vertex_tol, ctx.cfg.eps)
                .map_or(raw, |h| h.coord),
        );
    }

    /// First click pins the source; the second one cuts.
    /// Returns the ids of the two new parcels once a cut is made.
    pub fn click(
        &mut self,
        ctx: &mut Ctx,
        raw: Coord,
    ) -> Result<Option<(FeatureId, FeatureId)>, EditError> {
        if !self.active {
            return Err(EditError::NotActive("slice"));
        }
        let (edge_tol, vertex_tol) = tolerances(ctx);
        let eps = ctx.cfg.eps;
        let pinned = match &self.pinned {
            Some(p) => p,
            None => {
                let (source, ring, hit) = pick_source(ctx, raw, edge_tol, vertex_tol)
                    .ok_or(EditError::NoSnapTarget)?;
                debug!(?source, "slice source pinned");
                self.pinned = Some(Pinned {
                    source,
                    ring,
                    first: hit.coord,
                });
                ctx.emit(EditorEvent::SlicePointSelected { point: hit.coord });
                return Ok(None);
            }
        };
        let second = snap_to_ring(raw, &pinned.ring, edge_tol, vertex_tol, eps)
            .ok_or(EditError::NoSnapTarget)?
            .coord;
        if (second - pinned.first).norm() < ctx.cfg.min_slice_distance {
            return Err(EditError::DegenerateCut);
        }
        ctx.emit(EditorEvent::SlicePointSelected { point: second });
        let (source, first) = (pinned.source, pinned.first);
        let cfg = ctx.geom();
        if !cut_is_interior(&pinned.ring, first, second, cfg) {
            return Err(EditError::CutOutside);
        }
        let (a, b) = split_ring(&pinned.ring, first, second, cfg).ok_or(EditError::DegenerateCut)?;
        let ids = self.apply(ctx, source, a, b)?;
        self.pinned = None;
        self.cursor = None;
        Ok(Some(ids))
    }

    fn apply(
        &mut self,
        ctx: &mut Ctx,
        source: SliceSource,
        a: Vec<Coord>,
        b: Vec<Coord>,
    ) -> Result<(FeatureId, FeatureId), EditError> {
        let cfg = ctx.geom();
        check_simple_ring(&a, cfg)?;
        check_simple_ring(&b, cfg)?;
        let metadata = match source {
            SliceSource::Boundary => {
                for child in [&a, &b] {
                    if let Some(id) = ctx.first_overlap(child, None) {
                        return Err(EditError::OverlapsParcel(id));
                    }
                }
                Default::default()
            }
            SliceSource::Parcel(id) => {
                let index = ctx.doc.parcel_index(id).ok_or(EditError::NoSuchFeature(id))?;
                ctx.remove_parcel(index)?.metadata
            }
        };
        let (_, first) = ctx.add_parcel(a, metadata.clone());
        let (_, second) = ctx.add_parcel(b, metadata);
        info!(?source, %first, %second, "sliced");
        ctx.emit(EditorEvent::SliceCompleted { first, second });
        Ok((first, second))
    }

    pub fn cancel(&mut self, ctx: &mut Ctx) -> Result<(), EditError> {
        if !self.active {
            return Err(EditError::NotActive("slice"));
        }
        *self = Self::default();
        ctx.emit(EditorEvent::SliceCancelled);
        Ok(())
    }
}

fn tolerances(ctx: &Ctx) -> (f64, f64) {
    let res = ctx.surface.resolution();
    (ctx.snap.edge_tolerance(res), ctx.snap.vertex_tolerance(res))
}

/// Source-wide snap: every parcel first (vertex hits before edge hits), then the boundary.
fn pick_source(
    ctx: &Ctx,
    raw: Coord,
    edge_tol: f64,
    vertex_tol: f64,
) -> Option<(SliceSource, Vec<Coord>, RingHit)> {
    let eps = ctx.cfg.eps;
    let best = ctx
        .doc
        .parcels
        .iter()
        .filter_map(|p| snap_to_ring(raw, &p.ring, edge_tol, vertex_tol, eps).map(|h| (p, h)))
        .min_by(|(_, x), (_, y)| {
            (x.vertex.is_none(), x.dist)
                .partial_cmp(&(y.vertex.is_none(), y.dist))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some((p, hit)) = best {
        return Some((SliceSource::Parcel(p.id), p.ring.clone(), hit));
    }
    let boundary = ctx.doc.boundary_ring()?;
    let hit = snap_to_ring(raw, boundary, edge_tol, vertex_tol, eps)?;
    Some((SliceSource::Boundary, boundary.to_vec(), hit))
}

/// The cut must cross the inside of the ring without leaving it or touching
/// any ring vertex other than its own end points.
fn cut_is_interior(ring: &[Coord], a: Coord, b: Coord, cfg: GeomCfg) -> bool {
    let eps = cfg.eps;
    let mid = (a + b) * 0.5;
    let touches_vertex = open_ring(ring, eps).iter().any(|&v| {
        !points_equal(v, a, eps) && !points_equal(v, b, eps) && is_point_on_segment(v, a, b, eps)
    });
    is_point_inside_polygon(mid, ring, eps)
        && !touches_vertex
        && !ring_edges(ring, eps).any(|(_, p, q)| segments_intersect_properly(a, b, p, q, eps))
}

/// Index of `p` in `open`, inserting it on its edge if it is not already a vertex.
fn insert_on_ring(open: &mut Vec<Coord>, p: Coord, cfg: GeomCfg) -> Option<usize> {
    if let Some(i) = open.iter().position(|&v| points_equal(v, p, cfg.eps)) {
        return Some(i);
    }
    let (_, edge, d) = closest_point_on_ring(p, open, cfg.eps)?;
    if d > cfg.slack() {
        return None;
    }
    open.insert(edge + 1, p);
    Some(edge + 1)
}

/// Split a ring at two boundary points into two closed rings.
///
/// The first result runs from the earlier to the later cut index, the second
/// from the later one around the wrap back to the earlier. `None` when a cut
/// point is off the ring or either part has fewer than four coordinates.
pub fn split_ring(
    ring: &[Coord],
    a: Coord,
    b: Coord,
    cfg: GeomCfg,
) -> Option<(Vec<Coord>, Vec<Coord>)> {
    let mut open = open_ring(ring, cfg.eps).to_vec();
    if open.len() < 3 {
        return None;
    }
    insert_on_ring(&mut open, a, cfg)?;
    insert_on_ring(&mut open, b, cfg)?;
    let i = open.iter().position(|&v| points_equal(v, a, cfg.eps))?;
    let j = open.iter().position(|&v| points_equal(v, b, cfg.eps))?;
    if i == j {
        return None;
    }
    let (i, j) = (i.min(j), i.max(j));
    let first = closed_ring(&open[i..=j], cfg.eps);
    let wrap: Vec<Coord> = open[j..].iter().chain(open[..=i].iter()).copied().collect();
    let second = closed_ring(&wrap, cfg.eps);
    if first.len() < 4 || second.len() < 4 {
        return None;
    }
    Some((first, second))
}
