//! Polygon set operations and ring merging.
//!
//! Purpose
//! - One interface (`PolygonSetOps`: union, intersection, difference) over a
//!   robust planar clipper, used for clipping fills to the available space,
//!   measuring overlaps and reporting uncovered gaps.
//! - `merge`: the edge-cancellation ring walk for the common "single outer
//!   loop" case, falling back to the robust union when the walk fails.
//!
//! Results that would carry holes or several disjoint parts are rejected by
//! the merge; boundaries and parcels are single outer rings.

mod clip;
mod merge;

pub use clip::GeoClipper;
pub use merge::{merge_rings, merge_rings_by_edges, MergeError};

use crate::geom::{closed_ring, ring_area, Coord, GeomCfg};

/// Output polygon of a set operation: closed exterior ring plus holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub exterior: Vec<Coord>,
    pub holes: Vec<Vec<Coord>>,
}

impl Shape {
    /// Exterior area minus hole areas.
    pub fn area(&self) -> f64 {
        ring_area(&self.exterior) - self.holes.iter().map(|h| ring_area(h)).sum::<f64>()
    }
}

/// Robust planar set operations on simple rings.
pub trait PolygonSetOps {
    fn union(&self, rings: &[Vec<Coord>]) -> Vec<Shape>;
    fn intersection(&self, a: &[Coord], b: &[Coord]) -> Vec<Shape>;
    fn difference(&self, a: &[Coord], subtract: &[Vec<Coord>]) -> Vec<Shape>;
}

/// Area below which an overlap or gap is treated as numerical noise.
///
/// The effective threshold is `max(absolute, relative · smaller_area)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaThreshold {
    pub absolute: f64,
    pub relative: f64,
}

impl Default for AreaThreshold {
    fn default() -> Self {
        Self {
            absolute: 0.01,
            relative: 1e-6,
        }
    }
}

impl AreaThreshold {
    pub fn for_pair(&self, a_area: f64, b_area: f64) -> f64 {
        self.absolute.max(self.relative * a_area.min(b_area))
    }

    pub fn for_area(&self, area: f64) -> f64 {
        self.absolute.max(self.relative * area)
    }
}

/// Area shared by two rings.
pub fn overlap_area(ops: &dyn PolygonSetOps, a: &[Coord], b: &[Coord]) -> f64 {
    ops.intersection(a, b).iter().map(Shape::area).sum()
}

/// Shared area above the negligible threshold for this pair.
pub fn overlaps_significantly(
    ops: &dyn PolygonSetOps,
    a: &[Coord],
    b: &[Coord],
    threshold: AreaThreshold,
) -> bool {
    let shared = overlap_area(ops, a, b);
    shared > threshold.for_pair(ring_area(a), ring_area(b))
}

/// Parts of the boundary not covered by any parcel, above the threshold.
pub fn available_space(
    ops: &dyn PolygonSetOps,
    boundary: &[Coord],
    parcels: &[Vec<Coord>],
    threshold: AreaThreshold,
) -> Vec<Shape> {
    let min_area = threshold.absolute;
    ops.difference(boundary, parcels)
        .into_iter()
        .filter(|s| s.area() > min_area)
        .collect()
}

/// Summary of the uncovered boundary area.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GapReport {
    pub gaps: Vec<Shape>,
    pub total_area: f64,
}

pub fn gap_report(
    ops: &dyn PolygonSetOps,
    boundary: &[Coord],
    parcels: &[Vec<Coord>],
    threshold: AreaThreshold,
) -> GapReport {
    let gaps = available_space(ops, boundary, parcels, threshold);
    let total_area = gaps.iter().map(Shape::area).sum();
    GapReport { gaps, total_area }
}

/// Clip `candidate` to the boundary minus existing parcels.
///
/// Returns the clipped ring only when the result is a single hole-free part
/// whose area is above the threshold.
pub fn clip_to_available(
    ops: &dyn PolygonSetOps,
    candidate: &[Coord],
    boundary: &[Coord],
    parcels: &[Vec<Coord>],
    threshold: AreaThreshold,
    cfg: GeomCfg,
) -> Option<Vec<Coord>> {
    let inside: Vec<Shape> = ops
        .intersection(candidate, boundary)
        .into_iter()
        .filter(|s| s.area() > threshold.absolute)
        .collect();
    let [part] = inside.as_slice() else {
        return None;
    };
    if !part.holes.is_empty() {
        return None;
    }
    let free: Vec<Shape> = ops
        .difference(&part.exterior, parcels)
        .into_iter()
        .filter(|s| s.area() > threshold.for_area(ring_area(candidate)))
        .collect();
    match free.as_slice() {
        [only] if only.holes.is_empty() => Some(closed_ring(&only.exterior, cfg.eps)),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
