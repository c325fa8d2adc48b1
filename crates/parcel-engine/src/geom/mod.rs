//! Planar geometry validation.
//!
//! Purpose
//! - Pure, tolerance-aware predicates used by every editing tool: point
//!   location, segment intersection, polygon containment, overlap, adjacency,
//!   contiguity and line containment.
//! - Ring helpers (closing, orientation, shoelace area) and a tolerant
//!   boundary-correction pass.
//!
//! Code cross-refs: `boolean` (robust set operations), `tools::*` (callers).

mod correct;
mod predicates;
mod ring;
mod types;

pub use correct::{
    correct_geometry_to_boundary, correct_line_to_boundary, correct_point_to_boundary,
};
pub use predicates::{
    are_polygons_adjacent, are_polygons_contiguous, closest_point_on_line, closest_point_on_ring,
    closest_point_on_segment, collinear_overlap_length, do_polygons_overlap,
    is_line_within_boundary, is_point_inside_or_on_boundary, is_point_inside_polygon,
    is_point_on_polygon_boundary, is_point_on_segment, is_polygon_within_boundary,
    is_ring_self_intersecting, segments_intersect_properly,
};
pub use ring::{
    ccw, close_in_place, closed_ring, dedup_consecutive, edge_midpoints, is_closed,
    line_length, open_ring, points_equal, ring_area, ring_edges, signed_area, MIN_CLOSED_RING_LEN,
};
pub use types::{Affine2, Coord, Extent, GeomCfg};

#[cfg(test)]
mod tests;
