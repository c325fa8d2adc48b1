//! Tolerance-aware planar predicates shared by every editing tool.
//!
//! All functions are pure. Rings may be passed in open or closed form; the
//! duplicated closing coordinate is ignored where it matters.
//!
//! Conventions
//! - `eps` absorbs floating-point noise in "on segment / equal" tests.
//! - `cfg.slack()` (= 10·eps) bounds adjacency, coincidence and extent checks.
//! - "Inside" (strict) excludes the boundary; "inside or on" includes it.

use std::collections::VecDeque;

use super::ring::{edge_midpoints, open_ring, points_equal, ring_edges};
use super::types::{Coord, Extent, GeomCfg};

/// Twice the signed area of triangle `(a, b, c)`.
#[inline]
fn cross(a: Coord, b: Coord, c: Coord) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Signed distance of `c` from the infinite line through `a`, `b`.
#[inline]
fn line_offset(a: Coord, b: Coord, c: Coord) -> f64 {
    let len = (b - a).norm();
    if len <= f64::EPSILON {
        return (c - a).norm();
    }
    cross(a, b, c) / len
}

/// Closest point to `p` on segment `[a, b]`.
pub fn closest_point_on_segment(p: Coord, a: Coord, b: Coord) -> Coord {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point on the ring boundary: `(point, edge_index, distance)`.
/// `None` for rings with fewer than two coordinates.
pub fn closest_point_on_ring(p: Coord, ring: &[Coord], eps: f64) -> Option<(Coord, usize, f64)> {
    let mut best: Option<(Coord, usize, f64)> = None;
    for (i, a, b) in ring_edges(ring, eps) {
        let q = closest_point_on_segment(p, a, b);
        let d = (q - p).norm();
        if best.is_none_or(|(_, _, bd)| d < bd) {
            best = Some((q, i, d));
        }
    }
    best
}

/// Closest point on an open polyline: `(point, segment_index, distance)`.
pub fn closest_point_on_line(p: Coord, line: &[Coord]) -> Option<(Coord, usize, f64)> {
    let mut best: Option<(Coord, usize, f64)> = None;
    for (i, w) in line.windows(2).enumerate() {
        let q = closest_point_on_segment(p, w[0], w[1]);
        let d = (q - p).norm();
        if best.is_none_or(|(_, _, bd)| d < bd) {
            best = Some((q, i, d));
        }
    }
    best
}

/// `p` lies on segment `[a, b]` within `eps`.
pub fn is_point_on_segment(p: Coord, a: Coord, b: Coord, eps: f64) -> bool {
    (closest_point_on_segment(p, a, b) - p).norm() <= eps
}

pub fn is_point_on_polygon_boundary(p: Coord, ring: &[Coord], eps: f64) -> bool {
    ring_edges(ring, eps).any(|(_, a, b)| is_point_on_segment(p, a, b, eps))
}

/// Strict interior test (ray casting). Points on the boundary return `false`.
pub fn is_point_inside_polygon(p: Coord, ring: &[Coord], eps: f64) -> bool {
    let open = open_ring(ring, eps);
    if open.len() < 3 || is_point_on_polygon_boundary(p, open, eps) {
        return false;
    }
    let n = open.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (open[i], open[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Containment test where the boundary counts as inside.
pub fn is_point_inside_or_on_boundary(p: Coord, ring: &[Coord], eps: f64) -> bool {
    is_point_on_polygon_boundary(p, ring, eps) || is_point_inside_polygon(p, ring, eps)
}

/// Every vertex and edge midpoint of `inner` is inside-or-on `outer`, and
/// `inner`'s extent does not stick out of `outer`'s by more than the slack.
pub fn is_polygon_within_boundary(inner: &[Coord], outer: &[Coord], cfg: GeomCfg) -> bool {
    let eps = cfg.eps;
    let inner_open = open_ring(inner, eps);
    if inner_open.len() < 3 || open_ring(outer, eps).len() < 3 {
        return false;
    }
    if !inner_open
        .iter()
        .all(|&v| is_point_inside_or_on_boundary(v, outer, eps))
    {
        return false;
    }
    if !edge_midpoints(inner, eps)
        .into_iter()
        .all(|m| is_point_inside_or_on_boundary(m, outer, eps))
    {
        return false;
    }
    match (Extent::from_points(inner_open), Extent::from_points(outer)) {
        (Some(ei), Some(eo)) => !ei.exceeds(&eo, cfg.slack()),
        _ => false,
    }
}

/// Every vertex and every segment midpoint of an open line is inside-or-on `boundary`.
pub fn is_line_within_boundary(line: &[Coord], boundary: &[Coord], cfg: GeomCfg) -> bool {
    if line.len() < 2 {
        return false;
    }
    let eps = cfg.eps;
    line.iter()
        .all(|&v| is_point_inside_or_on_boundary(v, boundary, eps))
        && line
            .windows(2)
            .all(|w| is_point_inside_or_on_boundary((w[0] + w[1]) * 0.5, boundary, eps))
}

/// Segments cross at a single interior point of both.
///
/// Shared endpoints, T-junctions and collinear pairs are not proper intersections.
pub fn segments_intersect_properly(a1: Coord, a2: Coord, b1: Coord, b2: Coord, eps: f64) -> bool {
    if points_equal(a1, b1, eps)
        || points_equal(a1, b2, eps)
        || points_equal(a2, b1, eps)
        || points_equal(a2, b2, eps)
    {
        return false;
    }
    let d1 = line_offset(a1, a2, b1);
    let d2 = line_offset(a1, a2, b2);
    let d3 = line_offset(b1, b2, a1);
    let d4 = line_offset(b1, b2, a2);
    if d1.abs() <= eps && d2.abs() <= eps {
        return false;
    }
    let straddle_b = (d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps);
    let straddle_a = (d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps);
    straddle_a && straddle_b
}

/// Length of the shared stretch of two collinear segments (0 if not collinear).
pub fn collinear_overlap_length(a1: Coord, a2: Coord, b1: Coord, b2: Coord, eps: f64) -> f64 {
    let len_a = (a2 - a1).norm();
    let len_b = (b2 - b1).norm();
    if len_a <= eps || len_b <= eps {
        return 0.0;
    }
    if line_offset(a1, a2, b1).abs() > eps
        || line_offset(a1, a2, b2).abs() > eps
        || line_offset(b1, b2, a1).abs() > eps
        || line_offset(b1, b2, a2).abs() > eps
    {
        return 0.0;
    }
    let dir = (a2 - a1) / len_a;
    let tb1 = (b1 - a1).dot(&dir);
    let tb2 = (b2 - a1).dot(&dir);
    let lo = tb1.min(tb2).max(0.0);
    let hi = tb1.max(tb2).min(len_a);
    (hi - lo).max(0.0)
}

/// Interior overlap between two polygons.
///
/// True if a vertex of either lies strictly inside the other, any edge pair
/// properly intersects, or an edge midpoint of either lies strictly inside the other.
pub fn do_polygons_overlap(a: &[Coord], b: &[Coord], cfg: GeomCfg) -> bool {
    let eps = cfg.eps;
    let oa = open_ring(a, eps);
    let ob = open_ring(b, eps);
    if oa.len() < 3 || ob.len() < 3 {
        return false;
    }
    if let (Some(ea), Some(eb)) = (Extent::from_points(oa), Extent::from_points(ob)) {
        if !ea.intersects(&eb.buffered(eps)) {
            return false;
        }
    }
    if oa.iter().any(|&v| is_point_inside_polygon(v, ob, eps))
        || ob.iter().any(|&v| is_point_inside_polygon(v, oa, eps))
    {
        return true;
    }
    for (_, a1, a2) in ring_edges(oa, eps) {
        for (_, b1, b2) in ring_edges(ob, eps) {
            if segments_intersect_properly(a1, a2, b1, b2, eps) {
                return true;
            }
        }
    }
    if edge_midpoints(oa, eps)
        .into_iter()
        .any(|m| is_point_inside_polygon(m, ob, eps))
        || edge_midpoints(ob, eps)
            .into_iter()
            .any(|m| is_point_inside_polygon(m, oa, eps))
    {
        return true;
    }
    // coincident outlines: nothing above fires, so probe just inside each edge
    inward_probes(oa, 2.0 * cfg.slack())
        .into_iter()
        .any(|q| is_point_inside_polygon(q, oa, eps) && is_point_inside_polygon(q, ob, eps))
}

/// Points offset by `d` from each edge midpoint towards the ring interior.
fn inward_probes(open: &[Coord], d: f64) -> Vec<Coord> {
    let n = open.len();
    let orientation = if super::ring::signed_area(open) >= 0.0 { 1.0 } else { -1.0 };
    (0..n)
        .filter_map(|i| {
            let a = open[i];
            let b = open[(i + 1) % n];
            let e = b - a;
            let len = e.norm();
            if len <= d {
                return None;
            }
            let left = Coord::new(-e.y, e.x) / len;
            Some((a + b) * 0.5 + left * (orientation * d))
        })
        .collect()
}

/// Shared collinear edge stretch longer than the slack, or at least two
/// coincident vertices. A single shared corner is not adjacency.
pub fn are_polygons_adjacent(a: &[Coord], b: &[Coord], cfg: GeomCfg) -> bool {
    let eps = cfg.eps;
    let slack = cfg.slack();
    let oa = open_ring(a, eps);
    let ob = open_ring(b, eps);
    if oa.len() < 3 || ob.len() < 3 {
        return false;
    }
    if let (Some(ea), Some(eb)) = (Extent::from_points(oa), Extent::from_points(ob)) {
        if !ea.buffered(slack).intersects(&eb) {
            return false;
        }
    }
    for (_, a1, a2) in ring_edges(oa, eps) {
        for (_, b1, b2) in ring_edges(ob, eps) {
            if collinear_overlap_length(a1, a2, b1, b2, eps) > slack {
                return true;
            }
        }
    }
    let shared = oa
        .iter()
        .filter(|&&va| ob.iter().any(|&vb| points_equal(va, vb, slack)))
        .count();
    shared >= 2
}

/// Breadth-first walk over the pairwise adjacency graph from element 0.
/// Empty and single-element sets are contiguous.
pub fn are_polygons_contiguous<R: AsRef<[Coord]>>(set: &[R], cfg: GeomCfg) -> bool {
    let n = set.len();
    if n <= 1 {
        return true;
    }
    let mut adj = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if are_polygons_adjacent(set[i].as_ref(), set[j].as_ref(), cfg) {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
    }
    let mut seen = vec![false; n];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    while let Some(k) = queue.pop_front() {
        for &m in &adj[k] {
            if !seen[m] {
                seen[m] = true;
                queue.push_back(m);
            }
        }
    }
    seen.into_iter().all(|s| s)
}

/// A ring crosses or touches itself away from its consecutive vertices.
///
/// Detects proper crossings, vertices resting on non-adjacent edges, repeated
/// vertices and edges that fold back over their neighbours.
pub fn is_ring_self_intersecting(ring: &[Coord], cfg: GeomCfg) -> bool {
    let eps = cfg.eps;
    let open = open_ring(ring, eps);
    let n = open.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if points_equal(open[i], open[j], eps) {
                return true;
            }
        }
    }
    let edges: Vec<(Coord, Coord)> = ring_edges(open, eps).map(|(_, a, b)| (a, b)).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            let (a1, a2) = edges[i];
            let (b1, b2) = edges[j];
            if collinear_overlap_length(a1, a2, b1, b2, eps) > eps {
                return true;
            }
            let neighbours = j == i + 1 || (i == 0 && j == n - 1);
            if neighbours {
                continue;
            }
            if segments_intersect_properly(a1, a2, b1, b2, eps)
                || is_point_on_segment(b1, a1, a2, eps)
                || is_point_on_segment(b2, a1, a2, eps)
                || is_point_on_segment(a1, b1, b2, eps)
                || is_point_on_segment(a2, b1, b2, eps)
            {
                return true;
            }
        }
    }
    false
}
