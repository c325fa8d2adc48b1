//! Tolerant repair of geometry that nominally sits on a boundary.
//!
//! Vertices within the slack (10·eps) of a boundary vertex are moved onto it;
//! otherwise vertices within the slack of a boundary edge are projected onto
//! that edge. Everything else is left untouched. The pass runs before
//! containment validation so floating-point drift does not cause rejections.

use super::predicates::closest_point_on_ring;
use super::ring::open_ring;
use super::types::{Coord, GeomCfg};

/// Snap a single coordinate to the boundary if it lies within the slack.
pub fn correct_point_to_boundary(p: Coord, boundary: &[Coord], cfg: GeomCfg) -> Coord {
    let slack = cfg.slack();
    let verts = open_ring(boundary, cfg.eps);
    let nearest_vertex = verts
        .iter()
        .map(|&v| (v, (v - p).norm()))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some((v, d)) = nearest_vertex {
        if d <= slack {
            return v;
        }
    }
    match closest_point_on_ring(p, boundary, cfg.eps) {
        Some((q, _, d)) if d <= slack => q,
        _ => p,
    }
}

/// Apply `correct_point_to_boundary` to every ring vertex; keeps the ring closed.
pub fn correct_geometry_to_boundary(
    ring: &[Coord],
    boundary: &[Coord],
    cfg: GeomCfg,
) -> Vec<Coord> {
    let mut out: Vec<Coord> = ring
        .iter()
        .map(|&p| correct_point_to_boundary(p, boundary, cfg))
        .collect();
    let n = out.len();
    if n >= 2 && (ring[0] - ring[n - 1]).norm() <= cfg.eps {
        out[n - 1] = out[0];
    }
    out
}

/// Same repair for open polylines (no closing coordinate to preserve).
pub fn correct_line_to_boundary(line: &[Coord], boundary: &[Coord], cfg: GeomCfg) -> Vec<Coord> {
    line.iter()
        .map(|&p| correct_point_to_boundary(p, boundary, cfg))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn square() -> Vec<Coord> {
        vec![
            vector![0.0, 0.0],
            vector![100.0, 0.0],
            vector![100.0, 100.0],
            vector![0.0, 100.0],
            vector![0.0, 0.0],
        ]
    }

    #[test]
    fn near_vertex_snaps_to_vertex() {
        let cfg = GeomCfg::default();
        let p = correct_point_to_boundary(vector![100.004, 99.997], &square(), cfg);
        assert_eq!(p, vector![100.0, 100.0]);
    }

    #[test]
    fn near_edge_projects_onto_edge() {
        let cfg = GeomCfg::default();
        let p = correct_point_to_boundary(vector![50.0, -0.006], &square(), cfg);
        assert!((p - vector![50.0, 0.0]).norm() < 1e-12);
    }

    #[test]
    fn far_points_are_unchanged_and_ring_stays_closed() {
        let cfg = GeomCfg::default();
        let ring = vec![
            vector![-0.005, 10.0],
            vector![50.0, 10.0],
            vector![50.0, 50.0],
            vector![-0.005, 10.0],
        ];
        let out = correct_geometry_to_boundary(&ring, &square(), cfg);
        assert_eq!(out[1], ring[1]);
        assert!((out[0] - vector![0.0, 10.0]).norm() < 1e-12);
        assert_eq!(out[0], out[3]);
    }
}
