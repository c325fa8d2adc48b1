use super::*;
use crate::geom::{is_closed, ring_area};
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

fn unit(x: f64, y: f64) -> Vec<Coord> {
    rect(x, y, x + 1.0, y + 1.0)
}

#[test]
fn edge_walk_merges_two_by_two_block() {
    let cfg = GeomCfg::default();
    let block = vec![unit(0.0, 0.0), unit(1.0, 0.0), unit(1.0, 1.0), unit(0.0, 1.0)];
    let ring = merge_rings_by_edges(&block, cfg).expect("walk closes");
    assert!(is_closed(&ring, cfg.eps));
    assert!((ring_area(&ring) - 4.0).abs() < 1e-9);
}

#[test]
fn edge_walk_handles_mixed_orientation() {
    let cfg = GeomCfg::default();
    let mut cw = unit(1.0, 0.0);
    cw.reverse();
    let ring = merge_rings_by_edges(&[unit(0.0, 0.0), cw], cfg).unwrap();
    assert!((ring_area(&ring) - 2.0).abs() < 1e-9);
}

#[test]
fn edge_walk_rejects_disjoint_inputs() {
    let cfg = GeomCfg::default();
    assert!(merge_rings_by_edges(&[unit(0.0, 0.0), unit(5.0, 0.0)], cfg).is_none());
}

#[test]
fn merge_falls_back_to_union_on_t_junctions() {
    let cfg = GeomCfg::default();
    // the long rectangle's top edge is split by two squares above it
    let rings = vec![rect(0.0, 0.0, 2.0, 1.0), unit(0.0, 1.0), unit(1.0, 1.0)];
    let ring = merge_rings(&rings, cfg, &GeoClipper).expect("union fallback");
    assert!(is_closed(&ring, cfg.eps));
    assert!((ring_area(&ring) - 4.0).abs() < 1e-6);
}

#[test]
fn merge_rejects_holes_and_islands() {
    let cfg = GeomCfg::default();
    let ring_of_squares: Vec<Vec<Coord>> = (0..3)
        .flat_map(|x| (0..3).map(move |y| (x, y)))
        .filter(|&(x, y)| !(x == 1 && y == 1))
        .map(|(x, y)| unit(x as f64, y as f64))
        .collect();
    assert_eq!(
        merge_rings(&ring_of_squares, cfg, &GeoClipper),
        Err(MergeError::Hole)
    );
    assert_eq!(
        merge_rings(&[unit(0.0, 0.0), unit(3.0, 0.0)], cfg, &GeoClipper),
        Err(MergeError::Disjoint(2))
    );
    assert_eq!(merge_rings(&[], cfg, &GeoClipper), Err(MergeError::Empty));
}

#[test]
fn single_ring_merge_is_closed_copy() {
    let cfg = GeomCfg::default();
    let open = vec![vector![0.0, 0.0], vector![0.0, 3.0], vector![3.0, 0.0]];
    let ring = merge_rings(&[open], cfg, &GeoClipper).unwrap();
    assert_eq!(ring.len(), 4);
    assert!(crate::geom::signed_area(&ring) > 0.0);
}

#[test]
fn overlap_area_and_threshold() {
    let ops = GeoClipper;
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let b = rect(5.0, 0.0, 15.0, 10.0);
    assert!((overlap_area(&ops, &a, &b) - 50.0).abs() < 1e-6);
    let t = AreaThreshold::default();
    assert!(overlaps_significantly(&ops, &a, &b, t));
    let touching = rect(10.0, 0.0, 20.0, 10.0);
    assert!(!overlaps_significantly(&ops, &a, &touching, t));
    assert!((t.for_pair(1e8, 2e8) - 100.0).abs() < 1e-9);
}

#[test]
fn gaps_and_clipping_to_available_space() {
    let cfg = GeomCfg::default();
    let ops = GeoClipper;
    let t = AreaThreshold::default();
    let boundary = rect(0.0, 0.0, 100.0, 100.0);
    let parcels = vec![rect(0.0, 0.0, 50.0, 100.0)];
    let report = gap_report(&ops, &boundary, &parcels, t);
    assert_eq!(report.gaps.len(), 1);
    assert!((report.total_area - 5000.0).abs() < 1e-6);

    let candidate = rect(40.0, 10.0, 120.0, 20.0);
    let clipped = clip_to_available(&ops, &candidate, &boundary, &parcels, t, cfg).unwrap();
    assert!((ring_area(&clipped) - 500.0).abs() < 1e-6);

    // candidate cut in two by an existing parcel
    let split = vec![rect(45.0, 0.0, 55.0, 100.0)];
    let across = rect(30.0, 40.0, 70.0, 60.0);
    assert!(clip_to_available(&ops, &across, &boundary, &split, t, cfg).is_none());
}
