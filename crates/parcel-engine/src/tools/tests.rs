use super::*;
use crate::geom::ring_area;
use crate::surface::ViewTransform;
use nalgebra::vector;

fn square(s: f64) -> Vec<Coord> {
    vec![
        vector![0.0, 0.0],
        vector![s, 0.0],
        vector![s, s],
        vector![0.0, s],
        vector![0.0, 0.0],
    ]
}

#[test]
fn split_at_edge_midpoints() {
    let cfg = GeomCfg::default();
    let (a, b) = split_ring(&square(10.0), vector![5.0, 0.0], vector![5.0, 10.0], cfg).unwrap();
    assert_eq!(a.len(), 5);
    assert_eq!(b.len(), 5);
    assert_eq!(a.first(), a.last());
    assert_eq!(b.first(), b.last());
    assert!((ring_area(&a) - 50.0).abs() < 1e-9);
    assert!((ring_area(&b) - 50.0).abs() < 1e-9);
}

#[test]
fn split_at_existing_vertices() {
    let cfg = GeomCfg::default();
    let (a, b) = split_ring(&square(10.0), vector![0.0, 0.0], vector![10.0, 10.0], cfg).unwrap();
    assert_eq!((a.len(), b.len()), (4, 4));
    assert!((ring_area(&a) + ring_area(&b) - 100.0).abs() < 1e-9);
}

#[test]
fn split_rejects_degenerate_parts() {
    let cfg = GeomCfg::default();
    // both points on one edge: one side collapses to a sliver with two vertices
    assert!(split_ring(&square(10.0), vector![0.0, 0.0], vector![10.0, 0.0], cfg).is_none());
    assert!(split_ring(&square(10.0), vector![5.0, 5.0], vector![5.0, 10.0], cfg).is_none());
}

#[test]
fn first_and_closing_vertex_mirror() {
    let mut ring = square(1.0);
    set_ring_vertex(&mut ring, 0, vector![-1.0, -1.0]);
    assert_eq!(ring[0], ring[4]);
    set_ring_vertex(&mut ring, 4, vector![-2.0, -2.0]);
    assert_eq!(ring[0], vector![-2.0, -2.0]);
    assert_eq!(ring[4], vector![-2.0, -2.0]);
    set_ring_vertex(&mut ring, 2, vector![3.0, 3.0]);
    assert_eq!(ring[2], vector![3.0, 3.0]);
}

#[test]
fn simple_ring_checks() {
    let cfg = GeomCfg::default();
    assert!(check_simple_ring(&square(1.0), cfg).is_ok());
    let bowtie = vec![
        vector![0.0, 0.0],
        vector![1.0, 1.0],
        vector![1.0, 0.0],
        vector![0.0, 1.0],
        vector![0.0, 0.0],
    ];
    assert_eq!(check_simple_ring(&bowtie, cfg), Err(EditError::SelfIntersecting));
    assert!(matches!(
        check_simple_ring(&square(1.0)[..3], cfg),
        Err(EditError::TooFewPoints { .. })
    ));
}

#[test]
fn vertex_hit_uses_pixels() {
    let view = ViewTransform::new(vector![5.0, 5.0], 0.1, vector![400.0, 400.0]);
    let ring = square(10.0);
    // 0.5 m = 5 px from (10, 10)
    assert_eq!(vertex_under(&ring, vector![10.0, 10.5], 8.0, &view, 1e-3), Some(2));
    assert_eq!(vertex_under(&ring, vector![10.0, 11.0], 8.0, &view, 1e-3), None);
}

#[test]
fn split_through_reflex_vertex_leaves_touching_part() {
    let cfg = GeomCfg::default();
    let notched = vec![
        vector![0.0, 0.0],
        vector![12.0, 0.0],
        vector![12.0, 10.0],
        vector![4.0, 5.0],
        vector![0.0, 10.0],
        vector![0.0, 0.0],
    ];
    let (a, b) = split_ring(&notched, vector![0.0, 5.0], vector![12.0, 5.0], cfg).unwrap();
    let simple = [check_simple_ring(&a, cfg), check_simple_ring(&b, cfg)];
    assert!(simple.contains(&Err(EditError::SelfIntersecting)));
}
