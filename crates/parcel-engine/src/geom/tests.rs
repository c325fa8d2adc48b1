use super::*;
use nalgebra::vector;
use proptest::prelude::*;

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Coord> {
    vec![
        vector![x0, y0],
        vector![x1, y0],
        vector![x1, y1],
        vector![x0, y1],
        vector![x0, y0],
    ]
}

fn unit_square(x: f64, y: f64) -> Vec<Coord> {
    rect(x, y, x + 1.0, y + 1.0)
}

#[test]
fn point_location_classifies_boundary_separately() {
    let eps = GeomCfg::default().eps;
    let sq = rect(0.0, 0.0, 10.0, 10.0);
    assert!(is_point_inside_polygon(vector![5.0, 5.0], &sq, eps));
    assert!(!is_point_inside_polygon(vector![10.0, 5.0], &sq, eps));
    assert!(is_point_on_polygon_boundary(vector![10.0, 5.0], &sq, eps));
    assert!(is_point_inside_or_on_boundary(vector![10.0, 5.0], &sq, eps));
    assert!(!is_point_inside_or_on_boundary(vector![10.1, 5.0], &sq, eps));
    assert!(is_point_on_segment(
        vector![5.0, 0.0005],
        vector![0.0, 0.0],
        vector![10.0, 0.0],
        eps
    ));
}

#[test]
fn within_boundary_requires_vertices_midpoints_and_extent() {
    let cfg = GeomCfg::default();
    let outer = rect(0.0, 0.0, 100.0, 100.0);
    let inner = rect(10.0, 10.0, 90.0, 90.0);
    assert!(is_polygon_within_boundary(&inner, &outer, cfg));
    // sharing the whole outline is still "within"
    assert!(is_polygon_within_boundary(&outer, &outer, cfg));

    let mut moved = inner.clone();
    moved[2] = vector![100.5, 90.0];
    assert!(!is_polygon_within_boundary(&moved, &outer, cfg));
}

#[test]
fn edge_midpoint_catches_reentrant_boundary() {
    let cfg = GeomCfg::default();
    // U-shaped boundary: notch between x=40..60 from y=50 upwards
    let outer = vec![
        vector![0.0, 0.0],
        vector![100.0, 0.0],
        vector![100.0, 100.0],
        vector![60.0, 100.0],
        vector![60.0, 50.0],
        vector![40.0, 50.0],
        vector![40.0, 100.0],
        vector![0.0, 100.0],
        vector![0.0, 0.0],
    ];
    // every vertex is inside, but the top edge crosses the notch
    let bridge = rect(20.0, 60.0, 80.0, 70.0);
    assert!(!is_polygon_within_boundary(&bridge, &outer, cfg));
}

#[test]
fn adjacency_full_edge_vs_single_corner() {
    let cfg = GeomCfg::default();
    assert!(are_polygons_adjacent(&unit_square(0.0, 0.0), &unit_square(1.0, 0.0), cfg));
    assert!(!are_polygons_adjacent(&unit_square(0.0, 0.0), &unit_square(1.0, 1.0), cfg));
    // partial shared edge counts
    assert!(are_polygons_adjacent(&unit_square(0.0, 0.0), &unit_square(1.0, 0.5), cfg));
    assert!(!are_polygons_adjacent(&unit_square(0.0, 0.0), &unit_square(3.0, 0.0), cfg));
}

#[test]
fn overlap_ignores_touching_and_detects_shared_area() {
    let cfg = GeomCfg::default();
    let a = unit_square(0.0, 0.0);
    assert!(!do_polygons_overlap(&a, &unit_square(1.0, 0.0), cfg));
    assert!(!do_polygons_overlap(&a, &unit_square(1.0, 1.0), cfg));
    assert!(do_polygons_overlap(&a, &unit_square(0.5, 0.5), cfg));
    // a cross: no vertex of either inside the other
    let wide = rect(-1.0, 0.4, 2.0, 0.6);
    let tall = rect(0.4, -1.0, 0.6, 2.0);
    assert!(do_polygons_overlap(&wide, &tall, cfg));
    // identical outlines overlap fully
    assert!(do_polygons_overlap(&a, &unit_square(0.0, 0.0), cfg));
}

#[test]
fn contiguity_walks_the_adjacency_graph() {
    let cfg = GeomCfg::default();
    let row = vec![unit_square(0.0, 0.0), unit_square(1.0, 0.0), unit_square(2.0, 0.0)];
    assert!(are_polygons_contiguous(&row, cfg));
    let gap = vec![unit_square(0.0, 0.0), unit_square(1.0, 0.0), unit_square(5.0, 0.0)];
    assert!(!are_polygons_contiguous(&gap, cfg));
    let single: Vec<Vec<Coord>> = vec![unit_square(0.0, 0.0)];
    assert!(are_polygons_contiguous(&single, cfg));
}

#[test]
fn self_intersection_detects_bowtie_and_spike() {
    let cfg = GeomCfg::default();
    let bowtie = vec![
        vector![0.0, 0.0],
        vector![10.0, 10.0],
        vector![10.0, 0.0],
        vector![0.0, 10.0],
        vector![0.0, 0.0],
    ];
    assert!(is_ring_self_intersecting(&bowtie, cfg));
    assert!(!is_ring_self_intersecting(&rect(0.0, 0.0, 10.0, 10.0), cfg));
    let spike = vec![
        vector![0.0, 0.0],
        vector![10.0, 0.0],
        vector![5.0, 0.0],
        vector![5.0, 5.0],
        vector![0.0, 0.0],
    ];
    assert!(is_ring_self_intersecting(&spike, cfg));
}

#[test]
fn proper_intersection_excludes_collinear_and_shared_endpoints() {
    let eps = 1e-3;
    let o = vector![0.0, 0.0];
    assert!(segments_intersect_properly(
        o,
        vector![2.0, 2.0],
        vector![0.0, 2.0],
        vector![2.0, 0.0],
        eps
    ));
    assert!(!segments_intersect_properly(
        o,
        vector![2.0, 0.0],
        vector![1.0, 0.0],
        vector![3.0, 0.0],
        eps
    ));
    assert!(!segments_intersect_properly(
        o,
        vector![2.0, 0.0],
        o,
        vector![0.0, 2.0],
        eps
    ));
    let shared =
        collinear_overlap_length(o, vector![2.0, 0.0], vector![1.0, 0.0], vector![3.0, 0.0], eps);
    assert!((shared - 1.0).abs() < 1e-12);
}

#[test]
fn line_within_boundary_checks_segment_midpoints() {
    let cfg = GeomCfg::default();
    let outer = rect(0.0, 0.0, 100.0, 100.0);
    let inside = vec![vector![0.0, 50.0], vector![50.0, 50.0], vector![100.0, 20.0]];
    assert!(is_line_within_boundary(&inside, &outer, cfg));
    let outside = vec![vector![10.0, 10.0], vector![120.0, 10.0]];
    assert!(!is_line_within_boundary(&outside, &outer, cfg));
    assert!(!is_line_within_boundary(&[vector![1.0, 1.0]], &outer, cfg));
}

#[test]
fn closest_point_on_ring_reports_edge_index() {
    let sq = rect(0.0, 0.0, 10.0, 10.0);
    let (q, edge, d) = closest_point_on_ring(vector![12.0, 4.0], &sq, 1e-3).unwrap();
    assert_eq!(edge, 1);
    assert!((q - vector![10.0, 4.0]).norm() < 1e-12);
    assert!((d - 2.0).abs() < 1e-12);
}

proptest! {
    #[test]
    fn embedded_rectangles_are_within_and_escape_when_moved(
        x0 in 1.0f64..40.0,
        y0 in 1.0f64..40.0,
        w in 1.0f64..50.0,
        h in 1.0f64..50.0,
        push in 0.1f64..20.0,
        corner in 0usize..4,
    ) {
        let cfg = GeomCfg::default();
        let outer = rect(0.0, 0.0, 100.0, 100.0);
        let inner = rect(x0, y0, x0 + w, y0 + h);
        prop_assert!(is_polygon_within_boundary(&inner, &outer, cfg));

        let mut moved = inner.clone();
        moved[corner] = match corner {
            0 => vector![-push, y0],
            1 => vector![100.0 + push, y0],
            2 => vector![x0 + w, 100.0 + push],
            _ => vector![x0, 100.0 + push],
        };
        if corner == 0 {
            moved[4] = moved[0];
        }
        prop_assert!(!is_polygon_within_boundary(&moved, &outer, cfg));
    }

    #[test]
    fn translated_copies_overlap_until_they_separate(dx in -3.0f64..3.0) {
        // slivers thinner than the tolerance are classified as touching
        prop_assume!((dx.abs() - 2.0).abs() > 0.01);
        let cfg = GeomCfg::default();
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(dx, 0.5, dx + 2.0, 1.5);
        prop_assert_eq!(do_polygons_overlap(&a, &b, cfg), dx.abs() < 2.0);
    }
}
