//! Criterion benchmarks for the validation predicates on random star-shaped rings.
//! Focus sizes: n in {8, 32, 128, 512} vertices.
//! Results: by default under target/criterion.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use parcel_engine::gen::{draw_ring_radial, RadialCfg, ReplayToken, VertexCount};
use parcel_engine::geom::{
    do_polygons_overlap, is_point_inside_polygon, is_polygon_within_boundary,
    is_ring_self_intersecting, GeomCfg,
};
use parcel_engine::Coord;

fn ring(n: usize, radius: f64, index: u64) -> Vec<Coord> {
    let cfg = RadialCfg {
        vertex_count: VertexCount::Fixed(n),
        radius,
        ..RadialCfg::default()
    };
    draw_ring_radial(cfg, ReplayToken { seed: 17, index })
}

fn bench_predicates(c: &mut Criterion) {
    let cfg = GeomCfg::default();
    let mut group = c.benchmark_group("predicates");
    for &n in &[8usize, 32, 128, 512] {
        let outer = ring(n, 200.0, 1);
        let inner = ring(n, 50.0, 2);
        let shifted: Vec<Coord> = ring(n, 50.0, 3)
            .iter()
            .map(|p| p + Coord::new(40.0, 0.0))
            .collect();

        group.bench_with_input(BenchmarkId::new("self_intersecting", n), &outer, |b, r| {
            b.iter(|| is_ring_self_intersecting(r, cfg))
        });
        group.bench_with_input(BenchmarkId::new("point_inside", n), &outer, |b, r| {
            b.iter(|| is_point_inside_polygon(Coord::new(3.0, -7.0), r, cfg.eps))
        });
        group.bench_with_input(BenchmarkId::new("within_boundary", n), &n, |b, _| {
            b.iter(|| is_polygon_within_boundary(&inner, &outer, cfg))
        });
        group.bench_with_input(BenchmarkId::new("overlap", n), &n, |b, _| {
            b.iter(|| do_polygons_overlap(&inner, &shifted, cfg))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_predicates);
criterion_main!(benches);
