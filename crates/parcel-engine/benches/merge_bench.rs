//! Criterion benchmarks for merging grid selections and clipping to free space.
//! Focus sizes: k×k grids with k in {2, 4, 8}.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use parcel_engine::boolean::{clip_to_available, merge_rings, AreaThreshold, GeoClipper};
use parcel_engine::gen::grid_references;
use parcel_engine::geom::GeomCfg;
use parcel_engine::Coord;

fn grid_rings(k: usize) -> Vec<Vec<Coord>> {
    grid_references(Coord::zeros(), 10.0, k, k, "field")
        .into_iter()
        .filter_map(|f| f.geometry.rings().first().map(|r| r.to_vec()))
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let cfg = GeomCfg::default();
    let ops = GeoClipper;
    let mut group = c.benchmark_group("merge");
    for &k in &[2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("merge_grid", k), &k, |b, &k| {
            b.iter_batched(
                || grid_rings(k),
                |rings| merge_rings(&rings, cfg, &ops),
                BatchSize::SmallInput,
            )
        });

        let side = 10.0 * k as f64;
        let boundary = vec![
            Coord::new(-5.0, -5.0),
            Coord::new(side + 5.0, -5.0),
            Coord::new(side + 5.0, side + 5.0),
            Coord::new(-5.0, side + 5.0),
            Coord::new(-5.0, -5.0),
        ];
        let parcels: Vec<Vec<Coord>> = grid_rings(k).into_iter().step_by(2).collect();
        let candidate = boundary.clone();
        group.bench_with_input(BenchmarkId::new("clip_to_available", k), &k, |b, _| {
            b.iter(|| {
                clip_to_available(
                    &ops,
                    &candidate,
                    &boundary,
                    &parcels,
                    AreaThreshold::default(),
                    cfg,
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
