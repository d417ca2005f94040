//! R-Tree benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use parking_lot::Mutex;
use particle_rtree::{BoundingBox, MemoryRTree, Particle, Point, SpatialIndex, SpatialIndexBuilder};
use std::hint::black_box;
use std::sync::Arc;

struct Body {
    position: Mutex<Point>,
}

impl Particle for Body {
    fn position(&self) -> Point {
        *self.position.lock()
    }

    fn radius(&self) -> f64 {
        0.5
    }
}

fn grid_bodies(size: usize) -> Vec<Arc<Body>> {
    (0..size)
        .map(|i| {
            let x = (i % 100) as f64;
            let y = (i / 100) as f64;
            Arc::new(Body {
                position: Mutex::new(Point::new(x, y)),
            })
        })
        .collect()
}

fn bench_memory_rtree_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("MemoryRTree Insert");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_with_setup(MemoryRTree::<usize>::new, |mut tree| {
                for i in 0..size {
                    let x = (i % 100) as f64;
                    let y = (i / 100) as f64;
                    tree.insert(BoundingBox::new(x, y, x + 1.0, y + 1.0), Arc::new(i));
                }
                black_box(tree.len())
            });
        });
    }

    group.finish();
}

fn bench_spatial_index_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpatialIndex Query");

    for max_entries in [3, 8, 16].iter() {
        let index: SpatialIndex<Body> = SpatialIndexBuilder::new()
            .max_entries(*max_entries)
            .build()
            .unwrap();
        let bodies = grid_bodies(10000);
        for body in &bodies {
            index.index(body).unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("radius_10_of_10k", max_entries),
            max_entries,
            |b, _| {
                b.iter(|| {
                    let mut hits = 0usize;
                    index
                        .items_within_radius(Point::new(50.0, 50.0), 10.0, |_| {
                            hits += 1;
                            true
                        })
                        .unwrap();
                    black_box(hits)
                });
            },
        );
    }

    group.finish();
}

fn bench_spatial_index_reindex(c: &mut Criterion) {
    let mut group = c.benchmark_group("SpatialIndex Reindex");

    let index: SpatialIndex<Body> = SpatialIndexBuilder::new().max_entries(8).build().unwrap();
    let bodies = grid_bodies(10000);
    for body in &bodies {
        index.index(body).unwrap();
    }

    group.bench_function("step_10k", |b| {
        let mut tick = 0usize;
        b.iter(|| {
            let body = &bodies[tick % bodies.len()];
            let dx = if tick % 2 == 0 { 0.25 } else { -0.25 };
            index
                .reindex(body, |p| {
                    let mut pos = p.position.lock();
                    pos.x += dx;
                })
                .unwrap();
            tick += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_memory_rtree_insert,
    bench_spatial_index_query,
    bench_spatial_index_reindex
);
criterion_main!(benches);
