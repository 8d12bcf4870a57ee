//! Construction, break-line and contouring performance over seeded random surveys.
//!
//! ```bash
//! cargo bench --bench construction_and_contours
//! ```
//!
//! Point sets are generated from fixed seeds so runs are comparable across commits.

#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use tinlink::prelude::*;

/// Point counts shared by every group.
const COUNTS: &[usize] = &[100, 1_000, 5_000];

/// Random survey over a 1 km square with a rolling surface.
fn survey(count: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x: f64 = rng.random_range(0.0..1_000.0);
            let y: f64 = rng.random_range(0.0..1_000.0);
            let noise: f64 = rng.random_range(-0.5..0.5);
            let z = 100.0 + 20.0 * (x / 150.0).sin() * (y / 200.0).cos() + noise;
            [x, y, z]
        })
        .collect()
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    for &count in COUNTS {
        let points = survey(count, 0x5eed_0000 + count as u64);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("default", count), &points, |b, points| {
            b.iter(|| black_box(Mesh::new(points.iter().copied()).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("convex", count), &points, |b, points| {
            b.iter(|| {
                black_box(
                    MeshBuilder::new(points.iter().copied())
                        .convex_boundary(true)
                        .build()
                        .unwrap(),
                )
            });
        });
        group.bench_with_input(BenchmarkId::new("sentinels", count), &points, |b, points| {
            b.iter(|| {
                black_box(
                    MeshBuilder::new(points.iter().copied())
                        .add_sentinels(true)
                        .build()
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

fn bench_break_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("break_lines");
    for &count in COUNTS {
        let mesh = MeshBuilder::new(survey(count, 0xb7ea_0000 + count as u64))
            .convex_boundary(true)
            .build()
            .unwrap();
        let keys: Vec<VertexKey> = mesh.vertices().map(|(k, _)| k).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let pairs: Vec<(VertexKey, VertexKey)> = (0..10)
            .map(|_| {
                (
                    keys[rng.random_range(0..keys.len())],
                    keys[rng.random_range(0..keys.len())],
                )
            })
            .filter(|(a, b)| a != b)
            .collect();
        group.bench_with_input(BenchmarkId::new("force_edges", count), &pairs, |b, pairs| {
            b.iter_batched(
                || mesh.clone(),
                |mut mesh| {
                    for &(a, b) in pairs {
                        let _ = black_box(mesh.force_edge(a, b));
                    }
                    mesh
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_contours(c: &mut Criterion) {
    let mut group = c.benchmark_group("contours");
    for &count in COUNTS {
        let mesh = MeshBuilder::new(survey(count, 0xc047_0000 + count as u64))
            .convex_boundary(true)
            .build()
            .unwrap();
        for step in [1.0, 5.0] {
            group.bench_with_input(
                BenchmarkId::new(format!("step_{step}"), count),
                &mesh,
                |b, mesh| {
                    b.iter(|| {
                        let mut points = 0usize;
                        mesh.contours(&ContourOptions::new(step), |_, pts: &[(f64, f64, f64)], _| {
                            points += pts.len();
                        })
                        .unwrap();
                        black_box(points)
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");
    let mesh = Mesh::new(survey(1_000, 0x5a7e)).unwrap();
    let text = mesh.save_to_string().unwrap();
    group.bench_function("save_1000", |b| b.iter(|| black_box(mesh.save_to_string().unwrap())));
    group.bench_function("load_1000", |b| {
        b.iter(|| black_box(Mesh::load_from_str(&text).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_break_lines,
    bench_contours,
    bench_persistence
);
criterion_main!(benches);
