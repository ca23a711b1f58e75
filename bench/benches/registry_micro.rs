//! Registry microbenchmarks using Criterion.
//!
//! These benchmarks measure individual registry operations in isolation:
//! - Entity create/destroy churn
//! - Component add/remove
//! - Joined view iteration

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sparse_ecs::{Id64, Registry};
use sparse_ecs_bench::components::*;

// =============================================================================
// Entity Churn Benchmarks
// =============================================================================

fn bench_entity_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_churn");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("create", count), &count, |b, &n| {
            b.iter(|| {
                let mut registry = Registry::<Id64>::new();
                for _ in 0..n {
                    black_box(registry.create_entity());
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("create_destroy", count),
            &count,
            |b, &n| {
                b.iter(|| {
                    let mut registry = Registry::<Id64>::new();
                    let ids: Vec<_> = (0..n).map(|_| registry.create_entity()).collect();
                    for id in ids {
                        registry.destroy_entity(id);
                    }
                });
            },
        );

        // Recycling path: the free list is warm, no slot growth
        group.bench_with_input(BenchmarkId::new("recycle", count), &count, |b, &n| {
            let mut registry = Registry::<Id64>::new();
            let ids: Vec<_> = (0..n).map(|_| registry.create_entity()).collect();
            for id in ids {
                registry.destroy_entity(id);
            }

            b.iter(|| {
                let ids: Vec<_> = (0..n).map(|_| registry.create_entity()).collect();
                for id in ids {
                    registry.destroy_entity(id);
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// Component Benchmarks
// =============================================================================

fn bench_components(c: &mut Criterion) {
    let mut group = c.benchmark_group("components");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("add_single", count), &count, |b, &n| {
            b.iter(|| {
                let mut registry = Registry::<Id64>::new();
                for _ in 0..n {
                    let id = registry.create_entity();
                    black_box(registry.add(id, Position::default()));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("add_four", count), &count, |b, &n| {
            b.iter(|| {
                let mut registry = Registry::<Id64>::new();
                for _ in 0..n {
                    let id = registry.create_entity();
                    registry.add(id, Position::default());
                    registry.add(id, Velocity::default());
                    registry.add(id, Rotation::default());
                    registry.add(id, Lifetime::default());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("add_remove", count), &count, |b, &n| {
            let mut registry = Registry::<Id64>::new();
            let ids: Vec<_> = (0..n).map(|_| registry.create_entity()).collect();

            b.iter(|| {
                for &id in &ids {
                    registry.add(id, Position::default());
                }
                for &id in &ids {
                    black_box(registry.remove::<Position>(id));
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// View Benchmarks
// =============================================================================

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");

    for count in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("pos_vel", count), &count, |b, &n| {
            let mut registry = Registry::<Id64>::new();
            for i in 0..n {
                let id = registry.create_entity();
                registry.add(
                    id,
                    Position {
                        x: i as f32,
                        ..Position::default()
                    },
                );
                registry.add(
                    id,
                    Velocity {
                        x: 1.0,
                        ..Velocity::default()
                    },
                );
            }

            b.iter(|| {
                registry
                    .view::<(Position, Velocity)>()
                    .each(|_, (position, velocity)| {
                        position.x += velocity.x;
                        position.y += velocity.y;
                        position.z += velocity.z;
                    });
            });
        });

        // Sparse join: the driver is much smaller than the other store
        group.bench_with_input(BenchmarkId::new("sparse_join", count), &count, |b, &n| {
            let mut registry = Registry::<Id64>::new();
            for i in 0..n {
                let id = registry.create_entity();
                registry.add(id, Position::default());
                if i % 16 == 0 {
                    registry.add(id, Lifetime { remaining: 1.0 });
                }
            }

            b.iter(|| {
                registry
                    .view::<(Position, Lifetime)>()
                    .each(|_, (_, lifetime)| {
                        lifetime.remaining *= 0.99;
                    });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_entity_churn, bench_components, bench_views);
criterion_main!(benches);
