//! Role resolution benchmarks
//!
//! Measures closure resolution and the cycle check on chain and fan-out
//! hierarchies of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cretoai_roles::{
    InMemoryRoleStore, RecursiveRoleQuery, RoleConfig, RoleManager, StandardRoleManager,
};
use tokio::runtime::Runtime;

/// role_0 -> role_1 -> ... -> role_{n-1}
async fn chain(count: usize) -> StandardRoleManager<InMemoryRoleStore> {
    let manager = StandardRoleManager::new(InMemoryRoleStore::new());
    manager.start().await.unwrap();
    for i in 0..count {
        manager.create(&format!("role_{}", i), &RoleConfig::default()).await.unwrap();
    }
    for i in 1..count {
        manager
            .grant(&format!("role_{}", i - 1), &format!("role_{}", i))
            .await
            .unwrap();
    }
    manager
}

fn bench_query_granted(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("query_granted_chain");

    for count in [10usize, 100, 1000] {
        let manager = rt.block_on(chain(count));

        group.bench_with_input(BenchmarkId::new("recursive", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let roles = manager
                    .query_granted(black_box("role_0"), RecursiveRoleQuery::Yes)
                    .await
                    .unwrap();
                black_box(roles);
            });
        });

        group.bench_with_input(BenchmarkId::new("direct", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let roles = manager
                    .query_granted(black_box("role_0"), RecursiveRoleQuery::No)
                    .await
                    .unwrap();
                black_box(roles);
            });
        });
    }

    group.finish();
}

fn bench_rejected_cycle(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("grant_cycle_check");

    for count in [10usize, 100, 1000] {
        let manager = rt.block_on(chain(count));
        let tail = format!("role_{}", count - 1);

        // Closing the chain walks every edge before rejecting
        group.bench_with_input(BenchmarkId::new("chain", count), &count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let result = manager.grant(black_box(&tail), "role_0").await;
                black_box(result.is_err());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_query_granted, bench_rejected_cycle);
criterion_main!(benches);
