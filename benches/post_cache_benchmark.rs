//! Post cache benchmarks.
//!
//! Measures:
//! - InMemory backend operations (set, get, delete)
//! - PostService reads served from cache vs from the store
//! - Index-backed list reads for growing post counts
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use posts_api::backend::{CacheBackend, InMemoryBackend};
use posts_api::domain::{NewPost, NewUser, Post};
use posts_api::repository::{
    InMemoryPostStore, InMemoryUserStore, PostCache, PostStore, UserStore,
};
use posts_api::service::PostService;
use posts_api::{DataRepository, PostRepository};
use std::hint::black_box;
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

fn post(id: i64, content_size: usize) -> Post {
    let now = Utc::now();
    Post {
        id,
        title: format!("Post {}", id),
        content: "x".repeat(content_size),
        user_id: 1,
        created_at: now,
        updated_at: now,
    }
}

/// Service with one user and `count` posts in the store, cache empty.
async fn seeded_service(count: usize) -> PostService<InMemoryBackend> {
    let store = InMemoryPostStore::new();
    let users = InMemoryUserStore::new();
    let owner = users
        .insert(NewUser {
            first_name: "Bench".to_string(),
            last_name: "User".to_string(),
            email: "bench@example.com".to_string(),
        })
        .await
        .expect("Failed to insert user");

    for i in 0..count {
        store
            .insert(NewPost {
                title: format!("Post {}", i),
                content: "0123456789".to_string(),
                user_id: owner.id,
            })
            .await
            .expect("Failed to insert post");
    }

    PostService::new(
        Arc::new(store),
        PostCache::new(InMemoryBackend::new()),
        Arc::new(users),
    )
}

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn inmemory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                let value = vec![1u8; size];

                b.to_async(&rt).iter(|| async {
                    backend
                        .set(black_box("post:1"), black_box(value.clone()))
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                rt.block_on(async {
                    backend
                        .set("post:1", vec![1u8; size])
                        .await
                        .expect("Failed to set");
                });

                b.to_async(&rt)
                    .iter(|| async { backend.get(black_box("post:1")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let backend = InMemoryBackend::new();

        b.to_async(&rt)
            .iter(|| async { backend.get(black_box("post:404")).await });
    });

    group.bench_function("delete", |b| {
        let backend = InMemoryBackend::new();

        b.to_async(&rt).iter(|| async {
            backend
                .set("post:1", vec![1u8; 1_000])
                .await
                .expect("Failed to set");
            backend.delete(black_box("post:1")).await
        });
    });

    group.finish();
}

// ============================================================================
// Group 2: PostService Reads
// ============================================================================

fn service_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_service");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    // Cache HIT: lookup + deserialization
    group.bench_function("find_by_id_cached", |b| {
        let service = rt.block_on(seeded_service(1));
        rt.block_on(async { service.find_by_id(1).await.expect("warm cache") });

        b.to_async(&rt)
            .iter(|| async { service.find_by_id(black_box(1)).await });
    });

    // Cache MISS: lookup + store read + cache write
    group.bench_function("find_by_id_uncached", |b| {
        let service = rt.block_on(seeded_service(1));

        b.to_async(&rt).iter(|| async {
            service
                .cache()
                .delete_by_id(1)
                .await
                .expect("Failed to evict");
            service.find_by_id(black_box(1)).await
        });
    });

    for count in [10usize, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("find_all_cached", count),
            count,
            |b, &count| {
                let service = rt.block_on(seeded_service(count));
                rt.block_on(async { service.find_all().await.expect("warm cache") });

                b.to_async(&rt).iter(|| async { service.find_all().await });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Group 3: PostCache Writes
// ============================================================================

fn cache_write_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_cache");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("save", size), size, |b, &size| {
                let cache = PostCache::new(InMemoryBackend::new());
                let p = post(1, size);

                b.to_async(&rt)
                    .iter(|| async { cache.save(black_box(&p)).await });
            });
    }

    group.bench_function("fetch_by_ids_100", |b| {
        let cache = PostCache::new(InMemoryBackend::new());
        let posts: Vec<Post> = (1..=100).map(|id| post(id, 100)).collect();
        rt.block_on(async { cache.save_all(&posts).await.expect("Failed to save") });
        let ids: Vec<i64> = (1..=100).collect();

        b.to_async(&rt)
            .iter(|| async { cache.fetch_by_ids(black_box(&ids)).await });
    });

    group.finish();
}

criterion_group!(
    benches,
    inmemory_benchmarks,
    service_benchmarks,
    cache_write_benchmarks
);
criterion_main!(benches);
