//! # Arena Allocation Benchmark
//!
//! Bump allocation against the heap for node-sized blocks.
//!
//! Run with: `cargo bench --package strata_alloc`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_alloc::{Allocator, Arena, ArenaAllocator, Global};

/// Arena size used by every benchmark (64 KiB).
const ARENA_BYTES: usize = 64 * 1024;

/// Node-sized payload: two links plus a word of data.
type NodeSized = [u64; 3];

/// Benchmark: fill a fresh arena with node-sized blocks.
fn bench_arena_fill(c: &mut Criterion) {
    let blocks = ARENA_BYTES / 32;
    c.bench_function("arena_fill_2K_nodes", |b| {
        b.iter(|| {
            let arena: Arena<ARENA_BYTES> = Arena::new();
            let nodes: ArenaAllocator<'_, NodeSized, ARENA_BYTES> = ArenaAllocator::new(&arena);
            for _ in 0..blocks {
                black_box(nodes.allocate(1).ok());
            }
            arena.used()
        });
    });
}

/// Benchmark: the same block count through the global heap.
fn bench_global_alloc_free(c: &mut Criterion) {
    let mut group = c.benchmark_group("global_alloc_free");

    for count in [256usize, 2048] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let heap: Global<NodeSized> = Global::new();
            let mut live = Vec::with_capacity(count);
            b.iter(|| {
                for _ in 0..count {
                    if let Ok(block) = heap.allocate(1) {
                        live.push(block);
                    }
                }
                for block in live.drain(..) {
                    // SAFETY: every block came from `heap.allocate(1)` above.
                    #[allow(unsafe_code)]
                    unsafe {
                        heap.deallocate(block, 1);
                    }
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_arena_fill, bench_global_alloc_free);

criterion_main!(benches);
