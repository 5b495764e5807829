//! # List Benchmark
//!
//! Push/pop throughput with heap nodes versus arena nodes, and the cost of
//! copy-assignment.
//!
//! Run with: `cargo bench --package strata_list`

// Benchmarks don't need docs
#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_alloc::{Arena, ArenaAllocator};
use strata_list::List;

/// Large enough for 4K `u64` nodes.
const ARENA_BYTES: usize = 128 * 1024;

/// Benchmark: push_back then drain from the front.
fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");

    for count in [256u64, 4096] {
        group.bench_with_input(BenchmarkId::new("global", count), &count, |b, &count| {
            b.iter(|| {
                let mut list: List<u64> = List::new();
                for i in 0..count {
                    list.push_back(i).expect("heap allocation failed");
                }
                let mut sum = 0u64;
                while let Some(value) = list.pop_front() {
                    sum = sum.wrapping_add(value);
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("arena", count), &count, |b, &count| {
            b.iter(|| {
                let arena: Arena<ARENA_BYTES> = Arena::new();
                let mut list = List::new_in(ArenaAllocator::<'_, u64, ARENA_BYTES>::new(&arena));
                for i in 0..count {
                    list.push_back(i).expect("arena sized for every node");
                }
                let mut sum = 0u64;
                while let Some(value) = list.pop_front() {
                    sum = sum.wrapping_add(value);
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

/// Benchmark: clone_from into a list that already holds elements.
fn bench_clone_from(c: &mut Criterion) {
    let source: List<u64> = (0..1024).collect();
    let mut target: List<u64> = (0..512).collect();

    c.bench_function("clone_from_1K_over_512", |b| {
        b.iter(|| {
            target.clone_from(black_box(&source));
            target.len()
        });
    });
}

criterion_group!(benches, bench_push_pop, bench_clone_from);

criterion_main!(benches);
