// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use obq_core::ReproMode;
use obq_quantize::{L2Cost, RangeCost};

const N: usize = 1_000_000;
const QUERY_COUNT: usize = 1_000_000;

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn generate_queries(n: usize, count: usize) -> Vec<(usize, usize)> {
    let mut queries = Vec::with_capacity(count);
    let mut state = 0xfeed_f00d_dead_beef_u64;

    for _ in 0..count {
        let a = (lcg_next(&mut state) as usize) % n;
        let b = (lcg_next(&mut state) as usize) % n;
        let start = a.min(b);
        let mut end = a.max(b) + 1;
        if start == end {
            end = (start + 1).min(n);
        }
        queries.push((start, end));
    }

    queries
}

fn sorted_values(n: usize) -> Vec<f64> {
    let mut values: Vec<f64> = (0..n)
        .map(|idx| {
            let x = idx as f64;
            x.sin() * 100.0 + x * 0.001
        })
        .collect();
    values.sort_unstable_by(f64::total_cmp);
    values
}

fn benchmark_range_cost(c: &mut Criterion) {
    let values = sorted_values(N);

    let balanced = L2Cost::new(ReproMode::Balanced);
    let strict = L2Cost::new(ReproMode::Strict);

    let mut group = c.benchmark_group("range_cost");

    group.bench_function("l2_precompute_n1e6", |b| {
        b.iter(|| {
            let _cache = balanced
                .precompute(black_box(&values))
                .expect("precompute should succeed");
        })
    });

    group.bench_function("l2_precompute_strict_n1e6", |b| {
        b.iter(|| {
            let _cache = strict
                .precompute(black_box(&values))
                .expect("strict precompute should succeed");
        })
    });

    let cache = balanced
        .precompute(&values)
        .expect("precompute should succeed");
    let queries = generate_queries(N, QUERY_COUNT);

    group.bench_function("l2_range_cost_1e6_queries", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &(start, end) in &queries {
                acc += balanced.range_cost(black_box(&cache), start, end);
            }
            black_box(acc)
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_range_cost);
criterion_main!(benches);
