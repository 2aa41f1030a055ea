// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use obq_core::{ExecutionContext, Quantizer, ScoreSeries};
use obq_quantize::{L2Cost, MseQuantizer, MseQuantizerConfig};

fn lcg_next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state
}

fn synthetic_scores(n: usize, clusters: usize) -> Vec<f64> {
    let mut state = 0x0bad_cafe_1234_5678_u64;
    (0..n)
        .map(|idx| {
            let cluster = (idx * clusters / n) as f64;
            let jitter = (lcg_next(&mut state) % 1_000) as f64 / 1_000.0;
            cluster * 50.0 + jitter
        })
        .collect()
}

fn benchmark_quantize_mse(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantize_mse");
    group.sample_size(10);

    for n in [512_usize, 2_048, 4_096] {
        let values = synthetic_scores(n, 8);
        let series = ScoreSeries::from_f64(&values).expect("benchmark series should be valid");
        let quantizer = MseQuantizer::new(L2Cost::default(), MseQuantizerConfig { num_buckets: 8 })
            .expect("benchmark config should be valid");

        group.bench_function(format!("dp_sweep_n{n}_k8"), |b| {
            b.iter(|| {
                let result = quantizer
                    .quantize(black_box(&series), &ExecutionContext::new())
                    .expect("quantize should succeed");
                black_box(result.boundaries.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_quantize_mse);
criterion_main!(benches);
