//! Benchmarks for the bit-crusher.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::dsp::bitcrush::BitCrusher;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_bitcrush(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/bitcrush");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.02).sin()).collect();
        let mut buffer = input.clone();

        let mut crusher = BitCrusher::new();
        group.bench_with_input(BenchmarkId::new("8bit_10k", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                crusher.render(black_box(&mut buffer), 8.0, 10_000.0, SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
