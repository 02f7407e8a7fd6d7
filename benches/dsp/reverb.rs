//! Benchmarks for the Schroeder reverb.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::dsp::reverb::SchroederReverb;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_reverb(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/reverb");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let mut buffer = vec![0.0f32; size];

        // Four combs + two allpasses per sample
        let mut reverb = SchroederReverb::new(SAMPLE_RATE);
        reverb.set_decay_time(2.0);
        group.bench_with_input(BenchmarkId::new("schroeder", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(input.iter()) {
                    *out = reverb.process(x);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
