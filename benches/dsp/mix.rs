//! Benchmarks for summing and dry/wet helpers.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::dsp::mix::{accumulate, crossfade};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let dry: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).sin()).collect();
        let wet: Vec<f32> = (0..size).map(|i| (i as f32 * 0.03).cos()).collect();
        let mut out = vec![0.0f32; size];

        // Six instruments into one mixer
        group.bench_with_input(BenchmarkId::new("accumulate_6", size), &size, |b, _| {
            b.iter(|| {
                out.fill(0.0);
                for _ in 0..6 {
                    accumulate(black_box(&mut out), &dry, 0.5);
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("crossfade", size), &size, |b, _| {
            b.iter(|| {
                crossfade(&dry, &wet, black_box(0.35), &mut out);
            })
        });
    }

    group.finish();
}
