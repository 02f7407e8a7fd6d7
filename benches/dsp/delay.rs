//! Benchmarks for delay lines.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::dsp::delay::{DelayLine, MultiTapDelay};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut buffer = input.clone();

        // Short doubling delay (20 ms)
        let mut line = DelayLine::new(SAMPLE_RATE as usize / 4);
        group.bench_with_input(BenchmarkId::new("single_tap", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                line.render(black_box(&mut buffer), 960);
            })
        });

        // Three taps with feedback
        let mut echo = MultiTapDelay::new(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("multi_tap", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                echo.render(black_box(&mut buffer), 0.25, 0.3);
            })
        });
    }

    group.finish();
}
