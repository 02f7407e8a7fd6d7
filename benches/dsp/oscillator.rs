//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine - uses sin() transcendental function
        let mut osc = OscillatorBlock::sine();
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // Sawtooth - simple linear ramp
        let mut osc = OscillatorBlock::sawtooth();
        group.bench_with_input(BenchmarkId::new("sawtooth", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // FM - two sin() calls per sample
        let mut osc = OscillatorBlock::new(OscillatorWaveform::fm());
        group.bench_with_input(BenchmarkId::new("fm", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });

        // Noise - RNG plus pink filter state
        let mut osc = OscillatorBlock::new(OscillatorWaveform::noise(0.5));
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer), black_box(440.0), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
