//! Benchmarks for the ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::dsp::envelope::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sustain plateau - the common steady state
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.001, 0.001, 0.7, 0.2);
        env.note_on();
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                for sample in buffer.iter_mut() {
                    *sample = env.next_sample();
                }
                black_box(&buffer);
            })
        });

        // Attack, restarted every block
        let mut env = Envelope::adsr(SAMPLE_RATE, 0.5, 0.1, 0.7, 0.2);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.note_on();
                for sample in buffer.iter_mut() {
                    *sample = env.next_sample();
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
