//! Benchmarks for voice pools and instruments.
//!
//! A full pool is the worst case for an instrument: every slot renders an
//! oscillator and an envelope per sample.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::synth::{Instrument, Timbre, VelocityCurve, VoicePool};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const VOICES: usize = 12;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === FULL SINE POOL ===
        let mut pool = VoicePool::new("sine", VOICES, &Timbre::sine(), SAMPLE_RATE)
            .expect("non-zero pool");
        for note in 0..VOICES as u8 {
            pool.allocate(48 + note, 0.5);
        }
        group.bench_with_input(BenchmarkId::new("sine_pool_full", size), &size, |b, _| {
            b.iter(|| {
                buffer.fill(0.0);
                pool.render_add(black_box(&mut buffer));
            })
        });

        // === FM INSTRUMENT ===
        // the most expensive timbre in the layered patch
        let mut fm = Instrument::new(
            "fm",
            Timbre::fm().with_gain(0.4),
            VOICES,
            VelocityCurve::Linear,
            SAMPLE_RATE,
        )
        .expect("valid instrument");
        for note in 0..VOICES as u8 {
            fm.note_on(48 + note, 100, 1.0);
        }
        group.bench_with_input(BenchmarkId::new("fm_instrument_full", size), &size, |b, _| {
            b.iter(|| {
                fm.render(black_box(&mut buffer));
            })
        });

        // === STEAL CHURN ===
        // allocation cost when every note-on has to steal
        let mut churn = VoicePool::new("churn", VOICES, &Timbre::square(), SAMPLE_RATE)
            .expect("non-zero pool");
        let mut note = 0u8;
        group.bench_with_input(BenchmarkId::new("steal_churn", size), &size, |b, _| {
            b.iter(|| {
                note = note.wrapping_add(1) & 0x7f;
                black_box(churn.allocate(note, 1.0));
            })
        });
    }

    group.finish();
}
