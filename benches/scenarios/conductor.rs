//! Benchmarks for the full layered patch.
//!
//! Measures one `pull` through the default conductor: six instruments, nine
//! stages, with a chord held so every layered instrument is rendering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use layersynth::{engine::RoutingConfig, Conductor, EngineConfig};

use crate::BLOCK_SIZES;

pub fn bench_conductor(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/conductor");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === IDLE PATCH ===
        // graph cost alone, no voices
        let (mut idle, _idle_handle) =
            Conductor::new(&EngineConfig::default()).expect("default patch is valid");
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                idle.pull(black_box(&mut buffer));
            })
        });

        // === FOUR-NOTE CHORD ===
        let (mut chord, _chord_handle) =
            Conductor::new(&EngineConfig::default()).expect("default patch is valid");
        for note in [60, 64, 67, 71] {
            chord.route_note_on(note, 100);
        }
        group.bench_with_input(BenchmarkId::new("chord_4", size), &size, |b, _| {
            b.iter(|| {
                chord.pull(black_box(&mut buffer));
            })
        });

        // === EVERY INSTRUMENT LAYERED ===
        let all = RoutingConfig::new()
            .layer("sine1", 1.0)
            .layer("triangle1", 1.0)
            .layer("sawtooth1", 1.0)
            .layer("square1", 1.0)
            .layer("fm", 1.0)
            .layer("noise", 1.0);
        let (mut dense, _dense_handle) =
            Conductor::new(&EngineConfig::default().with_routing(all)).expect("valid routing");
        for note in [48, 55, 60, 64, 67, 71, 74, 79] {
            dense.route_note_on(note, 100);
        }
        group.bench_with_input(BenchmarkId::new("all_layers_8", size), &size, |b, _| {
            b.iter(|| {
                dense.pull(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
