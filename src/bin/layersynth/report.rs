//! Level and spectrum summary of a rendered capture.

use layersynth::params::StatsSnapshot;
use rustfft::{num_complex::Complex, FftPlanner};

/// FFT size for the dominant-frequency estimate
const FFT_SIZE: usize = 8192;

/// Peak absolute sample and RMS level.
pub fn levels(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
    (peak, rms)
}

/// Strongest frequency in the loudest FFT_SIZE window of `samples`.
pub fn dominant_frequency(samples: &[f32], sample_rate: f32) -> Option<f32> {
    let window = samples
        .chunks_exact(FFT_SIZE)
        .max_by(|a, b| levels(a).1.total_cmp(&levels(b).1))?;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);

    // Hann window - reduces spectral leakage
    let denom = (FFT_SIZE - 1) as f32;
    let mut buffer: Vec<Complex<f32>> = window
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos());
            Complex::new(s * w, 0.0)
        })
        .collect();
    fft.process(&mut buffer);

    // skip DC
    let (bin, _) = buffer[1..FFT_SIZE / 2]
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))?;
    Some((bin + 1) as f32 * sample_rate / FFT_SIZE as f32)
}

fn db(level: f32) -> f32 {
    20.0 * level.max(1e-9).log10()
}

pub fn print(capture: &[f32], sample_rate: f32, stats: &StatsSnapshot) {
    let (peak, rms) = levels(capture);

    println!("=== Report ===");
    println!(
        "Duration:  {:.2} s ({} frames)",
        capture.len() as f32 / sample_rate,
        capture.len()
    );
    println!("Peak:      {:.3} ({:.1} dBFS)", peak, db(peak));
    println!("RMS:       {:.3} ({:.1} dBFS)", rms, db(rms));
    match dominant_frequency(capture, sample_rate) {
        Some(freq) => println!("Dominant:  {:.1} Hz", freq),
        None => println!("Dominant:  n/a (capture shorter than {} frames)", FFT_SIZE),
    }
    println!();

    println!("Per-second peak:");
    let second = sample_rate as usize;
    for (i, chunk) in capture.chunks(second.max(1)).enumerate() {
        let (peak, _) = levels(chunk);
        let bar = "#".repeat((peak.min(1.0) * 40.0) as usize);
        println!("  {:>2}s {:>7.1} dB |{}", i, db(peak), bar);
    }
    println!();

    println!("Voices stolen:        {}", stats.voices_stolen);
    println!("Retriggers:           {}", stats.retriggers);
    println!("Ignored note-offs:    {}", stats.ignored_note_offs);
    println!("Late events:          {}", stats.late_events);
    println!("Scheduler overflows:  {}", stats.scheduler_overflows);
    println!("Stage faults:         {}", stats.stage_faults);
}
