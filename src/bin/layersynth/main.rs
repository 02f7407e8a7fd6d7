//! layersynth - offline driver for the layered patch
//!
//! Run with: cargo run --release
//! Log level follows RUST_LOG (default: info).
//!
//! A control thread plays a short phrase as raw MIDI through the router while
//! the main thread pulls blocks at real-time pace, the way an audio callback
//! would. When the phrase and its tail are done the control thread stops the
//! engine and a level/spectrum report is printed.

mod report;

use std::{
    thread,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use layersynth::{
    engine::RoutingConfig,
    io::{MidiRouter, NoteSink},
    Conductor, ConductorHandle, EngineConfig, SendError,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BLOCK_SIZE: usize = 512;
const STEP_SECONDS: f64 = 0.25;
const LOOKAHEAD_SECONDS: f64 = 0.05;
const TAIL_SECONDS: f64 = 1.5;
const PHRASE: &[u8] = &[60, 64, 67, 72, 76, 72, 67, 64, 60, 55, 60];

/// Forwards note commands stamped for one output frame.
struct Stamped<'a> {
    handle: &'a mut ConductorHandle,
    frame: u64,
}

impl NoteSink for Stamped<'_> {
    type Error = SendError;

    fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), SendError> {
        self.handle.note_on_at(self.frame, note, velocity)
    }

    fn note_off(&mut self, note: u8) -> Result<(), SendError> {
        self.handle.note_off_at(self.frame, note)
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = EngineConfig::default();
    let sample_rate = config.sample_rate;
    let (mut conductor, handle) =
        Conductor::new(&config).wrap_err("failed to build the layered patch")?;

    println!("=== layersynth ===");
    println!("Sample rate: {} Hz", sample_rate);
    println!("MIDI port:   {}", config.midi_port);
    println!("Instruments: {}", config.instrument_ids().join(", "));
    println!("Stages:      {}", conductor.graph().stage_count());
    println!();

    let control = thread::Builder::new()
        .name("control".into())
        .spawn(move || play_phrase(handle, sample_rate))
        .wrap_err("failed to spawn control thread")?;

    let block_time = Duration::from_secs_f64(BLOCK_SIZE as f64 / f64::from(sample_rate));
    let mut block = vec![0.0f32; BLOCK_SIZE];
    let mut capture = Vec::new();
    let mut deadline = Instant::now();

    loop {
        conductor.pull(&mut block);
        if conductor.is_stopped() {
            break;
        }
        capture.extend_from_slice(&block);

        deadline += block_time;
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    control
        .join()
        .map_err(|_| eyre!("control thread panicked"))?
        .wrap_err("control thread failed")?;
    info!(frames = conductor.frame(), "render finished");

    report::print(&capture, sample_rate, &conductor.stats());
    Ok(())
}

fn play_phrase(mut handle: ConductorHandle, sample_rate: f32) -> EyreResult<()> {
    let router = MidiRouter::omni();
    let sample_rate = f64::from(sample_rate);
    let frames_per_step = (STEP_SECONDS * sample_rate) as u64;
    let lookahead = (LOOKAHEAD_SECONDS * sample_rate) as u64;
    let half = PHRASE.len() / 2;

    for (step, &note) in PHRASE.iter().enumerate() {
        let on = step as u64 * frames_per_step;
        let off = on + frames_per_step * 3 / 4;
        wait_for_frame(&handle, on.saturating_sub(lookahead));

        if step == half {
            // Second half: cycle the plain waveforms and bring in the crusher and echo.
            let routing = RoutingConfig::new()
                .layer("fm", 1.0)
                .layer("noise", 1.0)
                .rotate("sine1", 1.0)
                .rotate("triangle1", 1.0)
                .rotate("sawtooth1", 0.6)
                .rotate("square1", 0.5);
            handle.set_routing(&routing)?;
            handle.set_param("bit_crush_mixer", "balance", 0.35)?;
            handle.set_param("multi_delay_mixer", "balance", 0.3)?;
            handle.set_master_volume(0.8);
        }

        let mut stamped = Stamped {
            handle: &mut handle,
            frame: on,
        };
        router.dispatch_bytes(&[0x90, note, 100], &mut stamped)?;
        stamped.frame = off;
        router.dispatch_bytes(&[0x90, note, 0], &mut stamped)?;
    }

    let end = PHRASE.len() as u64 * frames_per_step + (TAIL_SECONDS * sample_rate) as u64;
    wait_for_frame(&handle, end);
    handle.stop();
    Ok(())
}

fn wait_for_frame(handle: &ConductorHandle, frame: u64) {
    while handle.frames_rendered() < frame {
        thread::sleep(Duration::from_millis(1));
    }
}
