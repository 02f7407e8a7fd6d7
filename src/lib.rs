//! Polyphonic voice allocation and static signal routing for layered patches.
//!
//! MIDI notes enter through a [`ConductorHandle`](engine::ConductorHandle) on
//! the control side, cross a lock-free queue, and are routed by the
//! [`Conductor`](engine::Conductor) to one or more instruments. Each instrument
//! owns a fixed pool of voices. Their output is mixed through a validated,
//! acyclic [`SignalGraph`](graph::SignalGraph) and handed out one block per
//! [`Conductor::pull`](engine::Conductor::pull).

pub mod dsp; // Allocation-free DSP primitives
pub mod engine; // Note routing, scheduling and block rendering
pub mod error;
pub mod graph; // Static stage graph
pub mod io; // MIDI decoding and note dispatch
pub mod params;
pub mod synth; // Voices, pools and instruments

pub use engine::{Conductor, ConductorHandle, EngineConfig, NoteState};
pub use error::{ConfigError, ControlError, SendError, StageFault};

/// Largest block a stage ever processes. Longer pulls are split.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Shortest envelope segment, one sample at 48 kHz.
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
