//! Low-level DSP primitives used by voices and graph stages.
//!
//! These components allocate only at construction and are realtime-safe
//! afterwards, so they can live directly inside voices and stages. They stay
//! focused on the signal math; parameter plumbing lives in the graph layer.

/// Bit depth and sample rate reduction.
pub mod bitcrush;
/// Circular delay line and multi-tap echo.
pub mod delay;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Two-operator FM pair.
pub mod fm;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Control-rate sine LFO and conversions.
pub mod lfo;
/// Summing and dry/wet helpers.
pub mod mix;
/// Oscillator waveforms and noise sources.
pub mod oscillator;
/// Schroeder reverb with decay-time control.
pub mod reverb;

pub use envelope::{Envelope, EnvelopeStage};
pub use oscillator::{OscillatorBlock, OscillatorWaveform};
