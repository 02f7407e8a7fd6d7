//! Benchmarks for low-level DSP primitives.

mod bitcrush;
mod delay;
mod envelope;
mod filter;
mod mix;
mod oscillator;
mod reverb;

pub use bitcrush::bench_bitcrush;
pub use delay::bench_delay;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use mix::bench_mix;
pub use oscillator::bench_oscillator;
pub use reverb::bench_reverb;
