//! Real-world scenario benchmarks.
//!
//! These model actual engine usage: full voice pools and complete pulls
//! through the layered patch.

mod conductor;
mod voices;

pub use conductor::bench_conductor;
pub use voices::bench_voices;
