//! The static signal graph: declared, validated, then instantiated.
//!
//! A [`GraphSpec`] names stages and wires them by id. [`GraphSpec::validate`]
//! resolves it into a [`Topology`] (acyclic, single root, every instrument
//! feeding exactly one mixer), and [`SignalGraph`] evaluates that topology
//! once per block in a single pull pass. After construction only stage
//! parameters can change; the wiring never does.

/// Bit-crusher stage with dry/wet balance.
pub mod crusher;
/// Multi-tap echo stage.
pub mod delay;
/// Two-input crossfade stage.
pub mod dry_wet;
/// Short doubling delay stage.
pub mod fatten;
/// LFO-swept low-pass stage.
pub mod filter;
/// Summing stage; the only kind instruments may feed.
pub mod mixer;
/// Schroeder reverb stage.
pub mod reverb;
/// Pull-model evaluation of a validated topology.
pub mod signal;
/// The `Stage` trait and built-in stage construction.
pub mod stage;
/// Graph declaration and validation.
pub mod topology;

pub use signal::SignalGraph;
pub use stage::{build_stage, RenderCtx, Stage};
pub use topology::{GraphSpec, Input, Source, StageKind, StageSpec, Topology, MAX_STAGE_INPUTS};
