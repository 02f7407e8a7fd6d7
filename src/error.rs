//! Error taxonomy.
//!
//! Configuration problems are fatal and surface from constructors. Render-domain
//! problems never cross the `pull` boundary: stages report a [`StageFault`] that
//! the graph turns into silence, and runtime inconsistencies (stray note-offs,
//! late events) are only counted and traced.

use thiserror::Error;

/// Invalid engine configuration, reported at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A voice pool was declared with no voices.
    #[error("instrument '{instrument}' needs at least one voice")]
    ZeroVoices { instrument: String },

    /// Two instruments share an id.
    #[error("instrument id '{0}' is declared more than once")]
    DuplicateInstrument(String),

    /// A routing entry names an instrument that does not exist.
    #[error("routing target '{0}' is not a known instrument")]
    UnknownRoutingTarget(String),

    /// An instrument is listed twice in the same part of the routing table.
    #[error("instrument '{0}' appears more than once in the routing table")]
    DuplicateRoute(String),

    /// The routing table has more entries than fit in its fixed storage.
    #[error("routing table has {count} entries, at most {max} are supported")]
    TooManyRoutes { count: usize, max: usize },

    /// Two stages share an id.
    #[error("stage id '{0}' is declared more than once")]
    DuplicateStage(String),

    /// A stage lists an input that is neither a stage nor an instrument.
    #[error("stage '{stage}' reads from unknown {kind} '{input}'")]
    UnknownInput {
        stage: String,
        kind: &'static str,
        input: String,
    },

    /// A stage has the wrong number of inputs for its kind.
    #[error("stage '{stage}' takes {expected} input(s), {actual} declared")]
    InputArity {
        stage: String,
        expected: &'static str,
        actual: usize,
    },

    /// The declared topology is not a DAG.
    #[error("signal graph contains a cycle through stage(s): {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    /// The graph does not have exactly one output stage.
    #[error("signal graph needs exactly one root stage, found {}", .0.len())]
    RootCount(Vec<String>),

    /// The graph declares no stages.
    #[error("signal graph has no stages")]
    EmptyGraph,

    /// An instrument feeds a stage that is not a mixer.
    #[error("instrument '{instrument}' feeds non-mixer stage '{stage}'")]
    InstrumentNotMixed { instrument: String, stage: String },

    /// An instrument feeds more than one mixer input.
    #[error("instrument '{instrument}' feeds {count} mixer inputs, expected exactly one")]
    InstrumentFanout { instrument: String, count: usize },

    /// An instrument is not wired into the graph at all.
    #[error("instrument '{0}' is not wired into any mixer")]
    UnroutedInstrument(String),

    /// A stage parameter is out of its valid range.
    #[error("stage '{stage}' parameter '{param}' = {value} is out of range")]
    InvalidParameter {
        stage: String,
        param: &'static str,
        value: f32,
    },

    /// A runtime parameter lookup failed.
    #[error("stage '{stage}' has no parameter '{param}'")]
    UnknownParameter { stage: String, param: String },

    /// Caller-supplied stages do not match the validated topology.
    #[error("topology has {expected} stage(s), {actual} supplied")]
    StageCount { expected: usize, actual: usize },

    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("event queue capacity must be non-zero")]
    InvalidQueueCapacity,
}

/// A stage could not produce a block. The graph substitutes silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StageFault {
    #[error("stage received {actual} input block(s), expected {expected}")]
    InputMismatch { expected: usize, actual: usize },

    #[error("input block has {actual} frame(s), output has {expected}")]
    BlockLength { expected: usize, actual: usize },

    #[error("stage wrote a non-finite sample")]
    NonFinite,
}

/// The control domain could not hand an event to the render domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("event queue is full")]
    QueueFull,

    #[error("engine has been stopped")]
    Stopped,
}

/// Failure of a handle operation that both validates and enqueues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Send(#[from] SendError),
}
