//! Declaring and validating a signal graph.
//!
//! A graph is built in two steps. A [`GraphSpec`] is plain data: stage ids,
//! kinds with their initial parameters, and input wiring by id. Validating it
//! against the set of instrument ids produces a [`Topology`]: every reference
//! resolved to an index, every rule checked, and a topological evaluation
//! order computed. Only a `Topology` can be instantiated into a
//! [`SignalGraph`](crate::graph::SignalGraph).

use std::{collections::HashMap, sync::Arc};

use arrayvec::ArrayVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    dsp::delay::MultiTapDelay,
    error::ConfigError,
    params::{AtomicParam, ParamHandle},
};

/// Upper bound on a mixer's inputs.
pub const MAX_STAGE_INPUTS: usize = 16;

/// Valid `(min, max)` for each stage parameter.
pub mod ranges {
    use super::MultiTapDelay;

    pub const GAIN: (f32, f32) = (0.0, 4.0);
    pub const BALANCE: (f32, f32) = (0.0, 1.0);
    pub const BIT_DEPTH: (f32, f32) = (1.0, 24.0);
    pub const CRUSH_RATE: (f32, f32) = (100.0, 192_000.0);
    pub const CUTOFF: (f32, f32) = (10.0, 20_000.0);
    pub const RESONANCE: (f32, f32) = (0.0, 0.98);
    pub const LFO_RATE: (f32, f32) = (0.0, 20.0);
    pub const LFO_DEPTH: (f32, f32) = (0.0, 20_000.0);
    pub const FATTEN_TIME: (f32, f32) = (0.001, 0.25);
    pub const DELAY_TIME: (f32, f32) = (0.001, MultiTapDelay::MAX_TIME);
    pub const FEEDBACK: (f32, f32) = (0.0, MultiTapDelay::MAX_FEEDBACK);
    pub const DECAY_TIME: (f32, f32) = (0.01, 30.0);
}

/// Where a stage input comes from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Instrument(String),
    Stage(String),
}

impl Source {
    pub fn instrument(id: impl Into<String>) -> Self {
        Self::Instrument(id.into())
    }

    pub fn stage(id: impl Into<String>) -> Self {
        Self::Stage(id.into())
    }
}

/// Stage kind and its initial parameter values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageKind {
    /// Sum of all inputs times `gain`.
    Mixer { gain: f32 },
    /// `[dry, wet]` crossfade.
    DryWet { balance: f32 },
    BitCrusher {
        bit_depth: f32,
        sample_rate: f32,
        balance: f32,
    },
    /// Low-pass with a sine LFO sweeping the cutoff by ±`lfo_depth` Hz.
    Filter {
        cutoff: f32,
        resonance: f32,
        lfo_rate: f32,
        lfo_depth: f32,
    },
    /// Short doubling delay blended with the input.
    Fatten { time: f32, balance: f32 },
    /// Three-tap echo, wet only.
    MultiDelay { time: f32, feedback: f32 },
    Reverb { decay_time: f32, balance: f32 },
}

/// One named parameter of a declared stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl ParamSpec {
    pub fn new(name: &'static str, value: f32, (min, max): (f32, f32)) -> Self {
        Self {
            name,
            value,
            min,
            max,
        }
    }

    pub fn in_range(&self) -> bool {
        self.value.is_finite() && self.value >= self.min && self.value <= self.max
    }

    pub fn handle(&self) -> ParamHandle {
        Arc::new(AtomicParam::new(self.value, self.min, self.max))
    }
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mixer { .. } => "mixer",
            Self::DryWet { .. } => "dry/wet",
            Self::BitCrusher { .. } => "bit-crusher",
            Self::Filter { .. } => "filter",
            Self::Fatten { .. } => "fatten",
            Self::MultiDelay { .. } => "multi-delay",
            Self::Reverb { .. } => "reverb",
        }
    }

    pub fn is_mixer(&self) -> bool {
        matches!(self, Self::Mixer { .. })
    }

    /// Inclusive input count bounds and their description for errors.
    fn arity(&self) -> (usize, usize, &'static str) {
        match self {
            Self::Mixer { .. } => (1, MAX_STAGE_INPUTS, "1 to 16"),
            Self::DryWet { .. } => (2, 2, "exactly 2"),
            _ => (1, 1, "exactly 1"),
        }
    }

    pub fn params(&self) -> ArrayVec<ParamSpec, 4> {
        use self::ranges::*;

        let mut params = ArrayVec::new();
        match *self {
            Self::Mixer { gain } => params.push(ParamSpec::new("gain", gain, GAIN)),
            Self::DryWet { balance } => params.push(ParamSpec::new("balance", balance, BALANCE)),
            Self::BitCrusher {
                bit_depth,
                sample_rate,
                balance,
            } => {
                params.push(ParamSpec::new("bit_depth", bit_depth, BIT_DEPTH));
                params.push(ParamSpec::new("sample_rate", sample_rate, CRUSH_RATE));
                params.push(ParamSpec::new("balance", balance, BALANCE));
            }
            Self::Filter {
                cutoff,
                resonance,
                lfo_rate,
                lfo_depth,
            } => {
                params.push(ParamSpec::new("cutoff", cutoff, CUTOFF));
                params.push(ParamSpec::new("resonance", resonance, RESONANCE));
                params.push(ParamSpec::new("lfo_rate", lfo_rate, LFO_RATE));
                params.push(ParamSpec::new("lfo_depth", lfo_depth, LFO_DEPTH));
            }
            Self::Fatten { time, balance } => {
                params.push(ParamSpec::new("time", time, FATTEN_TIME));
                params.push(ParamSpec::new("balance", balance, BALANCE));
            }
            Self::MultiDelay { time, feedback } => {
                params.push(ParamSpec::new("time", time, DELAY_TIME));
                params.push(ParamSpec::new("feedback", feedback, FEEDBACK));
            }
            Self::Reverb {
                decay_time,
                balance,
            } => {
                params.push(ParamSpec::new("decay_time", decay_time, DECAY_TIME));
                params.push(ParamSpec::new("balance", balance, BALANCE));
            }
        }
        params
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub id: String,
    pub kind: StageKind,
    pub inputs: Vec<Source>,
}

impl StageSpec {
    pub fn new(
        id: impl Into<String>,
        kind: StageKind,
        inputs: impl IntoIterator<Item = Source>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            inputs: inputs.into_iter().collect(),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphSpec {
    pub stages: Vec<StageSpec>,
}

/// A resolved stage input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Index into the instrument list the graph was validated against.
    Instrument(usize),
    /// Index into the graph's stages.
    Stage(usize),
}

/// A validated graph: resolved wiring plus evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    ids: Vec<String>,
    inputs: Vec<Vec<Input>>,
    order: Vec<usize>,
    root: usize,
    instrument_count: usize,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, stage: usize) -> &str {
        &self.ids[stage]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|s| s == id)
    }

    pub fn inputs(&self, stage: usize) -> &[Input] {
        &self.inputs[stage]
    }

    /// Stage indices, every stage after all of its inputs.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn instrument_count(&self) -> usize {
        self.instrument_count
    }
}

impl GraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(
        mut self,
        id: impl Into<String>,
        kind: StageKind,
        inputs: impl IntoIterator<Item = Source>,
    ) -> Self {
        self.stages.push(StageSpec::new(id, kind, inputs));
        self
    }

    pub fn stage(&self, id: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Check the graph against the instruments that will feed it.
    pub fn validate<S: AsRef<str>>(&self, instrument_ids: &[S]) -> Result<Topology, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::EmptyGraph);
        }

        let mut stage_index: HashMap<&str, usize> = HashMap::with_capacity(self.stages.len());
        for (i, stage) in self.stages.iter().enumerate() {
            if stage_index.insert(stage.id.as_str(), i).is_some() {
                return Err(ConfigError::DuplicateStage(stage.id.clone()));
            }
        }

        let mut feeds = vec![0usize; instrument_ids.len()];
        let mut inputs = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let (min, max, expected) = stage.kind.arity();
            if stage.inputs.len() < min || stage.inputs.len() > max {
                return Err(ConfigError::InputArity {
                    stage: stage.id.clone(),
                    expected,
                    actual: stage.inputs.len(),
                });
            }

            for param in stage.kind.params() {
                if !param.in_range() {
                    return Err(ConfigError::InvalidParameter {
                        stage: stage.id.clone(),
                        param: param.name,
                        value: param.value,
                    });
                }
            }

            let mut resolved = Vec::with_capacity(stage.inputs.len());
            for source in &stage.inputs {
                resolved.push(match source {
                    Source::Stage(id) => Input::Stage(*stage_index.get(id.as_str()).ok_or_else(
                        || ConfigError::UnknownInput {
                            stage: stage.id.clone(),
                            kind: "stage",
                            input: id.clone(),
                        },
                    )?),
                    Source::Instrument(id) => {
                        let index = instrument_ids
                            .iter()
                            .position(|i| i.as_ref() == id)
                            .ok_or_else(|| ConfigError::UnknownInput {
                                stage: stage.id.clone(),
                                kind: "instrument",
                                input: id.clone(),
                            })?;
                        if !stage.kind.is_mixer() {
                            return Err(ConfigError::InstrumentNotMixed {
                                instrument: id.clone(),
                                stage: stage.id.clone(),
                            });
                        }
                        feeds[index] += 1;
                        Input::Instrument(index)
                    }
                });
            }
            inputs.push(resolved);
        }

        for (id, &count) in instrument_ids.iter().zip(feeds.iter()) {
            match count {
                1 => {}
                0 => return Err(ConfigError::UnroutedInstrument(id.as_ref().to_owned())),
                count => {
                    return Err(ConfigError::InstrumentFanout {
                        instrument: id.as_ref().to_owned(),
                        count,
                    })
                }
            }
        }

        let order = kahn_sort(&inputs).map_err(|stuck| {
            ConfigError::CycleDetected(stuck.into_iter().map(|i| self.stages[i].id.clone()).collect())
        })?;

        let mut consumed = vec![false; self.stages.len()];
        for input in inputs.iter().flatten() {
            if let Input::Stage(s) = *input {
                consumed[s] = true;
            }
        }
        let roots: Vec<usize> = (0..self.stages.len()).filter(|&i| !consumed[i]).collect();
        if roots.len() != 1 {
            return Err(ConfigError::RootCount(
                roots.into_iter().map(|i| self.stages[i].id.clone()).collect(),
            ));
        }

        let ids: Vec<String> = self.stages.iter().map(|s| s.id.clone()).collect();
        debug!(
            order = ?order.iter().map(|&i| ids[i].as_str()).collect::<Vec<_>>(),
            root = %ids[roots[0]],
            "signal graph validated"
        );

        Ok(Topology {
            ids,
            inputs,
            order,
            root: roots[0],
            instrument_count: instrument_ids.len(),
        })
    }
}

/// Kahn's algorithm over stage-to-stage edges. On a cycle, returns the
/// stages that could never be scheduled.
fn kahn_sort(inputs: &[Vec<Input>]) -> Result<Vec<usize>, Vec<usize>> {
    let n = inputs.len();
    let mut in_degree = vec![0usize; n];
    let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (stage, stage_inputs) in inputs.iter().enumerate() {
        for input in stage_inputs {
            if let Input::Stage(from) = *input {
                in_degree[stage] += 1;
                consumers[from].push(stage);
            }
        }
    }

    // Seed with stages fed only by instruments. Reversed so pops come out in
    // declaration order.
    let mut queue: Vec<usize> = (0..n).rev().filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(n);

    while let Some(idx) = queue.pop() {
        sorted.push(idx);
        for &to in consumers[idx].iter().rev() {
            in_degree[to] -= 1;
            if in_degree[to] == 0 {
                queue.push(to);
            }
        }
    }

    if sorted.len() != n {
        return Err((0..n).filter(|&i| in_degree[i] > 0).collect());
    }

    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIX: StageKind = StageKind::Mixer { gain: 1.0 };
    const REVERB: StageKind = StageKind::Reverb {
        decay_time: 2.0,
        balance: 0.5,
    };

    fn chain() -> GraphSpec {
        GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a"), Source::instrument("b")])
            .with_stage("verb", REVERB, [Source::stage("mix")])
            .with_stage("out", MIX, [Source::stage("verb")])
    }

    #[test]
    fn test_valid_chain_orders_inputs_first() {
        let topology = chain().validate(&["a", "b"]).expect("valid graph");

        assert_eq!(topology.len(), 3);
        assert_eq!(topology.order(), &[0, 1, 2]);
        assert_eq!(topology.id(topology.root()), "out");
        assert_eq!(topology.inputs(0), &[Input::Instrument(0), Input::Instrument(1)]);
    }

    #[test]
    fn test_order_respects_declaration_independent_wiring() {
        // consumer declared before producer
        let spec = GraphSpec::new()
            .with_stage("out", MIX, [Source::stage("verb")])
            .with_stage("verb", REVERB, [Source::stage("mix")])
            .with_stage("mix", MIX, [Source::instrument("a")]);
        let topology = spec.validate(&["a"]).expect("valid graph");

        let pos = |id: &str| {
            let index = topology.index_of(id).expect("known id");
            topology.order().iter().position(|&i| i == index).expect("ordered")
        };
        assert!(pos("mix") < pos("verb"));
        assert!(pos("verb") < pos("out"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let spec = GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a"), Source::stage("b")])
            .with_stage("a_fx", REVERB, [Source::stage("mix")])
            .with_stage("b", MIX, [Source::stage("a_fx")])
            .with_stage("out", MIX, [Source::stage("b")]);

        match spec.validate(&["a"]) {
            Err(ConfigError::CycleDetected(stages)) => {
                assert!(stages.contains(&"mix".to_owned()));
                assert!(stages.contains(&"b".to_owned()));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_rejected() {
        let spec = GraphSpec::new().with_stage(
            "mix",
            MIX,
            [Source::instrument("a"), Source::stage("mix")],
        );
        assert!(matches!(spec.validate(&["a"]), Err(ConfigError::CycleDetected(_))));
    }

    #[test]
    fn test_two_roots_rejected() {
        let spec = GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a")])
            .with_stage("left", REVERB, [Source::stage("mix")])
            .with_stage("right", REVERB, [Source::stage("mix")]);

        assert_eq!(
            spec.validate(&["a"]),
            Err(ConfigError::RootCount(vec!["left".into(), "right".into()]))
        );
    }

    #[test]
    fn test_unknown_references() {
        let spec = GraphSpec::new().with_stage("mix", MIX, [Source::instrument("ghost")]);
        assert!(matches!(
            spec.validate(&["a"]),
            Err(ConfigError::UnknownInput { kind: "instrument", .. })
        ));

        let spec = GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a")])
            .with_stage("out", REVERB, [Source::stage("nowhere")]);
        assert!(matches!(
            spec.validate(&["a"]),
            Err(ConfigError::UnknownInput { kind: "stage", .. })
        ));
    }

    #[test]
    fn test_instrument_wiring_rules() {
        let into_effect = GraphSpec::new().with_stage("verb", REVERB, [Source::instrument("a")]);
        assert!(matches!(
            into_effect.validate(&["a"]),
            Err(ConfigError::InstrumentNotMixed { .. })
        ));

        let twice = GraphSpec::new()
            .with_stage("m1", MIX, [Source::instrument("a")])
            .with_stage("m2", MIX, [Source::instrument("a"), Source::stage("m1")]);
        assert!(matches!(
            twice.validate(&["a"]),
            Err(ConfigError::InstrumentFanout { count: 2, .. })
        ));

        let unrouted = GraphSpec::new().with_stage("mix", MIX, [Source::instrument("a")]);
        assert_eq!(
            unrouted.validate(&["a", "b"]),
            Err(ConfigError::UnroutedInstrument("b".into()))
        );
    }

    #[test]
    fn test_arity_and_params() {
        let dry_wet = GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a")])
            .with_stage("dw", StageKind::DryWet { balance: 0.5 }, [Source::stage("mix")]);
        assert!(matches!(
            dry_wet.validate(&["a"]),
            Err(ConfigError::InputArity { actual: 1, .. })
        ));

        let bad_balance = GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a")])
            .with_stage(
                "verb",
                StageKind::Reverb {
                    decay_time: 2.0,
                    balance: 1.5,
                },
                [Source::stage("mix")],
            );
        assert!(matches!(
            bad_balance.validate(&["a"]),
            Err(ConfigError::InvalidParameter { param: "balance", .. })
        ));
    }

    #[test]
    fn test_duplicate_and_empty() {
        assert_eq!(GraphSpec::new().validate::<&str>(&[]), Err(ConfigError::EmptyGraph));

        let dup = GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a")])
            .with_stage("mix", MIX, [Source::stage("mix")]);
        assert_eq!(dup.validate(&["a"]), Err(ConfigError::DuplicateStage("mix".into())));
    }
}
