use arrayvec::ArrayVec;
use tracing::trace;

use crate::{
    error::{ConfigError, StageFault},
    graph::{
        stage::{build_stage, RenderCtx, Stage},
        topology::{GraphSpec, Input, Topology, MAX_STAGE_INPUTS},
    },
    params::{ParamHandle, ParamRegistry},
    MAX_BLOCK_SIZE,
};

static SILENCE: [f32; MAX_BLOCK_SIZE] = [0.0; MAX_BLOCK_SIZE];

/*
Pull-Model Evaluation
=====================

One pull = one pass over the stages in topological order:

    for stage in order:
        gather input blocks  (instrument sources, or earlier stages' buffers)
        stage.process(inputs, own buffer)
    copy root buffer to out

Each stage owns a MAX_BLOCK_SIZE buffer allocated at build time. Its output
stays there for the rest of the pull, so a stage feeding three consumers still
runs once. The buffer is moved out with `mem::take` while the stage writes it,
which lets the input slices borrow every OTHER buffer at the same time; a
validated topology never reads a stage's own output.

Fault isolation: a stage that returns `Err` or writes a non-finite sample has
its buffer zeroed for this block. Consumers downstream see silence and keep
running.
*/

pub struct SignalGraph {
    topology: Topology,
    stages: Vec<Box<dyn Stage>>,
    buffers: Vec<Vec<f32>>,
    params: ParamRegistry,
    sample_rate: f32,
    frame: u64,
}

impl SignalGraph {
    /// Instantiate the built-in stages of a validated `GraphSpec`.
    ///
    /// `topology` must come from `spec.validate`; a stage count that does not
    /// match is rejected.
    pub fn build(
        spec: &GraphSpec,
        topology: Topology,
        sample_rate: f32,
    ) -> Result<Self, ConfigError> {
        let stages = spec
            .stages
            .iter()
            .map(|stage| build_stage(&stage.kind, sample_rate))
            .collect();
        Self::with_stages(topology, stages, sample_rate)
    }

    /// Use caller-supplied stages, one per topology entry, in declaration order.
    pub fn with_stages(
        topology: Topology,
        stages: Vec<Box<dyn Stage>>,
        sample_rate: f32,
    ) -> Result<Self, ConfigError> {
        if stages.len() != topology.len() {
            return Err(ConfigError::StageCount {
                expected: topology.len(),
                actual: stages.len(),
            });
        }
        Ok(Self::assemble(topology, stages, sample_rate))
    }

    fn assemble(topology: Topology, stages: Vec<Box<dyn Stage>>, sample_rate: f32) -> Self {
        let mut params = ParamRegistry::new();
        for (index, stage) in stages.iter().enumerate() {
            for (name, handle) in stage.params() {
                params.register(topology.id(index), name, handle);
            }
        }

        Self {
            buffers: vec![vec![0.0; MAX_BLOCK_SIZE]; topology.len()],
            topology,
            stages,
            params,
            sample_rate,
            frame: 0,
        }
    }

    /// Evaluate every stage once and write the root's output to `out`.
    ///
    /// `sources[i]` is the block of instrument `i`. At most `MAX_BLOCK_SIZE`
    /// frames are produced; any excess in `out` is zeroed. Returns the number
    /// of stages that faulted.
    pub fn pull(&mut self, sources: &[Vec<f32>], out: &mut [f32]) -> usize {
        let frames = out.len().min(MAX_BLOCK_SIZE);
        let ctx = RenderCtx {
            sample_rate: self.sample_rate,
            frame: self.frame,
        };
        let mut faults = 0;

        for &index in self.topology.order() {
            let mut output = std::mem::take(&mut self.buffers[index]);

            let mut inputs: ArrayVec<&[f32], MAX_STAGE_INPUTS> = ArrayVec::new();
            for input in self.topology.inputs(index) {
                let block = match *input {
                    Input::Instrument(i) => sources
                        .get(i)
                        .filter(|s| s.len() >= frames)
                        .map_or(&SILENCE[..frames], |s| &s[..frames]),
                    Input::Stage(s) => &self.buffers[s][..frames],
                };
                inputs.push(block);
            }

            let result = self.stages[index].process(&inputs, &mut output[..frames], &ctx);
            // ArrayVec has drop glue; release the borrow of `buffers` before writing back
            drop(inputs);

            let fault = match result {
                Err(fault) => Some(fault),
                Ok(()) if output[..frames].iter().any(|s| !s.is_finite()) => {
                    Some(StageFault::NonFinite)
                }
                Ok(()) => None,
            };
            if let Some(fault) = fault {
                trace!(stage = self.topology.id(index), %fault, "stage faulted, block silenced");
                output[..frames].fill(0.0);
                faults += 1;
            }

            self.buffers[index] = output;
        }

        out[..frames].copy_from_slice(&self.buffers[self.topology.root()][..frames]);
        out[frames..].fill(0.0);
        self.frame += frames as u64;
        faults
    }

    /// Clear every stage's internal state and cached output.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
    }

    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    pub fn param(&self, stage: &str, name: &str) -> Option<ParamHandle> {
        self.params.get(stage, name)
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::graph::topology::{Source, StageKind};

    const MIX: StageKind = StageKind::Mixer { gain: 1.0 };

    /// Passes its first input through and counts calls.
    struct Counted {
        calls: Arc<AtomicUsize>,
        fail: bool,
        poison: bool,
    }

    impl Stage for Counted {
        fn process(
            &mut self,
            inputs: &[&[f32]],
            out: &mut [f32],
            _ctx: &RenderCtx,
        ) -> Result<(), StageFault> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(StageFault::InputMismatch {
                    expected: 9,
                    actual: inputs.len(),
                });
            }
            out.fill(0.0);
            for input in inputs {
                for (o, &x) in out.iter_mut().zip(input.iter()) {
                    *o += x;
                }
            }
            if self.poison {
                out[0] = f32::NAN;
            }
            Ok(())
        }
    }

    fn counted(calls: &Arc<AtomicUsize>) -> Box<dyn Stage> {
        Box::new(Counted {
            calls: Arc::clone(calls),
            fail: false,
            poison: false,
        })
    }

    /// a → mix → {left, right} → out (diamond)
    fn diamond() -> Topology {
        GraphSpec::new()
            .with_stage("mix", MIX, [Source::instrument("a")])
            .with_stage("left", MIX, [Source::stage("mix")])
            .with_stage("right", MIX, [Source::stage("mix")])
            .with_stage("out", MIX, [Source::stage("left"), Source::stage("right")])
            .validate(&["a"])
            .expect("valid diamond")
    }

    #[test]
    fn test_each_stage_runs_once_per_pull() {
        let counters: Vec<_> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let stages = counters.iter().map(counted).collect();
        let mut graph = SignalGraph::with_stages(diamond(), stages, 48_000.0).expect("4 stages");

        let sources = vec![vec![1.0f32; 64]];
        let mut out = vec![0.0f32; 64];
        for _ in 0..3 {
            graph.pull(&sources, &mut out);
        }

        for counter in &counters {
            assert_eq!(counter.load(Ordering::Relaxed), 3);
        }
        // both branches of the diamond sum at the root
        assert!(out.iter().all(|&s| s == 2.0));
    }

    #[test]
    fn test_faulted_stage_is_silenced_downstream_continues() {
        let counters: Vec<_> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let stages: Vec<Box<dyn Stage>> = vec![
            counted(&counters[0]),
            Box::new(Counted {
                calls: Arc::clone(&counters[1]),
                fail: true,
                poison: false,
            }),
            Box::new(Counted {
                calls: Arc::clone(&counters[2]),
                fail: false,
                poison: true,
            }),
            counted(&counters[3]),
        ];
        let mut graph = SignalGraph::with_stages(diamond(), stages, 48_000.0).expect("4 stages");

        let sources = vec![vec![1.0f32; 32]];
        let mut out = vec![5.0f32; 32];
        let faults = graph.pull(&sources, &mut out);

        assert_eq!(faults, 2);
        assert_eq!(counters[3].load(Ordering::Relaxed), 1, "root still ran");
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stage_count_mismatch() {
        let result = SignalGraph::with_stages(diamond(), Vec::new(), 48_000.0);
        assert!(matches!(
            result,
            Err(ConfigError::StageCount {
                expected: 4,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_build_rejects_topology_from_another_graph() {
        let short = GraphSpec::new().with_stage("mix", MIX, [Source::instrument("a")]);
        let result = SignalGraph::build(&short, diamond(), 48_000.0);
        assert!(matches!(
            result,
            Err(ConfigError::StageCount {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_built_graph_registers_params() {
        let spec = GraphSpec::new()
            .with_stage("mix", StageKind::Mixer { gain: 0.5 }, [Source::instrument("a")])
            .with_stage(
                "verb",
                StageKind::Reverb {
                    decay_time: 2.0,
                    balance: 0.0,
                },
                [Source::stage("mix")],
            );
        let topology = spec.validate(&["a"]).expect("valid graph");
        let mut graph = SignalGraph::build(&spec, topology, 48_000.0).expect("matching spec");

        assert_eq!(graph.params().len(), 3);
        let decay = graph.param("verb", "decay_time").expect("registered");
        assert_eq!(decay.get(), 2.0);

        // balance 0 reverb: output is the mixer output
        let sources = vec![vec![0.8f32; 128]];
        let mut out = vec![0.0f32; 128];
        graph.pull(&sources, &mut out);
        assert!(out.iter().all(|&s| (s - 0.4).abs() < 1e-6));
    }

    #[test]
    fn test_oversized_block_is_truncated() {
        let counters: Vec<_> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let stages = counters.iter().map(counted).collect();
        let mut graph = SignalGraph::with_stages(diamond(), stages, 48_000.0).expect("4 stages");

        let sources = vec![vec![1.0f32; MAX_BLOCK_SIZE + 16]];
        let mut out = vec![3.0f32; MAX_BLOCK_SIZE + 16];
        graph.pull(&sources, &mut out);

        assert_eq!(out[MAX_BLOCK_SIZE - 1], 2.0);
        assert!(out[MAX_BLOCK_SIZE..].iter().all(|&s| s == 0.0));
    }
}
