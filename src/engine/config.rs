#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    engine::routing::RoutingConfig,
    graph::topology::{GraphSpec, Source, StageKind},
    synth::{instrument::VelocityCurve, timbre::Timbre},
};

pub const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;
pub const DEFAULT_VOICE_COUNT: usize = 12;
pub const DEFAULT_MIDI_PORT: &str = "Session 1";

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentConfig {
    pub id: String,
    pub timbre: Timbre,
    pub voice_count: usize,
}

impl InstrumentConfig {
    pub fn new(id: impl Into<String>, timbre: Timbre, voice_count: usize) -> Self {
        Self {
            id: id.into(),
            timbre,
            voice_count,
        }
    }
}

/// Everything a [`Conductor`](crate::engine::Conductor) is built from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Slots in the control-to-render event queue.
    pub event_capacity: usize,
    /// Name of the MIDI input port the delivering collaborator should open.
    pub midi_port: String,
    pub velocity_curve: VelocityCurve,
    pub instruments: Vec<InstrumentConfig>,
    pub routing: RoutingConfig,
    pub graph: GraphSpec,
    /// Mixer stage whose `gain` acts as master volume.
    pub master_stage: Option<String>,
}

/*
The Layered Patch
=================

Six instruments summed, then one serial effect chain. The two dry/wet
mixers start fully dry, so out of the box the crusher and the echo are
in the graph but inaudible until their balance is raised.

    sine1, triangle1, sawtooth1, square1, fm, noise
        → source_mixer
        → [source_mixer (dry), bit_crusher (wet)] → bit_crush_mixer
        → filter_section
        → fatten
        → [fatten (dry), multi_delay (wet)] → multi_delay_mixer
        → master_volume
        → reverb (root)

Routing: fm and noise are layered under every note, sine1 takes the one
rotation slot. triangle1, sawtooth1 and square1 are wired and silent until
a routing change sends notes to them.
*/

impl Default for EngineConfig {
    fn default() -> Self {
        let instruments = vec![
            InstrumentConfig::new("sine1", Timbre::sine(), DEFAULT_VOICE_COUNT),
            InstrumentConfig::new("triangle1", Timbre::triangle(), DEFAULT_VOICE_COUNT),
            InstrumentConfig::new("sawtooth1", Timbre::sawtooth(), DEFAULT_VOICE_COUNT),
            InstrumentConfig::new("square1", Timbre::square(), DEFAULT_VOICE_COUNT),
            InstrumentConfig::new("fm", Timbre::fm().with_gain(0.4), DEFAULT_VOICE_COUNT),
            InstrumentConfig::new("noise", Timbre::noise(0.5).with_gain(0.2), DEFAULT_VOICE_COUNT),
        ];

        let graph = GraphSpec::new()
            .with_stage(
                "source_mixer",
                StageKind::Mixer { gain: 1.0 },
                instruments.iter().map(|i| Source::instrument(i.id.clone())),
            )
            .with_stage(
                "bit_crusher",
                StageKind::BitCrusher {
                    bit_depth: 8.0,
                    sample_rate: 10_000.0,
                    balance: 1.0,
                },
                [Source::stage("source_mixer")],
            )
            .with_stage(
                "bit_crush_mixer",
                StageKind::DryWet { balance: 0.0 },
                [Source::stage("source_mixer"), Source::stage("bit_crusher")],
            )
            .with_stage(
                "filter_section",
                StageKind::Filter {
                    cutoff: 2_000.0,
                    resonance: 0.2,
                    lfo_rate: 0.5,
                    lfo_depth: 500.0,
                },
                [Source::stage("bit_crush_mixer")],
            )
            .with_stage(
                "fatten",
                StageKind::Fatten {
                    time: 0.02,
                    balance: 0.5,
                },
                [Source::stage("filter_section")],
            )
            .with_stage(
                "multi_delay",
                StageKind::MultiDelay {
                    time: 0.25,
                    feedback: 0.3,
                },
                [Source::stage("fatten")],
            )
            .with_stage(
                "multi_delay_mixer",
                StageKind::DryWet { balance: 0.0 },
                [Source::stage("fatten"), Source::stage("multi_delay")],
            )
            .with_stage(
                "master_volume",
                StageKind::Mixer { gain: 1.0 },
                [Source::stage("multi_delay_mixer")],
            )
            .with_stage(
                "reverb",
                StageKind::Reverb {
                    decay_time: 2.0,
                    balance: 0.5,
                },
                [Source::stage("master_volume")],
            );

        let routing = RoutingConfig::new()
            .layer("fm", 1.0)
            .layer("noise", 1.0)
            .rotate("sine1", 1.0);

        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            midi_port: DEFAULT_MIDI_PORT.to_owned(),
            velocity_curve: VelocityCurve::default(),
            instruments,
            routing,
            graph,
            master_stage: Some("master_volume".to_owned()),
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_velocity_curve(mut self, curve: VelocityCurve) -> Self {
        self.velocity_curve = curve;
        self
    }

    pub fn instrument_ids(&self) -> Vec<&str> {
        self.instruments.iter().map(|i| i.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_validates() {
        let config = EngineConfig::default();
        let topology = config
            .graph
            .validate(&config.instrument_ids())
            .expect("default graph is valid");

        assert_eq!(topology.len(), 9);
        assert_eq!(topology.id(topology.root()), "reverb");
        assert_eq!(topology.instrument_count(), 6);
    }

    #[test]
    fn test_default_patch_levels() {
        let config = EngineConfig::default();
        let gain = |id: &str| {
            config
                .instruments
                .iter()
                .find(|i| i.id == id)
                .map(|i| i.timbre.gain)
        };
        assert_eq!(gain("fm"), Some(0.4));
        assert_eq!(gain("noise"), Some(0.2));
        assert_eq!(gain("sine1"), Some(1.0));
        assert!(config.instruments.iter().all(|i| i.voice_count == 12));
        assert_eq!(config.midi_port, "Session 1");
    }
}
