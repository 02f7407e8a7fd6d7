//! Two-operator FM (phase modulation).
//!
//! ```text
//! modulator = sin(2π · m_phase)                   m_phase at f · modulating_multiplier
//! output    = sin(2π · c_phase + index · modulator) c_phase at f · carrier_multiplier
//! ```
//!
//! With both multipliers at 1 and a modest index the result is a bright,
//! bell-ish tone whose sideband spacing tracks the played pitch. Raising the
//! index spreads energy into more sidebands; index 0 is a plain sine.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, Default)]
pub struct FmPair {
    carrier_phase: f32,
    modulator_phase: f32,
}

impl FmPair {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.carrier_phase = 0.0;
        self.modulator_phase = 0.0;
    }

    #[inline]
    pub fn next_sample(
        &mut self,
        frequency: f32,
        sample_rate: f32,
        carrier_multiplier: f32,
        modulating_multiplier: f32,
        modulation_index: f32,
    ) -> f32 {
        let modulator = (TAU * self.modulator_phase).sin();
        let output = (TAU * self.carrier_phase + modulation_index * modulator).sin();

        self.carrier_phase = wrap(self.carrier_phase + frequency * carrier_multiplier / sample_rate);
        self.modulator_phase =
            wrap(self.modulator_phase + frequency * modulating_multiplier / sample_rate);

        output
    }
}

#[inline]
fn wrap(phase: f32) -> f32 {
    phase - phase.floor()
}
