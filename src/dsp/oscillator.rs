use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::fm::FmPair;

/*
Phase-Accumulator Oscillators
=============================

Every pitched waveform here is driven by the same normalized phase:

    phase ∈ [0, 1)          one full cycle
    phase += f / sr         per sample
    if phase >= 1: phase -= 1

The waveform is a pure function of phase:

    Sine      sin(2π·phase)
    Triangle  0 → 1 → -1 → 0 over one cycle (odd harmonics, 1/n² falloff)
    Sawtooth  2·phase - 1                (all harmonics, 1/n falloff)
    Square    +1 for phase < 0.5, else -1 (odd harmonics, 1/n falloff)

The output sample is computed BEFORE the phase advances, so sample n of a
freshly reset sine is exactly sin(2π·f·n/sr).

These are naive (non-band-limited) shapes. At high pitches the saw and square
alias; for a layered patch driven from a keyboard that is an accepted cost.

Noise
-----
Noise ignores frequency. White noise comes from a per-voice SmallRng so two
voices never produce correlated hiss. Pink noise is white noise through
Paul Kellet's three-pole "economy" filter, which tilts the spectrum by
roughly -3 dB/octave. `white_pink_mix` blends them:

    0.0 = white only, 1.0 = pink only

FM
--
See `dsp/fm.rs`. The FM variant carries its operator ratios and index inline
so one enum describes every timbre's generator.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OscillatorWaveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
    /// Two-operator FM: the modulator runs at `frequency * modulating_multiplier`
    /// and bends the phase of a carrier at `frequency * carrier_multiplier`.
    Fm {
        carrier_multiplier: f32,
        modulating_multiplier: f32,
        modulation_index: f32,
    },
    /// Unpitched noise, `white_pink_mix` in [0, 1].
    Noise { white_pink_mix: f32 },
}

impl OscillatorWaveform {
    pub fn fm() -> Self {
        Self::Fm {
            carrier_multiplier: 1.0,
            modulating_multiplier: 1.0,
            modulation_index: 1.0,
        }
    }

    pub fn noise(white_pink_mix: f32) -> Self {
        Self::Noise {
            white_pink_mix: white_pink_mix.clamp(0.0, 1.0),
        }
    }

    pub fn is_pitched(&self) -> bool {
        !matches!(self, Self::Noise { .. })
    }
}

/// White noise with an optional pink-filtered blend.
struct NoiseSource {
    rng: SmallRng,
    b0: f32,
    b1: f32,
    b2: f32,
}

impl NoiseSource {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
        }
    }

    #[inline]
    fn next_sample(&mut self, white_pink_mix: f32) -> f32 {
        let white = self.rng.gen::<f32>() * 2.0 - 1.0;

        self.b0 = 0.99765 * self.b0 + white * 0.099_046;
        self.b1 = 0.963 * self.b1 + white * 0.296_516_4;
        self.b2 = 0.57 * self.b2 + white * 1.052_691_3;
        // Kellet's filter has roughly 4x gain; bring it back near unity.
        let pink = (self.b0 + self.b1 + self.b2 + white * 0.1848) * 0.25;

        white * (1.0 - white_pink_mix) + pink * white_pink_mix
    }

    fn reset(&mut self) {
        self.b0 = 0.0;
        self.b1 = 0.0;
        self.b2 = 0.0;
    }
}

/// Allocation-free generator for one voice.
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32,
    fm: FmPair,
    noise: NoiseSource,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self::with_seed(waveform, 0x5eed)
    }

    /// Seed the noise generator. Voices in one pool use distinct seeds.
    pub fn with_seed(waveform: OscillatorWaveform, seed: u64) -> Self {
        Self {
            waveform,
            phase: 0.0,
            fm: FmPair::new(),
            noise: NoiseSource::new(seed),
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Sawtooth)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    /// Restart the cycle from phase zero and clear filter memory.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.fm.reset();
        self.noise.reset();
    }

    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let sample = match self.waveform {
            OscillatorWaveform::Sine => (TAU * self.phase).sin(),
            OscillatorWaveform::Triangle => {
                let p = self.phase;
                if p < 0.25 {
                    4.0 * p
                } else if p < 0.75 {
                    2.0 - 4.0 * p
                } else {
                    4.0 * p - 4.0
                }
            }
            OscillatorWaveform::Sawtooth => 2.0 * self.phase - 1.0,
            OscillatorWaveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Fm {
                carrier_multiplier,
                modulating_multiplier,
                modulation_index,
            } => {
                return self.fm.next_sample(
                    frequency,
                    sample_rate,
                    carrier_multiplier,
                    modulating_multiplier,
                    modulation_index,
                );
            }
            OscillatorWaveform::Noise { white_pink_mix } => {
                return self.noise.next_sample(white_pink_mix);
            }
        };

        self.phase += frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        sample
    }

    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }
}
