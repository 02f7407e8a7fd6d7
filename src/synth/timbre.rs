#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{envelope::Envelope, oscillator::OscillatorWaveform},
    error::ConfigError,
};

/// ADSR times in seconds, sustain in [0, 1].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeDescriptor {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeDescriptor {
    /// A declicked gate: 2 ms in, full sustain, 20 ms out.
    fn default() -> Self {
        Self {
            attack: 0.002,
            decay: 0.05,
            sustain: 1.0,
            release: 0.02,
        }
    }
}

impl EnvelopeDescriptor {
    pub fn build(&self, sample_rate: f32) -> Envelope {
        Envelope::adsr(sample_rate, self.attack, self.decay, self.sustain, self.release)
    }

    fn first_invalid(&self) -> Option<(&'static str, f32)> {
        let times = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ];
        if let Some(bad) = times.into_iter().find(|(_, t)| !(t.is_finite() && *t >= 0.0)) {
            return Some(bad);
        }
        // NaN is outside every range
        (!(0.0..=1.0).contains(&self.sustain)).then_some(("sustain", self.sustain))
    }
}

/// What one instrument sounds like: generator, output level, and gate shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timbre {
    pub waveform: OscillatorWaveform,
    /// Output volume applied to the instrument's summed voices.
    pub gain: f32,
    pub envelope: EnvelopeDescriptor,
}

impl Timbre {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            gain: 1.0,
            envelope: EnvelopeDescriptor::default(),
        }
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeDescriptor) -> Self {
        self.envelope = envelope;
        self
    }

    /// Reject values the render path cannot use.
    pub fn validate(&self, instrument: &str) -> Result<(), ConfigError> {
        let invalid = |param: &'static str, value: f32| ConfigError::InvalidParameter {
            stage: format!("instrument '{instrument}'"),
            param,
            value,
        };

        if !(self.gain.is_finite() && self.gain >= 0.0) {
            return Err(invalid("gain", self.gain));
        }
        if let Some((param, value)) = self.envelope.first_invalid() {
            return Err(invalid(param, value));
        }

        match self.waveform {
            OscillatorWaveform::Fm {
                carrier_multiplier,
                modulating_multiplier,
                modulation_index,
            } => {
                let ratios = [
                    ("carrier_multiplier", carrier_multiplier),
                    ("modulating_multiplier", modulating_multiplier),
                ];
                if let Some((param, value)) = ratios
                    .into_iter()
                    .find(|(_, r)| !(r.is_finite() && *r > 0.0))
                {
                    return Err(invalid(param, value));
                }
                if !(modulation_index.is_finite() && modulation_index >= 0.0) {
                    return Err(invalid("modulation_index", modulation_index));
                }
            }
            OscillatorWaveform::Noise { white_pink_mix } => {
                if !(0.0..=1.0).contains(&white_pink_mix) {
                    return Err(invalid("white_pink_mix", white_pink_mix));
                }
            }
            _ => {}
        }
        Ok(())
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

    pub fn fm() -> Self {
        Self::new(OscillatorWaveform::fm())
    }

    pub fn noise(white_pink_mix: f32) -> Self {
        Self::new(OscillatorWaveform::noise(white_pink_mix))
    }
}
