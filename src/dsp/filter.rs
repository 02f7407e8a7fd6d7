use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
| type              | passes          | rejects      |
| ----------------- | --------------- | ------------ |
| low-pass          | below cutoff    | above cutoff |
| high-pass         | above cutoff    | below cutoff |
| band-pass         | around cutoff   | outside      |
| notch / band-stop | outside         | around       |

TPT state-variable filter (Zavalishin). All four responses fall out of one
update, so switching response costs nothing. Cutoff is pre-warped per block,
so it may be swept block by block (the filter section's LFO does exactly that).
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
    pub notch: f32,
}

pub struct SVFilter {
    ic1eq: f32,
    ic2eq: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            filter_type,
        }
    }

    pub fn lowpass() -> Self {
        Self::new(FilterType::LowPass)
    }

    /// Integrator gain for a cutoff, clamped below Nyquist.
    #[inline]
    pub fn coefficient(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let cutoff = cutoff_hz.clamp(10.0, sample_rate * 0.49);
        (PI * cutoff / sample_rate).tan()
    }

    /// Damping for a resonance in [0, 1). 0 = no peak, near 1 = self-oscillation.
    #[inline]
    pub fn damping(resonance: f32) -> f32 {
        2.0 - 2.0 * resonance.clamp(0.0, 0.98)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
            notch: sample - k * v1,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32, k: f32, g: f32) -> f32 {
        let outputs = self.next_sample(sample, k, g);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::HighPass => outputs.highpass,
            FilterType::BandPass => outputs.bandpass,
            FilterType::Notch => outputs.notch,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], cutoff_hz: f32, resonance: f32, sample_rate: f32) {
        let g = Self::coefficient(cutoff_hz, sample_rate);
        let k = Self::damping(resonance);

        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, k, g);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}
