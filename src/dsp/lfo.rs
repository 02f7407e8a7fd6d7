//! Low frequency oscillator for control-rate modulation.

/*
An LFO is the same phase accumulator as an audio oscillator, run at 0.01 to
20 Hz and used to move a parameter instead of making sound.

  bipolar    -1.0 .. +1.0   symmetric sweeps (cutoff goes above AND below center)
  unipolar    0.0 .. 1.0    one-directional sweeps

The filter section advances its LFO once per block rather than once per
sample: at block sizes up to a few hundred frames the staircase is far below
anything audible for sweep rates under ~20 Hz, and it keeps the per-sample
loop free of a `sin` call.
*/

use std::f32::consts::TAU;

/// Free-running sine LFO. Phase is kept in [0, 1).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lfo {
    phase: f32,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bipolar value without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        (TAU * self.phase).sin()
    }

    /// Advance by `frames` samples at `rate_hz`, returning the value at the
    /// start of the span.
    #[inline]
    pub fn advance(&mut self, rate_hz: f32, frames: usize, sample_rate: f32) -> f32 {
        let value = self.value();
        self.phase += rate_hz.max(0.0) * frames as f32 / sample_rate;
        self.phase -= self.phase.floor();
        value
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}

/// Convert unipolar signal (0.0 to 1.0) to bipolar (-1.0 to +1.0).
#[inline]
pub fn unipolar_to_bipolar(unipolar: f32) -> f32 {
    (unipolar * 2.0) - 1.0
}

/// Samples in one LFO cycle.
///
/// # Example
/// ```
/// use layersynth::dsp::lfo::samples_per_period;
/// let samples = samples_per_period(5.0, 48000.0);
/// assert_eq!(samples, 9600.0); // 5 Hz at 48kHz = 9600 samples
/// ```
#[inline]
pub fn samples_per_period(frequency_hz: f32, sample_rate: f32) -> f32 {
    sample_rate / frequency_hz
}
