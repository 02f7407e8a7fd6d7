//! Bit depth and sample rate reduction.
//!
//! ```text
//! hold:     phase += target_rate / sample_rate
//!           when phase crosses 1.0, capture a new sample; otherwise repeat the last
//! quantize: levels = 2^bits
//!           y = round(x · levels) / levels
//! ```
//!
//! Holding samples at a lower rate folds high partials back down (aliasing on
//! purpose); quantizing adds stepped distortion that grows as `bits` drops.

#[derive(Debug, Clone)]
pub struct BitCrusher {
    phase: f32,
    held: f32,
}

impl Default for BitCrusher {
    fn default() -> Self {
        Self::new()
    }
}

impl BitCrusher {
    pub fn new() -> Self {
        // Start on a capture so the first input sample is never swallowed.
        Self {
            phase: 1.0,
            held: 0.0,
        }
    }

    #[inline]
    pub fn quantize(sample: f32, bit_depth: f32) -> f32 {
        let levels = 2.0_f32.powf(bit_depth.clamp(1.0, 24.0));
        (sample * levels).round() / levels
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, bit_depth: f32, step: f32) -> f32 {
        if self.phase >= 1.0 {
            self.held = Self::quantize(sample, bit_depth);
            self.phase -= self.phase.floor();
        }
        self.phase += step;
        self.held
    }

    /// Crush `buffer` in place. `target_rate` is the held sample rate in Hz.
    pub fn render(&mut self, buffer: &mut [f32], bit_depth: f32, target_rate: f32, sample_rate: f32) {
        let step = (target_rate / sample_rate).clamp(1.0 / 64.0, 1.0);
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, bit_depth, step);
        }
    }

    pub fn reset(&mut self) {
        self.phase = 1.0;
        self.held = 0.0;
    }
}
