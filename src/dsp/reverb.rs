//! Reverb - Room Simulation via Delay Networks
//!
//! Classic Schroeder topology:
//!
//! ```text
//! Input ──┬──→ [Comb 1] ──┐
//!         ├──→ [Comb 2] ──┤
//!         ├──→ [Comb 3] ──┼──→ (+) ──→ [Allpass 1] ──→ [Allpass 2] ──→ Output
//!         └──→ [Comb 4] ──┘
//! ```
//!
//! ## Decay time
//!
//! The tail length is set as RT60: seconds for the tail to fall by 60 dB. A
//! comb with loop delay `d` seconds loses `20·log10(g)` dB per pass, so to hit
//! -60 dB after `T` seconds each comb gets its own gain:
//!
//! ```text
//! g = 10^(-3 · d / T)
//! ```
//!
//! Longer combs get lower gains, so all four decay at the same rate.
//!
//! ## Damping
//!
//! A one-pole lowpass in each comb loop absorbs highs on every pass, the way
//! air and soft surfaces darken a real tail.

const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];

fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    ((ms * sample_rate / 1000.0) as usize).max(1)
}

/// Feedback comb with a damped loop.
pub struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
            damp: 0.5,
            filter_state: 0.0,
        }
    }

    pub fn delay_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;
        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// Schroeder allpass used for diffusion.
pub struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback: 0.5,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -self.feedback * input + delayed;

        self.buffer[self.write_pos] = input + self.feedback * output;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

pub struct SchroederReverb {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
    sample_rate: f32,
    decay_time: f32,
}

impl SchroederReverb {
    pub fn new(sample_rate: f32) -> Self {
        let mut reverb = Self {
            combs: COMB_DELAYS_MS.map(|ms| CombFilter::new(ms_to_samples(ms, sample_rate))),
            allpasses: ALLPASS_DELAYS_MS.map(|ms| AllpassFilter::new(ms_to_samples(ms, sample_rate))),
            sample_rate,
            decay_time: 0.0,
        };
        reverb.set_decay_time(2.0);
        reverb.set_damping(0.3);
        reverb
    }

    /// RT60 in seconds. Recomputing the comb gains only happens on change.
    pub fn set_decay_time(&mut self, seconds: f32) {
        let seconds = seconds.max(crate::MIN_TIME);
        if seconds == self.decay_time {
            return;
        }
        self.decay_time = seconds;

        for comb in &mut self.combs {
            let delay = comb.delay_samples() as f32 / self.sample_rate;
            comb.set_feedback(10.0_f32.powf(-3.0 * delay / seconds));
        }
    }

    pub fn decay_time(&self) -> f32 {
        self.decay_time
    }

    pub fn set_damping(&mut self, damp: f32) {
        for comb in &mut self.combs {
            comb.set_damp(damp);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        output *= 0.25;

        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }

        output
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail_energy(reverb: &mut SchroederReverb, skip: usize, len: usize) -> f32 {
        reverb.process(1.0);
        for _ in 0..skip {
            reverb.process(0.0);
        }
        (0..len).map(|_| reverb.process(0.0).powi(2)).sum()
    }

    #[test]
    fn test_comb_filter_creates_echo() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(0.5);
        comb.set_damp(0.0);

        let out1 = comb.process(1.0);
        assert!(out1.abs() < 0.01);

        for _ in 0..9 {
            comb.process(0.0);
        }

        let echo = comb.process(0.0);
        assert!(echo.abs() > 0.4);
    }

    #[test]
    fn test_allpass_preserves_energy() {
        let mut allpass = AllpassFilter::new(5);
        let mut energy_in = 0.0;
        let mut energy_out = 0.0;

        for i in 0..100 {
            let input = if i < 10 { 1.0 } else { 0.0 };
            let output = allpass.process(input);
            energy_in += input * input;
            energy_out += output * output;
        }

        assert!(energy_out > energy_in * 0.8);
    }

    #[test]
    fn test_longer_decay_rings_longer() {
        let sample_rate = 48_000.0;
        let mut short = SchroederReverb::new(sample_rate);
        short.set_decay_time(0.3);
        let mut long = SchroederReverb::new(sample_rate);
        long.set_decay_time(4.0);

        let short_tail = tail_energy(&mut short, 24_000, 4_800);
        let long_tail = tail_energy(&mut long, 24_000, 4_800);

        assert!(
            long_tail > short_tail * 10.0,
            "long={long_tail}, short={short_tail}"
        );
    }

    #[test]
    fn test_decay_time_sets_comb_gain() {
        let sample_rate = 48_000.0;
        let mut reverb = SchroederReverb::new(sample_rate);
        reverb.set_decay_time(1.0);

        // after T60 seconds of round trips the comb gain product is 10^-3
        let comb = &reverb.combs[0];
        let delay = comb.delay_samples() as f32 / sample_rate;
        let trips = 1.0 / delay;
        let attenuation = comb.feedback.powf(trips);
        assert!((attenuation - 1e-3).abs() < 1e-4, "attenuation={attenuation}");
    }

    #[test]
    fn test_reverb_stability() {
        let mut reverb = SchroederReverb::new(48_000.0);
        reverb.set_decay_time(30.0);

        for _ in 0..10_000 {
            let out = reverb.process(0.1);
            assert!(out.is_finite(), "Reverb output should be finite");
            assert!(out.abs() < 10.0, "Reverb output unstable: {}", out);
        }
    }
}
