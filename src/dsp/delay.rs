//! Circular delay line and a three-tap echo built on it.

/// Fixed-capacity circular buffer. Allocated once at construction.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(1) + 1],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Sample written `delay_samples` pushes ago (1 = most recent).
    #[inline]
    pub fn tap(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1, len - 1);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Write then read, so a delay of 0 passes the input straight through.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        if delay_samples == 0 {
            self.push(sample);
            return sample;
        }
        let delayed = self.tap(delay_samples);
        self.push(sample);
        delayed
    }

    pub fn render(&mut self, buffer: &mut [f32], delay_samples: usize) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay_samples);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/*
Multi-tap echo
--------------

    input ──(+)──► [ line ] ──┬── tap 1·t  × 0.6 ──┐
             ▲                ├── tap 2·t  × 0.4 ──┼──► wet
             │                └── tap 3·t  × 0.2 ──┘
             └──── feedback × tap 3·t ◄────┘

Three evenly spaced echoes that fade out, with the last tap fed back so a
nonzero feedback keeps the pattern repeating. Output is wet only; the dry
blend happens in the dry/wet stage that follows it in the patch.
*/

const TAPS: [(f32, f32); 3] = [(1.0, 0.6), (2.0, 0.4), (3.0, 0.2)];

pub struct MultiTapDelay {
    line: DelayLine,
    sample_rate: f32,
}

impl MultiTapDelay {
    /// Longest supported base time in seconds.
    pub const MAX_TIME: f32 = 1.0;
    pub const MAX_FEEDBACK: f32 = 0.95;

    pub fn new(sample_rate: f32) -> Self {
        let longest = TAPS[TAPS.len() - 1].0 * Self::MAX_TIME;
        Self {
            line: DelayLine::new((longest * sample_rate).ceil() as usize),
            sample_rate,
        }
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32, time: f32, feedback: f32) -> f32 {
        let base = (time.clamp(0.0, Self::MAX_TIME) * self.sample_rate).round().max(1.0);

        let mut wet = 0.0;
        let mut last = 0.0;
        for &(multiple, gain) in &TAPS {
            last = self.line.tap((base * multiple) as usize);
            wet += last * gain;
        }

        self.line.push(input + last * feedback.clamp(0.0, Self::MAX_FEEDBACK));
        wet
    }

    pub fn render(&mut self, buffer: &mut [f32], time: f32, feedback: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, time, feedback);
        }
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}
