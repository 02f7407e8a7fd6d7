use crate::MIN_TIME;

/*
Voice Amplitude Envelope
========================

A linear ADSR that gates each voice. Layered patches mostly want a near-
rectangular gate (instant start, instant stop), but a literal rectangle clicks,
so every timbre carries a short envelope and the defaults keep it tight.

  Level
    1.0 ┐   ╱╲
        │  ╱  ╲________
    S   │ ╱            ╲
    0.0 └╱──────────────╲──→ Time
         A   D    S      R

Gate events
-----------

  note_on     Fresh start. Level snaps to 0 and attack begins. Used when a
              voice is newly assigned (including after a steal, where the old
              sound must be discarded immediately).

  retrigger   The same note struck again while it is still held. Attack
              resumes from the CURRENT level so the repeated note does not
              click down to zero first.

  note_off    Release from wherever the envelope is. The release ramp is
              snapshotted (start level, sample count) so it lands on exactly 0.

  kill        Hard stop. Level 0, Idle. Used on engine stop.

Increments are derived from the stored sample rate:

    increment = change / (seconds * sample_rate)
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    sample_rate: f32,
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeStage,
    level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    /// Times in seconds, sustain in [0, 1].
    pub fn adsr(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            sample_rate,
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),

            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed_samples = 0;
    }

    pub fn retrigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed_samples = 0;
    }

    pub fn note_off(&mut self) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * self.sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    pub fn kill(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_start_level = 0.0;
        self.release_elapsed_samples = 0;
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.level += 1.0 / (self.attack_time * self.sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let drop = 1.0 - self.sustain_level;
                self.level -= drop / (self.decay_time * self.sample_rate);
                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeStage::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);
                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
