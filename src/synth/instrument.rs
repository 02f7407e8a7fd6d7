#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    synth::{
        pool::{Allocation, VoiceHandle, VoicePool},
        timbre::Timbre,
    },
};

/// Velocity to gain mapping, shared by every instrument in a patch.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VelocityCurve {
    /// gain = v / 127
    #[default]
    Linear,
    /// gain = (v / 127)², softer response at low velocities
    Squared,
}

impl VelocityCurve {
    #[inline]
    pub fn gain(self, velocity: u8) -> f32 {
        let v = f32::from(velocity.min(127)) / 127.0;
        match self {
            Self::Linear => v,
            Self::Squared => v * v,
        }
    }
}

/// One polyphonic timbre: a voice pool plus its output level.
pub struct Instrument {
    id: String,
    timbre: Timbre,
    curve: VelocityCurve,
    pool: VoicePool,
}

impl Instrument {
    pub fn new(
        id: impl Into<String>,
        timbre: Timbre,
        voice_count: usize,
        curve: VelocityCurve,
        sample_rate: f32,
    ) -> Result<Self, ConfigError> {
        let id = id.into();
        let pool = VoicePool::new(&id, voice_count, &timbre, sample_rate)?;

        Ok(Self {
            id,
            timbre,
            curve,
            pool,
        })
    }

    /// Velocity 0 is a note-off and returns `None`.
    pub fn note_on(&mut self, note: u8, velocity: u8, route_gain: f32) -> Option<Allocation> {
        if velocity == 0 {
            self.note_off(note);
            return None;
        }

        let gain = self.curve.gain(velocity) * route_gain;
        Some(self.pool.allocate(note, gain))
    }

    pub fn note_off(&mut self, note: u8) -> Option<VoiceHandle> {
        self.pool.release(note)
    }

    pub fn all_notes_off(&mut self) {
        self.pool.release_all();
    }

    pub fn kill_all(&mut self) {
        self.pool.kill_all();
    }

    /// Overwrite `out` with this instrument's output. Silent when idle.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        self.pool.render_add(out);

        if self.timbre.gain != 1.0 {
            for sample in out.iter_mut() {
                *sample *= self.timbre.gain;
            }
        }
    }

    /// The same output as [`render`](Self::render), one sample at a time, forever.
    pub fn samples(&mut self) -> impl Iterator<Item = f32> + '_ {
        std::iter::from_fn(move || {
            let mut frame = [0.0f32; 1];
            self.render(&mut frame);
            Some(frame[0])
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timbre(&self) -> &Timbre {
        &self.timbre
    }

    pub fn velocity_curve(&self) -> VelocityCurve {
        self.curve
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn holds(&self, note: u8) -> bool {
        self.pool.holds(note)
    }

    pub fn is_sounding(&self) -> bool {
        self.pool.sounding_count() > 0
    }
}
