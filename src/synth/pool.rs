//! Fixed-size voice allocation with oldest-first stealing.

/*
Allocation order for `allocate(note)`:

  1. RETRIGGER  a voice already holds `note` → same slot, start time refreshed
  2. ASSIGN     a Free voice, or failing that the Releasing voice whose release
                began longest ago (its tail is cut)
  3. STEAL      every voice is Active → the one with the lowest start time

  clock ──► 1      2      3      4
            60     64     67
  cap 2:   [60]  [60,64] [67,64]   60 was oldest, stolen for 67

The clock is a per-pool counter bumped on every allocate/release, so start
times are totally ordered even when several notes land in the same frame.
Nothing is allocated after construction and every operation is a single
linear scan over the slots.
*/

use crate::{
    error::ConfigError,
    synth::{
        timbre::Timbre,
        voice::{Voice, VoiceState},
    },
};

/// Index of a voice slot within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle(usize);

impl VoiceHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationOutcome {
    Assigned,
    Retriggered,
    Stolen { previous_note: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub handle: VoiceHandle,
    pub outcome: AllocationOutcome,
}

pub struct VoicePool {
    voices: Vec<Voice>,
    clock: u64,
}

impl VoicePool {
    pub fn new(
        instrument: &str,
        capacity: usize,
        timbre: &Timbre,
        sample_rate: f32,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroVoices {
                instrument: instrument.to_owned(),
            });
        }
        timbre.validate(instrument)?;

        let voices = (0..capacity)
            .map(|i| Voice::new(timbre, sample_rate, voice_seed(i)))
            .collect();

        Ok(Self { voices, clock: 0 })
    }

    pub fn allocate(&mut self, note: u8, gain: f32) -> Allocation {
        let now = self.tick();

        if let Some(index) = self.active_index(note) {
            self.voices[index].retrigger(gain, now);
            return Allocation {
                handle: VoiceHandle(index),
                outcome: AllocationOutcome::Retriggered,
            };
        }

        if let Some(index) = self.idle_index() {
            self.voices[index].start(note, gain, now);
            return Allocation {
                handle: VoiceHandle(index),
                outcome: AllocationOutcome::Assigned,
            };
        }

        // No idle voice means every slot is Active; capacity >= 1 was checked.
        let index = self
            .voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.started_at())
            .map_or(0, |(i, _)| i);
        let previous_note = self.voices[index].note();
        self.voices[index].start(note, gain, now);

        Allocation {
            handle: VoiceHandle(index),
            outcome: AllocationOutcome::Stolen { previous_note },
        }
    }

    /// Start the release of the voice holding `note`. Unheld notes are ignored.
    pub fn release(&mut self, note: u8) -> Option<VoiceHandle> {
        let index = self.active_index(note)?;
        let now = self.tick();
        self.voices[index].release(now);
        Some(VoiceHandle(index))
    }

    /// Release every held note.
    pub fn release_all(&mut self) {
        let now = self.tick();
        for voice in &mut self.voices {
            voice.release(now);
        }
    }

    pub fn kill_all(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
    }

    pub fn render_add(&mut self, out: &mut [f32]) {
        for voice in &mut self.voices {
            voice.render_add(out);
        }
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn sounding_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_sounding()).count()
    }

    pub fn holds(&self, note: u8) -> bool {
        self.active_index(note).is_some()
    }

    pub fn handle_for(&self, note: u8) -> Option<VoiceHandle> {
        self.active_index(note).map(VoiceHandle)
    }

    pub fn voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        self.voices.get(handle.0)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    /// Notes currently held, in slot order.
    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices.iter().filter_map(Voice::held_note)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn active_index(&self, note: u8) -> Option<usize> {
        self.voices.iter().position(|v| v.held_note() == Some(note))
    }

    fn idle_index(&self) -> Option<usize> {
        if let Some(index) = self.voices.iter().position(Voice::is_free) {
            return Some(index);
        }

        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by_key(|(_, v)| v.released_at())
            .map(|(i, _)| i)
    }
}

fn voice_seed(index: usize) -> u64 {
    0x5eed_u64 ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
