use crate::{
    dsp::{envelope::Envelope, oscillator::OscillatorBlock},
    io::router::midi_note_to_freq,
    synth::timbre::Timbre,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Holding a note
    Releasing, // Note let go, release tail still sounding
}

/// One oscillator + envelope pair that plays a single note at a time.
pub struct Voice {
    note: u8,
    state: VoiceState,
    started_at: u64,
    released_at: u64,
    gain: f32,
    frequency: f32,
    sample_rate: f32,
    osc: OscillatorBlock,
    env: Envelope,
}

impl Voice {
    pub fn new(timbre: &Timbre, sample_rate: f32, seed: u64) -> Self {
        Self {
            note: 0,
            state: VoiceState::Free,
            started_at: 0,
            released_at: 0,
            gain: 0.0,
            frequency: 0.0,
            sample_rate,
            osc: OscillatorBlock::with_seed(timbre.waveform, seed),
            env: timbre.envelope.build(sample_rate),
        }
    }

    /// Fresh start. Whatever the voice was playing is discarded.
    pub fn start(&mut self, note: u8, gain: f32, clock: u64) {
        self.note = note;
        self.gain = gain;
        self.frequency = midi_note_to_freq(note);
        self.state = VoiceState::Active;
        self.started_at = clock;

        self.osc.reset();
        self.env.note_on();
    }

    /// Same note struck again. Phase and level carry on.
    pub fn retrigger(&mut self, gain: f32, clock: u64) {
        self.gain = gain;
        self.started_at = clock;
        self.env.retrigger();
    }

    pub fn release(&mut self, clock: u64) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.released_at = clock;
            self.env.note_off();
        }
    }

    pub fn kill(&mut self) {
        self.env.kill();
        self.osc.reset();
        self.state = VoiceState::Free;
        self.gain = 0.0;
    }

    /// Add this voice into `out`. A finished release tail frees the voice.
    pub fn render_add(&mut self, out: &mut [f32]) {
        if self.state == VoiceState::Free {
            return;
        }

        for sample in out.iter_mut() {
            let level = self.env.next_sample();
            *sample += self.osc.next_sample(self.frequency, self.sample_rate) * level * self.gain;
        }

        if self.state == VoiceState::Releasing && !self.env.is_active() {
            self.state = VoiceState::Free;
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    /// Holding a note. Releasing voices are not active.
    pub fn is_active(&self) -> bool {
        self.state == VoiceState::Active
    }

    pub fn is_sounding(&self) -> bool {
        self.state != VoiceState::Free
    }

    /// The note this voice holds, if it is active.
    pub fn held_note(&self) -> Option<u8> {
        self.is_active().then_some(self.note)
    }

    /// Last note assigned, whatever the state.
    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn released_at(&self) -> u64 {
        self.released_at
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }
}
