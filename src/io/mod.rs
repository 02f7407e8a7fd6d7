//! External interfaces: raw MIDI in, note commands out.

pub mod midi;
pub mod router;

pub use midi::MidiEvent;
pub use router::{midi_note_to_freq, MidiRouter, NoteCommand, NoteSink};
