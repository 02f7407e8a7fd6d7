use tracing::debug;

use crate::{engine::handle::ConductorHandle, error::SendError, io::midi::MidiEvent};

/// Convert a MIDI note number to Hz (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0f32.powf((f32::from(note) - 69.0) / 12.0)
}

/// A note message after normalization. A note-on never has velocity 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteCommand {
    On { note: u8, velocity: u8 },
    Off { note: u8 },
}

/// Anything that accepts note commands: the conductor itself, or its handle
/// from another thread.
pub trait NoteSink {
    type Error;

    fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), Self::Error>;

    fn note_off(&mut self, note: u8) -> Result<(), Self::Error>;

    fn send_command(&mut self, command: NoteCommand) -> Result<(), Self::Error> {
        match command {
            NoteCommand::On { note, velocity } => self.note_on(note, velocity),
            NoteCommand::Off { note } => self.note_off(note),
        }
    }
}

impl NoteSink for ConductorHandle {
    type Error = SendError;

    fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), Self::Error> {
        ConductorHandle::note_on(self, note, velocity)
    }

    fn note_off(&mut self, note: u8) -> Result<(), Self::Error> {
        ConductorHandle::note_off(self, note)
    }
}

/// Turns raw MIDI into note commands, optionally listening to one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MidiRouter {
    channel: Option<u8>,
}

impl MidiRouter {
    /// Accept every channel.
    pub fn omni() -> Self {
        Self::default()
    }

    /// Accept only `channel` (0-based).
    pub fn on_channel(channel: u8) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    /// Note-on with velocity 0 becomes a note-off. Anything that is not a note
    /// message, or arrives on another channel, is dropped.
    pub fn translate(&self, event: MidiEvent) -> Option<NoteCommand> {
        if self.channel.is_some_and(|c| c != event.channel()) {
            return None;
        }

        match event {
            MidiEvent::NoteOn { note, velocity, .. } if note < 128 => Some(if velocity == 0 {
                NoteCommand::Off { note }
            } else {
                NoteCommand::On {
                    note,
                    velocity: velocity.min(127),
                }
            }),
            MidiEvent::NoteOff { note, .. } if note < 128 => Some(NoteCommand::Off { note }),
            _ => None,
        }
    }

    /// Translate and forward. Returns whether a command reached the sink.
    pub fn dispatch<S: NoteSink>(&self, event: MidiEvent, sink: &mut S) -> Result<bool, S::Error> {
        match self.translate(event) {
            Some(command) => sink.send_command(command).map(|()| true),
            None => Ok(false),
        }
    }

    /// Decode raw bytes, then [`dispatch`](Self::dispatch). Malformed input is
    /// logged and skipped.
    pub fn dispatch_bytes<S: NoteSink>(&self, bytes: &[u8], sink: &mut S) -> Result<bool, S::Error> {
        match MidiEvent::from_bytes(bytes) {
            Ok(Some(event)) => self.dispatch(event, sink),
            Ok(None) => Ok(false),
            Err(err) => {
                debug!(?bytes, %err, "undecodable MIDI message skipped");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<NoteCommand>);

    impl NoteSink for Recorder {
        type Error = std::convert::Infallible;

        fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), Self::Error> {
            self.0.push(NoteCommand::On { note, velocity });
            Ok(())
        }

        fn note_off(&mut self, note: u8) -> Result<(), Self::Error> {
            self.0.push(NoteCommand::Off { note });
            Ok(())
        }
    }

    #[test]
    fn test_midi_note_to_freq() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((midi_note_to_freq(57) - 220.0).abs() < 1e-3);
        assert!((midi_note_to_freq(60) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        let router = MidiRouter::omni();
        let event = MidiEvent::NoteOn {
            channel: 0,
            note: 60,
            velocity: 0,
        };
        assert_eq!(router.translate(event), Some(NoteCommand::Off { note: 60 }));
    }

    #[test]
    fn test_channel_filter() {
        let router = MidiRouter::on_channel(2);
        let on = |channel| MidiEvent::NoteOn {
            channel,
            note: 64,
            velocity: 80,
        };
        assert_eq!(router.translate(on(0)), None);
        assert_eq!(
            router.translate(on(2)),
            Some(NoteCommand::On {
                note: 64,
                velocity: 80
            })
        );
    }

    #[test]
    fn test_non_note_messages_ignored() {
        let router = MidiRouter::omni();
        let mut sink = Recorder::default();
        let cc = MidiEvent::ControlChange {
            channel: 0,
            controller: 7,
            value: 100,
        };
        assert_eq!(router.dispatch(cc, &mut sink), Ok(false));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_dispatch_bytes() {
        let router = MidiRouter::omni();
        let mut sink = Recorder::default();

        assert_eq!(router.dispatch_bytes(&[0x90, 60, 100], &mut sink), Ok(true));
        assert_eq!(router.dispatch_bytes(&[0x90, 60, 0], &mut sink), Ok(true));
        assert_eq!(router.dispatch_bytes(&[0x90], &mut sink), Ok(false));
        assert_eq!(router.dispatch_bytes(&[0xF8], &mut sink), Ok(false));

        assert_eq!(
            sink.0,
            [
                NoteCommand::On {
                    note: 60,
                    velocity: 100
                },
                NoteCommand::Off { note: 60 },
            ]
        );
    }
}
