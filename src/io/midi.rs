use wmidi::{FromBytesError, MidiMessage};

/// The channel-voice messages the engine understands. Channels are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Centered on 0, range -8192..=8191.
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one raw MIDI message.
    ///
    /// Well-formed messages the engine has no use for (clock, sysex,
    /// aftertouch) decode to `Ok(None)`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Option<Self>, FromBytesError> {
        let message = MidiMessage::try_from(bytes)?;
        Ok(Self::from_message(&message))
    }

    pub fn from_message(message: &MidiMessage<'_>) -> Option<Self> {
        let event = match *message {
            MidiMessage::NoteOn(channel, note, velocity) => Self::NoteOn {
                channel: channel.index(),
                note: u8::from(note),
                velocity: u8::from(velocity),
            },
            MidiMessage::NoteOff(channel, note, velocity) => Self::NoteOff {
                channel: channel.index(),
                note: u8::from(note),
                velocity: u8::from(velocity),
            },
            MidiMessage::ControlChange(channel, function, value) => Self::ControlChange {
                channel: channel.index(),
                controller: u8::from(function.0),
                value: u8::from(value),
            },
            MidiMessage::PitchBendChange(channel, bend) => Self::PitchBend {
                channel: channel.index(),
                value: u16::from(bend) as i16 - 8192,
            },
            MidiMessage::ProgramChange(channel, program) => Self::ProgramChange {
                channel: channel.index(),
                program: u8::from(program),
            },
            _ => return None,
        };
        Some(event)
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::PitchBend { channel, .. }
            | Self::ProgramChange { channel, .. } => channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_note_messages() {
        assert_eq!(
            MidiEvent::from_bytes(&[0x90, 60, 100]),
            Ok(Some(MidiEvent::NoteOn {
                channel: 0,
                note: 60,
                velocity: 100
            }))
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0x83, 64, 0]),
            Ok(Some(MidiEvent::NoteOff {
                channel: 3,
                note: 64,
                velocity: 0
            }))
        );
    }

    #[test]
    fn test_decode_pitch_bend_is_centered() {
        // 0x2000 (LSB 0x00, MSB 0x40) is the center position
        assert_eq!(
            MidiEvent::from_bytes(&[0xE0, 0x00, 0x40]),
            Ok(Some(MidiEvent::PitchBend {
                channel: 0,
                value: 0
            }))
        );
    }

    #[test]
    fn test_unused_and_malformed_messages() {
        // timing clock
        assert_eq!(MidiEvent::from_bytes(&[0xF8]), Ok(None));
        assert!(MidiEvent::from_bytes(&[]).is_err());
        assert!(MidiEvent::from_bytes(&[0x90, 60]).is_err());
    }
}
