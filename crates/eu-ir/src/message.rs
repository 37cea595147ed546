//! Three-byte channel voice messages.

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;

/// A note message emitted by a generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
}

impl MidiMessage {
    /// Encode as `status | channel, note, velocity` (velocity 0 for note-off).
    pub const fn to_bytes(self) -> [u8; 3] {
        match self {
            MidiMessage::NoteOn { channel, note, velocity } => {
                [NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOff { channel, note } => [NOTE_OFF | (channel & 0x0F), note & 0x7F, 0],
        }
    }

    /// Decode a note message. Anything other than note-on/note-off is `None`.
    pub const fn from_bytes(bytes: [u8; 3]) -> Option<Self> {
        let channel = bytes[0] & 0x0F;
        let note = bytes[1];
        match bytes[0] & 0xF0 {
            NOTE_ON => Some(MidiMessage::NoteOn { channel, note, velocity: bytes[2] }),
            NOTE_OFF => Some(MidiMessage::NoteOff { channel, note }),
            _ => None,
        }
    }

    pub const fn note(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { note, .. } | MidiMessage::NoteOff { note, .. } => *note,
        }
    }

    pub const fn is_note_on(&self) -> bool {
        matches!(self, MidiMessage::NoteOn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_bytes() {
        let msg = MidiMessage::NoteOn { channel: 9, note: 36, velocity: 100 };
        assert_eq!(msg.to_bytes(), [0x99, 36, 100]);
    }

    #[test]
    fn note_off_has_zero_velocity() {
        let msg = MidiMessage::NoteOff { channel: 0, note: 60 };
        assert_eq!(msg.to_bytes(), [0x80, 60, 0]);
    }

    #[test]
    fn decodes_what_it_encodes() {
        let on = MidiMessage::NoteOn { channel: 3, note: 64, velocity: 1 };
        assert_eq!(MidiMessage::from_bytes(on.to_bytes()), Some(on));
        let off = MidiMessage::NoteOff { channel: 15, note: 127 };
        assert_eq!(MidiMessage::from_bytes(off.to_bytes()), Some(off));
    }

    #[test]
    fn other_statuses_are_ignored() {
        assert_eq!(MidiMessage::from_bytes([0xB0, 7, 100]), None);
    }
}
