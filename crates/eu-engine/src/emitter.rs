//! Turning timelines into note events.
//!
//! Each generator is scanned over a segment of the current block: every
//! onset and offset whose frame has been reached is consumed in frame order.
//! A generator holds at most one note; an onset that arrives while a note is
//! still held is consumed without sounding.

use eu_ir::MidiMessage;
use heapless::Vec;

use crate::generator::{GeneratorState, SoundingNote};
use crate::sink::CapacityExceeded;

/// Most events one block can carry before later ones are dropped.
pub const PENDING_CAPACITY: usize = 256;

/// A stretch of the current block with a continuously advancing playhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Frame offset of the segment within the block
    pub offset: u32,
    /// Number of frames in the segment (non-zero)
    pub len: u32,
    /// Absolute transport frame at `offset`
    pub start_frame: i64,
}

impl Segment {
    /// Last absolute frame covered by the segment.
    pub fn last_frame(&self) -> i64 {
        self.start_frame + self.len.saturating_sub(1) as i64
    }

    /// Block offset for an event due at `frame`. Late events land on the
    /// segment's first frame.
    pub fn offset_of(&self, frame: i64) -> u32 {
        let into = (frame - self.start_frame).clamp(0, self.len.saturating_sub(1) as i64);
        self.offset + into as u32
    }
}

impl GeneratorState {
    /// Consume every onset and offset due by the end of `segment`, calling
    /// `emit` with the block offset and message of each note that sounds.
    pub fn scan(&mut self, segment: &Segment, mut emit: impl FnMut(u32, MidiMessage)) {
        let Some(config) = self.config().copied() else {
            return;
        };
        let horizon = segment.last_frame();

        loop {
            let onset = self.timeline.onset(self.onset_cursor);
            let offset = self.timeline.offset(self.offset_cursor);

            // An offset belonging to an already consumed onset goes first on ties.
            if self.offset_cursor < self.onset_cursor && offset <= onset {
                if offset > horizon {
                    break;
                }
                if let Some(held) = self.sounding.take() {
                    emit(
                        segment.offset_of(offset),
                        MidiMessage::NoteOff { channel: held.channel, note: held.note },
                    );
                }
                self.offset_cursor += 1;
            } else {
                if onset > horizon {
                    break;
                }
                if self.sounding.is_none() {
                    emit(
                        segment.offset_of(onset),
                        MidiMessage::NoteOn {
                            channel: config.channel,
                            note: config.note,
                            velocity: config.velocity,
                        },
                    );
                    self.sounding = Some(SoundingNote { channel: config.channel, note: config.note });
                }
                self.onset_cursor += 1;
            }
        }
    }
}

/// A note event waiting to be written to the block's output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingEvent {
    pub offset: u32,
    pub generator: u8,
    seq: u16,
    pub message: MidiMessage,
}

/// The block's events, ordered by offset then generator index before
/// they are written out.
#[derive(Clone, Debug, Default)]
pub struct PendingEvents {
    events: Vec<PendingEvent, PENDING_CAPACITY>,
    next_seq: u16,
}

impl PendingEvents {
    pub fn new() -> Self {
        Self { events: Vec::new(), next_seq: 0 }
    }

    pub fn push(&mut self, offset: u32, generator: u8, message: MidiMessage) -> Result<(), CapacityExceeded> {
        let event = PendingEvent { offset, generator, seq: self.next_seq, message };
        self.events.push(event).map_err(|_| CapacityExceeded)?;
        self.next_seq = self.next_seq.wrapping_add(1);
        Ok(())
    }

    /// Sort into output order: frame offset, then generator index, then
    /// the order events were produced in.
    pub fn sort(&mut self) {
        self.events.sort_unstable_by_key(|e| (e.offset, e.generator, e.seq));
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.next_seq = 0;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
