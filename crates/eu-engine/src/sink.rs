//! Output sinks for timestamped note events.

use alloc::vec::Vec;
use core::fmt;

use eu_ir::MidiMessage;

/// Bytes one event occupies in a [`MidiBuffer`]: a `u32` frame offset and
/// three message bytes, padded to 8.
pub const EVENT_BYTES: usize = 8;

/// The sink has no room left for another whole event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityExceeded;

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output sequence capacity exceeded")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CapacityExceeded {}

/// Destination for the block's note events.
pub trait EventSink {
    /// Append one 3-byte message at `frame_offset` frames into the block.
    /// Must either write the whole event or nothing.
    fn append(&mut self, frame_offset: u32, bytes: [u8; 3]) -> Result<(), CapacityExceeded>;
}

/// A message timestamped relative to the start of the block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedMidi {
    pub frame_offset: u32,
    pub bytes: [u8; 3],
}

impl TimedMidi {
    pub fn message(&self) -> Option<MidiMessage> {
        MidiMessage::from_bytes(self.bytes)
    }
}

/// An output sequence with a fixed byte capacity, cleared by the host at
/// the start of every block. All storage is reserved up front.
#[derive(Clone, Debug)]
pub struct MidiBuffer {
    events: Vec<TimedMidi>,
    capacity_bytes: usize,
}

impl MidiBuffer {
    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity_bytes / EVENT_BYTES),
            capacity_bytes,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[TimedMidi] {
        &self.events
    }

    pub fn used_bytes(&self) -> usize {
        self.events.len() * EVENT_BYTES
    }

    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }
}

impl EventSink for MidiBuffer {
    fn append(&mut self, frame_offset: u32, bytes: [u8; 3]) -> Result<(), CapacityExceeded> {
        if self.used_bytes() + EVENT_BYTES > self.capacity_bytes {
            return Err(CapacityExceeded);
        }
        self.events.push(TimedMidi { frame_offset, bytes });
        Ok(())
    }
}
