//! Scheduling engine for euclid.
//!
//! Tracks the host transport, lays each generator's pattern out on the
//! frame timeline and emits note events for every processing block.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod emitter;
mod engine;
mod generator;
mod sink;
mod timeline;
mod transport;

pub use emitter::{PendingEvent, PendingEvents, Segment, PENDING_CAPACITY};
pub use engine::{Cycle, CycleReport, Diagnostic, Engine, TransportEvent, MAX_DIAGNOSTICS};
pub use generator::{GeneratorState, GeneratorStatus, Resync, SoundingNote};
pub use sink::{CapacityExceeded, EventSink, MidiBuffer, TimedMidi, EVENT_BYTES};
pub use timeline::{Timeline, SENTINEL};
pub use transport::{BarStart, Geometry, TransportChange, TransportState, TransportUpdate, MAX_FRAMES_PER_BAR};
