//! Euclidean rhythm generators scheduled as sample-accurate note events.
//!
//! Re-exports the pattern types from `eu-ir` and the scheduling engine from
//! `eu-engine`, and provides [`OfflineHost`] for rendering rhythms against
//! a simulated transport without a plugin host.

mod offline;

pub use eu_engine::{
    BarStart, CapacityExceeded, Cycle, CycleReport, Diagnostic, Engine, EventSink, Geometry,
    GeneratorState, GeneratorStatus, MidiBuffer, SoundingNote, TimedMidi, Timeline,
    TransportEvent, TransportState, TransportUpdate, EVENT_BYTES,
};
pub use eu_ir::{
    generate, saturates, ConfigError, GeneratorConfig, MidiMessage, OnsetPattern, ParamId,
    PatternError, GENERATORS, MAX_BEATS, PARAMETERS_PER_GENERATOR,
};

pub use offline::{OfflineHost, RenderedEvent, Rendering};
