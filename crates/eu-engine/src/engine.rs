//! The per-block scheduling pipeline.

use core::fmt;

use eu_ir::{saturates, ConfigError, GeneratorConfig, MidiMessage, PatternError, GENERATORS};
use heapless::Vec;

use crate::emitter::{PendingEvents, Segment};
use crate::generator::{GeneratorState, Resync};
use crate::sink::EventSink;
use crate::transport::{TransportState, TransportUpdate};

/// Most diagnostics a single block reports; later ones are only logged.
pub const MAX_DIAGNOSTICS: usize = 16;

/// A transport update delivered `offset` frames into the block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransportEvent {
    pub offset: u32,
    pub update: TransportUpdate,
}

/// Everything the host hands over for one processing block.
#[derive(Clone, Copy, Debug)]
pub struct Cycle<'a> {
    /// Frames in the block
    pub frames: u32,
    /// Current configuration of every generator
    pub configs: &'a [GeneratorConfig; GENERATORS],
    /// Transport updates, in offset order
    pub transport: &'a [TransportEvent],
}

/// A non-fatal condition raised while processing a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Zero beats: the generator is silent
    InvalidBeats { generator: usize },
    /// Too many beats for a pattern: the generator is silent
    TooManyBeats { generator: usize, beats: u16 },
    /// Zero bars per cycle: the generator is silent
    InvalidBarsPerCycle { generator: usize },
    /// More onsets than beats: every beat fires
    OnsetsExceedBeats { generator: usize, onsets: u16, beats: u16 },
    /// An event was dropped because the output was full
    CapacityExceeded { generator: usize },
    /// Timelines are stale but tempo, meter or frame rate is unusable
    TransportNotReady,
}

impl Diagnostic {
    fn from_config_error(generator: usize, err: ConfigError) -> Self {
        match err {
            ConfigError::Pattern(PatternError::InvalidBeats) => Diagnostic::InvalidBeats { generator },
            ConfigError::Pattern(PatternError::TooManyBeats { beats }) => {
                Diagnostic::TooManyBeats { generator, beats }
            }
            ConfigError::InvalidBarsPerCycle => Diagnostic::InvalidBarsPerCycle { generator },
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvalidBeats { generator } => {
                write!(f, "generator {}: number of beats can't be zero", generator)
            }
            Diagnostic::TooManyBeats { generator, beats } => {
                write!(f, "generator {}: {} beats is too many", generator, beats)
            }
            Diagnostic::InvalidBarsPerCycle { generator } => {
                write!(f, "generator {}: a cycle must span at least one bar", generator)
            }
            Diagnostic::OnsetsExceedBeats { generator, onsets, beats } => write!(
                f,
                "generator {}: {} onsets can't fit in {} beats",
                generator, onsets, beats
            ),
            Diagnostic::CapacityExceeded { generator } => {
                write!(f, "generator {}: event dropped, output full", generator)
            }
            Diagnostic::TransportNotReady => write!(f, "transport has no usable tempo yet"),
        }
    }
}

/// Outcome of one processing block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Events written to the sink
    pub emitted: u32,
    /// Events dropped for lack of capacity
    pub dropped: u32,
    pub diagnostics: Vec<Diagnostic, MAX_DIAGNOSTICS>,
}

impl CycleReport {
    fn push(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.contains(&diagnostic) {
            return;
        }
        if let Err(overflow) = self.diagnostics.push(diagnostic) {
            log::warn!("diagnostic list full, not reported: {}", overflow);
        }
    }

    /// No diagnostics and nothing dropped.
    pub fn is_clean(&self) -> bool {
        self.dropped == 0 && self.diagnostics.is_empty()
    }
}

/// The scheduling engine: one shared transport and a fixed bank of
/// generators writing to one output.
///
/// `process` runs the whole pipeline once per block and never allocates.
pub struct Engine {
    transport: TransportState,
    generators: [GeneratorState; GENERATORS],
    pending: PendingEvents,
}

impl Engine {
    /// Create an engine at stream start.
    pub fn new(frames_per_second: f32) -> Self {
        Self {
            transport: TransportState::new(frames_per_second),
            generators: core::array::from_fn(|_| GeneratorState::new()),
            pending: PendingEvents::new(),
        }
    }

    /// Initial configuration of a fresh instance: only the first generator
    /// is enabled.
    pub fn default_configs() -> [GeneratorConfig; GENERATORS] {
        core::array::from_fn(|i| GeneratorConfig { enabled: i == 0, ..GeneratorConfig::default() })
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    pub fn generator(&self, index: usize) -> Option<&GeneratorState> {
        self.generators.get(index)
    }

    pub fn generators(&self) -> &[GeneratorState] {
        &self.generators
    }

    /// Restart the stream: no bar observed, every cursor and reference
    /// frame back at zero. Notes held at the reset are released at offset 0
    /// of the next block.
    pub fn reset(&mut self) {
        self.transport = TransportState::new(self.transport.frames_per_second);
        self.pending.clear();
        for (index, generator) in self.generators.iter_mut().enumerate() {
            if let Some(held) = generator.release() {
                let note_off = MidiMessage::NoteOff { channel: held.channel, note: held.note };
                // At most one held note per generator, far below the capacity.
                if self.pending.push(0, index as u8, note_off).is_err() {
                    log::warn!("generator {}: note-off lost on reset", index);
                }
            }
            generator.reset();
        }
    }

    /// Process one block: sync configurations, then for each stretch between
    /// transport updates apply the update, refresh stale timelines and emit
    /// due notes. Events reach `sink` in offset order, ties broken by
    /// generator index.
    pub fn process<S: EventSink>(&mut self, cycle: &Cycle<'_>, sink: &mut S) -> CycleReport {
        #[cfg(all(feature = "alloc_check", debug_assertions))]
        {
            assert_no_alloc::assert_no_alloc(|| self.run(cycle, sink))
        }
        #[cfg(not(all(feature = "alloc_check", debug_assertions)))]
        {
            self.run(cycle, sink)
        }
    }

    fn run<S: EventSink>(&mut self, cycle: &Cycle<'_>, sink: &mut S) -> CycleReport {
        // Pending may already hold note-offs queued by `reset`.
        let mut report = CycleReport::default();

        self.sync_configs(cycle.configs, &mut report);
        self.refresh_timelines();

        let mut cursor = 0;
        for event in cycle.transport {
            let offset = event.offset.clamp(cursor, cycle.frames);
            self.emit_segment(cursor, offset - cursor, &mut report);
            self.apply_transport(&event.update, offset, &mut report);
            cursor = offset;
        }
        self.emit_segment(cursor, cycle.frames - cursor, &mut report);

        if self.generators.iter().any(|g| g.is_active() && g.is_dirty()) {
            log::debug!("timelines stale until the transport reports a usable tempo");
            report.push(Diagnostic::TransportNotReady);
        }

        self.flush(sink, &mut report);
        report
    }

    fn sync_configs(&mut self, configs: &[GeneratorConfig; GENERATORS], report: &mut CycleReport) {
        for (index, (generator, config)) in self.generators.iter_mut().zip(configs).enumerate() {
            match generator.sync(config) {
                Resync::Failed(err) => {
                    log::warn!("generator {} silenced: {}", index, err);
                    report.push(Diagnostic::from_config_error(index, err));
                }
                Resync::Regenerated if saturates(config.onsets, config.beats) => {
                    report.push(Diagnostic::OnsetsExceedBeats {
                        generator: index,
                        onsets: config.onsets,
                        beats: config.beats,
                    });
                }
                _ => {}
            }

            if !generator.is_active() {
                if let Some(held) = generator.release() {
                    let note_off = MidiMessage::NoteOff { channel: held.channel, note: held.note };
                    queue(&mut self.pending, report, 0, index, note_off);
                }
            }
        }
    }

    fn apply_transport(&mut self, update: &TransportUpdate, offset: u32, report: &mut CycleReport) {
        let change = self.transport.apply(update);
        if change.is_empty() {
            return;
        }

        for (index, generator) in self.generators.iter_mut().enumerate() {
            if change.geometry {
                generator.mark_dirty();
            }
            if let Some(start) = change.bar {
                generator.on_bar(start);
            }
            if change.stopped {
                if let Some(held) = generator.release() {
                    let note_off = MidiMessage::NoteOff { channel: held.channel, note: held.note };
                    queue(&mut self.pending, report, offset, index, note_off);
                }
            }
        }

        self.refresh_timelines();
    }

    /// Recompute stale timelines. Generators stay dirty while the transport
    /// has no usable geometry and are skipped when scanning.
    fn refresh_timelines(&mut self) {
        let geometry = self.transport.geometry();
        let now = self.transport.last_known_frame;
        for generator in &mut self.generators {
            generator.refresh(geometry, now);
        }
    }

    fn emit_segment(&mut self, offset: u32, len: u32, report: &mut CycleReport) {
        if len == 0 || !self.transport.is_rolling() {
            return;
        }
        let segment = Segment { offset, len, start_frame: self.transport.last_known_frame };

        let pending = &mut self.pending;
        for (index, generator) in self.generators.iter_mut().enumerate() {
            if !generator.is_active() || generator.is_dirty() {
                continue;
            }
            generator.scan(&segment, |at, message| queue(pending, report, at, index, message));
        }

        self.transport.advance(len);
    }

    fn flush<S: EventSink>(&mut self, sink: &mut S, report: &mut CycleReport) {
        self.pending.sort();
        for event in self.pending.iter() {
            match sink.append(event.offset, event.message.to_bytes()) {
                Ok(()) => report.emitted += 1,
                Err(err) => {
                    log::warn!("generator {}: {}", event.generator, err);
                    report.dropped += 1;
                    report.push(Diagnostic::CapacityExceeded { generator: event.generator as usize });
                }
            }
        }
        self.pending.clear();
    }
}

fn queue(pending: &mut PendingEvents, report: &mut CycleReport, offset: u32, generator: usize, message: MidiMessage) {
    if pending.push(offset, generator as u8, message).is_err() {
        log::warn!("generator {}: too many events this block, dropping one", generator);
        report.dropped += 1;
        report.push(Diagnostic::CapacityExceeded { generator });
    }
}
