//! Offline rendering against a simulated host transport.

use eu_engine::{Cycle, CycleReport, Diagnostic, Engine, Geometry, MidiBuffer, TransportEvent, TransportUpdate};
use eu_ir::{GeneratorConfig, MidiMessage, GENERATORS};

const DEFAULT_OUTPUT_BYTES: usize = 4096;

/// A note event at an absolute transport frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedEvent {
    pub frame: i64,
    pub message: MidiMessage,
}

/// Everything produced by a run of blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendering {
    pub events: Vec<RenderedEvent>,
    /// Diagnostics in the order they were first reported
    pub diagnostics: Vec<Diagnostic>,
    pub dropped: u32,
}

impl Rendering {
    fn absorb(&mut self, report: CycleReport) {
        self.dropped += report.dropped;
        for diagnostic in report.diagnostics {
            if !self.diagnostics.contains(&diagnostic) {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    /// Events of one MIDI note number.
    pub fn note_events(&self, note: u8) -> impl Iterator<Item = &RenderedEvent> {
        self.events.iter().filter(move |e| e.message.note() == note)
    }

    /// Frames of every note-on, in output order.
    pub fn note_on_frames(&self) -> Vec<i64> {
        self.events.iter().filter(|e| e.message.is_note_on()).map(|e| e.frame).collect()
    }
}

/// Drives an [`Engine`] the way a plugin host would: fixed-size blocks,
/// a position report at the start of each block and another wherever a
/// bar begins inside one.
pub struct OfflineHost {
    engine: Engine,
    configs: [GeneratorConfig; GENERATORS],
    output: MidiBuffer,
    frames_per_second: f32,
    beats_per_minute: f32,
    beats_per_bar: f32,
    block_size: u32,
    rolling: bool,
    frame: i64,
    bar: i64,
    bar_start: i64,
}

impl OfflineHost {
    /// A rolling transport at bar 0, frame 0, with the default configs.
    pub fn new(frames_per_second: f32, beats_per_minute: f32, beats_per_bar: f32, block_size: u32) -> Self {
        Self {
            engine: Engine::new(frames_per_second),
            configs: Engine::default_configs(),
            output: MidiBuffer::with_capacity_bytes(DEFAULT_OUTPUT_BYTES),
            frames_per_second,
            beats_per_minute,
            beats_per_bar,
            block_size: block_size.max(1),
            rolling: true,
            frame: 0,
            bar: 0,
            bar_start: 0,
        }
    }

    /// Limit the per-block output sequence to `bytes`.
    pub fn with_output_capacity(mut self, bytes: usize) -> Self {
        self.output = MidiBuffer::with_capacity_bytes(bytes);
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn configs(&self) -> &[GeneratorConfig; GENERATORS] {
        &self.configs
    }

    pub fn set_config(&mut self, index: usize, config: GeneratorConfig) {
        if let Some(slot) = self.configs.get_mut(index) {
            *slot = config;
        }
    }

    /// Disable every generator.
    pub fn clear_configs(&mut self) {
        for config in &mut self.configs {
            config.enabled = false;
        }
    }

    /// Change tempo from the next block on. The current bar keeps its start
    /// frame.
    pub fn set_tempo(&mut self, beats_per_minute: f32) {
        log::debug!("offline host tempo {} -> {}", self.beats_per_minute, beats_per_minute);
        self.beats_per_minute = beats_per_minute;
    }

    pub fn stop(&mut self) {
        self.rolling = false;
    }

    pub fn start(&mut self) {
        self.rolling = true;
    }

    pub fn frame(&self) -> i64 {
        self.frame
    }

    pub fn bar(&self) -> i64 {
        self.bar
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    fn geometry(&self) -> Option<Geometry> {
        Geometry::new(self.frames_per_second, self.beats_per_minute, self.beats_per_bar)
    }

    fn position(&self, bar: i64, frame: i64) -> TransportUpdate {
        TransportUpdate {
            speed: Some(if self.rolling { 1.0 } else { 0.0 }),
            frames_per_second: Some(self.frames_per_second),
            ..TransportUpdate::position(bar, frame, self.beats_per_minute, self.beats_per_bar)
        }
    }

    /// Transport updates for the block starting at `self.frame`.
    fn block_transport(&mut self) -> Vec<TransportEvent> {
        let block_end = self.frame + self.block_size as i64;
        let frames_per_bar = self.geometry().map(|g| g.frames_per_bar);

        if let Some(frames_per_bar) = frames_per_bar {
            while self.bar_start + frames_per_bar <= self.frame {
                self.bar += 1;
                self.bar_start += frames_per_bar;
            }
        }
        let mut transport = vec![TransportEvent { offset: 0, update: self.position(self.bar, self.frame) }];

        if let (true, Some(frames_per_bar)) = (self.rolling, frames_per_bar) {
            while self.bar_start + frames_per_bar < block_end {
                self.bar += 1;
                self.bar_start += frames_per_bar;
                let offset = (self.bar_start - self.frame) as u32;
                transport.push(TransportEvent {
                    offset,
                    update: TransportUpdate { bar: Some(self.bar), frame: Some(self.bar_start), ..Default::default() },
                });
            }
        }
        transport
    }

    /// Render one block, appending its events to `rendering`.
    pub fn render_block(&mut self, rendering: &mut Rendering) {
        let block_start = self.frame;
        let transport = self.block_transport();

        self.output.clear();
        let cycle = Cycle { frames: self.block_size, configs: &self.configs, transport: &transport };
        let report = self.engine.process(&cycle, &mut self.output);

        rendering.events.extend(self.output.events().iter().filter_map(|event| {
            let message = event.message()?;
            Some(RenderedEvent { frame: block_start + event.frame_offset as i64, message })
        }));
        rendering.absorb(report);

        if self.rolling {
            self.frame += self.block_size as i64;
        }
    }

    pub fn render_blocks(&mut self, blocks: usize) -> Rendering {
        let mut rendering = Rendering::default();
        for _ in 0..blocks {
            self.render_block(&mut rendering);
        }
        rendering
    }

    /// Render whole blocks until the playhead reaches `frame`.
    pub fn render_until(&mut self, frame: i64) -> Rendering {
        let mut rendering = Rendering::default();
        while self.rolling && self.frame < frame {
            self.render_block(&mut rendering);
        }
        rendering
    }

    /// Render whole blocks covering `bars` bars at the current tempo.
    pub fn render_bars(&mut self, bars: u32) -> Rendering {
        match self.geometry() {
            Some(geometry) => self.render_until(self.frame + geometry.frames_per_bar * bars as i64),
            None => Rendering::default(),
        }
    }
}
