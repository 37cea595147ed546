//! Per-generator runtime state.

use eu_ir::{ConfigError, GeneratorConfig, OnsetPattern};

use crate::timeline::Timeline;
use crate::transport::{BarStart, Geometry};

/// The note a generator is currently holding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoundingNote {
    pub channel: u8,
    pub note: u8,
}

/// Where a generator stands after its last configuration change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorStatus {
    /// No configuration seen yet
    Unconfigured,
    Disabled,
    /// Silent until the configuration is corrected
    Invalid(ConfigError),
    Active,
}

/// Result of comparing a configuration against the cached copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resync {
    Unchanged,
    /// Changed, but the pattern and timeline still hold
    Updated,
    /// The pattern was regenerated and the timeline is stale
    Regenerated,
    Failed(ConfigError),
}

/// Derived state of one generator: its pattern, the frame vectors of the
/// current cycle, and the playback cursors into them.
#[derive(Clone, Debug)]
pub struct GeneratorState {
    config: Option<GeneratorConfig>,
    error: Option<ConfigError>,
    pattern: Option<OnsetPattern>,
    pub(crate) timeline: Timeline,
    pub(crate) onset_cursor: usize,
    pub(crate) offset_cursor: usize,
    pub(crate) sounding: Option<SoundingNote>,
    reference_frame: i64,
    dirty: bool,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorState {
    pub fn new() -> Self {
        Self {
            config: None,
            error: None,
            pattern: None,
            timeline: Timeline::new(),
            onset_cursor: 0,
            offset_cursor: 0,
            sounding: None,
            reference_frame: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> Option<&GeneratorConfig> {
        self.config.as_ref()
    }

    pub fn pattern(&self) -> Option<&OnsetPattern> {
        self.pattern.as_ref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn sounding(&self) -> Option<SoundingNote> {
        self.sounding
    }

    pub fn reference_frame(&self) -> i64 {
        self.reference_frame
    }

    pub fn cursors(&self) -> (usize, usize) {
        (self.onset_cursor, self.offset_cursor)
    }

    /// Is the timeline waiting to be recomputed?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn status(&self) -> GeneratorStatus {
        match (self.config, self.error) {
            (None, _) => GeneratorStatus::Unconfigured,
            (Some(config), _) if !config.enabled => GeneratorStatus::Disabled,
            (Some(_), Some(err)) => GeneratorStatus::Invalid(err),
            (Some(_), None) => GeneratorStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == GeneratorStatus::Active
    }

    /// Compare `config` with the cached copy and regenerate the pattern when
    /// a pattern or timeline field changed, or the generator was just enabled.
    pub fn sync(&mut self, config: &GeneratorConfig) -> Resync {
        if self.config.as_ref() == Some(config) {
            return Resync::Unchanged;
        }
        let previous = self.config.replace(*config);
        if !config.enabled {
            return Resync::Updated;
        }

        let regenerate = match previous {
            Some(prev) => !prev.enabled || prev.timeline_changed(config),
            None => true,
        };
        if !regenerate {
            return Resync::Updated;
        }

        log::trace!("regenerating E({}, {}) rotated {}", config.onsets, config.beats, config.rotation);
        match config.pattern() {
            Ok(pattern) => {
                self.pattern = Some(pattern);
                self.error = None;
                self.dirty = true;
                Resync::Regenerated
            }
            Err(err) => {
                self.pattern = None;
                self.error = Some(err);
                self.timeline.clear();
                self.onset_cursor = 0;
                self.offset_cursor = 0;
                self.dirty = false;
                Resync::Failed(err)
            }
        }
    }

    fn bars_per_cycle(&self) -> u16 {
        self.config.map_or(1, |c| c.bars_per_cycle)
    }

    /// A new bar started: if it begins one of this generator's cycles, the
    /// cycle restarts at the bar's frame.
    pub fn on_bar(&mut self, start: BarStart) {
        let bars = self.bars_per_cycle();
        if bars == 0 || start.bar.rem_euclid(bars as i64) != 0 {
            return;
        }
        self.reference_frame = start.frame;
        self.onset_cursor = 0;
        self.offset_cursor = 0;
        self.dirty = true;
    }

    /// Tempo, meter or frame rate changed.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Recompute the timeline if it is stale. Returns `false` when it is
    /// stale but can't be recomputed yet because the transport has no
    /// usable geometry.
    pub fn refresh(&mut self, geometry: Option<Geometry>, now: i64) -> bool {
        if !self.dirty || !self.is_active() {
            return true;
        }
        let (Some(pattern), Some(config)) = (self.pattern, self.config) else {
            return true;
        };
        let Some(geometry) = geometry else {
            return false;
        };

        self.timeline.recompute(&pattern, config.bars_per_cycle, self.reference_frame, geometry);
        self.catch_up(now);
        self.dirty = false;
        true
    }

    /// Reset the cursors, then skip onsets that lie before `now` without
    /// emitting them. While a note is held, the offset cursor stays on the
    /// previous onset's offset so that note is still released.
    pub fn catch_up(&mut self, now: i64) {
        self.onset_cursor = self.timeline.first_onset_from(now);
        self.offset_cursor = if self.sounding.is_some() {
            self.onset_cursor.saturating_sub(1)
        } else {
            self.onset_cursor
        };
    }

    /// Forget the held note, returning it so the caller can send its note-off.
    pub fn release(&mut self) -> Option<SoundingNote> {
        self.sounding.take()
    }

    /// Back to stream-start state, keeping the configuration and pattern.
    pub fn reset(&mut self) {
        self.timeline.clear();
        self.onset_cursor = 0;
        self.offset_cursor = 0;
        self.sounding = None;
        self.reference_frame = 0;
        self.dirty = self.pattern.is_some();
    }
}
