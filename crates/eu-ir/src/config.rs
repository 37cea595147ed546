//! Per-generator configuration as delivered by the host.

use crate::error::ConfigError;
use crate::pattern::{generate, OnsetPattern};

/// Number of independently configured generators.
pub const GENERATORS: usize = 8;

/// Number of host parameters per generator.
pub const PARAMETERS_PER_GENERATOR: usize = 8;

/// Index of a parameter within a generator's block of host values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ParamId {
    Enabled = 0,
    Beats = 1,
    Onsets = 2,
    Rotation = 3,
    Bars = 4,
    Channel = 5,
    Note = 6,
    Velocity = 7,
}

impl ParamId {
    pub const ALL: [ParamId; PARAMETERS_PER_GENERATOR] = [
        ParamId::Enabled,
        ParamId::Beats,
        ParamId::Onsets,
        ParamId::Rotation,
        ParamId::Bars,
        ParamId::Channel,
        ParamId::Note,
        ParamId::Velocity,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Configuration of one generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Is the generator producing notes?
    pub enabled: bool,
    /// Slots per pattern cycle
    pub beats: u16,
    /// Onsets distributed across the slots
    pub onsets: u16,
    /// Cyclic shift in slots (positive = leading edge forward)
    pub rotation: i16,
    /// Bars spanned by one pattern cycle
    pub bars_per_cycle: u16,
    /// MIDI channel (0-15)
    pub channel: u8,
    /// MIDI note number (0-127)
    pub note: u8,
    /// Note-on velocity (0-127)
    pub velocity: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            beats: 8,
            onsets: 0,
            rotation: 0,
            bars_per_cycle: 1,
            channel: 0,
            note: 60,
            velocity: 100,
        }
    }
}

impl GeneratorConfig {
    /// Decode the host's plain numeric parameter values, indexed by [`ParamId`].
    ///
    /// Channels arrive 1-based (1-16) and are stored 0-based.
    pub fn from_values(values: &[f32; PARAMETERS_PER_GENERATOR]) -> Self {
        let value = |id: ParamId| values[id.index()];
        Self {
            enabled: value(ParamId::Enabled) != 0.0,
            beats: value(ParamId::Beats) as u16,
            onsets: value(ParamId::Onsets) as u16,
            rotation: value(ParamId::Rotation) as i16,
            bars_per_cycle: value(ParamId::Bars) as u16,
            channel: (value(ParamId::Channel) as u8).saturating_sub(1).min(15),
            note: (value(ParamId::Note) as u8).min(127),
            velocity: (value(ParamId::Velocity) as u8).min(127),
        }
    }

    /// Generate this configuration's pattern, rejecting configurations that
    /// can't be scheduled.
    pub fn pattern(&self) -> Result<OnsetPattern, ConfigError> {
        if self.bars_per_cycle == 0 {
            return Err(ConfigError::InvalidBarsPerCycle);
        }
        Ok(generate(self.onsets, self.beats, self.rotation)?)
    }

    /// Did a field feeding the pattern generator change?
    pub fn pattern_changed(&self, other: &GeneratorConfig) -> bool {
        self.beats != other.beats || self.onsets != other.onsets || self.rotation != other.rotation
    }

    /// Did a field feeding the onset timeline change?
    pub fn timeline_changed(&self, other: &GeneratorConfig) -> bool {
        self.pattern_changed(other) || self.bars_per_cycle != other.bars_per_cycle
    }
}
