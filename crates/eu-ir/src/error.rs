//! Error types for pattern generation and generator configuration.

use core::fmt;

use crate::pattern::MAX_BEATS;

/// Why a pattern could not be generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternError {
    /// A pattern needs at least one beat slot
    InvalidBeats,
    /// More beats than a pattern mask can hold
    TooManyBeats { beats: u16 },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::InvalidBeats => write!(f, "number of beats can't be zero"),
            PatternError::TooManyBeats { beats } => {
                write!(f, "{} beats exceeds the maximum of {}", beats, MAX_BEATS)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}

/// Why a generator configuration can't be scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The pattern itself is invalid
    Pattern(PatternError),
    /// A cycle must span at least one bar
    InvalidBarsPerCycle,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Pattern(err) => write!(f, "{}", err),
            ConfigError::InvalidBarsPerCycle => write!(f, "a cycle must span at least one bar"),
        }
    }
}

impl From<PatternError> for ConfigError {
    fn from(err: PatternError) -> Self {
        ConfigError::Pattern(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Pattern(err) => Some(err),
            ConfigError::InvalidBarsPerCycle => None,
        }
    }
}
