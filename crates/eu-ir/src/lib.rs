//! Core types for euclid.
//!
//! Defines the onset pattern generator and the plain data shared between
//! the host and the scheduling engine: generator configuration and note
//! messages. Everything here is pure and allocation-free.
//!
//! Designed to be `no_std` compatible.

#![cfg_attr(not(feature = "std"), no_std)]

mod config;
mod error;
mod message;
mod pattern;

pub use config::{GeneratorConfig, ParamId, GENERATORS, PARAMETERS_PER_GENERATOR};
pub use error::{ConfigError, PatternError};
pub use message::{MidiMessage, NOTE_OFF, NOTE_ON};
pub use pattern::{generate, saturates, OnsetPattern, MAX_BEATS};
