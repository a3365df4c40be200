//! EEPROM emulation error types

use core::fmt;

/// Errors from emulation operations
///
/// Invalid keys, a missing active block and an exhausted block are not
/// errors; they are reported through [`super::WriteOutcome`] or the erased
/// word. Only a failing medium is surfaced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EepromError<E> {
    /// The block device rejected an erase, read or program
    Device(E),
}

impl<E> From<E> for EepromError<E> {
    fn from(error: E) -> Self {
        EepromError::Device(error)
    }
}

impl<E: fmt::Debug> fmt::Display for EepromError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EepromError::Device(e) => write!(f, "block device error: {:?}", e),
        }
    }
}

/// Configuration rejected by [`super::EepromConfig::validate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Key space capacity is zero
    EmptyKeySpace,
    /// Fewer than two blocks in the pool
    PoolTooSmall,
    /// Pool is larger than the device
    PoolExceedsDevice,
    /// Block cannot hold every key plus one free slot
    BlockTooSmall,
    /// Boot threshold exceeds the free space a fresh pack guarantees
    ThresholdTooLarge,
}

impl ConfigError {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigError::EmptyKeySpace => "EmptyKeySpace",
            ConfigError::PoolTooSmall => "PoolTooSmall",
            ConfigError::PoolExceedsDevice => "PoolExceedsDevice",
            ConfigError::BlockTooSmall => "BlockTooSmall",
            ConfigError::ThresholdTooLarge => "ThresholdTooLarge",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyKeySpace => write!(f, "key space capacity is zero"),
            ConfigError::PoolTooSmall => write!(f, "pool needs at least two blocks"),
            ConfigError::PoolExceedsDevice => write!(f, "pool larger than device"),
            ConfigError::BlockTooSmall => write!(f, "block too small for key space"),
            ConfigError::ThresholdTooLarge => write!(f, "reclaim threshold too large"),
        }
    }
}
