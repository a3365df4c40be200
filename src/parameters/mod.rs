//! Persisted application parameters
//!
//! Typed views over the raw word store. Each parameter set owns a range of
//! store keys and decodes them with range checks, so a corrupt or
//! never-written word always yields a usable default.

pub mod channel;

pub use channel::{ChannelParams, ModulatedLevel, SwitchMode, KEY_COUNT, MODE_KEY, MODULATION_LEVEL_KEY};
