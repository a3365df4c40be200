//! canpower_core - Pure no_std storage logic for the CANPower module
//!
//! This crate contains the platform-agnostic EEPROM emulation engine that
//! persists the module's settings in erase-block flash. It can be tested on
//! host without any feature flags or embedded dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies
//! - **Trait abstractions**: The flash medium is injected via [`eeprom::BlockDevice`]
//!
//! # Modules
//!
//! - [`eeprom`]: Block primitive trait, header protocol, record reader/writer,
//!   reclaimer, boot recovery and a mock block device

#![no_std]

pub mod eeprom;
