#![cfg_attr(not(test), no_std)]

//! canpower - Persistent settings for the CANPower switch module
//!
//! This library provides the Flash platform abstraction, EEPROM emulation
//! storage on top of it, and the persisted channel parameters.

// Platform abstraction layer (Flash access)
pub mod platform;

// Core infrastructure (logging)
pub mod core;

// EEPROM emulation storage
pub mod storage;

// Persisted application parameters
pub mod parameters;
