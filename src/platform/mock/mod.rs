//! Mock platform implementation for testing
//!
//! This module provides mock implementations of platform traits that can be used
//! for unit testing without requiring actual hardware.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```ignore
//! use canpower::platform::mock::MockFlash;
//! use canpower::platform::traits::FlashInterface;
//!
//! let mut flash = MockFlash::new();
//! flash.erase(0x040000, 4096).unwrap();
//! ```

#![cfg(any(test, feature = "mock"))]

mod flash;

pub use flash::MockFlash;
