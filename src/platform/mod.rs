//! Platform abstraction layer
//!
//! This module provides the hardware abstraction the persistent store runs on.
//! All platform-specific code must be isolated to this module.

pub mod error;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{FlashError, PlatformError, Result};
pub use traits::FlashInterface;
