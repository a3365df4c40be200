//! Emulation configuration
//!
//! Compile-time defaults mirror the module's firmware build: two persisted
//! words, a pool of twenty flash blocks, and a proactive pack at boot when
//! fewer than ten slots remain.

use super::error::ConfigError;

/// Value of an emulated data word when never written
pub const ERASED_WORD: u16 = 0xFFFF;

/// Value of a tag byte when unprogrammed
pub const ERASED_BYTE: u8 = 0xFF;

/// Emulation configuration
///
/// # Fields
///
/// - `capacity`: Number of keys; valid keys are `0..capacity`
/// - `pool_blocks`: Number of device blocks rotated through (`P`)
/// - `reclaim_threshold`: Boot packs the active block when it has fewer free
///   slots than this
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EepromConfig {
    /// Size of the key space
    pub capacity: u8,
    /// Number of blocks in the rotation pool
    pub pool_blocks: u8,
    /// Free-slot count below which initialization packs the active block
    pub reclaim_threshold: u16,
}

impl EepromConfig {
    /// Firmware defaults
    pub const DEFAULT: Self = Self::new(2, 20, 10);

    /// Create a configuration
    pub const fn new(capacity: u8, pool_blocks: u8, reclaim_threshold: u16) -> Self {
        Self {
            capacity,
            pool_blocks,
            reclaim_threshold,
        }
    }

    /// Check this configuration against a device geometry
    ///
    /// # Arguments
    ///
    /// - `device_blocks`: Blocks the device exposes
    /// - `cells_per_block`: Cells per block, header included
    ///
    /// # Errors
    ///
    /// - `EmptyKeySpace` if `capacity` is zero
    /// - `PoolTooSmall` if fewer than two blocks rotate
    /// - `PoolExceedsDevice` if the device has fewer blocks than the pool
    /// - `BlockTooSmall` if a full live set would leave no free slot after a pack
    /// - `ThresholdTooLarge` if a freshly packed block could still be below
    ///   the boot threshold
    pub fn validate(&self, device_blocks: u8, cells_per_block: u16) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::EmptyKeySpace);
        }
        if self.pool_blocks < 2 {
            return Err(ConfigError::PoolTooSmall);
        }
        if self.pool_blocks > device_blocks {
            return Err(ConfigError::PoolExceedsDevice);
        }

        let slots = cells_per_block.saturating_sub(1);
        if slots <= self.capacity as u16 {
            return Err(ConfigError::BlockTooSmall);
        }
        if self.reclaim_threshold > slots - self.capacity as u16 {
            return Err(ConfigError::ThresholdTooLarge);
        }

        Ok(())
    }
}

impl Default for EepromConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
