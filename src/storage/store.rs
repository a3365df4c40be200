//! Persistent store facade
//!
//! The surface the rest of the firmware uses to persist settings. Every
//! operation is infallible from the caller's point of view: Flash failures
//! are logged and degrade to "no stored value" / "write ignored", so a worn
//! or faulty chip never stops the module from switching loads.
//!
//! # Example
//!
//! ```ignore
//! use canpower::platform::mock::MockFlash;
//! use canpower::storage::PersistentStore;
//! use canpower_core::eeprom::EepromConfig;
//!
//! let mut store = PersistentStore::new(MockFlash::new(), EepromConfig::DEFAULT).unwrap();
//! store.initialize_store();
//!
//! store.write(0, 1);
//! assert_eq!(store.read(0), 1);
//! ```

use canpower_core::eeprom::{
    EepromConfig, EepromEmulation, EepromError, Record, RecoveryActions, WriteOutcome,
    ERASED_WORD,
};

use super::flash_device::FlashBlockDevice;
use crate::platform::traits::FlashInterface;
use crate::platform::{PlatformError, Result};
use crate::{log_debug, log_error, log_info, log_trace, log_warn};

/// Wear and occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StoreStats {
    /// Block currently serving reads and writes
    pub active_block: Option<u8>,
    /// Unwritten slots left in the active block
    pub free_slots: u16,
    /// Reclaim counter stored in the active block header
    pub reclaim_count: Option<u16>,
    /// Reclaims performed since this store was created, boot packs included
    pub reclaims: u32,
}

/// Flash-backed key/value store
pub struct PersistentStore<F: FlashInterface> {
    eeprom: EepromEmulation<FlashBlockDevice<F>>,
    reclaims: u32,
}

impl<F: FlashInterface> PersistentStore<F> {
    /// Create a store over the default pool placement
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::InvalidConfig` if `config` does not fit the pool, or
    /// `PlatformError::Flash(FlashError::InvalidAddress)` if the pool does not fit in Flash.
    pub fn new(flash: F, config: EepromConfig) -> Result<Self> {
        Self::with_device(FlashBlockDevice::new(flash)?, config)
    }

    /// Create a store over an explicitly placed block device
    pub fn with_device(device: FlashBlockDevice<F>, config: EepromConfig) -> Result<Self> {
        let eeprom = EepromEmulation::new(device, config).map_err(|e| {
            log_error!("EEPROM configuration rejected: {}", e.as_str());
            PlatformError::from(e)
        })?;

        Ok(Self {
            eeprom,
            reclaims: 0,
        })
    }

    /// Recover the pool after a restart
    ///
    /// Must be called exactly once, before any read or write. Blocks for at
    /// most one reclaim.
    pub fn initialize_store(&mut self) {
        match self.eeprom.initialize() {
            Ok(report) => {
                if report.actions.contains(RecoveryActions::PACKED) {
                    self.reclaims = self.reclaims.saturating_add(1);
                }
                if report.actions.is_empty() {
                    log_info!("EEPROM: block {} active", report.active);
                } else {
                    log_info!(
                        "EEPROM: block {} active after recovery (actions={}, erased={})",
                        report.active,
                        report.actions.bits(),
                        report.erased_blocks
                    );
                }
            }
            Err(EepromError::Device(e)) => {
                log_error!("EEPROM recovery failed: {:?}", e);
            }
        }
    }

    /// Stored value of `key`, or `0xFFFF` if none
    pub fn read(&mut self, key: u8) -> u16 {
        match self.eeprom.read(key) {
            Ok(value) => value,
            Err(EepromError::Device(e)) => {
                log_error!("EEPROM read of key {} failed: {:?}", key, e);
                ERASED_WORD
            }
        }
    }

    /// Persist `value` under `key`
    ///
    /// Ignored for keys outside the configured capacity; no Flash is
    /// programmed when the value is already stored.
    pub fn write(&mut self, key: u8, value: u16) {
        match self.eeprom.write(key, value) {
            Ok(WriteOutcome::Appended {
                block,
                offset,
                reclaimed,
            }) => {
                if reclaimed {
                    self.reclaims = self.reclaims.saturating_add(1);
                    log_debug!("EEPROM: packed into block {}", block);
                }
                log_trace!("EEPROM: key {} stored at {}:{}", key, block, offset);
            }
            Ok(WriteOutcome::Unchanged) => {}
            Ok(WriteOutcome::OutOfRange) => {
                log_warn!("EEPROM: key {} out of range, write ignored", key);
            }
            Ok(WriteOutcome::NoActiveBlock) => {
                log_warn!("EEPROM: no active block, write of key {} ignored", key);
            }
            Ok(WriteOutcome::Dropped) => {
                log_warn!("EEPROM: no free slot, write of key {} dropped", key);
            }
            Err(EepromError::Device(e)) => {
                log_error!("EEPROM write of key {} failed: {:?}", key, e);
            }
        }
    }

    /// Current value of every written key, in ascending key order
    pub fn snapshot<const N: usize>(&mut self) -> heapless::Vec<Record, N> {
        match self.eeprom.live_records() {
            Ok(records) => records,
            Err(EepromError::Device(e)) => {
                log_error!("EEPROM snapshot failed: {:?}", e);
                heapless::Vec::new()
            }
        }
    }

    /// Wear and occupancy of the pool
    pub fn stats(&mut self) -> StoreStats {
        let active_block = self.eeprom.find_active().ok().flatten();
        let (free_slots, reclaim_count) = match active_block {
            Some(block) => (
                self.eeprom.free_slots(block).unwrap_or(0),
                self.eeprom.block_header(block).ok().map(|h| h.reclaim_count),
            ),
            None => (0, None),
        };

        StoreStats {
            active_block,
            free_slots,
            reclaim_count,
            reclaims: self.reclaims,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EepromConfig {
        self.eeprom.config()
    }

    /// Borrow the Flash driver
    pub fn flash(&self) -> &F {
        self.eeprom.device().flash()
    }

    /// Mutably borrow the Flash driver
    pub fn flash_mut(&mut self) -> &mut F {
        self.eeprom.device_mut().flash_mut()
    }

    /// Release the Flash driver
    pub fn into_inner(self) -> F {
        self.eeprom.into_inner().into_inner()
    }
}
