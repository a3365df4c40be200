//! Mock Flash implementation for testing
//!
//! Provides in-memory Flash simulation for unit tests.

extern crate alloc;

use crate::platform::{error::FlashError, traits::FlashInterface, Result};
use alloc::vec;
use alloc::vec::Vec;

/// Flash block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Flash capacity (firmware region plus the EEPROM pool, rounded up)
const FLASH_CAPACITY: u32 = 0x060000;

/// Firmware region (protect first 256 KB)
const FIRMWARE_SIZE: u32 = 0x040000;

/// Mock Flash implementation
///
/// Simulates Flash storage in memory for testing. Supports:
/// - Read/write/erase operations with 1→0 write semantics
/// - Corruption injection for testing error handling
/// - Erase count tracking for wear leveling validation
/// - Power-loss simulation after a chosen number of writes/erases
///
/// # Example
///
/// ```ignore
/// use canpower::platform::mock::MockFlash;
/// use canpower::platform::traits::FlashInterface;
///
/// let mut flash = MockFlash::new();
///
/// flash.erase(0x040000, 4096).unwrap();
/// flash.write(0x040000, &[0x34, 0x12, 0xAC, 0xFF]).unwrap();
///
/// let mut buf = [0u8; 4];
/// flash.read(0x040000, &mut buf).unwrap();
/// assert_eq!(buf, [0x34, 0x12, 0xAC, 0xFF]);
/// assert_eq!(flash.get_erase_count(0x040000), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: Vec<u8>,
    /// Erase count per block (for wear leveling testing)
    erase_counts: Vec<u32>,
    /// Writes/erases allowed before simulated power loss
    operations_left: Option<u32>,
    /// Cleared by a simulated power loss
    powered: bool,
}

impl MockFlash {
    /// Create a new mock Flash instance
    pub fn new() -> Self {
        Self {
            storage: vec![0xFF; FLASH_CAPACITY as usize],
            erase_counts: vec![0; (FLASH_CAPACITY / BLOCK_SIZE) as usize],
            operations_left: None,
            powered: true,
        }
    }

    /// Get Flash contents (for test verification)
    pub fn get_contents(&self, address: u32, len: usize) -> Vec<u8> {
        self.storage[address as usize..(address as usize + len)].to_vec()
    }

    /// Inject corruption at address (for testing error recovery)
    pub fn inject_corruption(&mut self, address: u32, len: usize) {
        for byte in &mut self.storage[address as usize..address as usize + len] {
            *byte = 0xAA;
        }
    }

    /// Get erase count for the block containing `address`
    pub fn get_erase_count(&self, address: u32) -> u32 {
        self.erase_counts[(address / BLOCK_SIZE) as usize]
    }

    /// Get total erase count across all blocks
    pub fn get_total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Simulate power loss after `operations` more writes/erases
    ///
    /// The following write or erase is dropped and every later operation,
    /// reads included, fails until [`Self::restore_power`].
    pub fn simulate_power_loss(&mut self, operations: u32) {
        self.operations_left = Some(operations);
    }

    /// Power back up
    pub fn restore_power(&mut self) {
        self.operations_left = None;
        self.powered = true;
    }

    /// Check if address is in writable region
    fn is_writable(&self, address: u32) -> bool {
        (FIRMWARE_SIZE..FLASH_CAPACITY).contains(&address)
    }

    /// Check if address is block-aligned
    fn is_block_aligned(&self, address: u32) -> bool {
        address % BLOCK_SIZE == 0
    }

    fn check_power(&self, failure: FlashError) -> Result<()> {
        if self.powered {
            Ok(())
        } else {
            Err(failure.into())
        }
    }

    /// Consume one operation from the power-loss budget
    fn begin_operation(&mut self, failure: FlashError) -> Result<()> {
        self.check_power(failure)?;
        match self.operations_left {
            Some(0) => {
                self.powered = false;
                Err(failure.into())
            }
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashInterface for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        if address as usize + buf.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }
        self.check_power(FlashError::ReadFailed)?;

        buf.copy_from_slice(&self.storage[address as usize..(address as usize + buf.len())]);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if !self.is_writable(address) {
            return Err(FlashError::InvalidAddress.into());
        }
        if address as usize + data.len() > FLASH_CAPACITY as usize {
            return Err(FlashError::InvalidAddress.into());
        }
        self.begin_operation(FlashError::WriteFailed)?;

        // Flash can only change bits from 1→0
        for (cell, byte) in self.storage[address as usize..].iter_mut().zip(data) {
            *cell &= *byte;
        }
        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !self.is_writable(address) || !self.is_block_aligned(address) {
            return Err(FlashError::InvalidAddress.into());
        }
        if size % BLOCK_SIZE != 0 || address + size > FLASH_CAPACITY {
            return Err(FlashError::InvalidAddress.into());
        }
        self.begin_operation(FlashError::EraseFailed)?;

        self.storage[address as usize..(address + size) as usize].fill(0xFF);

        let start_block = (address / BLOCK_SIZE) as usize;
        for count in &mut self.erase_counts[start_block..start_block + (size / BLOCK_SIZE) as usize] {
            *count += 1;
        }
        Ok(())
    }

    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    fn capacity(&self) -> u32 {
        FLASH_CAPACITY
    }
}
