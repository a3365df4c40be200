//! Flash-backed block device
//!
//! Maps the emulation engine's cells onto a region of on-chip Flash.
//!
//! # Cell Format
//!
//! ```text
//! ┌─────────┬─────────┬─────────┬─────────┐
//! │ data lo │ data hi │ tag     │ 0xFF    │  4 bytes per cell
//! └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! The fourth byte is never programmed. Cell `n` of block `b` lives at
//! `base + b * block_size + n * 4`.

use canpower_core::eeprom::{BlockDevice, RawCell, ERASED_BYTE};

use crate::platform::error::FlashError;
use crate::platform::traits::FlashInterface;
use crate::platform::{PlatformError, Result};

/// EEPROM pool base address (Flash offset)
pub const EEPROM_BASE: u32 = 0x040000; // 256 KB

/// Number of Flash blocks reserved for the pool
pub const EEPROM_BLOCK_COUNT: u8 = 20;

/// Bytes occupied by one cell
const CELL_SIZE: u32 = 4;

/// [`BlockDevice`] over a [`FlashInterface`]
pub struct FlashBlockDevice<F: FlashInterface> {
    flash: F,
    base: u32,
    block_count: u8,
}

impl<F: FlashInterface> FlashBlockDevice<F> {
    /// Use the default pool placement (`EEPROM_BASE`, `EEPROM_BLOCK_COUNT`)
    pub fn new(flash: F) -> Result<Self> {
        Self::with_layout(flash, EEPROM_BASE, EEPROM_BLOCK_COUNT)
    }

    /// Place `block_count` blocks starting at `base`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if `base` is
    /// not block-aligned or the pool does not fit in Flash.
    pub fn with_layout(flash: F, base: u32, block_count: u8) -> Result<Self> {
        let block_size = flash.block_size();
        if block_size < CELL_SIZE * 2 || base % block_size != 0 {
            return Err(FlashError::InvalidAddress.into());
        }

        let end = (block_count as u32)
            .checked_mul(block_size)
            .and_then(|size| size.checked_add(base));
        match end {
            Some(end) if end <= flash.capacity() => Ok(Self {
                flash,
                base,
                block_count,
            }),
            _ => Err(FlashError::InvalidAddress.into()),
        }
    }

    /// Borrow the Flash driver
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Mutably borrow the Flash driver
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the Flash driver
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Flash address of the first byte of `block`
    pub fn block_address(&self, block: u8) -> u32 {
        self.base + block as u32 * self.flash.block_size()
    }

    fn cell_address(&self, block: u8, offset: u16) -> Result<u32> {
        if block >= self.block_count || offset >= self.cells_per_block() {
            return Err(FlashError::InvalidAddress.into());
        }
        Ok(self.block_address(block) + offset as u32 * CELL_SIZE)
    }
}

impl<F: FlashInterface> BlockDevice for FlashBlockDevice<F> {
    type Error = PlatformError;

    fn block_count(&self) -> u8 {
        self.block_count
    }

    fn cells_per_block(&self) -> u16 {
        (self.flash.block_size() / CELL_SIZE).min(u16::MAX as u32) as u16
    }

    fn erase_block(&mut self, block: u8) -> Result<()> {
        if block >= self.block_count {
            return Err(FlashError::InvalidAddress.into());
        }
        let address = self.block_address(block);
        let size = self.flash.block_size();
        self.flash.erase(address, size)
    }

    fn read_cell(&mut self, block: u8, offset: u16) -> Result<RawCell> {
        let address = self.cell_address(block, offset)?;
        let mut buf = [0u8; CELL_SIZE as usize];
        self.flash.read(address, &mut buf)?;
        Ok(RawCell::new(buf[2], u16::from_le_bytes([buf[0], buf[1]])))
    }

    fn program_cell(&mut self, block: u8, offset: u16, cell: RawCell) -> Result<()> {
        let address = self.cell_address(block, offset)?;
        let [lo, hi] = cell.data.to_le_bytes();
        self.flash.write(address, &[lo, hi, cell.tag, ERASED_BYTE])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockFlash;

    #[test]
    fn test_geometry() {
        let device = FlashBlockDevice::new(MockFlash::new()).unwrap();
        assert_eq!(device.block_count(), EEPROM_BLOCK_COUNT);
        assert_eq!(device.cells_per_block(), 1024);
        assert_eq!(device.block_address(0), EEPROM_BASE);
        assert_eq!(device.block_address(19), 0x053000);
    }

    #[test]
    fn test_layout_must_fit() {
        // unaligned base
        assert!(FlashBlockDevice::with_layout(MockFlash::new(), 0x040100, 2).is_err());
        // runs past the end of Flash
        assert!(FlashBlockDevice::with_layout(MockFlash::new(), 0x05F000, 2).is_err());
        assert!(FlashBlockDevice::with_layout(MockFlash::new(), 0x05E000, 2).is_ok());
    }

    #[test]
    fn test_cell_byte_layout() {
        let mut device = FlashBlockDevice::new(MockFlash::new()).unwrap();
        device.erase_block(1).unwrap();
        device.program_cell(1, 3, RawCell::new(0x01, 0x1234)).unwrap();

        let address = EEPROM_BASE + 0x1000 + 3 * CELL_SIZE;
        assert_eq!(
            device.flash().get_contents(address, 4),
            vec![0x34, 0x12, 0x01, 0xFF]
        );
        assert_eq!(device.read_cell(1, 3).unwrap(), RawCell::new(0x01, 0x1234));
        assert!(device.read_cell(1, 4).unwrap().is_unwritten());
    }

    #[test]
    fn test_erase_block_counts_wear() {
        let mut device = FlashBlockDevice::new(MockFlash::new()).unwrap();
        device.erase_block(2).unwrap();
        device.erase_block(2).unwrap();

        assert_eq!(device.flash().get_erase_count(EEPROM_BASE + 0x2000), 2);
        assert_eq!(device.flash().get_erase_count(EEPROM_BASE), 0);
    }

    #[test]
    fn test_out_of_range_cells_rejected() {
        let mut device = FlashBlockDevice::new(MockFlash::new()).unwrap();
        let invalid = Err(PlatformError::Flash(FlashError::InvalidAddress));

        assert_eq!(device.read_cell(EEPROM_BLOCK_COUNT, 0), invalid);
        assert_eq!(device.read_cell(0, 1024), invalid);
        assert_eq!(
            device.erase_block(EEPROM_BLOCK_COUNT),
            Err(PlatformError::Flash(FlashError::InvalidAddress))
        );
    }
}
