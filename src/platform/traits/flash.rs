//! Flash interface trait
//!
//! This module defines the Flash storage interface that platform implementations must provide.
//! Flash backs the emulated EEPROM that persists the module's settings.

use crate::platform::Result;

/// Flash interface trait
///
/// Platform implementations must provide this interface for Flash read/write/erase operations.
///
/// # Flash Characteristics
///
/// - Flash is organized in blocks (the minimum erase unit)
/// - Erase operations set all bytes to 0xFF
/// - Write operations can only change bits from 1→0 (must erase first to reset to 1)
/// - Erase and write stall the caller until the operation completes
///
/// # Safety Invariants
///
/// - Flash peripheral must be initialized before use
/// - Only one owner per Flash instance (no concurrent access)
/// - Must not erase/write firmware region (implementations must validate addresses)
///
/// # Memory Layout
///
/// ```text
/// [Firmware]             0x000000 - 0x040000 (256 KB) - DO NOT WRITE
/// [EEPROM Block 0]       0x040000 - 0x041000 (4 KB)
/// [EEPROM Block 1]       0x041000 - 0x042000 (4 KB)
/// ...
/// [EEPROM Block 19]      0x053000 - 0x054000 (4 KB)
/// ```
pub trait FlashInterface {
    /// Read data from Flash
    ///
    /// Reads `buf.len()` bytes from Flash starting at `address`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if address is out of bounds.
    /// Returns `PlatformError::Flash(FlashError::ReadFailed)` if the read operation fails.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()>;

    /// Write data to Flash
    ///
    /// Writes `data` to Flash starting at `address`. The target bytes must be
    /// erased; writing can only clear bits.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if address is in firmware region.
    /// Returns `PlatformError::Flash(FlashError::WriteFailed)` if the write operation fails.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase Flash region
    ///
    /// Erases `size` bytes starting at the block-aligned `address`, setting
    /// them to 0xFF. `size` must be a multiple of the block size.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the region is
    /// protected or misaligned.
    /// Returns `PlatformError::Flash(FlashError::EraseFailed)` if the erase operation fails.
    fn erase(&mut self, address: u32, size: u32) -> Result<()>;

    /// Get Flash block size
    ///
    /// Returns the minimum erasable unit size in bytes.
    fn block_size(&self) -> u32;

    /// Get total Flash size
    ///
    /// Returns the total Flash capacity in bytes.
    fn capacity(&self) -> u32;
}
