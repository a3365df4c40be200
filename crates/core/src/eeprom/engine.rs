//! Record reader and writer
//!
//! The active block is never cached: every operation locates it by scanning
//! the pool headers, so the medium is the only source of truth.

use super::config::{EepromConfig, ERASED_WORD};
use super::device::BlockDevice;
use super::error::{ConfigError, EepromError};
use super::header::{BlockHeader, BlockStatus, Record};

/// Result type for emulation operations on device `D`
pub(super) type Result<T, D> = core::result::Result<T, EepromError<<D as BlockDevice>::Error>>;

/// What a call to [`EepromEmulation::write`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Key outside the configured key space; nothing stored
    OutOfRange,
    /// Stored value already equal; no slot consumed
    Unchanged,
    /// No active block in the pool; nothing stored
    NoActiveBlock,
    /// Record appended
    Appended {
        /// Block that received the record
        block: u8,
        /// Slot offset within the block
        offset: u16,
        /// True if the active block was packed first
        reclaimed: bool,
    },
    /// No free slot even after packing; nothing stored
    Dropped,
}

/// EEPROM emulation engine
///
/// Owns a [`BlockDevice`] and provides word-sized key/value persistence with
/// wear leveling across `config.pool_blocks` blocks.
///
/// Call [`EepromEmulation::initialize`] once before any read or write.
///
/// # Example
///
/// ```
/// use canpower_core::eeprom::{EepromConfig, EepromEmulation, MockBlockDevice, ERASED_WORD};
///
/// let device = MockBlockDevice::<4, 16>::new();
/// let mut eeprom = EepromEmulation::new(device, EepromConfig::new(4, 4, 2)).unwrap();
/// eeprom.initialize().unwrap();
///
/// assert_eq!(eeprom.read(1).unwrap(), ERASED_WORD);
/// eeprom.write(1, 0x1234).unwrap();
/// assert_eq!(eeprom.read(1).unwrap(), 0x1234);
/// ```
pub struct EepromEmulation<D: BlockDevice> {
    pub(super) device: D,
    pub(super) config: EepromConfig,
}

impl<D: BlockDevice> EepromEmulation<D> {
    /// Create an engine over `device`
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] if `config` does not fit the device geometry.
    pub fn new(device: D, config: EepromConfig) -> core::result::Result<Self, ConfigError> {
        config.validate(device.block_count(), device.cells_per_block())?;
        Ok(Self { device, config })
    }

    /// Active configuration
    pub fn config(&self) -> &EepromConfig {
        &self.config
    }

    /// Number of record slots per block (header excluded)
    pub fn slots_per_block(&self) -> u16 {
        self.device.cells_per_block() - 1
    }

    /// Borrow the underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the underlying device
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Release the underlying device
    pub fn into_inner(self) -> D {
        self.device
    }

    /// True if `key` is inside the configured key space
    pub fn is_valid_key(&self, key: u8) -> bool {
        key < self.config.capacity
    }

    /// Decode the header of `block`
    pub fn block_header(&mut self, block: u8) -> Result<BlockHeader, D> {
        Ok(BlockHeader::from_cell(self.device.read_cell(block, 0)?))
    }

    /// Locate the active block
    ///
    /// Scans the pool in index order and returns the first block whose status
    /// is Active. Lowest index wins when more than one block is Active.
    pub fn find_active(&mut self) -> Result<Option<u8>, D> {
        for block in 0..self.config.pool_blocks {
            if self.block_header(block)?.status == BlockStatus::Active {
                return Ok(Some(block));
            }
        }
        Ok(None)
    }

    /// Count unwritten slots in `block`
    pub fn free_slots(&mut self, block: u8) -> Result<u16, D> {
        let mut count = 0;
        for offset in 1..=self.slots_per_block() {
            if self.device.read_cell(block, offset)?.is_unwritten() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Reclaim counter of the active block, `None` without an active block
    pub fn reclaim_count(&mut self) -> Result<Option<u16>, D> {
        match self.find_active()? {
            Some(block) => Ok(Some(self.block_header(block)?.reclaim_count)),
            None => Ok(None),
        }
    }

    /// Read the current value of `key`
    ///
    /// Returns [`ERASED_WORD`] when the key is out of range, has never been
    /// written, or the pool has no active block.
    pub fn read(&mut self, key: u8) -> Result<u16, D> {
        if !self.is_valid_key(key) {
            return Ok(ERASED_WORD);
        }

        match self.find_active()? {
            Some(block) => Ok(self.read_from(block, key)?.unwrap_or(ERASED_WORD)),
            None => Ok(ERASED_WORD),
        }
    }

    /// Store `value` under `key`
    ///
    /// Appends one record to the active block, packing it into the next block
    /// first when no slot is free. Writing the value already stored consumes
    /// nothing.
    pub fn write(&mut self, key: u8, value: u16) -> Result<WriteOutcome, D> {
        if !self.is_valid_key(key) {
            return Ok(WriteOutcome::OutOfRange);
        }

        if self.read(key)? == value {
            return Ok(WriteOutcome::Unchanged);
        }

        let Some(mut block) = self.find_active()? else {
            return Ok(WriteOutcome::NoActiveBlock);
        };

        let mut reclaimed = false;
        if self.free_slots(block)? == 0 {
            self.reclaim()?;
            reclaimed = true;
            block = match self.find_active()? {
                Some(block) => block,
                None => return Ok(WriteOutcome::NoActiveBlock),
            };
        }

        let Some(offset) = self.next_free_offset(block)? else {
            return Ok(WriteOutcome::Dropped);
        };

        self.device
            .program_cell(block, offset, Record::new(key, value).to_cell())?;

        Ok(WriteOutcome::Appended {
            block,
            offset,
            reclaimed,
        })
    }

    /// Current value of every written key, in ascending key order
    ///
    /// Stops collecting once `N` records have been gathered.
    pub fn live_records<const N: usize>(&mut self) -> Result<heapless::Vec<Record, N>, D> {
        let mut records = heapless::Vec::new();

        let Some(block) = self.find_active()? else {
            return Ok(records);
        };

        for key in 0..self.config.capacity {
            if let Some(value) = self.read_from(block, key)? {
                if value == ERASED_WORD {
                    continue;
                }
                if records.push(Record::new(key, value)).is_err() {
                    break;
                }
            }
        }

        Ok(records)
    }

    /// Newest value of `key` in `block`, scanning slots from the end
    pub(super) fn read_from(&mut self, block: u8, key: u8) -> Result<Option<u16>, D> {
        for offset in (1..=self.slots_per_block()).rev() {
            let cell = self.device.read_cell(block, offset)?;
            if cell.tag == key {
                return Ok(Some(cell.data));
            }
        }
        Ok(None)
    }

    /// First unwritten slot offset in `block`
    pub(super) fn next_free_offset(&mut self, block: u8) -> Result<Option<u16>, D> {
        for offset in 1..=self.slots_per_block() {
            if self.device.read_cell(block, offset)?.is_unwritten() {
                return Ok(Some(offset));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eeprom::{MockBlockDevice, ACTIVE_STATUS};

    type Device = MockBlockDevice<3, 8>;

    fn engine(capacity: u8) -> EepromEmulation<Device> {
        let mut eeprom =
            EepromEmulation::new(Device::new(), EepromConfig::new(capacity, 3, 1)).unwrap();
        eeprom.initialize().unwrap();
        eeprom
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = EepromEmulation::new(Device::new(), EepromConfig::new(8, 3, 0));
        assert_eq!(result.err(), Some(ConfigError::BlockTooSmall));
    }

    #[test]
    fn test_round_trip() {
        let mut eeprom = engine(4);
        eeprom.write(0, 10).unwrap();
        eeprom.write(3, 30).unwrap();

        assert_eq!(eeprom.read(0).unwrap(), 10);
        assert_eq!(eeprom.read(3).unwrap(), 30);
        assert_eq!(eeprom.read(1).unwrap(), ERASED_WORD);
    }

    #[test]
    fn test_latest_write_wins() {
        let mut eeprom = engine(4);
        eeprom.write(2, 1).unwrap();
        eeprom.write(2, 2).unwrap();
        eeprom.write(2, 3).unwrap();

        assert_eq!(eeprom.read(2).unwrap(), 3);
    }

    #[test]
    fn test_unchanged_write_consumes_no_slot() {
        let mut eeprom = engine(4);
        assert!(matches!(
            eeprom.write(1, 42).unwrap(),
            WriteOutcome::Appended { offset: 1, .. }
        ));

        let programs = eeprom.device().program_count();
        assert_eq!(eeprom.write(1, 42).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(eeprom.device().program_count(), programs);
    }

    #[test]
    fn test_out_of_range_key() {
        let mut eeprom = engine(4);
        let programs = eeprom.device().program_count();

        assert_eq!(eeprom.write(4, 1).unwrap(), WriteOutcome::OutOfRange);
        assert_eq!(eeprom.read(4).unwrap(), ERASED_WORD);
        assert_eq!(eeprom.device().program_count(), programs);
    }

    #[test]
    fn test_no_active_block_degrades() {
        let mut eeprom = EepromEmulation::new(Device::new(), EepromConfig::new(4, 3, 1)).unwrap();
        // initialize() deliberately skipped

        assert_eq!(eeprom.find_active().unwrap(), None);
        assert_eq!(eeprom.write(0, 5).unwrap(), WriteOutcome::NoActiveBlock);
        assert_eq!(eeprom.read(0).unwrap(), ERASED_WORD);
        assert_eq!(eeprom.device().program_count(), 0);
    }

    #[test]
    fn test_find_active_prefers_lowest_index() {
        let mut device = Device::new();
        device.set_cell(1, 0, BlockHeader::active(0).to_cell());
        device.set_cell(2, 0, BlockHeader::active(0).to_cell());
        let mut eeprom = EepromEmulation::new(device, EepromConfig::new(4, 3, 1)).unwrap();

        assert_eq!(eeprom.find_active().unwrap(), Some(1));
    }

    #[test]
    fn test_free_slots_counts_unwritten() {
        let mut eeprom = engine(4);
        let block = eeprom.find_active().unwrap().unwrap();
        assert_eq!(eeprom.free_slots(block).unwrap(), 7);

        eeprom.write(0, 1).unwrap();
        eeprom.write(1, 1).unwrap();
        assert_eq!(eeprom.free_slots(block).unwrap(), 5);
    }

    #[test]
    fn test_full_block_triggers_reclaim() {
        let mut eeprom = engine(4);
        // 7 slots: fill them with alternating values on two keys
        for i in 0..7u16 {
            eeprom.write((i % 2) as u8, i).unwrap();
        }
        assert_eq!(eeprom.free_slots(0).unwrap(), 0);

        let outcome = eeprom.write(3, 99).unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::Appended {
                block: 1,
                offset: 3,
                reclaimed: true
            }
        );
        assert_eq!(eeprom.find_active().unwrap(), Some(1));
        assert_eq!(eeprom.read(0).unwrap(), 6);
        assert_eq!(eeprom.read(1).unwrap(), 5);
        assert_eq!(eeprom.read(3).unwrap(), 99);
        assert_eq!(eeprom.free_slots(1).unwrap(), 4);
    }

    #[test]
    fn test_reads_ignore_foreign_keys() {
        let mut eeprom = engine(2);
        // a record outside the key space left behind by another build
        eeprom.device_mut().set_cell(0, 1, Record::new(9, 0x0909).to_cell());

        assert_eq!(eeprom.read(0).unwrap(), ERASED_WORD);
        assert_eq!(eeprom.block_header(0).unwrap().status.to_byte(), ACTIVE_STATUS);

        // the record is on the medium but its key stays out of range
        assert_eq!(eeprom.read(9).unwrap(), ERASED_WORD);
        assert_eq!(eeprom.write(9, 0x1234).unwrap(), WriteOutcome::OutOfRange);
        assert_eq!(eeprom.device().cell(0, 1), Record::new(9, 0x0909).to_cell());
        assert_eq!(eeprom.free_slots(0).unwrap(), 6);
    }

    #[test]
    fn test_live_records() {
        let mut eeprom = engine(4);
        eeprom.write(2, 20).unwrap();
        eeprom.write(0, 1).unwrap();
        eeprom.write(0, 2).unwrap();

        let records = eeprom.live_records::<4>().unwrap();
        assert_eq!(records.as_slice(), &[Record::new(0, 2), Record::new(2, 20)]);

        let truncated = eeprom.live_records::<1>().unwrap();
        assert_eq!(truncated.as_slice(), &[Record::new(0, 2)]);
    }
}
