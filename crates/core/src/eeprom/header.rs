//! Block header and slot record encoding
//!
//! The header is the first cell of every block. Its tag byte holds the block
//! status and its data word holds the reclaim counter. Every other cell is a
//! slot holding one record.

use super::config::{ERASED_BYTE, ERASED_WORD};
use super::device::RawCell;

/// Status byte of the block currently serving reads and writes
pub const ACTIVE_STATUS: u8 = 0xAC;

/// Status byte of an erased block
pub const AVAILABLE_STATUS: u8 = ERASED_BYTE;

/// Block role decoded from the header status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// Block of record
    Active,
    /// Erased (or being filled by an uncommitted pack)
    Available,
    /// Any other status byte; recovered by erasing
    Invalid(u8),
}

impl BlockStatus {
    /// Decode a status byte
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            ACTIVE_STATUS => BlockStatus::Active,
            AVAILABLE_STATUS => BlockStatus::Available,
            other => BlockStatus::Invalid(other),
        }
    }

    /// Encode as a status byte
    pub const fn to_byte(self) -> u8 {
        match self {
            BlockStatus::Active => ACTIVE_STATUS,
            BlockStatus::Available => AVAILABLE_STATUS,
            BlockStatus::Invalid(byte) => byte,
        }
    }
}

/// Decoded block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block role
    pub status: BlockStatus,
    /// Number of times the pool has wrapped back to block 0 (saturating)
    pub reclaim_count: u16,
}

impl BlockHeader {
    /// Header of an erased block
    pub const AVAILABLE: Self = Self {
        status: BlockStatus::Available,
        reclaim_count: ERASED_WORD,
    };

    /// Header committing a block as active
    pub const fn active(reclaim_count: u16) -> Self {
        Self {
            status: BlockStatus::Active,
            reclaim_count,
        }
    }

    /// Decode from the header cell
    pub const fn from_cell(cell: RawCell) -> Self {
        Self {
            status: BlockStatus::from_byte(cell.tag),
            reclaim_count: cell.data,
        }
    }

    /// Encode into the header cell
    pub const fn to_cell(self) -> RawCell {
        RawCell::new(self.status.to_byte(), self.reclaim_count)
    }

    /// Counter to carry into the block that follows this one in a pack
    ///
    /// Increments only when the pack wraps around to block 0, saturating at
    /// `u16::MAX`.
    pub const fn next_reclaim_count(&self, next_block: u8) -> u16 {
        if next_block == 0 {
            self.reclaim_count.saturating_add(1)
        } else {
            self.reclaim_count
        }
    }
}

/// One key/value record stored in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    /// Emulated EEPROM address
    pub key: u8,
    /// Stored word
    pub value: u16,
}

impl Record {
    /// Create a record
    pub const fn new(key: u8, value: u16) -> Self {
        Self { key, value }
    }

    /// Decode a slot cell, `None` if the slot is unwritten
    pub const fn from_cell(cell: RawCell) -> Option<Self> {
        if cell.is_unwritten() {
            None
        } else {
            Some(Self {
                key: cell.tag,
                value: cell.data,
            })
        }
    }

    /// Encode into a slot cell
    pub const fn to_cell(self) -> RawCell {
        RawCell::new(self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_decoding() {
        assert_eq!(BlockStatus::from_byte(0xAC), BlockStatus::Active);
        assert_eq!(BlockStatus::from_byte(0xFF), BlockStatus::Available);
        assert_eq!(BlockStatus::from_byte(0x00), BlockStatus::Invalid(0x00));
        assert_eq!(BlockStatus::from_byte(0xAA), BlockStatus::Invalid(0xAA));
    }

    #[test]
    fn test_erased_header_is_available() {
        let header = BlockHeader::from_cell(RawCell::ERASED);
        assert_eq!(header, BlockHeader::AVAILABLE);
    }

    #[test]
    fn test_active_header_cell() {
        let cell = BlockHeader::active(7).to_cell();
        assert_eq!(cell, RawCell::new(ACTIVE_STATUS, 7));
        assert_eq!(BlockHeader::from_cell(cell).reclaim_count, 7);
    }

    #[test]
    fn test_reclaim_count_increments_on_wrap_only() {
        let header = BlockHeader::active(3);
        assert_eq!(header.next_reclaim_count(4), 3);
        assert_eq!(header.next_reclaim_count(0), 4);
    }

    #[test]
    fn test_reclaim_count_saturates() {
        let header = BlockHeader::active(u16::MAX);
        assert_eq!(header.next_reclaim_count(0), u16::MAX);
    }

    #[test]
    fn test_unwritten_slot_has_no_record() {
        assert_eq!(Record::from_cell(RawCell::ERASED), None);
        assert_eq!(
            Record::from_cell(RawCell::new(1, 0x1234)),
            Some(Record::new(1, 0x1234))
        );
    }
}
