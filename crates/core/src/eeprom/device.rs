//! Block primitive interface
//!
//! This module defines the medium interface the emulation engine runs on.

use super::config::{ERASED_BYTE, ERASED_WORD};

/// One programmable cell of a block
///
/// A cell holds a tag byte and a data word. The header cell stores the block
/// status in `tag` and the reclaim counter in `data`; slot cells store the key
/// in `tag` and the value in `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCell {
    /// Status byte (header) or key byte (slot)
    pub tag: u8,
    /// Reclaim counter (header) or value (slot)
    pub data: u16,
}

impl RawCell {
    /// Cell contents after erase
    pub const ERASED: Self = Self {
        tag: ERASED_BYTE,
        data: ERASED_WORD,
    };

    /// Create a cell from its tag byte and data word
    pub const fn new(tag: u8, data: u16) -> Self {
        Self { tag, data }
    }

    /// True when the tag byte still holds the erased pattern
    ///
    /// Slots are considered unwritten based on the tag alone, so a record
    /// whose value happens to equal the erased word still occupies its slot.
    pub const fn is_unwritten(&self) -> bool {
        self.tag == ERASED_BYTE
    }
}

/// Block primitive interface
///
/// Implementations expose a pool of equally sized, separately erasable
/// blocks addressed by index, each made of `cells_per_block()` cells.
///
/// # Medium Characteristics
///
/// - Erase sets every cell of a block to [`RawCell::ERASED`]
/// - Programming can only move erased bits to their final value; a cell is
///   programmed at most once between erases
/// - Both mutations are blocking and may stall the caller for milliseconds
///
/// # Safety Invariants
///
/// - Only one owner per device (no concurrent access)
/// - The engine never programs a cell it has not observed as unwritten
pub trait BlockDevice {
    /// Error reported by the underlying medium
    type Error: core::fmt::Debug;

    /// Number of blocks available to the engine
    fn block_count(&self) -> u8;

    /// Number of cells per block, header included
    fn cells_per_block(&self) -> u16;

    /// Erase a whole block
    ///
    /// Erasing an already erased block must leave it observably unchanged.
    fn erase_block(&mut self, block: u8) -> Result<(), Self::Error>;

    /// Read the cell at `offset` within `block`
    fn read_cell(&mut self, block: u8, offset: u16) -> Result<RawCell, Self::Error>;

    /// Program the cell at `offset` within `block`
    ///
    /// The cell must be erased; programming a written cell is undefined on
    /// real flash.
    fn program_cell(&mut self, block: u8, offset: u16, cell: RawCell) -> Result<(), Self::Error>;
}

impl<D: BlockDevice + ?Sized> BlockDevice for &mut D {
    type Error = D::Error;

    fn block_count(&self) -> u8 {
        (**self).block_count()
    }

    fn cells_per_block(&self) -> u16 {
        (**self).cells_per_block()
    }

    fn erase_block(&mut self, block: u8) -> Result<(), Self::Error> {
        (**self).erase_block(block)
    }

    fn read_cell(&mut self, block: u8, offset: u16) -> Result<RawCell, Self::Error> {
        (**self).read_cell(block, offset)
    }

    fn program_cell(&mut self, block: u8, offset: u16, cell: RawCell) -> Result<(), Self::Error> {
        (**self).program_cell(block, offset, cell)
    }
}
