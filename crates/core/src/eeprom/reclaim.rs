//! Block reclaim (pack)
//!
//! Copies the live record of every key from the active block into the next
//! block of the pool, commits that block, then erases the old one.
//!
//! # Commit Ordering
//!
//! ```text
//! 1. erase next block              old: Active   next: Available (empty)
//! 2. program live records          old: Active   next: Available (filled)
//! 3. program next header = Active  old: Active   next: Active     <- commit
//! 4. erase old block               old: Available next: Active
//! ```
//!
//! A power loss before step 3 leaves the old block as the only Active block.
//! A power loss between steps 3 and 4 leaves two Active blocks holding the
//! same live set; boot recovery keeps the lower index.

use super::config::ERASED_WORD;
use super::device::BlockDevice;
use super::engine::{EepromEmulation, Result};
use super::header::{BlockHeader, Record};

/// Summary of a completed reclaim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Block that was retired
    pub from: u8,
    /// Block that became active
    pub to: u8,
    /// Number of live records copied
    pub records: u16,
    /// Reclaim counter committed in the new header
    pub reclaim_count: u16,
}

impl<D: BlockDevice> EepromEmulation<D> {
    /// Pack the active block into the next block of the pool
    ///
    /// Returns `None` if there is no active block to pack.
    ///
    /// Blocks for up to `capacity` programs, two erases and one header program.
    pub fn reclaim(&mut self) -> Result<Option<ReclaimReport>, D> {
        let Some(from) = self.find_active()? else {
            return Ok(None);
        };
        let to = self.next_block(from);

        self.device.erase_block(to)?;

        // `from` stays the block of record until the header commit below
        let mut offset = 1;
        for key in 0..self.config.capacity {
            let Some(value) = self.read_from(from, key)? else {
                continue;
            };
            if value == ERASED_WORD {
                continue;
            }
            self.device
                .program_cell(to, offset, Record::new(key, value).to_cell())?;
            offset += 1;
        }

        let reclaim_count = self.block_header(from)?.next_reclaim_count(to);
        self.device
            .program_cell(to, 0, BlockHeader::active(reclaim_count).to_cell())?;

        self.device.erase_block(from)?;

        Ok(Some(ReclaimReport {
            from,
            to,
            records: offset - 1,
            reclaim_count,
        }))
    }

    /// Block following `block` in round-robin order
    pub fn next_block(&self, block: u8) -> u8 {
        (block + 1) % self.config.pool_blocks
    }
}
