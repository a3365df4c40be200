//! Boot recovery
//!
//! Brings the pool back to exactly one active block after any restart,
//! including a restart in the middle of a reclaim.

use bitflags::bitflags;

use super::device::BlockDevice;
use super::engine::{EepromEmulation, Result};
use super::header::{BlockHeader, BlockStatus};

bitflags! {
    /// Repairs performed by [`EepromEmulation::initialize`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecoveryActions: u8 {
        /// A second Active block (interrupted reclaim) was erased
        const DUPLICATE_ACTIVE_ERASED = 0b0000_0001;
        /// A block with an unknown status byte was erased
        const CORRUPT_ERASED = 0b0000_0010;
        /// No active block existed; block 0 was formatted
        const BOOTSTRAPPED = 0b0000_0100;
        /// The active block was nearly full and got packed
        const PACKED = 0b0000_1000;
    }
}

/// Summary of boot recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Block serving reads and writes after recovery
    pub active: u8,
    /// Repairs performed
    pub actions: RecoveryActions,
    /// Number of blocks erased by the status scan
    pub erased_blocks: u8,
}

impl<D: BlockDevice> EepromEmulation<D> {
    /// Recover a consistent pool
    ///
    /// Must run once before any read or write. Idempotent: running it on an
    /// already consistent pool changes nothing unless the active block is
    /// below the reclaim threshold.
    ///
    /// # Recovery Steps
    ///
    /// 1. Keep the lowest-index Active block, erase any other Active block,
    ///    erase any block whose status is neither Active nor Available
    /// 2. If no block is Active, erase block 0 and commit it as Active with a
    ///    zero reclaim counter
    /// 3. If the active block has fewer free slots than the threshold, pack it
    pub fn initialize(&mut self) -> Result<RecoveryReport, D> {
        let mut actions = RecoveryActions::empty();
        let mut erased_blocks = 0;
        let mut active = None;

        for block in 0..self.config.pool_blocks {
            match self.block_header(block)?.status {
                BlockStatus::Active if active.is_none() => active = Some(block),
                BlockStatus::Active => {
                    self.device.erase_block(block)?;
                    actions |= RecoveryActions::DUPLICATE_ACTIVE_ERASED;
                    erased_blocks += 1;
                }
                BlockStatus::Available => {}
                BlockStatus::Invalid(_) => {
                    self.device.erase_block(block)?;
                    actions |= RecoveryActions::CORRUPT_ERASED;
                    erased_blocks += 1;
                }
            }
        }

        let mut active = match active {
            Some(block) => block,
            None => {
                self.device.erase_block(0)?;
                self.device
                    .program_cell(0, 0, BlockHeader::active(0).to_cell())?;
                actions |= RecoveryActions::BOOTSTRAPPED;
                0
            }
        };

        if self.free_slots(active)? < self.config.reclaim_threshold {
            if let Some(report) = self.reclaim()? {
                active = report.to;
                actions |= RecoveryActions::PACKED;
            }
        }

        Ok(RecoveryReport {
            active,
            actions,
            erased_blocks,
        })
    }
}
