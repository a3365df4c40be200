//! EEPROM emulation over erase-block non-volatile memory
//!
//! Provides word-sized key/value persistence on a medium that can only be
//! erased in whole blocks and programmed once per cell between erases.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │        EepromEmulation                 │
//! │  - read / write (record reader/writer) │
//! │  - reclaim (pack into next block)      │
//! │  - initialize (boot recovery)          │
//! └──────────────┬─────────────────────────┘
//!                │  BlockHeader / Record
//!                ▼
//! ┌────────────────────────────────────────┐
//! │         BlockDevice                    │
//! │  erase_block / read_cell / program_cell│
//! └────────────────────────────────────────┘
//! ```
//!
//! # Block Layout
//!
//! ```text
//! offset 0       [status: u8 | reclaim count: u16]   header
//! offset 1..S    [key: u8    | value: u16]           slots, filled in order
//! ```
//!
//! A key may appear several times in a block; the highest offset wins.
//! Exactly one block is Active in stable operation. A reclaim copies the live
//! records into the next block in the pool, commits its header, and only then
//! erases the old block, so a power loss at any instant leaves either the old
//! or the new block (or both, resolved at boot) holding the complete data.

mod config;
mod device;
mod engine;
mod error;
mod header;
mod mock;
mod reclaim;
mod recovery;

pub use config::{EepromConfig, ERASED_BYTE, ERASED_WORD};
pub use device::{BlockDevice, RawCell};
pub use engine::{EepromEmulation, WriteOutcome};
pub use error::{ConfigError, EepromError};
pub use header::{BlockHeader, BlockStatus, Record, ACTIVE_STATUS, AVAILABLE_STATUS};
pub use mock::{MockBlockDevice, MockDeviceError};
pub use reclaim::ReclaimReport;
pub use recovery::{RecoveryActions, RecoveryReport};
