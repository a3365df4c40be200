//! Persistent settings storage
//!
//! EEPROM emulation on top of on-chip Flash:
//!
//! - [`FlashBlockDevice`]: maps engine cells onto a Flash region
//! - [`PersistentStore`]: infallible read/write facade used by the firmware
//! - [`SharedStore`]: the same facade behind a blocking mutex

pub mod flash_device;
pub mod shared;
pub mod store;

pub use flash_device::{FlashBlockDevice, EEPROM_BASE, EEPROM_BLOCK_COUNT};
pub use shared::SharedStore;
pub use store::{PersistentStore, StoreStats};
