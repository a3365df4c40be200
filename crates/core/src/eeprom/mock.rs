//! Mock block device for host testing
//!
//! Always available (no feature gate) so downstream crates can test their
//! storage code without flash hardware.

use core::fmt;

use super::device::{BlockDevice, RawCell};

/// Errors reported by [`MockBlockDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDeviceError {
    /// Simulated power loss; every operation fails until power is restored
    PowerLost,
    /// Block or offset outside the device
    OutOfBounds,
    /// Program attempted on a cell that is not erased
    AlreadyProgrammed,
}

impl fmt::Display for MockDeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockDeviceError::PowerLost => write!(f, "power lost"),
            MockDeviceError::OutOfBounds => write!(f, "address out of bounds"),
            MockDeviceError::AlreadyProgrammed => write!(f, "cell already programmed"),
        }
    }
}

/// In-memory block device
///
/// `BLOCKS` blocks of `CELLS` cells each, at most 255 blocks of 65535 cells
/// (checked at compile time). Supports:
/// - Erase and program counting for wear leveling validation
/// - Strict program-once semantics (programming a written cell is an error)
/// - Power-loss injection after a chosen number of mutations
/// - Direct cell injection for corruption and crash-state tests
///
/// # Example
///
/// ```
/// use canpower_core::eeprom::{BlockDevice, MockBlockDevice, RawCell};
///
/// let mut device = MockBlockDevice::<2, 4>::new();
/// device.program_cell(0, 1, RawCell::new(1, 0x1234)).unwrap();
/// assert_eq!(device.read_cell(0, 1).unwrap(), RawCell::new(1, 0x1234));
///
/// // the next mutation is lost
/// device.power_loss_after(0);
/// assert!(device.erase_block(0).is_err());
/// device.restore_power();
/// assert_eq!(device.read_cell(0, 1).unwrap(), RawCell::new(1, 0x1234));
/// ```
#[derive(Debug, Clone)]
pub struct MockBlockDevice<const BLOCKS: usize, const CELLS: usize> {
    cells: [[RawCell; CELLS]; BLOCKS],
    erase_counts: [u32; BLOCKS],
    programs: u32,
    mutations_left: Option<u32>,
    powered: bool,
}

impl<const BLOCKS: usize, const CELLS: usize> MockBlockDevice<BLOCKS, CELLS> {
    /// Geometry must fit the `u8` block and `u16` offset addressing
    const GEOMETRY_FITS: () = assert!(
        BLOCKS <= u8::MAX as usize && CELLS <= u16::MAX as usize,
        "mock geometry exceeds u8 blocks / u16 cells"
    );

    /// Create a fully erased device
    pub const fn new() -> Self {
        let () = Self::GEOMETRY_FITS;
        Self {
            cells: [[RawCell::ERASED; CELLS]; BLOCKS],
            erase_counts: [0; BLOCKS],
            programs: 0,
            mutations_left: None,
            powered: true,
        }
    }

    /// Cut power after `mutations` more successful erases or programs
    ///
    /// The mutation after that fails without effect and the device stays
    /// unpowered until [`Self::restore_power`].
    pub fn power_loss_after(&mut self, mutations: u32) {
        self.mutations_left = Some(mutations);
    }

    /// Power the device back up (a reboot)
    pub fn restore_power(&mut self) {
        self.mutations_left = None;
        self.powered = true;
    }

    /// True while power is cut
    pub fn is_power_lost(&self) -> bool {
        !self.powered
    }

    /// Overwrite a cell directly, bypassing program-once semantics
    pub fn set_cell(&mut self, block: u8, offset: u16, cell: RawCell) {
        self.cells[block as usize][offset as usize] = cell;
    }

    /// Inspect a cell directly
    pub fn cell(&self, block: u8, offset: u16) -> RawCell {
        self.cells[block as usize][offset as usize]
    }

    /// Number of times `block` has been erased
    pub fn erase_count(&self, block: u8) -> u32 {
        self.erase_counts[block as usize]
    }

    /// Erases across all blocks
    pub fn total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Successful cell programs
    pub fn program_count(&self) -> u32 {
        self.programs
    }

    /// Successful erases plus programs
    pub fn mutation_count(&self) -> u32 {
        self.total_erase_count() + self.programs
    }

    fn check_power(&self) -> Result<(), MockDeviceError> {
        if self.powered {
            Ok(())
        } else {
            Err(MockDeviceError::PowerLost)
        }
    }

    fn check_bounds(&self, block: u8, offset: u16) -> Result<(), MockDeviceError> {
        if (block as usize) < BLOCKS && (offset as usize) < CELLS {
            Ok(())
        } else {
            Err(MockDeviceError::OutOfBounds)
        }
    }

    /// Consume one mutation from the power-loss budget
    fn begin_mutation(&mut self) -> Result<(), MockDeviceError> {
        self.check_power()?;
        match self.mutations_left {
            Some(0) => {
                self.powered = false;
                Err(MockDeviceError::PowerLost)
            }
            Some(ref mut left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<const BLOCKS: usize, const CELLS: usize> Default for MockBlockDevice<BLOCKS, CELLS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BLOCKS: usize, const CELLS: usize> BlockDevice for MockBlockDevice<BLOCKS, CELLS> {
    type Error = MockDeviceError;

    fn block_count(&self) -> u8 {
        BLOCKS as u8
    }

    fn cells_per_block(&self) -> u16 {
        CELLS as u16
    }

    fn erase_block(&mut self, block: u8) -> Result<(), Self::Error> {
        self.check_bounds(block, 0)?;
        self.begin_mutation()?;

        self.cells[block as usize] = [RawCell::ERASED; CELLS];
        self.erase_counts[block as usize] += 1;
        Ok(())
    }

    fn read_cell(&mut self, block: u8, offset: u16) -> Result<RawCell, Self::Error> {
        self.check_power()?;
        self.check_bounds(block, offset)?;
        Ok(self.cells[block as usize][offset as usize])
    }

    fn program_cell(&mut self, block: u8, offset: u16, cell: RawCell) -> Result<(), Self::Error> {
        self.check_bounds(block, offset)?;
        if self.cells[block as usize][offset as usize] != RawCell::ERASED {
            return Err(MockDeviceError::AlreadyProgrammed);
        }
        self.begin_mutation()?;

        self.cells[block as usize][offset as usize] = cell;
        self.programs += 1;
        Ok(())
    }
}
