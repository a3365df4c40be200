//! Channel 0 Parameter Definitions
//!
//! Channel 0 is the switchable output. Its mode and modulation level are
//! persisted immediately before the controller powers down and restored at
//! the next power up.
//!
//! # Parameters
//!
//! - key `0` - Switch mode (`SwitchMode`)
//! - key `1` - Modulation level (`ModulatedLevel`)

use crate::platform::traits::FlashInterface;
use crate::storage::PersistentStore;

/// Store key of the switch mode
pub const MODE_KEY: u8 = 0;

/// Store key of the modulation level
pub const MODULATION_LEVEL_KEY: u8 = 1;

/// Number of keys the application persists (the store capacity)
pub const KEY_COUNT: u8 = 2;

/// Channel 0 switching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchMode {
    /// PWM at the selected modulation level
    #[default]
    Modulated = 0,
    /// Always fully on
    Unmodulated = 1,
}

impl SwitchMode {
    /// Decode a stored value, `None` if out of range
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(SwitchMode::Modulated),
            1 => Some(SwitchMode::Unmodulated),
            _ => None,
        }
    }

    /// The other mode (long button press)
    pub fn toggled(self) -> Self {
        match self {
            SwitchMode::Modulated => SwitchMode::Unmodulated,
            SwitchMode::Unmodulated => SwitchMode::Modulated,
        }
    }
}

/// Channel 0 power level in modulated mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModulatedLevel {
    #[default]
    Off = 0,
    Quarter = 1,
    Half = 2,
    ThreeQuarter = 3,
    Maximum = 4,
}

impl ModulatedLevel {
    /// Decode a stored value, `None` if out of range
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(ModulatedLevel::Off),
            1 => Some(ModulatedLevel::Quarter),
            2 => Some(ModulatedLevel::Half),
            3 => Some(ModulatedLevel::ThreeQuarter),
            4 => Some(ModulatedLevel::Maximum),
            _ => None,
        }
    }

    /// Next level, wrapping from `Maximum` to `Off` (short button press)
    pub fn next(self) -> Self {
        match self {
            ModulatedLevel::Off => ModulatedLevel::Quarter,
            ModulatedLevel::Quarter => ModulatedLevel::Half,
            ModulatedLevel::Half => ModulatedLevel::ThreeQuarter,
            ModulatedLevel::ThreeQuarter => ModulatedLevel::Maximum,
            ModulatedLevel::Maximum => ModulatedLevel::Off,
        }
    }
}

/// Persisted channel 0 settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelParams {
    pub mode: SwitchMode,
    pub level: ModulatedLevel,
}

impl ChannelParams {
    /// Load from the store
    ///
    /// Never-written or out-of-range values fall back to `Modulated` / `Off`.
    pub fn load<F: FlashInterface>(store: &mut PersistentStore<F>) -> Self {
        Self {
            mode: SwitchMode::from_u16(store.read(MODE_KEY)).unwrap_or_default(),
            level: ModulatedLevel::from_u16(store.read(MODULATION_LEVEL_KEY)).unwrap_or_default(),
        }
    }

    /// Save to the store
    ///
    /// Values already stored are not rewritten.
    pub fn save<F: FlashInterface>(&self, store: &mut PersistentStore<F>) {
        store.write(MODE_KEY, self.mode as u16);
        store.write(MODULATION_LEVEL_KEY, self.level as u16);
    }

    /// Level change only applies while modulated
    pub fn cycle_level(&mut self) {
        if self.mode == SwitchMode::Modulated {
            self.level = self.level.next();
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }
}
