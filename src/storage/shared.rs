//! Mutex-guarded store for multiple callers
//!
//! A single lock around the whole store. Reads, writes, and the reclaims a
//! write may trigger never interleave.
//!
//! Use `CriticalSectionRawMutex` on target and `NoopRawMutex` in host tests.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::store::{PersistentStore, StoreStats};
use crate::platform::traits::FlashInterface;

/// Shared [`PersistentStore`]
pub struct SharedStore<M: RawMutex, F: FlashInterface> {
    inner: Mutex<M, RefCell<PersistentStore<F>>>,
}

impl<M: RawMutex, F: FlashInterface> SharedStore<M, F> {
    /// Wrap `store`
    pub const fn new(store: PersistentStore<F>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut PersistentStore<F>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// See [`PersistentStore::initialize_store`]
    pub fn initialize_store(&self) {
        self.with(|store| store.initialize_store())
    }

    /// See [`PersistentStore::read`]
    pub fn read(&self, key: u8) -> u16 {
        self.with(|store| store.read(key))
    }

    /// See [`PersistentStore::write`]
    pub fn write(&self, key: u8, value: u16) {
        self.with(|store| store.write(key, value))
    }

    /// See [`PersistentStore::stats`]
    pub fn stats(&self) -> StoreStats {
        self.with(|store| store.stats())
    }

    /// Release the store
    pub fn into_inner(self) -> PersistentStore<F> {
        self.inner.into_inner().into_inner()
    }
}
