use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{Error, Result};

/// Objects decoded from foreign memory, keyed by the address they live at.
///
/// Construction is idempotent per address: the first value installed for an
/// address is the one every caller sees until the cache is cleared.
pub struct AddressCache<T> {
    entries: DashMap<u64, Arc<T>>,
}

impl<T> Default for AddressCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> AddressCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value cached for `address`, creating it with `factory` if
    /// absent. Zero is never a valid key.
    ///
    /// The factory runs outside of any shard lock and may therefore run more
    /// than once under contention; only one result is retained.
    pub fn get_or_create<F>(&self, address: u64, factory: F) -> Result<Arc<T>>
    where
        F: FnOnce(u64) -> T,
    {
        if address == 0 {
            return Err(Error::InvalidAddress(address));
        }

        if let Some(existing) = self.entries.get(&address) {
            return Ok(Arc::clone(existing.value()));
        }

        let created = Arc::new(factory(address));
        let stored = self.entries.entry(address).or_insert(created);
        Ok(Arc::clone(stored.value()))
    }

    pub fn get(&self, address: u64) -> Option<Arc<T>> {
        self.entries
            .get(&address)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, address: u64) -> bool {
        self.entries.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        debug!("Clearing address cache with {} entries", self.entries.len());
        self.entries.clear();
    }

    /// Snapshot of every entry, sorted by address
    pub fn entries(&self) -> Vec<(u64, Arc<T>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        entries.sort_by_key(|(address, _)| *address);
        entries
    }
}
