//! Address-bound decoded objects.
//!
//! A [`Remote`] ties one foreign address to a decoded snapshot. Rebinding to
//! a different non-zero address re-decodes, rebinding to zero resets the
//! snapshot to its defaults.

use std::ops::{Deref, DerefMut};

use crate::context::Context;
use crate::error::Result;

/// Decoding behavior of an object that lives at a foreign address
pub trait RemoteObject {
    /// Re-read the object from `address`.
    ///
    /// Decode failures are absorbed; only broken contracts are returned.
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()>;

    /// Reset every decoded field to its default
    fn cleanup(&mut self);
}

#[derive(Debug, Clone)]
pub struct Remote<T> {
    address: u64,
    force_update: bool,
    inner: T,
}

impl<T: RemoteObject> Remote<T> {
    /// Unbound object that only re-decodes when its address changes
    pub fn unbound(inner: T) -> Self {
        Self {
            address: 0,
            force_update: false,
            inner,
        }
    }

    /// Unbound object that re-decodes on every `set_address`
    pub fn forced(inner: T) -> Self {
        Self {
            address: 0,
            force_update: true,
            inner,
        }
    }

    /// Bind a new forced object to `address` and decode it
    pub fn bind(ctx: &Context, address: u64, inner: T) -> Result<Self> {
        let mut remote = Self::forced(inner);
        remote.set_address(ctx, address)?;
        Ok(remote)
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn is_bound(&self) -> bool {
        self.address != 0
    }

    pub fn set_address(&mut self, ctx: &Context, address: u64) -> Result<()> {
        if address != 0 && address == self.address && !self.force_update {
            return Ok(());
        }

        let has_address_changed = address != self.address;
        self.address = address;
        if address == 0 {
            self.inner.cleanup();
            return Ok(());
        }

        self.inner.update(ctx, address, has_address_changed)
    }

    /// Re-read at the current address without treating it as a change
    pub fn refresh(&mut self, ctx: &Context) -> Result<()> {
        if self.address == 0 {
            return Ok(());
        }
        self.inner.update(ctx, self.address, false)
    }

    pub fn unbind(&mut self) {
        self.address = 0;
        self.inner.cleanup();
    }
}

impl<T> Deref for Remote<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Remote<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}
