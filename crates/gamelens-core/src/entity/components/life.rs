use serde::Serialize;

use crate::context::Context;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::components::{LifeOffsets, VitalStruct};
use crate::remote::RemoteObject;

/// One pool of health, mana or energy shield
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Vital {
    pub total: i32,
    pub current: i32,
    pub reserved_flat: i32,
    pub reserved_percent: i32,
}

impl From<VitalStruct> for Vital {
    fn from(value: VitalStruct) -> Self {
        Self {
            total: value.total,
            current: value.current,
            reserved_flat: value.reserved_flat,
            reserved_percent: value.reserved_percent,
        }
    }
}

impl Vital {
    /// Pool left after flat and percent reservations
    pub fn unreserved(&self) -> i32 {
        let reserved_by_percent = (self.total as i64 * self.reserved_percent as i64 / 10_000) as i32;
        (self.total - self.reserved_flat - reserved_by_percent).max(0)
    }

    /// Current value as a percentage of the unreserved pool
    pub fn current_in_percent(&self) -> i32 {
        let unreserved = self.unreserved();
        if unreserved == 0 {
            return 0;
        }
        (self.current as i64 * 100 / unreserved as i64) as i32
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Life {
    pub(super) owner: u64,
    health: Vital,
    mana: Vital,
    energy_shield: Vital,
}

impl Life {
    pub fn health(&self) -> Vital {
        self.health
    }

    pub fn mana(&self) -> Vital {
        self.mana
    }

    pub fn energy_shield(&self) -> Vital {
        self.energy_shield
    }

    pub fn is_alive(&self) -> bool {
        self.health.current > 0
    }
}

impl RemoteObject for Life {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: LifeOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.health = data.health.into();
        self.mana = data.mana.into();
        self.energy_shield = data.energy_shield.into();
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}
