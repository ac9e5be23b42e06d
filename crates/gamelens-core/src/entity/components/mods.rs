use crate::context::Context;
use crate::entity::enums::Rarity;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::components::{ModArrayStruct, ModsOffsets};
use crate::memory::layout::natives::StdVector;
use crate::remote::RemoteObject;

/// First two numeric values of a mod, `NaN` where absent
pub type ModValues = (f32, f32);

fn mod_values(ctx: &Context, values: &StdVector, value0: i32) -> ModValues {
    match values.total_elements(4) {
        0 => (f32::NAN, f32::NAN),
        1 => (value0 as f32, f32::NAN),
        _ => match ctx.reader().read_std_vector::<i32>(values).as_slice() {
            [first, second, ..] => (*first as f32, *second as f32),
            _ => (f32::NAN, f32::NAN),
        },
    }
}

fn append_mods(ctx: &Context, target: &mut Vec<(String, ModValues)>, list: &StdVector) {
    let mods: Vec<ModArrayStruct> = ctx.reader().read_std_vector(list);
    target.extend(
        mods.iter()
            .filter(|m| m.mods_ptr != 0)
            .map(|m| {
                let name = ctx.data_row_name(m.mods_ptr).unwrap_or_default();
                (name, mod_values(ctx, &m.values, m.value0))
            }),
    );
}

/// Rarity and every mod of a monster or ground item, in one flat list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectMagicProperties {
    pub(super) owner: u64,
    rarity: Rarity,
    mods: Vec<(String, ModValues)>,
}

impl ObjectMagicProperties {
    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn mods(&self) -> &[(String, ModValues)] {
        &self.mods
    }
}

impl RemoteObject for ObjectMagicProperties {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let data: ModsOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.rarity = Rarity::from_i32(data.details.rarity);
        if has_address_changed {
            let all = &data.details.mods;
            self.mods.clear();
            for list in [
                &all.implicit_mods,
                &all.explicit_mods,
                &all.enchant_mods,
                &all.hellscape_mods,
                &all.crucible_mods,
            ] {
                append_mods(ctx, &mut self.mods, list);
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

/// Item mods split by origin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mods {
    pub(super) owner: u64,
    rarity: Rarity,
    implicit: Vec<(String, ModValues)>,
    explicit: Vec<(String, ModValues)>,
    enchant: Vec<(String, ModValues)>,
    hellscape: Vec<(String, ModValues)>,
}

impl Mods {
    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn implicit(&self) -> &[(String, ModValues)] {
        &self.implicit
    }

    pub fn explicit(&self) -> &[(String, ModValues)] {
        &self.explicit
    }

    pub fn enchant(&self) -> &[(String, ModValues)] {
        &self.enchant
    }

    /// Hellscape and crucible mods share this list
    pub fn hellscape(&self) -> &[(String, ModValues)] {
        &self.hellscape
    }
}

impl RemoteObject for Mods {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let data: ModsOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.rarity = Rarity::from_i32(data.details.rarity);
        if has_address_changed {
            let all = &data.details.mods;
            self.implicit.clear();
            self.explicit.clear();
            self.enchant.clear();
            self.hellscape.clear();
            append_mods(ctx, &mut self.implicit, &all.implicit_mods);
            append_mods(ctx, &mut self.explicit, &all.explicit_mods);
            append_mods(ctx, &mut self.enchant, &all.enchant_mods);
            append_mods(ctx, &mut self.hellscape, &all.hellscape_mods);
            append_mods(ctx, &mut self.hellscape, &all.crucible_mods);
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}
