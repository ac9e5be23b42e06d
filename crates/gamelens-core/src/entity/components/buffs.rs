use std::collections::HashMap;

use serde::Serialize;

use crate::context::Context;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::components::{BuffsOffsets, StatusEffectStruct};
use crate::remote::RemoteObject;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusEffect {
    pub total_time: f32,
    pub time_left: f32,
    pub source_entity_id: u32,
    pub charges: u16,
}

impl From<StatusEffectStruct> for StatusEffect {
    fn from(value: StatusEffectStruct) -> Self {
        Self {
            total_time: value.total_time,
            time_left: value.time_left,
            source_entity_id: value.source_entity_id,
            charges: value.charges,
        }
    }
}

/// Active status effects keyed by buff name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buffs {
    pub(super) owner: u64,
    status_effects: HashMap<String, StatusEffect>,
}

impl Buffs {
    pub fn has(&self, name: &str) -> bool {
        self.status_effects.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&StatusEffect> {
        self.status_effects.get(name)
    }

    pub fn status_effects(&self) -> &HashMap<String, StatusEffect> {
        &self.status_effects
    }
}

impl RemoteObject for Buffs {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let reader = ctx.reader();
        let data: BuffsOffsets = reader.read_value(address);
        self.owner = data.header.owner_entity;
        self.status_effects.clear();
        let effects: Vec<u64> = reader.read_std_vector(&data.status_effect_ptr);
        for effect_address in effects {
            let Some(effect) = reader.try_read_value::<StatusEffectStruct>(effect_address) else {
                continue;
            };
            let Some(name) = ctx.data_row_name(effect.buff_definition_ptr) else {
                continue;
            };
            // a buff applied twice keeps the later entry
            self.status_effects.insert(name, effect.into());
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context_for;
    use crate::memory::MockMemoryBuilder;
    use crate::memory::layout::components::ComponentHeader;
    use crate::memory::layout::natives::StdVector;
    use crate::remote::Remote;

    fn buff_row(builder: &mut MockMemoryBuilder, name: &str) -> u64 {
        let text = builder.alloc_unicode(name);
        builder.alloc(&text.to_le_bytes())
    }

    #[test]
    fn test_buffs_by_name() {
        let mut builder = MockMemoryBuilder::new();
        let frozen = buff_row(&mut builder, "frozen_in_time");
        let hidden = buff_row(&mut builder, "hidden_monster");

        let first = builder.alloc_pod(&StatusEffectStruct {
            buff_definition_ptr: frozen,
            total_time: 10.0,
            time_left: 4.0,
            charges: 2,
            ..Default::default()
        });
        let second = builder.alloc_pod(&StatusEffectStruct {
            buff_definition_ptr: hidden,
            ..Default::default()
        });
        let orphan = builder.alloc_pod(&StatusEffectStruct::default());

        let mut pointers = Vec::new();
        for p in [first, second, orphan] {
            pointers.extend_from_slice(&p.to_le_bytes());
        }
        let list = builder.alloc(&pointers);
        let address = builder.alloc_pod(&BuffsOffsets {
            header: ComponentHeader {
                vtable: 0,
                owner_entity: 0x7000,
            },
            status_effect_ptr: StdVector {
                first: list,
                last: list + 24,
                end: list + 24,
            },
        });
        let ctx = context_for(builder.build());

        let buffs = Remote::bind(&ctx, address, Buffs::default()).unwrap();
        assert_eq!(buffs.owner, 0x7000);
        assert_eq!(buffs.status_effects().len(), 2);
        assert!(buffs.has("frozen_in_time"));
        assert!(buffs.has("hidden_monster"));
        assert!(!buffs.has("legion_reward_display"));
        let effect = buffs.get("frozen_in_time").unwrap();
        assert_eq!(effect.time_left, 4.0);
        assert_eq!(effect.charges, 2);
    }

    #[test]
    fn test_unnamed_buff_is_skipped() {
        let mut builder = MockMemoryBuilder::new();
        let blank = builder.reserve(32);
        let row = builder.alloc(&blank.to_le_bytes());
        let effect = builder.alloc_pod(&StatusEffectStruct {
            buff_definition_ptr: row,
            ..Default::default()
        });
        let list = builder.alloc(&effect.to_le_bytes());
        let address = builder.alloc_pod(&BuffsOffsets {
            header: ComponentHeader::default(),
            status_effect_ptr: StdVector {
                first: list,
                last: list + 8,
                end: list + 8,
            },
        });
        let ctx = context_for(builder.build());

        let buffs = Remote::bind(&ctx, address, Buffs::default()).unwrap();
        assert!(buffs.status_effects().is_empty());
        assert!(!buffs.has(""));
        assert!(!ctx.strings().contains(row));
    }
}
