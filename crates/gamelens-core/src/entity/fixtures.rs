//! Writes complete entities into mock memory for tests.

use std::collections::HashMap;

use crate::entity::components::ComponentKind;
use crate::memory::MockMemoryBuilder;
use crate::memory::layout::components::{
    BuffsOffsets, ChestOffsets, ChestsStruct, ComponentHeader, LifeOffsets, ModsOffsets,
    PlayerOffsets, PositionedOffsets, RenderOffsets, StatusEffectStruct, TargetableOffsets,
    VitalStruct,
};
use crate::memory::layout::entity::{
    ComponentLookup, ComponentNameAndIndex, EntityDetails, EntityOffsets, ItemStruct,
};
use crate::memory::layout::natives::{BUCKET_EMPTY_FLAG, BUCKET_SLOT_WIDTH, StdBucket, StdVector};

type ComponentWriter = Box<dyn FnOnce(&mut MockMemoryBuilder, u64) -> u64>;

enum Source {
    Written(ComponentKind, ComponentWriter),
    Dangling(i32),
}

pub struct EntityFixture {
    id: u32,
    path: String,
    components: Vec<(String, Source)>,
}

impl EntityFixture {
    pub fn new(id: u32, path: &str) -> Self {
        Self {
            id,
            path: path.to_string(),
            components: Vec::new(),
        }
    }

    /// Add a component; `write` receives the owner address and returns the
    /// component address
    pub fn with(
        mut self,
        kind: ComponentKind,
        write: impl FnOnce(&mut MockMemoryBuilder, u64) -> u64 + 'static,
    ) -> Self {
        self.components
            .push((kind.name().to_string(), Source::Written(kind, Box::new(write))));
        self
    }

    /// Register a name whose index points past the component list
    pub fn with_dangling(mut self, name: &str, index: i32) -> Self {
        self.components
            .push((name.to_string(), Source::Dangling(index)));
        self
    }
}

pub struct WrittenEntity {
    pub address: u64,
    pub components: HashMap<ComponentKind, u64>,
}

pub fn write_entity(builder: &mut MockMemoryBuilder, fixture: EntityFixture) -> WrittenEntity {
    let address = builder.reserve(size_of::<EntityOffsets>());

    let mut pointers = Vec::new();
    let mut entries = Vec::new();
    let mut components = HashMap::new();
    for (name, source) in fixture.components {
        let mut name_bytes = name.into_bytes();
        name_bytes.push(0);
        let name_ptr = builder.alloc(&name_bytes);
        let index = match source {
            Source::Written(kind, write) => {
                let component = write(builder, address);
                components.insert(kind, component);
                pointers.push(component);
                pointers.len() as i32 - 1
            }
            Source::Dangling(index) => index,
        };
        entries.push(ComponentNameAndIndex {
            name_ptr,
            index,
            _pad: 0,
        });
    }

    let pointer_bytes: Vec<u8> = pointers.iter().flat_map(|p| p.to_le_bytes()).collect();
    let first = builder.alloc(&pointer_bytes);
    let component_list = StdVector {
        first,
        last: first + pointer_bytes.len() as u64,
        end: first + pointer_bytes.len() as u64,
    };

    let lookup = ComponentLookup {
        components_name_and_index: write_bucket(builder, &entries),
    };
    let component_lookup_ptr = builder.alloc_pod(&lookup);
    let name = builder.wide_string(&fixture.path);
    let details = builder.alloc_pod(&EntityDetails {
        name,
        component_lookup_ptr,
    });

    builder.write_pod(
        address,
        &EntityOffsets {
            vtable: 0,
            item_base: ItemStruct {
                entity_details_ptr: details,
                component_list,
            },
            id: fixture.id,
            is_valid: 1,
            _pad: [0; 3],
        },
    );

    WrittenEntity {
        address,
        components,
    }
}

fn write_bucket(builder: &mut MockMemoryBuilder, entries: &[ComponentNameAndIndex]) -> StdBucket {
    let slots = entries.len().div_ceil(BUCKET_SLOT_WIDTH).max(1);
    let mut bytes = Vec::new();
    for slot in 0..slots {
        let chunk = entries
            .iter()
            .skip(slot * BUCKET_SLOT_WIDTH)
            .take(BUCKET_SLOT_WIDTH)
            .collect::<Vec<_>>();
        for i in 0..BUCKET_SLOT_WIDTH {
            bytes.push(if i < chunk.len() { 0 } else { BUCKET_EMPTY_FLAG });
        }
        for i in 0..BUCKET_SLOT_WIDTH {
            let entry = chunk.get(i).map(|e| **e).unwrap_or_default();
            bytes.extend_from_slice(bytemuck::bytes_of(&entry));
        }
    }
    StdBucket {
        data: builder.alloc(&bytes),
        capacity: (slots * BUCKET_SLOT_WIDTH) as i64 - 1,
    }
}

fn header(owner: u64) -> ComponentHeader {
    ComponentHeader {
        vtable: 0,
        owner_entity: owner,
    }
}

pub fn header_only(builder: &mut MockMemoryBuilder, owner: u64) -> u64 {
    builder.alloc_pod(&header(owner))
}

pub fn render(builder: &mut MockMemoryBuilder, owner: u64, x: f32, y: f32) -> u64 {
    builder.alloc_pod(&RenderOffsets {
        header: header(owner),
        grid_position: [x, y],
        ..Default::default()
    })
}

pub fn life(builder: &mut MockMemoryBuilder, owner: u64, health: i32) -> u64 {
    builder.alloc_pod(&LifeOffsets {
        header: header(owner),
        health: VitalStruct {
            total: 100,
            current: health,
            ..Default::default()
        },
        ..Default::default()
    })
}

pub fn positioned(builder: &mut MockMemoryBuilder, owner: u64, reaction: u8) -> u64 {
    builder.alloc_pod(&PositionedOffsets {
        header: header(owner),
        reaction,
        ..Default::default()
    })
}

pub fn targetable(builder: &mut MockMemoryBuilder, owner: u64, is_targetable: bool) -> u64 {
    builder.alloc_pod(&TargetableOffsets {
        header: header(owner),
        is_targetable: is_targetable as u8,
        ..Default::default()
    })
}

pub fn magic_properties(builder: &mut MockMemoryBuilder, owner: u64) -> u64 {
    builder.alloc_pod(&ModsOffsets {
        header: header(owner),
        ..Default::default()
    })
}

pub fn chest(
    builder: &mut MockMemoryBuilder,
    owner: u64,
    is_opened: bool,
    is_strongbox: bool,
    is_label_visible: bool,
) -> u64 {
    let details = builder.alloc_pod(&ChestsStruct {
        is_label_visible: is_label_visible as u8,
        strongbox_dat_ptr: if is_strongbox { 0x1234 } else { 0 },
        ..Default::default()
    });
    builder.alloc_pod(&ChestOffsets {
        header: header(owner),
        chests_data_ptr: details,
        is_opened: is_opened as u8,
        ..Default::default()
    })
}

pub fn player(builder: &mut MockMemoryBuilder, owner: u64, name: &str) -> u64 {
    let name = builder.wide_string(name);
    builder.alloc_pod(&PlayerOffsets {
        header: header(owner),
        name,
    })
}

pub fn buffs(builder: &mut MockMemoryBuilder, owner: u64, names: &[&str]) -> u64 {
    let mut pointers = Vec::new();
    for name in names {
        let text = builder.alloc_unicode(name);
        let row = builder.alloc(&text.to_le_bytes());
        let effect = builder.alloc_pod(&StatusEffectStruct {
            buff_definition_ptr: row,
            ..Default::default()
        });
        pointers.extend_from_slice(&effect.to_le_bytes());
    }
    let first = if pointers.is_empty() {
        0
    } else {
        builder.alloc(&pointers)
    };
    builder.alloc_pod(&BuffsOffsets {
        header: header(owner),
        status_effect_ptr: StdVector {
            first,
            last: first + pointers.len() as u64,
            end: first + pointers.len() as u64,
        },
    })
}
