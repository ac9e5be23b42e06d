use std::collections::HashMap;

use tracing::{trace, warn};

use crate::area::GridPoint;
use crate::context::{Context, PlayerView};
use crate::entity::components::{Component, ComponentKind, ComponentView, Render};
use crate::entity::enums::{EntityState, EntitySubtype, EntityType};
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::entity::{
    ComponentLookup, ComponentNameAndIndex, EntityDetails, EntityOffsets, ItemStruct,
};
use crate::remote::{Remote, RemoteObject};

/// One awake entity of the current area
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub(super) path: String,
    pub(super) id: u32,
    pub(super) is_valid: bool,
    pub(super) nearby: bool,
    pub(super) entity_type: EntityType,
    pub(super) entity_subtype: EntitySubtype,
    pub(super) entity_state: EntityState,
    component_addresses: HashMap<String, u64>,
    components: HashMap<ComponentKind, Remote<Component>>,
}

impl Entity {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Mark the entity unconfirmed until the next successful decode
    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }

    pub fn is_nearby(&self) -> bool {
        self.is_valid && self.nearby
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn entity_subtype(&self) -> EntitySubtype {
        self.entity_subtype
    }

    pub fn entity_state(&self) -> EntityState {
        self.entity_state
    }

    /// Component name to address, as registered by the game
    pub fn component_addresses(&self) -> &HashMap<String, u64> {
        &self.component_addresses
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.component_addresses.contains_key(name)
    }

    /// Kinds decoded so far
    pub fn loaded_components(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    /// Already decoded component of type `T`
    pub fn get<T: ComponentView>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(|c| T::view(c))
    }

    /// Decode component `T` on first use and return it
    pub fn load<T: ComponentView>(&mut self, ctx: &Context) -> Option<&T> {
        if !self.ensure(ctx, T::KIND) {
            return None;
        }
        self.get::<T>()
    }

    /// Make sure `kind` is decoded; false when the entity does not have it
    pub(super) fn ensure(&mut self, ctx: &Context, kind: ComponentKind) -> bool {
        if self.components.contains_key(&kind) {
            return true;
        }
        let address = match self.component_addresses.get(kind.name()) {
            Some(&address) if address != 0 => address,
            _ => return false,
        };
        match Remote::bind(ctx, address, Component::new(kind)) {
            Ok(component) => {
                self.components.insert(kind, component);
                true
            }
            Err(e) => {
                warn!("Failed to decode {} of {}: {}", kind, self.path, e);
                false
            }
        }
    }

    pub fn grid_position(&self) -> Option<GridPoint> {
        self.get::<Render>().map(Render::grid_position)
    }

    /// Integer grid distance, 0 when either side has no position
    pub fn distance_to(&self, other: &Entity) -> i32 {
        match (self.grid_position(), other.grid_position()) {
            (Some(a), Some(b)) => a.distance_to(b),
            _ => 0,
        }
    }

    pub fn update_nearby(&mut self, player: &PlayerView, radius: i32) {
        self.nearby = self.entity_state != EntityState::Useless
            && player.distance_to(self.grid_position()) < radius;
    }

    /// Entities that may vanish from the awake list for good
    pub fn can_explode_or_be_removed(&self) -> bool {
        self.entity_state == EntityState::Useless
            || (self.entity_type == EntityType::Monster
                && self.entity_state != EntityState::LegionStage1Dead)
            || self.entity_type == EntityType::PoiMonster
    }

    /// Rebuild or refresh the component map; false when a cached component
    /// no longer belongs to this entity
    fn update_components(
        &mut self,
        ctx: &Context,
        address: u64,
        item: &ItemStruct,
        has_address_changed: bool,
    ) -> bool {
        if !has_address_changed {
            for (kind, component) in self.components.iter_mut() {
                if let Err(e) = component.refresh(ctx) {
                    warn!("Failed to refresh {} of {}: {}", kind, self.path, e);
                }
                if component.owner_entity() != address {
                    trace!("{} of entity {} moved, rebuilding", kind, self.id);
                    return false;
                }
            }
            return true;
        }

        self.component_addresses.clear();
        self.components.clear();

        let reader = ctx.reader();
        let pointers: Vec<u64> = reader.read_std_vector(&item.component_list);
        let details: EntityDetails = reader.read_value(item.entity_details_ptr);
        self.path = reader.read_wide_string(&details.name);
        let lookup: ComponentLookup = reader.read_value(details.component_lookup_ptr);
        let entries: Vec<ComponentNameAndIndex> =
            reader.read_std_bucket(&lookup.components_name_and_index);
        for entry in entries {
            let Some(&component) = usize::try_from(entry.index)
                .ok()
                .and_then(|index| pointers.get(index))
            else {
                continue;
            };
            let name = reader.read_narrow_string(entry.name_ptr);
            if !name.is_empty() {
                self.component_addresses.entry(name).or_insert(component);
            }
        }
        true
    }
}

impl RemoteObject for Entity {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let data: EntityOffsets = ctx.reader().read_value(address);
        self.is_valid = data.is_valid_entity();
        if !self.is_valid {
            return Ok(());
        }
        self.id = data.id;
        if self.entity_state == EntityState::Useless {
            return Ok(());
        }

        if !self.update_components(ctx, address, &data.item_base, has_address_changed) {
            self.update_components(ctx, address, &data.item_base, true);
        }
        self.classify(ctx)
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}
