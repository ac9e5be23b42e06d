//! Serializable snapshots of decoded state, for dumps and debugging.

use std::fmt::Display;

use serde::Serialize;

use crate::area::{AreaInstance, DisappearingEntities};
use crate::cache::AddressCache;
use crate::entity::{Entity, EntityNodeKey, EntityState, EntitySubtype, EntityType};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub key: EntityNodeKey,
    pub path: String,
    pub id: u32,
    pub is_valid: bool,
    pub is_nearby: bool,
    pub entity_type: EntityType,
    pub entity_subtype: EntitySubtype,
    pub entity_state: EntityState,
    pub components: Vec<String>,
}

impl EntitySnapshot {
    pub fn capture(key: EntityNodeKey, entity: &Entity) -> Self {
        let mut components: Vec<String> = entity.component_addresses().keys().cloned().collect();
        components.sort();
        Self {
            key,
            path: entity.path().to_string(),
            id: entity.id(),
            is_valid: entity.is_valid(),
            is_nearby: entity.is_nearby(),
            entity_type: entity.entity_type(),
            entity_subtype: entity.entity_subtype(),
            entity_state: entity.entity_state(),
            components,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub address: String,
    pub value: String,
}

/// Size and contents of an address-keyed cache, sorted by address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSnapshot {
    pub size: usize,
    pub entries: Vec<CacheEntry>,
}

impl CacheSnapshot {
    pub fn capture<T: Display>(cache: &AddressCache<T>) -> Self {
        let mut entries = cache.entries();
        entries.sort_by_key(|(address, _)| *address);
        Self {
            size: entries.len(),
            entries: entries
                .into_iter()
                .map(|(address, value)| CacheEntry {
                    address: format!("{:#x}", address),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueCacheSnapshot {
    pub name: String,
    pub is_active: bool,
    pub size: usize,
}

impl From<&DisappearingEntities> for LeagueCacheSnapshot {
    fn from(cache: &DisappearingEntities) -> Self {
        Self {
            name: cache.name().to_string(),
            is_active: cache.is_active(),
            size: cache.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSnapshot {
    pub area_hash: String,
    pub monster_level: i32,
    pub environments: Vec<i32>,
    pub grid_width: usize,
    pub grid_height: usize,
    pub walkable_bytes: usize,
    pub tile_names: usize,
    pub network_bubble_entity_count: usize,
    pub player: EntitySnapshot,
    pub league_caches: Vec<LeagueCacheSnapshot>,
    pub entities: Vec<EntitySnapshot>,
}

impl AreaSnapshot {
    pub fn capture(area: &AreaInstance) -> Self {
        let mut entities: Vec<EntitySnapshot> = area
            .awake_entities()
            .iter()
            .map(|entry| EntitySnapshot::capture(*entry.key(), entry.value()))
            .collect();
        entities.sort_by_key(|entity| entity.key);

        let player = area.player();
        Self {
            area_hash: area.area_hash().to_string(),
            monster_level: area.monster_level(),
            environments: area.environments().to_vec(),
            grid_width: area.grid_height_data().first().map_or(0, Vec::len),
            grid_height: area.grid_height_data().len(),
            walkable_bytes: area.grid_walkable_data().len(),
            tile_names: area.tgt_tiles_locations().len(),
            network_bubble_entity_count: area.network_bubble_entity_count(),
            player: EntitySnapshot::capture(EntityNodeKey::new(player.id()), player),
            league_caches: area.entity_caches().iter().map(Into::into).collect(),
            entities,
        }
    }

    /// Entities grouped by type, for one-line summaries
    pub fn count_by_type(&self) -> Vec<(EntityType, usize)> {
        let mut counts: Vec<(EntityType, usize)> = Vec::new();
        for entity in &self.entities {
            match counts.iter_mut().find(|(kind, _)| *kind == entity.entity_type) {
                Some((_, count)) => *count += 1,
                None => counts.push((entity.entity_type, 1)),
            }
        }
        counts
    }
}
