//! The current area instance: awake entities, terrain and league caches.

mod disappearing;
pub mod terrain;

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::context::{Context, PlayerView};
use crate::entity::{self, Entity, EntityNodeKey, EntityState};
use crate::error::Result;
use crate::memory::layout::area::{
    AreaInstanceOffsets, EnvironmentStruct, TILE_TO_GRID_CONVERSION, TILE_TO_WORLD_CONVERSION,
    TerrainStruct,
};
use crate::memory::layout::entity::{EntityNodeValue, EntityOffsets};
use crate::memory::layout::natives::{StdMap, StdVector};
use crate::memory::{NativeRead, ReadMemory};
use crate::remote::{Remote, RemoteObject};

pub use disappearing::DisappearingEntities;

/// Position on the terrain grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GridPoint {
    pub x: f32,
    pub y: f32,
}

impl GridPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance truncated to whole cells
    pub fn distance_to(&self, other: GridPoint) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt() as i32
    }
}

#[derive(Debug)]
pub struct AreaInstance {
    monster_level: i32,
    area_hash: String,
    terrain: TerrainStruct,
    environments: Vec<i32>,
    player: Remote<Entity>,
    awake_entities: DashMap<EntityNodeKey, Remote<Entity>>,
    entity_caches: Vec<DisappearingEntities>,
    network_bubble_entity_count: usize,
    grid_height_data: Vec<Vec<f32>>,
    grid_walkable_data: Vec<u8>,
    tgt_tiles_locations: HashMap<String, Vec<GridPoint>>,
}

impl Default for AreaInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl AreaInstance {
    pub fn new() -> Self {
        Self {
            monster_level: 0,
            area_hash: String::new(),
            terrain: TerrainStruct::default(),
            environments: Vec::new(),
            player: Remote::forced(Entity::default()),
            awake_entities: DashMap::new(),
            entity_caches: DisappearingEntities::defaults(),
            network_bubble_entity_count: 0,
            grid_height_data: Vec::new(),
            grid_walkable_data: Vec::new(),
            tgt_tiles_locations: HashMap::new(),
        }
    }

    pub fn monster_level(&self) -> i32 {
        self.monster_level
    }

    /// Upper-case hex of the area hash
    pub fn area_hash(&self) -> &str {
        &self.area_hash
    }

    pub fn terrain(&self) -> &TerrainStruct {
        &self.terrain
    }

    pub fn environments(&self) -> &[i32] {
        &self.environments
    }

    pub fn player(&self) -> &Entity {
        &self.player
    }

    /// What entity classification needs to know about the local player
    pub fn player_view(&self) -> PlayerView {
        PlayerView {
            id: self.player.id(),
            grid_position: self.player.grid_position(),
        }
    }

    pub fn awake_entities(&self) -> &DashMap<EntityNodeKey, Remote<Entity>> {
        &self.awake_entities
    }

    pub fn entity_caches(&self) -> &[DisappearingEntities] {
        &self.entity_caches
    }

    /// Entities the server reported this tick, before local bookkeeping
    pub fn network_bubble_entity_count(&self) -> usize {
        self.network_bubble_entity_count
    }

    pub fn grid_height_data(&self) -> &[Vec<f32>] {
        &self.grid_height_data
    }

    pub fn grid_walkable_data(&self) -> &[u8] {
        &self.grid_walkable_data
    }

    pub fn tgt_tiles_locations(&self) -> &HashMap<String, Vec<GridPoint>> {
        &self.tgt_tiles_locations
    }

    pub fn world_to_grid_ratio(&self) -> f32 {
        TILE_TO_WORLD_CONVERSION / TILE_TO_GRID_CONVERSION as f32
    }

    /// Height at a grid cell, 0 outside the grid
    pub fn terrain_height(&self, x: usize, y: usize) -> f32 {
        self.grid_height_data
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(0.0)
    }

    fn reset_entities(&mut self) {
        self.awake_entities.clear();
        for cache in &mut self.entity_caches {
            cache.clear();
        }
    }

    fn update_environments(&mut self, reader: &dyn ReadMemory, environments: &StdVector) {
        let data: Vec<EnvironmentStruct> = reader.read_std_vector(environments);
        self.environments = data.iter().map(|env| env.key).collect();
        for cache in &mut self.entity_caches {
            cache.update_state(&self.environments, &self.awake_entities);
        }
    }

    /// Refresh the local player and return a context that knows about it
    fn update_player(&mut self, ctx: &Context, address: u64) -> Result<Context> {
        // the player's own subtype depends on its id being known up front
        let peek: EntityOffsets = ctx.reader().read_value(address);
        let mut local = ctx.clone().with_player(PlayerView {
            id: peek.id,
            grid_position: None,
        });
        self.player.set_address(&local, address)?;
        local.player = self.player_view();
        Ok(local)
    }

    fn update_entities(&mut self, ctx: &Context, awake: &StdMap) -> Result<()> {
        if ctx.settings().disable_entity_processing_in_town_or_hideout
            && ctx.area.is_town_or_hideout()
        {
            self.network_bubble_entity_count = 0;
            return Ok(());
        }

        let live = ctx.reader().read_std_map_as_list::<EntityNodeKey, EntityNodeValue>(
            awake,
            Some(&entity::ignore_visuals_and_decorations),
        );

        self.awake_entities
            .iter_mut()
            .for_each(|mut entity| entity.invalidate());
        self.network_bubble_entity_count = live.len();

        let table = &self.awake_entities;
        let caches = &self.entity_caches;
        let radius = ctx.settings().nearby_radius;
        live.par_iter().try_for_each(|(key, value)| -> Result<()> {
            if let Some(mut entity) = table.get_mut(key) {
                entity.set_address(ctx, value.entity_ptr)?;
                entity.update_nearby(&ctx.player, radius);
                return Ok(());
            }

            let mut entity = Remote::forced(Entity::default());
            entity.set_address(ctx, value.entity_ptr)?;
            if entity.path().is_empty() {
                return Ok(());
            }
            entity.update_nearby(&ctx.player, radius);
            if let Some(cache) = caches.iter().find(|c| c.try_add(*key, entity.path())) {
                debug!("Entity {} joined the {} cache", key.id, cache.name());
            }
            table.insert(*key, entity);
            Ok(())
        })?;

        self.evict_stale(ctx, &live);
        Ok(())
    }

    fn evict_stale(&self, ctx: &Context, live: &[(EntityNodeKey, EntityNodeValue)]) {
        let seen: HashSet<EntityNodeKey> = live.iter().map(|(key, _)| *key).collect();
        let radius = ctx.settings().stale_entity_removal_radius;
        let player = &self.player;
        self.awake_entities.retain(|key, entity| {
            if seen.contains(key) {
                return true;
            }
            let friendly_gone =
                entity.entity_state() == EntityState::MonsterFriendly && !entity.is_valid();
            let exploded_nearby = entity.can_explode_or_be_removed()
                && !entity.is_valid()
                && player.distance_to(entity) < radius;
            !(friendly_gone || exploded_nearby)
        });
    }
}

impl RemoteObject for AreaInstance {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let reader = ctx.reader();
        let data: AreaInstanceOffsets = reader.read_value(address);

        if has_address_changed {
            self.reset_entities();
            self.terrain = data.terrain;
            self.monster_level = data.monster_level;
            self.area_hash = format!("{:X}", data.area_hash);
            self.grid_walkable_data = reader.read_std_vector(&data.terrain.grid_walkable_data);
            self.grid_height_data = terrain::height_grid(reader, &self.terrain);
            self.tgt_tiles_locations = terrain::tile_locations(reader, &self.terrain);
            info!(
                "Entered area {} (level {}, {} tile names)",
                self.area_hash,
                self.monster_level,
                self.tgt_tiles_locations.len()
            );
        }

        self.update_environments(reader, &data.environments);
        let ctx = self.update_player(ctx, data.local_player_ptr)?;
        self.update_entities(&ctx, &data.awake_entities)
    }

    fn cleanup(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::terrain::tests::{TileDef, write_terrain};
    use crate::config::Settings;
    use crate::context::AreaDetails;
    use crate::entity::components::ComponentKind as K;
    use crate::entity::fixtures::*;
    use crate::entity::{EntitySubtype, EntityType};
    use crate::memory::layout::natives::StdMapNodeHeader;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};
    use std::sync::Arc;

    /// Right-leaning chain of map nodes, one per entity
    fn write_entity_map(builder: &mut MockMemoryBuilder, entries: &[(u32, u64)]) -> StdMap {
        let head = builder.reserve(48);
        let nodes: Vec<u64> = entries.iter().map(|_| builder.reserve(48)).collect();
        for (i, (id, ptr)) in entries.iter().enumerate() {
            let right = nodes.get(i + 1).copied().unwrap_or(head);
            let parent = if i == 0 { head } else { nodes[i - 1] };
            builder.write_pod(
                nodes[i],
                &StdMapNodeHeader {
                    left: head,
                    parent,
                    right,
                    ..Default::default()
                },
            );
            builder.write_pod(nodes[i] + 32, &EntityNodeKey::new(*id));
            builder.write_pod(nodes[i] + 40, &EntityNodeValue { entity_ptr: *ptr });
        }
        builder.write_pod(
            head,
            &StdMapNodeHeader {
                left: head,
                parent: nodes.first().copied().unwrap_or(head),
                right: head,
                is_nil: 1,
                ..Default::default()
            },
        );
        StdMap {
            head,
            size: entries.len() as i64,
        }
    }

    fn env_vector(builder: &mut MockMemoryBuilder, keys: &[i32]) -> StdVector {
        let bytes: Vec<u8> = keys
            .iter()
            .flat_map(|k| bytemuck::bytes_of(&EnvironmentStruct { key: *k, _pad: 0 }).to_vec())
            .collect();
        if bytes.is_empty() {
            return StdVector::default();
        }
        let first = builder.alloc(&bytes);
        StdVector {
            first,
            last: first + bytes.len() as u64,
            end: first + bytes.len() as u64,
        }
    }

    fn player_fixture(id: u32) -> EntityFixture {
        EntityFixture::new(id, "Metadata/Characters/Int/Int")
            .with(K::Render, |b, o| render(b, o, 100.0, 100.0))
            .with(K::Player, |b, o| player(b, o, "Me"))
    }

    fn zombie(id: u32, x: f32, y: f32, health: i32) -> EntityFixture {
        EntityFixture::new(id, "Metadata/Monsters/Zombie")
            .with(K::Render, move |b, o| render(b, o, x, y))
            .with(K::Life, move |b, o| life(b, o, health))
            .with(K::Positioned, |b, o| positioned(b, o, 2))
            .with(K::ObjectMagicProperties, magic_properties)
            .with(K::Buffs, |b, o| buffs(b, o, &[]))
    }

    struct World {
        reader: MockMemoryReader,
        area: u64,
    }

    impl World {
        fn edit(&self, change: impl FnOnce(&mut AreaInstanceOffsets)) {
            let mut offsets: AreaInstanceOffsets = self.reader.read_value(self.area);
            change(&mut offsets);
            self.reader.patch_pod(self.area, &offsets);
        }
    }

    fn context(reader: &MockMemoryReader, settings: Settings) -> Context {
        Context::new(Arc::new(reader.clone()), Arc::new(settings))
    }

    #[test]
    fn test_grid_point_distance() {
        let a = GridPoint::new(0.0, 0.0);
        assert_eq!(a.distance_to(GridPoint::new(3.0, 4.0)), 5);
        assert_eq!(a.distance_to(GridPoint::new(1.0, 1.0)), 1);
    }

    #[test]
    fn test_area_decode_and_reconcile() {
        let mut builder = MockMemoryBuilder::new();
        let me = write_entity(&mut builder, player_fixture(1));
        let near = write_entity(&mut builder, zombie(2, 110.0, 100.0, 100));
        let far = write_entity(&mut builder, zombie(3, 400.0, 100.0, 100));
        let nameless = write_entity(&mut builder, EntityFixture::new(4, ""));
        let map = write_entity_map(
            &mut builder,
            &[
                (1, me.address),
                (2, near.address),
                (3, far.address),
                (4, nameless.address),
                (0x4000_0001, near.address),
            ],
        );
        let terrain = write_terrain(
            &mut builder,
            1,
            1,
            1,
            &[TileDef {
                height: 2,
                rotation: 0,
                id: (0, 0),
                tgt: "Art/a.tgt",
            }],
        );
        let environments = env_vector(&mut builder, &[7]);
        let area = builder.alloc_pod(&AreaInstanceOffsets {
            monster_level: 68,
            area_hash: 0xBEEF,
            environments,
            local_player_ptr: me.address,
            awake_entities: map,
            terrain,
            ..Default::default()
        });
        let reader = builder.build();
        let ctx = context(&reader, Settings::default());

        let instance = Remote::bind(&ctx, area, AreaInstance::new()).unwrap();
        assert_eq!(instance.monster_level(), 68);
        assert_eq!(instance.area_hash(), "BEEF");
        assert_eq!(instance.environments(), &[7]);
        assert_eq!(instance.grid_height_data().len(), 23);
        assert_eq!(instance.terrain_height(0, 0), -2.0 * 7.8125);
        assert_eq!(instance.terrain_height(500, 0), 0.0);
        assert_eq!(instance.tgt_tiles_locations().len(), 1);
        assert_eq!(instance.world_to_grid_ratio(), 250.0 / 23.0);

        assert_eq!(instance.player().id(), 1);
        assert_eq!(
            instance.player_view().grid_position,
            Some(GridPoint::new(100.0, 100.0))
        );

        // visuals are filtered; the nameless entity is dropped
        assert_eq!(instance.network_bubble_entity_count(), 4);
        assert_eq!(instance.awake_entities().len(), 3);
        assert!(!instance.awake_entities().contains_key(&EntityNodeKey::new(4)));

        let me_in_table = instance.awake_entities().get(&EntityNodeKey::new(1)).unwrap();
        assert_eq!(me_in_table.entity_subtype(), EntitySubtype::PlayerSelf);
        drop(me_in_table);

        let near = instance.awake_entities().get(&EntityNodeKey::new(2)).unwrap();
        assert_eq!(near.entity_type(), EntityType::Monster);
        assert!(near.is_nearby());
        drop(near);
        let far = instance.awake_entities().get(&EntityNodeKey::new(3)).unwrap();
        assert!(!far.is_nearby());
    }

    #[test]
    fn test_stale_entities_are_evicted_by_rule() {
        let mut builder = MockMemoryBuilder::new();
        let me = write_entity(&mut builder, player_fixture(1));
        let close = write_entity(&mut builder, zombie(2, 110.0, 100.0, 100));
        let distant = write_entity(&mut builder, zombie(3, 400.0, 100.0, 100));
        let barrel = write_entity(
            &mut builder,
            EntityFixture::new(4, "Metadata/Chests/Barrel")
                .with(K::Render, |b, o| render(b, o, 101.0, 100.0))
                .with(K::Chest, |b, o| chest(b, o, false, false, false)),
        );
        let all = write_entity_map(
            &mut builder,
            &[
                (1, me.address),
                (2, close.address),
                (3, distant.address),
                (4, barrel.address),
            ],
        );
        let only_player = write_entity_map(&mut builder, &[(1, me.address)]);
        let area = builder.alloc_pod(&AreaInstanceOffsets {
            local_player_ptr: me.address,
            awake_entities: all,
            ..Default::default()
        });
        let reader = builder.build();
        let ctx = context(&reader, Settings::default());
        let world = World {
            reader: reader.clone(),
            area,
        };

        let mut instance = Remote::bind(&ctx, area, AreaInstance::new()).unwrap();
        assert_eq!(instance.awake_entities().len(), 4);

        world.edit(|offsets| offsets.awake_entities = only_player);
        instance.set_address(&ctx, area).unwrap();

        // the close monster may have exploded; the distant one and the chest stay
        let table = instance.awake_entities();
        assert!(table.contains_key(&EntityNodeKey::new(1)));
        assert!(!table.contains_key(&EntityNodeKey::new(2)));
        assert!(table.contains_key(&EntityNodeKey::new(3)));
        assert!(table.contains_key(&EntityNodeKey::new(4)));
        assert!(!table.get(&EntityNodeKey::new(3)).unwrap().is_valid());
    }

    #[test]
    fn test_eviction_respects_removal_radius() {
        let mut builder = MockMemoryBuilder::new();
        let me = write_entity(
            &mut builder,
            EntityFixture::new(1, "Metadata/Characters/Int/Int")
                .with(K::Render, |b, o| render(b, o, 0.0, 0.0))
                .with(K::Player, |b, o| player(b, o, "Me")),
        );
        let inside = write_entity(&mut builder, zombie(2, 149.0, 0.0, 100));
        let outside = write_entity(&mut builder, zombie(3, 151.0, 0.0, 100));
        let all = write_entity_map(
            &mut builder,
            &[(1, me.address), (2, inside.address), (3, outside.address)],
        );
        let only_player = write_entity_map(&mut builder, &[(1, me.address)]);
        let area = builder.alloc_pod(&AreaInstanceOffsets {
            local_player_ptr: me.address,
            awake_entities: all,
            ..Default::default()
        });
        let reader = builder.build();
        let ctx = context(&reader, Settings::default());
        let world = World {
            reader: reader.clone(),
            area,
        };

        let mut instance = Remote::bind(&ctx, area, AreaInstance::new()).unwrap();
        world.edit(|offsets| offsets.awake_entities = only_player);
        instance.set_address(&ctx, area).unwrap();

        assert!(!instance.awake_entities().contains_key(&EntityNodeKey::new(2)));
        assert!(instance.awake_entities().contains_key(&EntityNodeKey::new(3)));
    }

    #[test]
    fn test_town_skips_entity_processing() {
        let mut builder = MockMemoryBuilder::new();
        let me = write_entity(&mut builder, player_fixture(1));
        let map = write_entity_map(&mut builder, &[(1, me.address)]);
        let area = builder.alloc_pod(&AreaInstanceOffsets {
            local_player_ptr: me.address,
            awake_entities: map,
            ..Default::default()
        });
        let reader = builder.build();
        let settings = Settings {
            disable_entity_processing_in_town_or_hideout: true,
            ..Settings::default()
        };
        let ctx = context(&reader, settings).with_area(AreaDetails {
            is_town: true,
            is_hideout: false,
        });

        let instance = Remote::bind(&ctx, area, AreaInstance::new()).unwrap();
        assert_eq!(instance.network_bubble_entity_count(), 0);
        assert!(instance.awake_entities().is_empty());
        assert_eq!(instance.player().id(), 1);
    }

    #[test]
    fn test_disappearing_cache_lifecycle() {
        let mut builder = MockMemoryBuilder::new();
        let me = write_entity(&mut builder, player_fixture(1));
        let breach = write_entity(
            &mut builder,
            EntityFixture::new(5, "Metadata/Monsters/Breach/BreachMonster")
                .with(K::Render, |b, o| render(b, o, 500.0, 500.0)),
        );
        let map = write_entity_map(&mut builder, &[(1, me.address), (5, breach.address)]);
        let only_player = write_entity_map(&mut builder, &[(1, me.address)]);
        let in_breach = env_vector(&mut builder, &[1110]);
        let after_breach = env_vector(&mut builder, &[3]);
        let area = builder.alloc_pod(&AreaInstanceOffsets {
            local_player_ptr: me.address,
            awake_entities: map,
            environments: in_breach,
            ..Default::default()
        });
        let reader = builder.build();
        let ctx = context(&reader, Settings::default());
        let world = World {
            reader: reader.clone(),
            area,
        };

        let mut instance = Remote::bind(&ctx, area, AreaInstance::new()).unwrap();
        // caches activate before entities are admitted
        let breach_cache = &instance.entity_caches()[0];
        assert!(breach_cache.is_active());
        assert!(breach_cache.contains(&EntityNodeKey::new(5)));

        // the breach closes and its monsters leave the awake list unannounced
        world.edit(|offsets| {
            offsets.environments = after_breach;
            offsets.awake_entities = only_player;
        });
        instance.set_address(&ctx, area).unwrap();
        assert!(!instance.entity_caches()[0].is_active());
        assert!(instance.entity_caches()[0].is_empty());
        assert!(!instance.awake_entities().contains_key(&EntityNodeKey::new(5)));
    }

    #[test]
    fn test_new_area_resets_entities() {
        let mut builder = MockMemoryBuilder::new();
        let me = write_entity(&mut builder, player_fixture(1));
        let zombie = write_entity(&mut builder, zombie(2, 400.0, 100.0, 100));
        let map = write_entity_map(&mut builder, &[(1, me.address), (2, zombie.address)]);
        let empty = write_entity_map(&mut builder, &[]);
        let first = builder.alloc_pod(&AreaInstanceOffsets {
            local_player_ptr: me.address,
            awake_entities: map,
            ..Default::default()
        });
        let second = builder.alloc_pod(&AreaInstanceOffsets {
            local_player_ptr: me.address,
            awake_entities: empty,
            area_hash: 1,
            ..Default::default()
        });
        let reader = builder.build();
        let ctx = context(&reader, Settings::default());

        let mut instance = Remote::bind(&ctx, first, AreaInstance::new()).unwrap();
        assert_eq!(instance.awake_entities().len(), 2);
        instance.set_address(&ctx, second).unwrap();
        assert!(instance.awake_entities().is_empty());
        assert_eq!(instance.area_hash(), "1");

        instance.set_address(&ctx, 0).unwrap();
        assert_eq!(instance.area_hash(), "");
        assert_eq!(instance.player().id(), 0);
    }
}
