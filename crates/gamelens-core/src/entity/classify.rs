//! Type, subtype and state resolution.
//!
//! Each stage runs only once the previous one resolved. A stage that needs a
//! component the entity has not exposed yet leaves everything untouched and
//! is retried on the next refresh.

use crate::context::Context;
use crate::entity::components::{Buffs, Chest, ComponentKind, Life, Player, Positioned, Targetable};
use crate::entity::enums::{EntityState, EntitySubtype, EntityType};
use crate::entity::object::Entity;
use crate::error::{Error, Result};

const DELIRIUM_HIDDEN_MONSTER_PREFIX: &str =
    "Metadata/Monsters/LeagueAffliction/DoodadDaemons/DoodadDaemon";

const EXPEDITION_CHEST_PREFIX: &str = "Metadata/Chests/LeaguesExpedition";
const LEGION_CHEST_PREFIX: &str = "Metadata/Chests/LegionChests";
const DELVE_CHEST_PREFIX: &str = "Metadata/Chests/DelveChests/";
const BREACH_CHEST_PREFIX: &str = "Metadata/Chests/Breach";
const SYNTHESIS_AMBUSH_PREFIX: &str = "Metadata/Chests/SynthesisChests/SynthesisChestAmbush";
const IMPORTANT_STRONGBOX_PREFIXES: [&str; 4] = [
    "Metadata/Chests/StrongBoxes/Arcanist",
    "Metadata/Chests/StrongBoxes/Cartographer",
    "Metadata/Chests/StrongBoxes/StrongboxDivination",
    "Metadata/Chests/StrongBoxes/StrongboxScarab",
];

const HIDDEN_MONSTER: &str = "hidden_monster";
const FROZEN_IN_TIME: &str = "frozen_in_time";
const LEGION_REWARD_DISPLAY: &str = "legion_reward_display";
const METAMORPH_VISUAL: &str = "metamorphosis_monster_visual";

impl Entity {
    pub(super) fn classify(&mut self, ctx: &Context) -> Result<()> {
        if self.entity_type == EntityType::Unidentified {
            match self.resolve_type(ctx) {
                Some(entity_type) => self.entity_type = entity_type,
                None => return Ok(()),
            }
        }

        if self.entity_subtype == EntitySubtype::Unidentified {
            match self.resolve_subtype(ctx)? {
                Some(subtype) => self.entity_subtype = subtype,
                None => return Ok(()),
            }
        }

        self.resolve_state(ctx);
        Ok(())
    }

    fn resolve_type(&mut self, ctx: &Context) -> Option<EntityType> {
        use ComponentKind as K;

        if !self.ensure(ctx, K::Render) {
            return None;
        }
        if self.ensure(ctx, K::Chest) {
            return Some(EntityType::Chest);
        }
        if self.ensure(ctx, K::Player) {
            return Some(EntityType::Player);
        }
        if self.ensure(ctx, K::Shrine) {
            return Some(EntityType::Shrine);
        }
        if self.ensure(ctx, K::WorldItem) {
            return Some(EntityType::Item);
        }

        if !self.ensure(ctx, K::Life) {
            return None;
        }
        if self.ensure(ctx, K::TriggerableBlockage) {
            return Some(EntityType::Blockage);
        }
        if !self.ensure(ctx, K::Positioned) || !self.ensure(ctx, K::ObjectMagicProperties) {
            return None;
        }

        let is_friendly = self.get::<Positioned>().is_some_and(Positioned::is_friendly);
        if !is_friendly && self.ensure(ctx, K::DiesAfterTime) {
            let targetable = self.ensure(ctx, K::Targetable)
                && self.get::<Targetable>().is_some_and(Targetable::is_targetable);
            return targetable.then_some(EntityType::Monster);
        }

        if !self.ensure(ctx, K::Buffs) {
            return None;
        }
        if ctx.settings().is_poi_monster(&self.path) {
            return Some(EntityType::PoiMonster);
        }
        let is_hidden = self.get::<Buffs>().is_some_and(|b| b.has(HIDDEN_MONSTER));
        if is_hidden && self.path.starts_with(DELIRIUM_HIDDEN_MONSTER_PREFIX) {
            return if self.path.contains("BloodBag") {
                Some(EntityType::DeliriumBomb)
            } else if self.path.contains("EggFodder") || self.path.contains("GlobSpawn") {
                Some(EntityType::DeliriumSpawner)
            } else {
                None
            };
        }
        Some(EntityType::Monster)
    }

    fn resolve_subtype(&mut self, ctx: &Context) -> Result<Option<EntitySubtype>> {
        let subtype = match self.entity_type {
            EntityType::Unidentified => {
                return Err(Error::UnclassifiedEntity {
                    path: self.path.clone(),
                    id: self.id,
                });
            }
            EntityType::Chest => return Ok(self.chest_subtype(ctx)),
            EntityType::Player if self.id == ctx.player.id => EntitySubtype::PlayerSelf,
            EntityType::Player => EntitySubtype::PlayerOther,
            EntityType::Monster => {
                self.ensure(ctx, ComponentKind::Buffs);
                self.monster_subtype()
            }
            EntityType::Item => EntitySubtype::WorldItem,
            EntityType::PoiMonster
            | EntityType::Shrine
            | EntityType::Blockage
            | EntityType::DeliriumBomb
            | EntityType::DeliriumSpawner => EntitySubtype::None,
        };
        Ok(Some(subtype))
    }

    fn chest_subtype(&mut self, ctx: &Context) -> Option<EntitySubtype> {
        if self.path.starts_with(EXPEDITION_CHEST_PREFIX) {
            return Some(EntitySubtype::ExpeditionChest);
        }
        // legion chests are classified through their monster counterpart
        if self.ensure(ctx, ComponentKind::MinimapIcon)
            || self.path.starts_with(LEGION_CHEST_PREFIX)
        {
            return None;
        }
        if self.path.starts_with(DELVE_CHEST_PREFIX) {
            return Some(EntitySubtype::DelveChest);
        }
        if self.path.starts_with(BREACH_CHEST_PREFIX) {
            return Some(EntitySubtype::BreachChest);
        }

        let (is_strongbox, is_label_visible) = self
            .get::<Chest>()
            .map(|c| (c.is_strongbox(), c.is_label_visible()))
            .unwrap_or_default();
        if is_strongbox || self.path.starts_with(SYNTHESIS_AMBUSH_PREFIX) {
            let important = IMPORTANT_STRONGBOX_PREFIXES
                .iter()
                .any(|prefix| self.path.starts_with(*prefix));
            return Some(if important {
                EntitySubtype::ImportantStrongbox
            } else {
                EntitySubtype::Strongbox
            });
        }
        if is_label_visible {
            return Some(EntitySubtype::ChestWithLabel);
        }
        Some(EntitySubtype::None)
    }

    fn monster_subtype(&self) -> EntitySubtype {
        let Some(buffs) = self.get::<Buffs>() else {
            return EntitySubtype::None;
        };
        if buffs.has(METAMORPH_VISUAL) {
            EntitySubtype::MetamorphMonster
        } else if buffs.has(FROZEN_IN_TIME) {
            if buffs.has(LEGION_REWARD_DISPLAY) {
                EntitySubtype::LegionChest
            } else if self.path.contains("ChestEpic") {
                EntitySubtype::LegionEpicChest
            } else if self.path.contains("Chest") {
                EntitySubtype::LegionChest
            } else {
                EntitySubtype::LegionMonster
            }
        } else {
            EntitySubtype::None
        }
    }

    fn resolve_state(&mut self, ctx: &Context) {
        match self.entity_type {
            EntityType::Chest => {
                if self.ensure(ctx, ComponentKind::Chest)
                    && self.get::<Chest>().is_some_and(Chest::is_opened)
                {
                    self.entity_state = EntityState::Useless;
                }
            }
            EntityType::DeliriumBomb | EntityType::DeliriumSpawner | EntityType::PoiMonster => {
                if self.is_dead(ctx) {
                    self.entity_state = EntityState::Useless;
                }
            }
            EntityType::Monster => self.resolve_monster_state(ctx),
            EntityType::Player if self.entity_subtype == EntitySubtype::PlayerOther => {
                if !self.ensure(ctx, ComponentKind::Player) {
                    return;
                }
                let leader = &ctx.settings().leader_name;
                let is_leader = !leader.is_empty()
                    && self.get::<Player>().is_some_and(|p| p.name() == leader.as_str());
                self.entity_state = if is_leader {
                    EntityState::PlayerLeader
                } else {
                    EntityState::None
                };
            }
            _ => {}
        }
    }

    fn is_dead(&mut self, ctx: &Context) -> bool {
        self.ensure(ctx, ComponentKind::Life)
            && self.get::<Life>().is_some_and(|life| !life.is_alive())
    }

    fn resolve_monster_state(&mut self, ctx: &Context) {
        if !self.ensure(ctx, ComponentKind::Life) {
            return;
        }
        if self.is_dead(ctx) {
            self.entity_state = EntityState::Useless;
            return;
        }
        if !self.ensure(ctx, ComponentKind::Positioned) {
            return;
        }

        if self.get::<Positioned>().is_some_and(Positioned::is_friendly) {
            self.entity_state = EntityState::MonsterFriendly;
        } else if self.entity_state == EntityState::MonsterFriendly {
            self.entity_state = EntityState::None;
        } else if self.entity_subtype.is_legion() && self.ensure(ctx, ComponentKind::Buffs) {
            let (frozen, hidden) = self
                .get::<Buffs>()
                .map(|b| (b.has(FROZEN_IN_TIME), b.has(HIDDEN_MONSTER)))
                .unwrap_or_default();
            self.entity_state = match (frozen, hidden) {
                (true, true) => EntityState::LegionStage0,
                (true, false) => EntityState::LegionStage1Alive,
                (false, true) => EntityState::LegionStage1Dead,
                (false, false) => EntityState::None,
            };
        }
    }
}
