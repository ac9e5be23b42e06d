use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum EntityType {
    #[default]
    Unidentified,
    Chest,
    Player,
    Shrine,
    Blockage,
    Monster,
    #[strum(serialize = "POIMonster")]
    #[serde(rename = "POIMonster")]
    PoiMonster,
    DeliriumBomb,
    DeliriumSpawner,
    Item,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum EntitySubtype {
    #[default]
    Unidentified,
    None,
    PlayerSelf,
    PlayerOther,
    ChestWithLabel,
    DelveChest,
    ExpeditionChest,
    BreachChest,
    ImportantStrongbox,
    Strongbox,
    LegionEpicChest,
    LegionChest,
    LegionMonster,
    MetamorphMonster,
    TormentedSpiritsMonster,
    WorldItem,
    InventoryItem,
}

impl EntitySubtype {
    pub fn is_legion(&self) -> bool {
        matches!(
            self,
            Self::LegionChest | Self::LegionEpicChest | Self::LegionMonster
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    EnumString,
    IntoStaticStr,
    Display,
)]
pub enum EntityState {
    #[default]
    None,
    /// Terminal: the entity is never refreshed again
    Useless,
    PlayerLeader,
    MonsterFriendly,
    LegionStage0,
    LegionStage1Alive,
    LegionStage1Dead,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromRepr,
    IntoStaticStr,
    Display,
)]
#[repr(i32)]
pub enum Rarity {
    #[default]
    Normal = 0,
    Magic = 1,
    Rare = 2,
    Unique = 3,
}

impl Rarity {
    /// Unknown values decode as `Normal`
    pub fn from_i32(value: i32) -> Self {
        Self::from_repr(value).unwrap_or_default()
    }
}
