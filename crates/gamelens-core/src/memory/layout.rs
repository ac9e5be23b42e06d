//! Fixed memory layouts of the target game version.
//!
//! Every record is `#[repr(C)]` and `Pod`, read verbatim from foreign memory
//! with `bytemuck::try_pod_read_unaligned`. Layouts are organized by the
//! structure family they belong to.

/// Native container descriptors (MSVC std layouts)
pub mod natives {
    use bytemuck::{Pod, Zeroable};

    /// `std::vector<T>`: begin, end of used range, end of allocation
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdVector {
        pub first: u64,
        pub last: u64,
        pub end: u64,
    }

    impl StdVector {
        /// Number of elements of `element_size` bytes in the used range
        pub fn total_elements(&self, element_size: usize) -> i64 {
            if element_size == 0 {
                return 0;
            }
            (self.last as i64).wrapping_sub(self.first as i64) / element_size as i64
        }
    }

    /// `std::wstring` with small-string optimization: up to 8 UTF-16 units
    /// live inline in `buffer` and `reserved_bytes`
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdWString {
        pub buffer: u64,
        pub reserved_bytes: u64,
        pub length: i64,
        pub capacity: i64,
    }

    /// Inline capacity (in UTF-16 units) of a `StdWString`
    pub const WSTRING_INLINE_CAPACITY: i64 = 8;

    /// `std::map<K, V>`: sentinel head node and element count
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdMap {
        pub head: u64,
        pub size: i64,
    }

    /// Red-black tree node header; the key follows at `MAP_NODE_DATA_OFFSET`
    /// and the value right after the key
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdMapNodeHeader {
        pub left: u64,
        pub parent: u64,
        pub right: u64,
        pub color: u8,
        pub is_nil: u8,
        pub _pad: [u8; 6],
    }

    pub const MAP_NODE_DATA_OFFSET: u64 = std::mem::size_of::<StdMapNodeHeader>() as u64;

    /// `std::list<T>`: sentinel head node and element count
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdList {
        pub head: u64,
        pub size: i64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdListNodeHeader {
        pub next: u64,
        pub prev: u64,
    }

    pub const LIST_NODE_DATA_OFFSET: u64 = std::mem::size_of::<StdListNodeHeader>() as u64;

    /// Bucketed hash table: slots of 8 flag bytes followed by 8 payloads
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StdBucket {
        pub data: u64,
        pub capacity: i64,
    }

    pub const BUCKET_SLOT_WIDTH: usize = 8;
    pub const BUCKET_EMPTY_FLAG: u8 = 0xFF;
}

/// Entity records and the live-entity map entries
pub mod entity {
    use bytemuck::{Pod, Zeroable};
    use serde::Serialize;

    use super::natives::{StdBucket, StdVector, StdWString};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ItemStruct {
        pub entity_details_ptr: u64,
        pub component_list: StdVector,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct EntityOffsets {
        pub vtable: u64,
        pub item_base: ItemStruct,
        pub id: u32,
        pub is_valid: u8,
        pub _pad: [u8; 3],
    }

    impl EntityOffsets {
        pub fn is_valid_entity(&self) -> bool {
            self.is_valid != 0
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct EntityDetails {
        pub name: StdWString,
        pub component_lookup_ptr: u64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ComponentLookup {
        pub components_name_and_index: StdBucket,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ComponentNameAndIndex {
        pub name_ptr: u64,
        pub index: i32,
        pub _pad: i32,
    }

    /// Key of the live-entity map
    #[derive(
        Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize,
    )]
    #[repr(C)]
    pub struct EntityNodeKey {
        pub id: u32,
        #[serde(skip)]
        pub _pad: u32,
    }

    impl EntityNodeKey {
        pub fn new(id: u32) -> Self {
            Self { id, _pad: 0 }
        }
    }

    /// Ids at or above this value are client-side visuals and decorations
    pub const VISUAL_ENTITY_ID_START: u32 = 0x4000_0000;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct EntityNodeValue {
        pub entity_ptr: u64,
    }
}

/// Component records; every component starts with a `ComponentHeader`
pub mod components {
    use bytemuck::{Pod, Zeroable};

    use super::natives::{StdVector, StdWString};

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ComponentHeader {
        pub vtable: u64,
        pub owner_entity: u64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    pub struct RenderOffsets {
        pub header: ComponentHeader,
        pub world_position: [f32; 3],
        pub _pad0: f32,
        pub grid_position: [f32; 2],
        pub terrain_height: f32,
        pub _pad1: f32,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct VitalStruct {
        pub total: i32,
        pub current: i32,
        pub reserved_flat: i32,
        pub reserved_percent: i32,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct LifeOffsets {
        pub header: ComponentHeader,
        pub health: VitalStruct,
        pub mana: VitalStruct,
        pub energy_shield: VitalStruct,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ChestOffsets {
        pub header: ComponentHeader,
        pub chests_data_ptr: u64,
        pub is_opened: u8,
        pub _pad: [u8; 7],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ChestsStruct {
        pub is_label_visible: u8,
        pub _pad: [u8; 7],
        pub strongbox_dat_ptr: u64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct PlayerOffsets {
        pub header: ComponentHeader,
        pub name: StdWString,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ShrineOffsets {
        pub header: ComponentHeader,
        pub is_used: u8,
        pub _pad: [u8; 7],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct PositionedOffsets {
        pub header: ComponentHeader,
        pub reaction: u8,
        pub _pad: [u8; 7],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct TargetableOffsets {
        pub header: ComponentHeader,
        pub is_targetable: u8,
        pub is_highlightable: u8,
        pub is_targeted: u8,
        pub hidden_from_player: u8,
        pub _pad: [u8; 4],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct BuffsOffsets {
        pub header: ComponentHeader,
        pub status_effect_ptr: StdVector,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    pub struct StatusEffectStruct {
        pub buff_definition_ptr: u64,
        pub total_time: f32,
        pub time_left: f32,
        pub source_entity_id: u32,
        pub charges: u16,
        pub _pad: u16,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct TriggerableBlockageOffsets {
        pub header: ComponentHeader,
        pub is_blocked: u8,
        pub _pad: [u8; 7],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct WorldItemOffsets {
        pub header: ComponentHeader,
        pub item_entity_ptr: u64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct AllModsType {
        pub implicit_mods: StdVector,
        pub explicit_mods: StdVector,
        pub enchant_mods: StdVector,
        pub hellscape_mods: StdVector,
        pub crucible_mods: StdVector,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ModDetails {
        pub rarity: i32,
        pub _pad: i32,
        pub mods: AllModsType,
    }

    /// Shared by `ObjectMagicProperties` and `Mods`
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ModsOffsets {
        pub header: ComponentHeader,
        pub details: ModDetails,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ModArrayStruct {
        pub values: StdVector,
        pub value0: i32,
        pub _pad: i32,
        pub mods_ptr: u64,
    }
}

/// Area instance and terrain records
pub mod area {
    use bytemuck::{Pod, Zeroable};

    use super::natives::{StdMap, StdVector, StdWString};

    /// Tiles are 23×23 grid cells
    pub const TILE_TO_GRID_CONVERSION: usize = 23;
    pub const TILE_TO_WORLD_CONVERSION: f32 = 250.0;
    pub const TILE_HEIGHT_FINAL_MULTIPLIER: f32 = 7.8125;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct TerrainStruct {
        pub total_tiles_x: i64,
        pub total_tiles_y: i64,
        pub tile_details: StdVector,
        pub grid_walkable_data: StdVector,
        pub grid_landscape_data: StdVector,
        pub bytes_per_row: i32,
        pub tile_height_multiplier: i16,
        pub _pad: i16,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct AreaInstanceOffsets {
        pub monster_level: i32,
        pub _pad0: i32,
        pub area_hash: u32,
        pub _pad1: u32,
        pub environments: StdVector,
        pub local_player_ptr: u64,
        pub server_data_ptr: u64,
        pub awake_entities: StdMap,
        pub terrain: TerrainStruct,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct TileStructure {
        pub sub_tile_details_ptr: u64,
        pub tgt_file_ptr: u64,
        pub tile_height: i16,
        pub tile_id_x: u8,
        pub tile_id_y: u8,
        pub rotation_selector: u8,
        pub _pad: [u8; 3],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct SubTileStruct {
        pub sub_tile_height: StdVector,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct TgtFileStruct {
        pub vtable: u64,
        pub tgt_path: StdWString,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct EnvironmentStruct {
        pub key: i32,
        pub _pad: i32,
    }
}

/// UI element records
pub mod ui {
    use bytemuck::{Pod, Zeroable};

    use super::natives::{StdVector, StdWString};

    /// Flag bit set on visible elements
    pub const VISIBLE_FLAG: u32 = 0x800;
    /// Flag bit asking the parent's position modifier to be applied
    pub const MODIFY_POSITION_FLAG: u32 = 0x400;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    pub struct UiElementBaseOffset {
        pub vtable: u64,
        pub self_ptr: u64,
        pub childrens: StdVector,
        pub parent_ptr: u64,
        pub id: StdWString,
        pub position_modifier: [f32; 2],
        pub relative_position: [f32; 2],
        pub unscaled_size: [f32; 2],
        pub local_scale_multiplier: f32,
        pub flags: u32,
        pub scale_index: u8,
        pub _pad: [u8; 7],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    pub struct MapUiElementOffset {
        pub base: UiElementBaseOffset,
        pub shift: [f32; 2],
        pub default_shift: [f32; 2],
        pub zoom: f32,
        pub _pad: u32,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct ImportantUiElementsOffsets {
        pub vtable: u64,
        pub map_parent_ptr: u64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct MapParentStruct {
        pub large_map_ptr: u64,
        pub mini_map_ptr: u64,
    }
}

/// Game state records reached from the static state pointer
pub mod states {
    use bytemuck::{Pod, Zeroable};

    /// Number of entries in the game state table
    pub const TOTAL_STATES: usize = 12;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct GameStatesOffsets {
        pub vtable: u64,
        pub current_state_ptr: u64,
        pub states: [u64; TOTAL_STATES],
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
    #[repr(C)]
    pub struct WorldAreaDat {
        pub id_ptr: u64,
        pub name_ptr: u64,
        pub act: i32,
        pub is_town: u8,
        pub is_hideout: u8,
        pub has_waypoint: u8,
        pub _pad: u8,
    }
}
