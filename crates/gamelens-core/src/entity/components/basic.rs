//! Components that decode a handful of flags

use crate::context::Context;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::components::{
    ChestOffsets, ChestsStruct, ComponentHeader, PlayerOffsets, PositionedOffsets, ShrineOffsets,
    TargetableOffsets, TriggerableBlockageOffsets, WorldItemOffsets,
};
use crate::remote::RemoteObject;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chest {
    pub(super) owner: u64,
    is_opened: bool,
    is_strongbox: bool,
    is_label_visible: bool,
}

impl Chest {
    pub fn is_opened(&self) -> bool {
        self.is_opened
    }

    pub fn is_strongbox(&self) -> bool {
        self.is_strongbox
    }

    pub fn is_label_visible(&self) -> bool {
        self.is_label_visible
    }
}

impl RemoteObject for Chest {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let reader = ctx.reader();
        let data: ChestOffsets = reader.read_value(address);
        self.owner = data.header.owner_entity;
        self.is_opened = data.is_opened != 0;
        if has_address_changed {
            let details: ChestsStruct = reader.read_value(data.chests_data_ptr);
            self.is_strongbox = details.strongbox_dat_ptr != 0;
            self.is_label_visible = details.is_label_visible != 0;
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    pub(super) owner: u64,
    name: String,
}

impl Player {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RemoteObject for Player {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let data: PlayerOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        if has_address_changed {
            self.name = ctx.reader().read_wide_string(&data.name);
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shrine {
    pub(super) owner: u64,
    is_used: bool,
}

impl Shrine {
    pub fn is_used(&self) -> bool {
        self.is_used
    }
}

impl RemoteObject for Shrine {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: ShrineOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.is_used = data.is_used != 0;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

/// Allegiance of an entity relative to the local player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Positioned {
    pub(super) owner: u64,
    reaction: u8,
}

impl Positioned {
    pub fn reaction(&self) -> u8 {
        self.reaction
    }

    pub fn is_friendly(&self) -> bool {
        (self.reaction & 0x7F) == 1
    }
}

impl RemoteObject for Positioned {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: PositionedOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.reaction = data.reaction;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Targetable {
    pub(super) owner: u64,
    is_targetable: bool,
    is_highlightable: bool,
    is_targeted: bool,
    hidden_from_player: bool,
}

impl Targetable {
    pub fn is_targetable(&self) -> bool {
        self.is_targetable
    }

    pub fn is_highlightable(&self) -> bool {
        self.is_highlightable
    }

    pub fn is_targeted(&self) -> bool {
        self.is_targeted
    }

    pub fn hidden_from_player(&self) -> bool {
        self.hidden_from_player
    }
}

impl RemoteObject for Targetable {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: TargetableOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.is_targetable = data.is_targetable != 0;
        self.is_highlightable = data.is_highlightable != 0;
        self.is_targeted = data.is_targeted != 0;
        self.hidden_from_player = data.hidden_from_player != 0;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerableBlockage {
    pub(super) owner: u64,
    is_blocked: bool,
}

impl TriggerableBlockage {
    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }
}

impl RemoteObject for TriggerableBlockage {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: TriggerableBlockageOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.is_blocked = data.is_blocked != 0;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldItem {
    pub(super) owner: u64,
    item_entity: u64,
}

impl WorldItem {
    /// Address of the inventory entity this ground item wraps
    pub fn item_entity(&self) -> u64 {
        self.item_entity
    }
}

impl RemoteObject for WorldItem {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: WorldItemOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.item_entity = data.item_entity_ptr;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

/// Present on monsters that despawn on a timer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiesAfterTime {
    pub(super) owner: u64,
}

impl RemoteObject for DiesAfterTime {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let header: ComponentHeader = ctx.reader().read_value(address);
        self.owner = header.owner_entity;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinimapIcon {
    pub(super) owner: u64,
}

impl RemoteObject for MinimapIcon {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let header: ComponentHeader = ctx.reader().read_value(address);
        self.owner = header.owner_entity;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}
