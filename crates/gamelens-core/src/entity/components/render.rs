use crate::area::GridPoint;
use crate::context::Context;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::components::RenderOffsets;
use crate::remote::RemoteObject;

/// Position of an entity in the world and on the terrain grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Render {
    pub(super) owner: u64,
    world_position: [f32; 3],
    grid_position: GridPoint,
    terrain_height: f32,
}

impl Render {
    pub fn world_position(&self) -> [f32; 3] {
        self.world_position
    }

    pub fn grid_position(&self) -> GridPoint {
        self.grid_position
    }

    pub fn terrain_height(&self) -> f32 {
        self.terrain_height
    }
}

impl RemoteObject for Render {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        let data: RenderOffsets = ctx.reader().read_value(address);
        self.owner = data.header.owner_entity;
        self.world_position = data.world_position;
        self.grid_position = GridPoint::new(data.grid_position[0], data.grid_position[1]);
        self.terrain_height = data.terrain_height;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}
