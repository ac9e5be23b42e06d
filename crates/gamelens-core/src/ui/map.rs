use std::ops::Deref;

use crate::context::Context;
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::ui::MapUiElementOffset;
use crate::remote::RemoteObject;
use crate::ui::UiElementBase;

const DEFAULT_ZOOM: f32 = 0.5;

/// Large map or mini map: a UI element plus its pan and zoom
#[derive(Debug, Clone, PartialEq)]
pub struct MapUiElement {
    base: UiElementBase,
    shift: [f32; 2],
    default_shift: [f32; 2],
    zoom: f32,
}

impl Default for MapUiElement {
    fn default() -> Self {
        Self {
            base: UiElementBase::default(),
            shift: [0.0; 2],
            default_shift: [0.0; 2],
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapUiElement {
    pub fn shift(&self) -> [f32; 2] {
        self.shift
    }

    pub fn default_shift(&self) -> [f32; 2] {
        self.default_shift
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }
}

impl Deref for MapUiElement {
    type Target = UiElementBase;

    fn deref(&self) -> &UiElementBase {
        &self.base
    }
}

impl RemoteObject for MapUiElement {
    fn update(&mut self, ctx: &Context, address: u64, has_address_changed: bool) -> Result<()> {
        let data: MapUiElementOffset = ctx.reader().read_value(address);
        self.base.apply(ctx, address, &data.base, has_address_changed);
        self.shift = data.shift;
        self.default_shift = data.default_shift;
        self.zoom = data.zoom;
        Ok(())
    }

    fn cleanup(&mut self) {
        *self = Self::default();
    }
}
