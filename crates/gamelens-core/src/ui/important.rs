use crate::cache::UiElementParents;
use crate::context::{Context, GameStateKind};
use crate::error::Result;
use crate::memory::NativeRead;
use crate::memory::layout::ui::{ImportantUiElementsOffsets, MapParentStruct};
use crate::remote::{Remote, RemoteObject};
use crate::ui::MapUiElement;

/// UI elements the observer tracks every frame, and the parent cache their
/// positions are resolved through
#[derive(Debug)]
pub struct ImportantUiElements {
    parents: UiElementParents,
    large_map: Remote<MapUiElement>,
    mini_map: Remote<MapUiElement>,
}

impl Default for ImportantUiElements {
    fn default() -> Self {
        Self {
            parents: UiElementParents::new(GameStateKind::InGameState, GameStateKind::EscapeState),
            large_map: Remote::forced(MapUiElement::default()),
            mini_map: Remote::forced(MapUiElement::default()),
        }
    }
}

impl ImportantUiElements {
    pub fn parents(&self) -> &UiElementParents {
        &self.parents
    }

    pub fn large_map(&self) -> &Remote<MapUiElement> {
        &self.large_map
    }

    pub fn mini_map(&self) -> &Remote<MapUiElement> {
        &self.mini_map
    }

    pub fn on_state_changed(&mut self, state: GameStateKind) {
        self.parents.on_state_changed(state);
    }

    /// Drop the parent cache and unbind both maps
    pub fn clear(&mut self) {
        self.parents.clear();
        self.cleanup();
    }
}

impl RemoteObject for ImportantUiElements {
    fn update(&mut self, ctx: &Context, address: u64, _has_address_changed: bool) -> Result<()> {
        if ctx.state != GameStateKind::InGameState {
            return Ok(());
        }

        let reader = ctx.reader();
        let offsets: ImportantUiElementsOffsets = reader.read_value(address);
        let maps: MapParentStruct = reader.read_value(offsets.map_parent_ptr);
        self.large_map.set_address(ctx, maps.large_map_ptr)?;
        self.mini_map.set_address(ctx, maps.mini_map_ptr)?;

        for parent in [
            self.large_map.parent_address(),
            self.mini_map.parent_address(),
        ] {
            self.parents.add_if_not_exists(ctx, parent);
        }
        self.parents.update_all(ctx);
        Ok(())
    }

    fn cleanup(&mut self) {
        self.large_map.unbind();
        self.mini_map.unbind();
    }
}
