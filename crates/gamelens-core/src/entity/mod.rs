//! Awake entities of the current area and their components.

mod classify;
pub mod components;
mod enums;
#[cfg(test)]
pub(crate) mod fixtures;
mod object;

pub use components::{Component, ComponentKind, ComponentView};
pub use enums::{EntityState, EntitySubtype, EntityType, Rarity};
pub use object::Entity;

pub use crate::memory::layout::entity::{EntityNodeKey, VISUAL_ENTITY_ID_START};

/// False for client-side visuals and decorations, which are never tracked
pub fn ignore_visuals_and_decorations(key: &EntityNodeKey) -> bool {
    key.id < VISUAL_ENTITY_ID_START
}
