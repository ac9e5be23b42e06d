//! Address-keyed caches shared across the object tree

mod address_cache;
mod ui_parents;

pub use address_cache::AddressCache;
pub use ui_parents::{MAX_PARENT_ROUNDS, UiElementParents};
