use std::collections::HashMap;

use tracing::{debug, warn};

use crate::context::{Context, GameStateKind};
use crate::remote::Remote;
use crate::ui::UiElementBase;

/// Upper bound on ancestor discovery rounds per `update_all`
pub const MAX_PARENT_ROUNDS: usize = 32;

/// Parents of UI elements, keyed by address and scoped to a pair of game
/// states. Leaving both owning states empties the cache.
#[derive(Debug)]
pub struct UiElementParents {
    owners: [GameStateKind; 2],
    cache: HashMap<u64, Remote<UiElementBase>>,
}

impl UiElementParents {
    pub fn new(owner_a: GameStateKind, owner_b: GameStateKind) -> Self {
        Self {
            owners: [owner_a, owner_b],
            cache: HashMap::new(),
        }
    }

    /// Decode and cache the element at `address` unless it is already known
    pub fn add_if_not_exists(&mut self, ctx: &Context, address: u64) -> bool {
        if address == 0 || self.cache.contains_key(&address) {
            return false;
        }
        match Remote::bind(ctx, address, UiElementBase::default()) {
            Ok(element) => {
                self.cache.insert(address, element);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to add the UI element parent {:#x} to the cache: {}",
                    address, e
                );
                false
            }
        }
    }

    pub fn get(&self, address: u64) -> Option<&UiElementBase> {
        self.cache.get(&address).map(|remote| &**remote)
    }

    /// Refresh every cached parent, then cache newly discovered ancestors
    /// until none are left or `MAX_PARENT_ROUNDS` is reached
    pub fn update_all(&mut self, ctx: &Context) {
        for remote in self.cache.values_mut() {
            let address = remote.address();
            if let Err(e) = remote.set_address(ctx, address) {
                warn!("Failed to update the UI element parent {:#x}: {}", address, e);
            }
        }

        for _ in 0..MAX_PARENT_ROUNDS {
            let mut discovered: Vec<u64> = self
                .cache
                .values()
                .map(|element| element.parent_address())
                .filter(|&parent| parent != 0 && !self.cache.contains_key(&parent))
                .collect();
            if discovered.is_empty() {
                return;
            }
            discovered.sort_unstable();
            discovered.dedup();
            for address in discovered {
                self.add_if_not_exists(ctx, address);
            }
        }
        debug!(
            "Stopped discovering UI parents after {} rounds",
            MAX_PARENT_ROUNDS
        );
    }

    /// Drop every parent unless `state` is one of the owning states
    pub fn on_state_changed(&mut self, state: GameStateKind) {
        if !self.owners.contains(&state) {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn addresses(&self) -> Vec<u64> {
        let mut addresses: Vec<u64> = self.cache.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }
}
