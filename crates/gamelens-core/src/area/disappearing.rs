use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::entity::{Entity, EntityNodeKey};
use crate::remote::Remote;

/// League content whose entities vanish from the awake list without being
/// invalidated. Active while the area carries an environment id inside
/// `[min_environment, max_environment]`.
#[derive(Debug)]
pub struct DisappearingEntities {
    name: &'static str,
    min_environment: i32,
    max_environment: i32,
    is_active: bool,
    keys: DashSet<EntityNodeKey>,
}

impl DisappearingEntities {
    pub fn new(name: &'static str, min_environment: i32, max_environment: i32) -> Self {
        Self {
            name,
            min_environment,
            max_environment,
            is_active: false,
            keys: DashSet::new(),
        }
    }

    /// The caches tracked for every area
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Breach", 1108, 1112),
            Self::new("LeagueAffliction", 1118, 1118),
            Self::new("Hellscape", 1248, 1259),
        ]
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &EntityNodeKey) -> bool {
        self.keys.contains(key)
    }

    /// Record `key` when the cache is active and `path` belongs to it.
    /// Safe to call from parallel workers.
    pub fn try_add(&self, key: EntityNodeKey, path: &str) -> bool {
        if !self.is_active || !path.contains(self.name) {
            return false;
        }
        self.keys.insert(key);
        true
    }

    /// Recompute activity; on deactivation drop every recorded entity from `entities`
    pub fn update_state(
        &mut self,
        environments: &[i32],
        entities: &DashMap<EntityNodeKey, Remote<Entity>>,
    ) {
        let active = environments
            .iter()
            .any(|env| (self.min_environment..=self.max_environment).contains(env));
        if self.is_active && !active {
            debug!(
                "{} content ended, dropping {} entities",
                self.name,
                self.keys.len()
            );
            for key in self.keys.iter() {
                entities.remove(key.key());
            }
            self.keys.clear();
        }
        self.is_active = active;
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.is_active = false;
    }
}
