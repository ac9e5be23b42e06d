//! Configuration loaded from a TOML file
//!
//! ```toml
//! [process]
//! name = "PathOfExile.exe"
//! tick_interval_ms = 16
//!
//! [settings]
//! nearby_radius = 70
//! poi_monster_paths = ["Metadata/Monsters/LeagueHeist"]
//!
//! [offsets]
//! version = "3.23.0"
//! game_state = 0x7ff6_1234_5678
//! area_instance = 0x948
//! ui_elements = 0xa80
//! world_area = 0x9d0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Executable name of the observed game
pub const DEFAULT_PROCESS_NAME: &str = "PathOfExile.exe";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessConfig,
    pub settings: Settings,
    pub offsets: OffsetsCollection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Executable name used to find the process
    pub name: String,
    /// Delay between ticks
    pub tick_interval_ms: u64,
    /// Emit a summary log line every this many ticks (0 disables)
    pub summary_every: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROCESS_NAME.to_string(),
            tick_interval_ms: 16,
            summary_every: 300,
        }
    }
}

/// Options consulted while decoding entities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Skip entity reconciliation while in a town or hideout
    pub disable_entity_processing_in_town_or_hideout: bool,
    /// Grid distance under which an entity counts as nearby
    pub nearby_radius: i32,
    /// Path prefixes of monsters treated as points of interest
    pub poi_monster_paths: Vec<String>,
    /// Player name treated as the party leader
    pub leader_name: String,
    /// Unseen entities closer than this to the player may be evicted
    pub stale_entity_removal_radius: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            disable_entity_processing_in_town_or_hideout: false,
            nearby_radius: 70,
            poi_monster_paths: Vec::new(),
            leader_name: String::new(),
            stale_entity_removal_radius: 150,
        }
    }
}

impl Settings {
    pub fn is_poi_monster(&self, path: &str) -> bool {
        self.poi_monster_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Static pointers into the game for one client version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetsCollection {
    pub version: String,
    /// Absolute address of the pointer to the game state table
    pub game_state: u64,
    /// Offset of the area instance pointer inside the in-game state
    pub area_instance: u64,
    /// Offset of the UI root pointer inside the in-game state
    pub ui_elements: u64,
    /// Offset of the world area row pointer inside the in-game state
    pub world_area: u64,
}

impl OffsetsCollection {
    pub fn is_valid(&self) -> bool {
        !self.version.is_empty() && self.game_state != 0 && self.area_instance != 0
    }
}

impl Config {
    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load(path.as_ref()) {
            Ok(config) => Ok(config),
            Err(e) if e.is_not_found() => {
                debug!("Config file {} not found", path.as_ref().display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.process.name.is_empty() {
            return Err(Error::InvalidConfig("process.name is empty".to_string()));
        }
        if self.settings.nearby_radius < 0 {
            return Err(Error::InvalidConfig(
                "settings.nearby_radius must not be negative".to_string(),
            ));
        }
        if self.settings.stale_entity_removal_radius < 0 {
            return Err(Error::InvalidConfig(
                "settings.stale_entity_removal_radius must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
