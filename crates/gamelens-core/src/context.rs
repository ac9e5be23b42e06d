//! Per-tick context passed down the object tree.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr, IntoStaticStr};
use tracing::trace;

use crate::area::GridPoint;
use crate::cache::AddressCache;
use crate::config::Settings;
use crate::memory::{NativeRead, ReadMemory};
use crate::ui::GameScale;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromRepr,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum GameStateKind {
    AreaLoadingState = 0,
    ChangePasswordState = 1,
    CreditsState = 2,
    EscapeState = 3,
    InGameState = 4,
    PreGameState = 5,
    LoginState = 6,
    WaitingState = 7,
    CreateCharacterState = 8,
    SelectCharacterState = 9,
    DeleteCharacterState = 10,
    LoadingState = 11,
    #[default]
    GameNotLoaded = 255,
}

impl GameStateKind {
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Town and hideout flags of the current world area
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AreaDetails {
    pub is_town: bool,
    pub is_hideout: bool,
}

impl AreaDetails {
    pub fn is_town_or_hideout(&self) -> bool {
        self.is_town || self.is_hideout
    }
}

/// What entities need to know about the local player
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: u32,
    pub grid_position: Option<GridPoint>,
}

impl PlayerView {
    /// Integer distance to `other`, or 0 when either position is unknown
    pub fn distance_to(&self, other: Option<GridPoint>) -> i32 {
        match (self.grid_position, other) {
            (Some(a), Some(b)) => a.distance_to(b),
            _ => 0,
        }
    }
}

/// Shared read access plus the state of the current tick.
///
/// Cloning is cheap: the reader, settings and string cache are shared.
#[derive(Clone)]
pub struct Context {
    reader: Arc<dyn ReadMemory>,
    settings: Arc<Settings>,
    strings: Arc<AddressCache<String>>,
    pub area: AreaDetails,
    pub state: GameStateKind,
    pub scale: GameScale,
    pub player: PlayerView,
}

impl Context {
    pub fn new(reader: Arc<dyn ReadMemory>, settings: Arc<Settings>) -> Self {
        Self {
            reader,
            settings,
            strings: Arc::new(AddressCache::new()),
            area: AreaDetails::default(),
            state: GameStateKind::default(),
            scale: GameScale::default(),
            player: PlayerView::default(),
        }
    }

    pub fn with_strings(mut self, strings: Arc<AddressCache<String>>) -> Self {
        self.strings = strings;
        self
    }

    pub fn with_area(mut self, area: AreaDetails) -> Self {
        self.area = area;
        self
    }

    pub fn with_state(mut self, state: GameStateKind) -> Self {
        self.state = state;
        self
    }

    pub fn with_scale(mut self, scale: GameScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_player(mut self, player: PlayerView) -> Self {
        self.player = player;
        self
    }

    pub fn reader(&self) -> &dyn ReadMemory {
        self.reader.as_ref()
    }

    pub fn shared_reader(&self) -> Arc<dyn ReadMemory> {
        Arc::clone(&self.reader)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn strings(&self) -> &Arc<AddressCache<String>> {
        &self.strings
    }

    /// Name stored behind a game data row, decoded once per row address.
    ///
    /// An unreadable or empty name is not cached, so the row is retried later.
    pub fn data_row_name(&self, row_address: u64) -> Option<String> {
        if row_address == 0 {
            return None;
        }
        if let Some(name) = self.strings.get(row_address) {
            return Some(name.as_ref().clone());
        }
        let reader = self.reader();
        let name = reader.read_heuristic_unicode_string(reader.read_value::<u64>(row_address));
        if name.is_empty() {
            trace!("No name behind data row {:#x}", row_address);
            return None;
        }
        self.strings
            .get_or_create(row_address, |_| name)
            .ok()
            .map(|name| name.as_ref().clone())
    }
}
