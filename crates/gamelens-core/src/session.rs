//! Per-frame driver for the object tree.
//!
//! A [`Session`] owns everything decoded from the game and reacts to three
//! events: a new frame, a game state change and the game closing. The host
//! calls [`Session::tick`] once per frame with a [`GameStates`] source.

use std::sync::Arc;

use tracing::{debug, info};

use crate::area::AreaInstance;
use crate::cache::AddressCache;
use crate::config::{OffsetsCollection, Settings};
use crate::context::{AreaDetails, Context, GameStateKind};
use crate::error::Result;
use crate::memory::layout::states::{GameStatesOffsets, WorldAreaDat};
use crate::memory::{NativeRead, ReadMemory};
use crate::remote::Remote;
use crate::ui::{GameScale, ImportantUiElements};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    PerFrame,
    StateChanged(GameStateKind),
    SessionClosed,
}

/// What the game reports about itself at the start of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub state: GameStateKind,
    pub area_instance: u64,
    pub ui_root: u64,
    pub area: AreaDetails,
}

/// Source of the current game state and the roots of the object tree
pub trait GameStates {
    fn snapshot(&self) -> StateSnapshot;
}

/// Game states resolved through static pointer offsets
pub struct OffsetStates {
    reader: Arc<dyn ReadMemory>,
    offsets: OffsetsCollection,
}

impl OffsetStates {
    pub fn new(reader: Arc<dyn ReadMemory>, offsets: OffsetsCollection) -> Self {
        Self { reader, offsets }
    }

    pub fn offsets(&self) -> &OffsetsCollection {
        &self.offsets
    }
}

impl GameStates for OffsetStates {
    fn snapshot(&self) -> StateSnapshot {
        let reader = self.reader.as_ref();
        let table_ptr: u64 = reader.read_value(self.offsets.game_state);
        if table_ptr == 0 {
            return StateSnapshot::default();
        }
        let table: GameStatesOffsets = reader.read_value(table_ptr);

        let state = table
            .states
            .iter()
            .position(|&ptr| ptr != 0 && ptr == table.current_state_ptr)
            .and_then(GameStateKind::from_index)
            .unwrap_or_default();

        let in_game = table.states[GameStateKind::InGameState as usize];
        if in_game == 0 {
            return StateSnapshot {
                state,
                ..Default::default()
            };
        }

        let world_area: WorldAreaDat =
            reader.read_value(reader.read_value::<u64>(in_game + self.offsets.world_area));
        StateSnapshot {
            state,
            area_instance: reader.read_value(in_game + self.offsets.area_instance),
            ui_root: reader.read_value(in_game + self.offsets.ui_elements),
            area: AreaDetails {
                is_town: world_area.is_town != 0,
                is_hideout: world_area.is_hideout != 0,
            },
        }
    }
}

pub struct Session {
    ctx: Context,
    state: GameStateKind,
    snapshot: StateSnapshot,
    area: Remote<AreaInstance>,
    ui: Remote<ImportantUiElements>,
    frames: u64,
}

impl Session {
    pub fn new(reader: Arc<dyn ReadMemory>, settings: Arc<Settings>) -> Self {
        Self {
            ctx: Context::new(reader, settings),
            state: GameStateKind::default(),
            snapshot: StateSnapshot::default(),
            area: Remote::forced(AreaInstance::new()),
            ui: Remote::forced(ImportantUiElements::default()),
            frames: 0,
        }
    }

    pub fn with_scale(mut self, scale: GameScale) -> Self {
        self.ctx.scale = scale;
        self
    }

    pub fn state(&self) -> GameStateKind {
        self.state
    }

    pub fn area(&self) -> &AreaInstance {
        &self.area
    }

    pub fn ui(&self) -> &ImportantUiElements {
        &self.ui
    }

    pub fn strings(&self) -> &Arc<AddressCache<String>> {
        self.ctx.strings()
    }

    /// Frames processed since the session opened or was last closed
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Read the game state, announce a change, then process the frame
    pub fn tick(&mut self, states: &dyn GameStates) -> Result<()> {
        self.snapshot = states.snapshot();
        if self.snapshot.state != self.state {
            self.handle(CoreEvent::StateChanged(self.snapshot.state))?;
        }
        self.handle(CoreEvent::PerFrame)
    }

    pub fn handle(&mut self, event: CoreEvent) -> Result<()> {
        match event {
            CoreEvent::StateChanged(state) => {
                info!("Game state changed: {} -> {}", self.state, state);
                self.state = state;
                self.ui.on_state_changed(state);
                Ok(())
            }
            CoreEvent::PerFrame => self.on_frame(),
            CoreEvent::SessionClosed => {
                self.close();
                Ok(())
            }
        }
    }

    /// Drop every cache and unbind the object tree
    pub fn close(&mut self) {
        info!(
            "Session closed after {} frames, dropping {} cached strings",
            self.frames,
            self.ctx.strings().len()
        );
        self.ctx.strings().clear();
        self.area.unbind();
        self.ui.clear();
        self.ui.unbind();
        self.state = GameStateKind::default();
        self.snapshot = StateSnapshot::default();
        self.frames = 0;
    }

    fn on_frame(&mut self) -> Result<()> {
        self.frames += 1;
        let ctx = self
            .ctx
            .clone()
            .with_state(self.state)
            .with_area(self.snapshot.area);

        // the area pointer is only meaningful while the player is in one
        if matches!(
            self.state,
            GameStateKind::InGameState | GameStateKind::EscapeState
        ) {
            self.area.set_address(&ctx, self.snapshot.area_instance)?;
        } else {
            debug!("Skipping area refresh in {}", self.state);
        }
        self.ui.set_address(&ctx, self.snapshot.ui_root)
    }
}
