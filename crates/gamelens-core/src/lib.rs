//! # gamelens-core
//!
//! Core library for the gamelens memory observer.
//!
//! This crate provides:
//! - Read-only process memory access and defensive decoders for native containers
//! - Address-keyed caches and the address-bound remote object lifecycle
//! - Entity reconciliation and classification for the current area
//! - Terrain height grid and tile-name reconstruction
//! - UI element tree decoding
//! - A per-frame session driven by tick, state-change and session-close events

pub mod area;
pub mod cache;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod memory;
pub mod remote;
pub mod session;
pub mod ui;

pub use area::{AreaInstance, DisappearingEntities, GridPoint};
pub use cache::{AddressCache, UiElementParents};
pub use config::{Config, OffsetsCollection, ProcessConfig, Settings};
pub use context::{AreaDetails, Context, GameStateKind, PlayerView};
pub use diagnostics::{AreaSnapshot, CacheSnapshot, EntitySnapshot};
pub use entity::{
    Component, ComponentKind, ComponentView, Entity, EntityNodeKey, EntityState, EntitySubtype,
    EntityType,
};
pub use error::{Error, Result};
pub use memory::{MemoryReader, NativeRead, ProcessHandle, ReadMemory};
pub use remote::{Remote, RemoteObject};
pub use session::{CoreEvent, GameStates, OffsetStates, Session, StateSnapshot};
pub use ui::{GameScale, ImportantUiElements, MapUiElement, UiElementBase};
