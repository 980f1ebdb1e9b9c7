pub mod actions;
pub mod ai;
pub mod combat;
pub mod config;
pub mod content;
pub mod entity;
pub mod error;
pub mod grid;
pub mod items;
pub mod mapgen;
pub mod messages;
pub mod pathfinding;
pub mod rng;
pub mod save;
pub mod scheduler;
pub mod snapshot;
pub mod types;
pub mod visibility;
pub mod world;

#[cfg(test)]
mod test_support;

pub use actions::PlayerCommand;
pub use ai::Behavior;
pub use combat::{DeathKind, Fighter, LevelUpChoice};
pub use config::{ConfigError, EngineConfig};
pub use content::BuildKind;
pub use entity::{Entity, Placement};
pub use error::{Component, CoreError};
pub use grid::{Designation, DesignationKind, Grid, Tile};
pub use items::{EquipSlot, Equipment, Item, ItemTarget, UseEffect};
pub use messages::{Message, MessageLog};
pub use save::{SaveError, SaveFile};
pub use scheduler::{RunResult, RunStopReason, StepOutcome, SweepReport};
pub use snapshot::{EntityView, RenderSnapshot, StatusView, TileView};
pub use types::*;
pub use world::{GameStatus, Level, World};
