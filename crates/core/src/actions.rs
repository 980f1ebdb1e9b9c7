//! Player commands as the input layer hands them to the core.
//! This module exists to turn one command into world mutations and messages.
//! It does not own turn order or the player's wait timer (see `scheduler`).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::BuildKind;
use crate::error::CoreError;
use crate::grid::DesignationKind;
use crate::items::ItemTarget;
use crate::types::{Direction, EntityId, Pos};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Step one cell, or attack whatever fighter stands there.
    Move(Direction),
    Wait,
    PickUp,
    Drop(EntityId),
    Use { item: EntityId, target: Option<ItemTarget> },
    Descend,
    /// Mark the rectangle spanned by two corners for construction.
    Designate { from: Pos, to: Pos, kind: DesignationKind },
    /// Place a structure on one tile.
    Build { kind: BuildKind, at: Pos },
}

impl World {
    pub fn apply_command(&mut self, command: PlayerCommand) -> Result<(), CoreError> {
        let player = self.player;
        debug!(?command, turn = self.turn, "player command");
        match command {
            PlayerCommand::Move(direction) => {
                let (dx, dy) = direction.delta();
                self.move_or_attack(player, dx, dy)
            }
            PlayerCommand::Wait => Ok(()),
            PlayerCommand::PickUp => self.pick_up_here(player).map(|_| ()),
            PlayerCommand::Drop(item) => self.drop_item(player, item),
            PlayerCommand::Use { item, target } => self.use_item(player, item, target).map(|_| ()),
            PlayerCommand::Descend => self.descend(),
            PlayerCommand::Designate { from, to, kind } => {
                self.designate_rect(from, to, kind);
                Ok(())
            }
            PlayerCommand::Build { kind, at } => self.build_structure(kind, at).map(|_| ()),
        }
    }

    /// Attacks the first living fighter on the destination cell, otherwise moves.
    pub fn move_or_attack(&mut self, id: EntityId, dx: i32, dy: i32) -> Result<(), CoreError> {
        let (level, pos) = self.map_position(id)?;
        let dest = pos.offset(dx, dy);
        let target = self.entities_at(level, dest).into_iter().find(|&other| {
            other != id && self.entities.get(other).is_some_and(|entity| entity.is_alive())
        });
        match target {
            Some(target) => self.attack(id, target),
            None => self.move_entity(id, dx, dy).map(|_| ()),
        }
    }
}
