//! Error taxonomy for core operations.
//!
//! Every variant is contained to the entity turn or player command that raised it;
//! the scheduler sweep and `World::step` never let one escape the turn loop.

use crate::types::{EntityId, Pos};

/// Which optional entity component an operation needed but did not find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Fighter,
    Behavior,
    Item,
    UseEffect,
    Equipment,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Coordinate outside `[0, width) x [0, height)`.
    #[error("position {pos:?} is out of map bounds")]
    OutOfBounds { pos: Pos },

    /// A path was stepped after it had been fully consumed.
    #[error("cannot step an exhausted path")]
    InvalidPath,

    /// Pickup refused; the item stays on the ground.
    #[error("inventory is full ({capacity} slots)")]
    InventoryFull { capacity: usize },

    #[error("entity {entity:?} has no {component:?} component")]
    ComponentMissing { entity: EntityId, component: Component },

    #[error("entity does not exist")]
    NoSuchEntity,

    #[error("item is not carried by that entity")]
    NotCarried,

    #[error("entity is not placed on a map")]
    NotOnMap,

    /// Building refused: the site is a wall or something already stands there.
    #[error("cannot build on {pos:?}, the site is blocked")]
    SiteBlocked { pos: Pos },

    #[error("no transition tile at the player position")]
    NotOnTransitionTile,

    #[error("player is still waiting ({wait} ticks left)")]
    PlayerNotReady { wait: u32 },

    #[error("no level-up is pending")]
    NoLevelUpPending,

    #[error("the game is over")]
    GameOver,
}

impl CoreError {
    /// Errors a behavior or command can absorb locally with a message instead of
    /// treating them as programming mistakes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::InventoryFull { .. }
                | CoreError::ComponentMissing { .. }
                | CoreError::NotCarried
                | CoreError::NotOnTransitionTile
                | CoreError::SiteBlocked { .. }
                | CoreError::PlayerNotReady { .. }
                | CoreError::NoLevelUpPending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_is_not_recoverable() {
        assert!(!CoreError::InvalidPath.is_recoverable());
        assert!(!CoreError::OutOfBounds { pos: Pos::new(-1, 0) }.is_recoverable());
        assert!(CoreError::InventoryFull { capacity: 26 }.is_recoverable());
    }

    #[test]
    fn out_of_bounds_message_names_the_position() {
        let text = CoreError::OutOfBounds { pos: Pos::new(90, 3) }.to_string();
        assert!(text.contains("x: 90"), "unexpected message: {text}");
    }
}
