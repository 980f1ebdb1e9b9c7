//! Per-turn decision modules for non-player entities.
//!
//! A behavior runs only when its owner's wait timer is at zero and issues at most one
//! move or attack. It reaches its owner through the entity id it is handed, never a
//! stored back-reference. Returning `Some(next)` from [`Behavior::take_turn`] swaps the
//! owner's behavior, which is how confusion wears off.

mod confused;
mod explore;
mod pursue;
mod worker;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EntityId;
use crate::world::World;

pub use explore::ExploreState;
pub use worker::WorkerState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Behavior {
    /// Chase the player while it is in view and attack when adjacent.
    Pursue { has_spoken: bool },
    /// Stumble around at random, then resume `previous`.
    Confused { previous: Box<Behavior>, remaining: u32 },
    /// Walk to random open cells, one after another.
    Explore(ExploreState),
    /// Carry out construction designations.
    Worker(WorkerState),
}

impl Behavior {
    pub fn pursue() -> Self {
        Behavior::Pursue { has_spoken: false }
    }

    pub fn explore() -> Self {
        Behavior::Explore(ExploreState::default())
    }

    pub fn worker() -> Self {
        Behavior::Worker(WorkerState::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Pursue { .. } => "pursue",
            Behavior::Confused { .. } => "confused",
            Behavior::Explore(_) => "explore",
            Behavior::Worker(_) => "worker",
        }
    }

    pub fn take_turn(
        &mut self,
        world: &mut World,
        me: EntityId,
    ) -> Result<Option<Behavior>, CoreError> {
        match self {
            Behavior::Pursue { has_spoken } => {
                pursue::take_turn(world, me, has_spoken).map(|()| None)
            }
            Behavior::Confused { previous, remaining } => {
                confused::take_turn(world, me, previous, remaining)
            }
            Behavior::Explore(state) => state.take_turn(world, me).map(|()| None),
            Behavior::Worker(state) => state.take_turn(world, me).map(|()| None),
        }
    }
}

/// Counts consecutive blocked steps along a stored path. Once the limit is hit the
/// path is dropped so the owner plans a new one.
pub(crate) fn note_step(moved: bool, stuck_turns: &mut u32, limit: u32) -> bool {
    if moved {
        *stuck_turns = 0;
        return false;
    }
    *stuck_turns += 1;
    if *stuck_turns >= limit {
        *stuck_turns = 0;
        return true;
    }
    false
}
