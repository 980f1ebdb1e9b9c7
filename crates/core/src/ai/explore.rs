use serde::{Deserialize, Serialize};
use tracing::debug;

use super::note_step;
use crate::error::CoreError;
use crate::pathfinding::{Path, PathMap};
use crate::types::EntityId;
use crate::world::World;

/// Wanders from one random open cell to the next.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExploreState {
    /// Built on first use and rebuilt whenever the grid revision moves on.
    #[serde(skip)]
    pub path_map: Option<PathMap>,
    pub path: Path,
    /// Grid revision `path` was planned against.
    pub planned_at: u64,
    pub stuck_turns: u32,
}

impl ExploreState {
    pub(super) fn take_turn(&mut self, world: &mut World, me: EntityId) -> Result<(), CoreError> {
        let (level, pos) = world.map_position(me)?;
        let grid = &world.levels[level].grid;
        if self.planned_at != grid.revision() {
            self.path.clear();
        }
        let map = PathMap::refresh(&mut self.path_map, grid);

        if !self.path.is_empty() {
            let (dx, dy) = self.path.walk_next_step(pos)?;
            let moved = world.move_entity(me, dx, dy)?;
            if note_step(moved, &mut self.stuck_turns, world.config.stuck_replan_turns) {
                debug!(?me, "explorer stuck, dropping path");
                self.path.clear();
            }
            return Ok(());
        }

        let candidates: Vec<_> =
            grid.unblocked_positions().into_iter().filter(|&cell| cell != pos).collect();
        if candidates.is_empty() {
            return Ok(());
        }
        let destination = candidates[world.rng.index(candidates.len())];
        self.path = map.compute_path(pos, destination);
        self.planned_at = grid.revision();
        debug!(?me, ?destination, len = self.path.len(), "explorer picked destination");
        Ok(())
    }
}
