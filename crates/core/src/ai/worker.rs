use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::note_step;
use crate::error::CoreError;
use crate::grid::DesignationKind;
use crate::pathfinding::{Path, PathMap, neighbors};
use crate::types::{EntityId, Pos};
use crate::world::World;

/// Claims designated tiles in row-major order, walks next to them and does the work.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkerState {
    #[serde(skip)]
    pub path_map: Option<PathMap>,
    pub path: Path,
    /// Grid revision `path` and `passed_over` were decided against.
    pub planned_at: u64,
    pub work_target: Option<Pos>,
    pub stuck_turns: u32,
    /// Designations this worker gave up on. Skipped by the scan until the grid changes
    /// or nothing else is left.
    pub passed_over: BTreeSet<Pos>,
}

impl WorkerState {
    pub(super) fn take_turn(&mut self, world: &mut World, me: EntityId) -> Result<(), CoreError> {
        let (level, pos) = world.map_position(me)?;
        let revision = world.levels[level].grid.revision();
        if self.planned_at != revision {
            self.path.clear();
            self.passed_over.clear();
            self.planned_at = revision;
        }

        if !self.path.is_empty() {
            let (dx, dy) = self.path.walk_next_step(pos)?;
            let moved = world.move_entity(me, dx, dy)?;
            if note_step(moved, &mut self.stuck_turns, world.config.stuck_replan_turns) {
                debug!(?me, "worker stuck, dropping path");
                self.path.clear();
            }
            return Ok(());
        }

        if let Some(target) = self.work_target {
            let on_wall_site = pos == target
                && designation_kind(world, level, target)? == Some(DesignationKind::Wall);
            if on_wall_site {
                if !step_aside(world, me, level, pos)? {
                    self.pass_over(world, level, target)?;
                }
                return Ok(());
            }
            if pos.chebyshev(target) <= 1 {
                return self.work_on(world, me, level, target);
            }
            if !self.approach(world, level, pos, target) {
                self.pass_over(world, level, target)?;
            }
            return Ok(());
        }

        let next = world.levels[level]
            .grid
            .open_designations()
            .find(|candidate| !self.passed_over.contains(candidate));
        let Some(target) = next else {
            if !self.passed_over.is_empty() {
                debug!(?me, count = self.passed_over.len(), "worker retrying passed-over sites");
                self.passed_over.clear();
            }
            return Ok(());
        };
        world.levels[level].grid.set_designation_claimed(target, true)?;
        self.work_target = Some(target);
        debug!(?me, ?target, "worker claimed designation");
        if pos.chebyshev(target) > 1 && !self.approach(world, level, pos, target) {
            self.pass_over(world, level, target)?;
        }
        Ok(())
    }

    /// Plans a route to a cell next to `target`. `false` when there is none.
    fn approach(&mut self, world: &World, level: usize, pos: Pos, target: Pos) -> bool {
        let grid = &world.levels[level].grid;
        let map = PathMap::refresh(&mut self.path_map, grid);
        self.path = map.approach_path(pos, target);
        self.planned_at = grid.revision();
        !self.path.is_empty()
    }

    fn work_on(
        &mut self,
        world: &mut World,
        me: EntityId,
        level: usize,
        target: Pos,
    ) -> Result<(), CoreError> {
        let speed = world.entities.get(me).map_or(0, |entity| entity.speed);
        if !world.complete_designation(level, target)? {
            debug!(?me, ?target, "construction refused");
            self.pass_over(world, level, target)?;
            return Ok(());
        }
        if let Some(entity) = world.entities.get_mut(me) {
            entity.wait = speed;
        }
        self.work_target = None;
        Ok(())
    }

    /// Releases the claim on `target` and leaves it for later.
    fn pass_over(&mut self, world: &mut World, level: usize, target: Pos) -> Result<(), CoreError> {
        debug!(?target, "worker passed over designation");
        self.passed_over.insert(target);
        world.levels[level].grid.set_designation_claimed(target, false)?;
        self.work_target = None;
        self.path.clear();
        Ok(())
    }
}

fn designation_kind(
    world: &World,
    level: usize,
    pos: Pos,
) -> Result<Option<DesignationKind>, CoreError> {
    let tile = world.levels[level].grid.tile_at(pos)?;
    Ok(tile.designation.map(|designation| designation.kind))
}

/// Moves off a wall site onto the first free neighbour. `false` when boxed in.
fn step_aside(world: &mut World, me: EntityId, level: usize, pos: Pos) -> Result<bool, CoreError> {
    let free = neighbors(pos).into_iter().find(|&cell| !world.is_occupied_blocking(level, cell));
    match free {
        Some(cell) => world.move_entity(me, cell.x - pos.x, cell.y - pos.y),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Behavior;
    use crate::entity::Entity;
    use crate::grid::Tile;
    use crate::test_support::{add_robot, open_world, run_behavior};
    use crate::types::Tint;

    fn add_worker(world: &mut World, pos: Pos) -> EntityId {
        let id = add_robot(world, pos);
        world.entities[id].ai = Some(Behavior::worker());
        id
    }

    fn worker_state(world: &World, id: EntityId) -> &WorkerState {
        match &world.entities[id].ai {
            Some(Behavior::Worker(state)) => state,
            other => panic!("expected worker behavior, got {other:?}"),
        }
    }

    #[test]
    fn idle_without_designations() {
        let (mut world, _player) = open_world(8, 8, Pos::new(0, 0));
        let worker = add_worker(&mut world, Pos::new(4, 4));
        run_behavior(&mut world, worker);
        assert_eq!(world.entities[worker].pos, Pos::new(4, 4));
        assert!(worker_state(&world, worker).work_target.is_none());
    }

    #[test]
    fn claims_walks_over_and_clears_a_designated_wall() {
        let (mut world, _player) = open_world(12, 6, Pos::new(0, 0));
        let target = Pos::new(9, 3);
        world.grid_mut().set_tile(target, Tile::wall()).unwrap();
        world.designate_rect(target, target, DesignationKind::Clearing);
        let worker = add_worker(&mut world, Pos::new(2, 3));

        run_behavior(&mut world, worker);
        assert_eq!(worker_state(&world, worker).work_target, Some(target));
        assert!(world.grid().tile_at(target).unwrap().designation.unwrap().in_progress);

        for _ in 0..20 {
            if worker_state(&world, worker).work_target.is_none() {
                break;
            }
            run_behavior(&mut world, worker);
        }

        let tile = world.grid().tile_at(target).unwrap();
        assert!(!tile.blocked);
        assert!(tile.designation.is_none());
        assert!(worker_state(&world, worker).work_target.is_none());
        assert!(world.entities[worker].pos.is_adjacent(target));
    }

    #[test]
    fn scans_designations_in_row_major_order() {
        let (mut world, _player) = open_world(10, 10, Pos::new(0, 0));
        world.designate_rect(Pos::new(7, 6), Pos::new(7, 6), DesignationKind::Clearing);
        world.designate_rect(Pos::new(2, 3), Pos::new(3, 3), DesignationKind::Clearing);
        let worker = add_worker(&mut world, Pos::new(5, 5));
        run_behavior(&mut world, worker);
        assert_eq!(worker_state(&world, worker).work_target, Some(Pos::new(2, 3)));
    }

    #[test]
    fn unreachable_designation_is_released() {
        let (mut world, _player) = open_world(10, 5, Pos::new(0, 0));
        for y in 0..5 {
            world.grid_mut().set_tile(Pos::new(5, y), Tile::wall()).unwrap();
        }
        let target = Pos::new(8, 2);
        world.designate_rect(target, target, DesignationKind::Clearing);
        let worker = add_worker(&mut world, Pos::new(2, 2));

        run_behavior(&mut world, worker);
        assert!(worker_state(&world, worker).work_target.is_none());
        assert!(!world.grid().tile_at(target).unwrap().designation.unwrap().in_progress);
    }

    #[test]
    fn wall_is_not_raised_on_an_occupied_tile() {
        let (mut world, _player) = open_world(8, 8, Pos::new(0, 0));
        let target = Pos::new(4, 3);
        world.spawn(Entity::new("crate", '#', Tint::Grey, target).blocking(), 0);
        world.designate_rect(target, target, DesignationKind::Wall);
        world.designate_rect(Pos::new(1, 6), Pos::new(1, 6), DesignationKind::Clearing);
        let worker = add_worker(&mut world, Pos::new(4, 4));

        run_behavior(&mut world, worker);
        run_behavior(&mut world, worker);
        assert!(!world.grid().is_blocked(target));
        assert!(worker_state(&world, worker).work_target.is_none());

        run_behavior(&mut world, worker);
        assert_eq!(worker_state(&world, worker).work_target, Some(Pos::new(1, 6)));
    }

    #[test]
    fn unreachable_designation_does_not_starve_later_ones() {
        let (mut world, _player) = open_world(10, 6, Pos::new(0, 0));
        for y in 0..6 {
            world.grid_mut().set_tile(Pos::new(5, y), Tile::wall()).unwrap();
        }
        let unreachable = Pos::new(8, 1);
        let reachable = Pos::new(1, 4);
        world.designate_rect(unreachable, unreachable, DesignationKind::Clearing);
        world.designate_rect(reachable, reachable, DesignationKind::Clearing);
        let worker = add_worker(&mut world, Pos::new(3, 2));

        for _ in 0..200 {
            if world.grid().tile_at(reachable).unwrap().designation.is_none() {
                break;
            }
            run_behavior(&mut world, worker);
        }

        assert!(world.grid().tile_at(reachable).unwrap().designation.is_none());
        assert!(world.entities[worker].pos.chebyshev(reachable) <= 1);
        let left = world.grid().tile_at(unreachable).unwrap().designation.unwrap();
        assert!(!left.in_progress);
    }

    #[test]
    fn worker_steps_off_its_own_wall_site_before_building() {
        let (mut world, _player) = open_world(10, 8, Pos::new(0, 0));
        let wall_site = Pos::new(3, 2);
        let clearing = Pos::new(7, 4);
        world.designate_rect(wall_site, wall_site, DesignationKind::Wall);
        world.designate_rect(clearing, clearing, DesignationKind::Clearing);
        let worker = add_worker(&mut world, wall_site);

        for _ in 0..200 {
            if world.grid().tile_at(clearing).unwrap().designation.is_none() {
                break;
            }
            run_behavior(&mut world, worker);
        }

        assert!(world.grid().is_blocked(wall_site));
        assert!(world.grid().tile_at(wall_site).unwrap().designation.is_none());
        assert!(world.grid().tile_at(clearing).unwrap().designation.is_none());
        assert_ne!(world.entities[worker].pos, wall_site);
    }

    #[test]
    fn boxed_in_worker_passes_over_its_wall_site() {
        let (mut world, _player) = open_world(3, 3, Pos::new(0, 0));
        for pos in [(1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)] {
            world.grid_mut().set_tile(Pos::new(pos.0, pos.1), Tile::wall()).unwrap();
        }
        let site = Pos::new(1, 1);
        world.designate_rect(site, site, DesignationKind::Wall);
        let worker = add_worker(&mut world, site);

        run_behavior(&mut world, worker);
        run_behavior(&mut world, worker);
        let state = worker_state(&world, worker);
        assert!(state.work_target.is_none());
        assert!(state.passed_over.contains(&site));
        assert!(!world.grid().tile_at(site).unwrap().designation.unwrap().in_progress);
    }
}
