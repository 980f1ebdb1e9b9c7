//! Procedural level generation split into coherent submodules.
//!
//! Depth 0 is the Martian surface; every deeper level is a cave. Generation is a
//! pure function of `(params, seed, depth)` and never touches the world RNG.

pub mod model;

mod layout;
mod population;
mod seed;
mod surface;
mod underground;

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::grid::Grid;
use crate::pathfinding::neighbors;
use crate::types::Pos;

pub use model::{GeneratedLevel, LevelKind, MapGenParams, Spawn, SpawnKind};
pub use seed::derive_level_seed;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LevelDefect {
    #[error("spawn on blocked tile at {pos:?}")]
    SpawnOnBlockedTile { pos: Pos },
    #[error("two spawns share {pos:?}")]
    SpawnsOverlap { pos: Pos },
    #[error("player start is blocked")]
    PlayerStartBlocked,
    #[error("player start has no open neighbour")]
    PlayerStartEnclosed,
    #[error("stairs are blocked")]
    StairsBlocked,
    #[error("stairs cannot be reached from the player start")]
    StairsUnreachable,
}

pub fn generate_level(params: &MapGenParams, seed: u64, depth: usize) -> GeneratedLevel {
    let level = match LevelKind::for_depth(depth) {
        LevelKind::Surface => surface::generate(params, seed, depth),
        LevelKind::Underground => underground::generate(params, seed, depth),
    };
    debug!(depth, seed, kind = ?level.kind, spawns = level.spawns.len(), "generated level");
    debug_assert_eq!(validate_level(&level), Ok(()), "seed={seed} depth={depth}");
    level
}

/// Checks the output contract every generator must meet.
pub fn validate_level(level: &GeneratedLevel) -> Result<(), LevelDefect> {
    let grid = &level.grid;
    let start = level.player_start;
    if grid.is_blocked(start) {
        return Err(LevelDefect::PlayerStartBlocked);
    }
    if neighbors(start).into_iter().all(|pos| grid.is_blocked(pos)) {
        return Err(LevelDefect::PlayerStartEnclosed);
    }

    let mut taken = BTreeSet::new();
    for spawn in &level.spawns {
        if grid.is_blocked(spawn.pos) {
            return Err(LevelDefect::SpawnOnBlockedTile { pos: spawn.pos });
        }
        if !taken.insert(spawn.pos) {
            return Err(LevelDefect::SpawnsOverlap { pos: spawn.pos });
        }
    }

    if let Some(stairs) = level.stairs {
        if grid.is_blocked(stairs) {
            return Err(LevelDefect::StairsBlocked);
        }
        if !reachable_from(grid, start).contains(&stairs) {
            return Err(LevelDefect::StairsUnreachable);
        }
    }
    Ok(())
}

fn reachable_from(grid: &Grid, origin: Pos) -> BTreeSet<Pos> {
    let mut seen = BTreeSet::from([origin]);
    let mut open = VecDeque::from([origin]);
    while let Some(pos) = open.pop_front() {
        for next in neighbors(pos) {
            if !grid.is_blocked(next) && seen.insert(next) {
                open.push_back(next);
            }
        }
    }
    seen
}
