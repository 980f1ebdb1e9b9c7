//! Spawn tables and placement rules for the things that start on a level, plus
//! cosmetic debris.

use crate::grid::Grid;
use crate::pathfinding::neighbors;
use crate::types::{Pos, Tint};

use super::layout::RoomRect;
use super::model::{Spawn, SpawnKind};
use super::seed::SeedStream;

/// `(value, from_level)` pairs. Difficulty level is depth + 1.
type DepthTable = &'static [(usize, usize)];

const MAX_NPCS: DepthTable = &[(2, 1), (3, 4), (5, 6)];
const MAX_ITEMS: DepthTable = &[(1, 1), (2, 4)];
const SECURITY_BOT_CHANCE: DepthTable = &[(10, 1), (15, 3), (30, 5), (60, 7)];
const LIGHTNING_CHANCE: DepthTable = &[(25, 4)];
const FIREBALL_CHANCE: DepthTable = &[(25, 6)];
const CONFUSE_CHANCE: DepthTable = &[(10, 2)];

const DEBRIS_WEIGHTS: [usize; 4] = [100, 10, 10, 10];

/// Value of the last entry whose level has been reached, or zero before the first.
pub(super) fn from_depth(table: DepthTable, depth: usize) -> usize {
    let level = depth + 1;
    table.iter().rev().find(|&&(_, from)| level >= from).map_or(0, |&(value, _)| value)
}

fn npc_table(depth: usize) -> [(SpawnKind, usize); 3] {
    [
        (SpawnKind::Robot, 80),
        (SpawnKind::SecurityBot, from_depth(SECURITY_BOT_CHANCE, depth)),
        (SpawnKind::Explorer, 80),
    ]
}

fn item_table(depth: usize) -> [(SpawnKind, usize); 6] {
    [
        (SpawnKind::HealingPotion, 35),
        (SpawnKind::LightningScroll, from_depth(LIGHTNING_CHANCE, depth)),
        (SpawnKind::FireballScroll, from_depth(FIREBALL_CHANCE, depth)),
        (SpawnKind::ConfusionScroll, from_depth(CONFUSE_CHANCE, depth)),
        (SpawnKind::Sword, 25),
        (SpawnKind::Shield, 15),
    ]
}

fn pick(stream: &mut SeedStream, table: &[(SpawnKind, usize)]) -> SpawnKind {
    let weights: Vec<usize> = table.iter().map(|&(_, weight)| weight).collect();
    table[stream.weighted(&weights)].0
}

/// Cells nothing may spawn on: the player start and the stairs.
pub(super) struct Reserved {
    pub(super) cells: Vec<Pos>,
}

impl Reserved {
    fn allows(&self, spawns: &[Spawn], pos: Pos) -> bool {
        !self.cells.contains(&pos) && !spawns.iter().any(|spawn| spawn.pos == pos)
    }
}

/// Up to the depth's NPC and item limits, at random cells of `room`. A roll that
/// lands on a blocked or taken cell is dropped rather than retried.
pub(super) fn populate_room(
    grid: &Grid,
    room: RoomRect,
    depth: usize,
    stream: &mut SeedStream,
    reserved: &Reserved,
    spawns: &mut Vec<Spawn>,
) {
    let npc_count = stream.range(0, from_depth(MAX_NPCS, depth));
    for _ in 0..npc_count {
        let pos = room.random_cell(stream);
        if grid.is_blocked(pos) || !reserved.allows(spawns, pos) {
            continue;
        }
        let kind = pick(stream, &npc_table(depth));
        spawns.push(Spawn { kind, pos });
    }

    let item_count = stream.range(0, from_depth(MAX_ITEMS, depth));
    for _ in 0..item_count {
        let pos = room.random_cell(stream);
        if grid.is_blocked(pos) || !reserved.allows(spawns, pos) {
            continue;
        }
        let kind = pick(stream, &item_table(depth));
        spawns.push(Spawn { kind, pos });
    }
}

/// A construction worker on the first free cell next to `start`.
pub(super) fn place_worker(grid: &Grid, start: Pos, reserved: &Reserved, spawns: &mut Vec<Spawn>) {
    let spot = neighbors(start)
        .into_iter()
        .find(|&pos| !grid.is_blocked(pos) && reserved.allows(spawns, pos));
    if let Some(pos) = spot {
        spawns.push(Spawn { kind: SpawnKind::Worker, pos });
    }
}

/// Stone, boulders and gravel on open outdoor ground. Passability is untouched.
pub(super) fn scatter_debris(grid: &mut Grid, stream: &mut SeedStream) {
    let open: Vec<Pos> = grid
        .positions()
        .filter(|&pos| grid.tile_at(pos).is_ok_and(|tile| tile.outdoors && !tile.blocked))
        .collect();
    for pos in open {
        let (glyph, fore) = match stream.weighted(&DEBRIS_WEIGHTS) {
            0 => continue,
            1 => ('.', Tint::Sepia),
            2 => ('\u{2022}', Tint::Sepia),
            _ => ('\u{2591}', Tint::DarkRed),
        };
        grid.set_look(pos, glyph, fore).ok();
    }
}
