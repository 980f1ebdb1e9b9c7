//! Open Martian ground: noise-shaped rock outcrops, walled buildings with doors,
//! debris, and stairs in the last building.

use std::collections::{BTreeSet, VecDeque};
use std::iter;

use crate::grid::Grid;
use crate::pathfinding::neighbors;
use crate::types::Pos;

use super::layout::{RoomRect, open_doors, raise_building, rock, seal_border, surface_ground};
use super::model::{GeneratedLevel, LevelKind, MapGenParams};
use super::population::{Reserved, place_worker, populate_room, scatter_debris};
use super::seed::{SeedStream, mix_seed_stream};

const OUTCROP_CELL: i32 = 8;
const OUTCROP_THRESHOLD: f64 = 0.3;
const OUTCROP_SALT: u64 = 0x5EED_0C40_0B5E_D0C4;

pub(super) fn generate(params: &MapGenParams, seed: u64, depth: usize) -> GeneratedLevel {
    let mut stream = SeedStream::new(seed);
    let mut grid = Grid::filled(params.width, params.height, surface_ground());

    raise_outcrops(&mut grid, seed);
    seal_border(&mut grid);

    let mut buildings = Vec::new();
    for _ in 0..params.max_buildings {
        let w = stream.range(params.building_min_size, params.building_max_size);
        let h = stream.range(params.building_min_size, params.building_max_size);
        if w + 2 > params.width || h + 2 > params.height {
            continue;
        }
        let x = stream.range(0, params.width - w - 1);
        let y = stream.range(0, params.height - h - 1);
        let building = RoomRect { x, y, width: w + 1, height: h + 1 };
        raise_building(&mut grid, building);
        buildings.push(building);
    }
    for &building in &buildings {
        open_doors(&mut grid, building);
    }
    scatter_debris(&mut grid, &mut stream);

    let stairs = buildings
        .last()
        .map(|building| building.center())
        .filter(|&pos| !grid.is_blocked(pos))
        .or_else(|| random_open_cell(&grid, &mut stream, None));
    let player_start = choose_start(&mut grid, &mut stream, stairs);

    let reserved = Reserved { cells: [Some(player_start), stairs].into_iter().flatten().collect() };
    let mut spawns = Vec::new();
    if depth == 0 {
        place_worker(&grid, player_start, &reserved, &mut spawns);
    }
    for building in &buildings {
        if let Some(interior) = building.interior() {
            populate_room(&grid, interior, depth, &mut stream, &reserved, &mut spawns);
        }
    }

    GeneratedLevel { depth, kind: LevelKind::Surface, grid, player_start, stairs, spawns }
}

/// Bilinear value noise over a coarse lattice; low values become rock.
fn raise_outcrops(grid: &mut Grid, seed: u64) {
    let lattice = |lx: i32, ly: i32| {
        let stream = ((lx as u32 as u64) << 32) | (ly as u32 as u64);
        (mix_seed_stream(seed ^ OUTCROP_SALT, stream) >> 11) as f64 / (1u64 << 53) as f64
    };
    let smooth = |t: f64| t * t * (3.0 - 2.0 * t);
    let cells: Vec<Pos> = grid.positions().collect();
    for pos in cells {
        let (lx, ly) = (pos.x.div_euclid(OUTCROP_CELL), pos.y.div_euclid(OUTCROP_CELL));
        let tx = smooth(f64::from(pos.x.rem_euclid(OUTCROP_CELL)) / f64::from(OUTCROP_CELL));
        let ty = smooth(f64::from(pos.y.rem_euclid(OUTCROP_CELL)) / f64::from(OUTCROP_CELL));
        let top = lattice(lx, ly) * (1.0 - tx) + lattice(lx + 1, ly) * tx;
        let bottom = lattice(lx, ly + 1) * (1.0 - tx) + lattice(lx + 1, ly + 1) * tx;
        if top * (1.0 - ty) + bottom * ty < OUTCROP_THRESHOLD {
            grid.paint(pos, rock(true));
        }
    }
}

fn has_open_neighbor(grid: &Grid, pos: Pos, except: Option<Pos>) -> bool {
    neighbors(pos).into_iter().any(|next| Some(next) != except && !grid.is_blocked(next))
}

fn random_open_cell(grid: &Grid, stream: &mut SeedStream, except: Option<Pos>) -> Option<Pos> {
    let open: Vec<Pos> = grid
        .unblocked_positions()
        .into_iter()
        .filter(|&pos| Some(pos) != except && has_open_neighbor(grid, pos, except))
        .collect();
    (!open.is_empty()).then(|| open[stream.range(0, open.len() - 1)])
}

/// A random open cell the stairs can be walked to from, with room to move.
/// Digs out a pocket in the middle of the map if the terrain left nothing.
fn choose_start(grid: &mut Grid, stream: &mut SeedStream, stairs: Option<Pos>) -> Pos {
    if let Some(stairs) = stairs {
        let reachable: Vec<Pos> = flood_from(grid, stairs)
            .into_iter()
            .filter(|&pos| pos != stairs && has_open_neighbor(grid, pos, Some(stairs)))
            .collect();
        if !reachable.is_empty() {
            return reachable[stream.range(0, reachable.len() - 1)];
        }
    }
    if let Some(pos) = random_open_cell(grid, stream, stairs) {
        return pos;
    }
    let center = Pos { y: grid.height() as i32 / 2, x: grid.width() as i32 / 2 };
    for pos in iter::once(center).chain(neighbors(center)) {
        grid.paint(pos, surface_ground());
    }
    center
}

/// Every open cell 8-connected to `origin`, in row-major order.
fn flood_from(grid: &Grid, origin: Pos) -> BTreeSet<Pos> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::mapgen::SpawnKind;

    fn params() -> MapGenParams {
        MapGenParams::from_config(&EngineConfig::default())
    }

    #[test]
    fn border_is_sealed() {
        let level = generate(&params(), 17, 0);
        let grid = &level.grid;
        for x in 0..grid.width() as i32 {
            assert!(grid.is_blocked(Pos::new(x, 0)));
            assert!(grid.is_blocked(Pos::new(x, grid.height() as i32 - 1)));
        }
        for y in 0..grid.height() as i32 {
            assert!(grid.is_blocked(Pos::new(0, y)));
            assert!(grid.is_blocked(Pos::new(grid.width() as i32 - 1, y)));
        }
    }

    #[test]
    fn stairs_are_reachable_from_the_start() {
        for seed in [1_u64, 2, 3, 99, 4_242] {
            let level = generate(&params(), seed, 0);
            let stairs = level.stairs.expect("surface levels have stairs");
            assert!(flood_from(&level.grid, stairs).contains(&level.player_start), "seed={seed}");
        }
    }

    #[test]
    fn first_surface_level_has_a_worker_next_to_the_player() {
        let level = generate(&params(), 5, 0);
        let worker = level
            .spawns
            .iter()
            .find(|spawn| spawn.kind == SpawnKind::Worker)
            .expect("worker spawned");
        assert!(worker.pos.is_adjacent(level.player_start));
    }

    #[test]
    fn outcrops_leave_most_of_the_ground_open() {
        let level = generate(&params(), 8, 0);
        let open = level.grid.unblocked_positions().len();
        let total = level.grid.width() * level.grid.height();
        assert!(open * 2 > total, "only {open} of {total} cells open");
    }
}
