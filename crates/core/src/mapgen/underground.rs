//! Cave levels: rectangular rooms carved out of solid rock, chained together by
//! L-shaped tunnels in the order they were placed.

use crate::grid::Grid;
use crate::types::Pos;

use super::layout::{RoomRect, carve_l_tunnel, carve_room, place_rooms, rock};
use super::model::{GeneratedLevel, LevelKind, MapGenParams};
use super::population::{Reserved, populate_room};
use super::seed::SeedStream;

pub(super) fn generate(params: &MapGenParams, seed: u64, depth: usize) -> GeneratedLevel {
    let mut stream = SeedStream::new(seed);
    let mut grid = Grid::filled(params.width, params.height, rock(false));

    let mut rooms = place_rooms(
        &mut stream,
        params.width,
        params.height,
        params.room_min_size,
        params.room_max_size,
        params.max_rooms,
    );
    if rooms.is_empty() {
        rooms.push(fallback_room(params));
    }

    for (index, &room) in rooms.iter().enumerate() {
        carve_room(&mut grid, room);
        if index > 0 {
            let previous = rooms[index - 1].center();
            carve_l_tunnel(&mut grid, previous, room.center(), stream.coin());
        }
    }

    let player_start = rooms[0].center();
    let mut stairs = rooms[rooms.len() - 1].center();
    if stairs == player_start {
        stairs = other_cell(rooms[0], player_start);
    }

    let reserved = Reserved { cells: vec![player_start, stairs] };
    let mut spawns = Vec::new();
    for &room in &rooms {
        populate_room(&grid, room, depth, &mut stream, &reserved, &mut spawns);
    }

    GeneratedLevel {
        depth,
        kind: LevelKind::Underground,
        grid,
        player_start,
        stairs: Some(stairs),
        spawns,
    }
}

/// A small room in the middle of the map, for sizes where no placement fit.
fn fallback_room(params: &MapGenParams) -> RoomRect {
    let width = params.width.saturating_sub(2).clamp(1, 3);
    let height = params.height.saturating_sub(2).clamp(1, 3);
    RoomRect {
        x: (params.width.saturating_sub(width) / 2).max(1),
        y: (params.height.saturating_sub(height) / 2).max(1),
        width,
        height,
    }
}

/// Any cell of `room` other than `taken`, falling back to its east neighbour.
fn other_cell(room: RoomRect, taken: Pos) -> Pos {
    (room.y..=room.bottom())
        .flat_map(|y| (room.x..=room.right()).map(move |x| Pos { y: y as i32, x: x as i32 }))
        .find(|&pos| pos != taken)
        .unwrap_or(taken.offset(1, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::pathfinding::compute_path;

    fn params() -> MapGenParams {
        MapGenParams::from_config(&EngineConfig::default())
    }

    #[test]
    fn start_and_stairs_sit_on_open_floor_and_are_connected() {
        for seed in [0_u64, 7, 31, 1_000, 65_535] {
            let level = generate(&params(), seed, 2);
            let stairs = level.stairs.expect("cave levels have stairs");
            assert!(!level.grid.is_blocked(level.player_start), "seed={seed}");
            assert!(!level.grid.is_blocked(stairs), "seed={seed}");
            assert_ne!(level.player_start, stairs);
            let path = compute_path(&level.grid, level.player_start, stairs);
            assert!(!path.is_empty(), "seed={seed}");
        }
    }

    #[test]
    fn cave_floors_are_indoors() {
        let level = generate(&params(), 12, 1);
        for pos in level.grid.unblocked_positions() {
            assert!(!level.grid.tile_at(pos).unwrap().outdoors, "{pos:?} is outdoors");
        }
    }

    #[test]
    fn cramped_maps_still_get_a_room() {
        let tiny = MapGenParams { width: 6, height: 6, ..params() };
        let level = generate(&tiny, 3, 4);
        assert!(!level.grid.is_blocked(level.player_start));
        assert_ne!(Some(level.player_start), level.stairs);
    }

    #[test]
    fn spawns_avoid_the_start_and_stairs() {
        for seed in 0..20_u64 {
            let level = generate(&params(), seed, 6);
            for spawn in &level.spawns {
                assert_ne!(spawn.pos, level.player_start);
                assert_ne!(Some(spawn.pos), level.stairs);
                assert!(!level.grid.is_blocked(spawn.pos));
            }
        }
    }
}
