//! Room, tunnel and building shapes, and the tile styles they are painted with.

use crate::grid::{Grid, Tile};
use crate::types::{Pos, Tint};

use super::seed::SeedStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct RoomRect {
    pub(super) x: usize,
    pub(super) y: usize,
    pub(super) width: usize,
    pub(super) height: usize,
}

impl RoomRect {
    pub(super) fn right(self) -> usize {
        self.x + self.width - 1
    }

    pub(super) fn bottom(self) -> usize {
        self.y + self.height - 1
    }

    pub(super) fn center(self) -> Pos {
        Pos { y: (self.y + (self.height / 2)) as i32, x: (self.x + (self.width / 2)) as i32 }
    }

    pub(super) fn expanded(self, margin: usize) -> Self {
        let expanded_x = self.x.saturating_sub(margin);
        let expanded_y = self.y.saturating_sub(margin);
        let expanded_right = self.right().saturating_add(margin);
        let expanded_bottom = self.bottom().saturating_add(margin);
        Self {
            x: expanded_x,
            y: expanded_y,
            width: expanded_right - expanded_x + 1,
            height: expanded_bottom - expanded_y + 1,
        }
    }

    /// The cells inside a one-tile wall ring. `None` when nothing is left.
    pub(super) fn interior(self) -> Option<Self> {
        (self.width > 2 && self.height > 2).then(|| Self {
            x: self.x + 1,
            y: self.y + 1,
            width: self.width - 2,
            height: self.height - 2,
        })
    }

    pub(super) fn intersects(self, other: &Self) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    #[cfg(test)]
    pub(super) fn contains(self, pos: Pos) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return false;
        }
        let px = pos.x as usize;
        let py = pos.y as usize;
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub(super) fn random_cell(self, stream: &mut SeedStream) -> Pos {
        Pos {
            y: stream.range(self.y, self.bottom()) as i32,
            x: stream.range(self.x, self.right()) as i32,
        }
    }

    /// Middle cell of each side: left, top, right, bottom.
    fn side_midpoints(self) -> [(Pos, char); 4] {
        let mid_x = ((self.x + self.right()) / 2) as i32;
        let mid_y = ((self.y + self.bottom()) / 2) as i32;
        [
            (Pos { y: mid_y, x: self.x as i32 }, '\u{2194}'),
            (Pos { y: self.y as i32, x: mid_x }, '\u{2195}'),
            (Pos { y: mid_y, x: self.right() as i32 }, '\u{2194}'),
            (Pos { y: self.bottom() as i32, x: mid_x }, '\u{2195}'),
        ]
    }
}

pub(super) fn surface_ground() -> Tile {
    let mut tile = Tile::ground();
    tile.fore = Tint::Flame;
    tile.back = Tint::Flame;
    tile
}

pub(super) fn rock(outdoors: bool) -> Tile {
    let mut tile = Tile::wall();
    tile.glyph = ' ';
    tile.fore = Tint::DarkRed;
    tile.back = Tint::DarkRed;
    tile.outdoors = outdoors;
    tile
}

pub(super) fn cave_floor() -> Tile {
    let mut tile = Tile::ground();
    tile.outdoors = false;
    tile.fore = Tint::Sepia;
    tile.back = Tint::Black;
    tile
}

fn building_floor() -> Tile {
    let mut tile = surface_ground();
    tile.outdoors = false;
    tile
}

fn building_wall() -> Tile {
    let mut tile = rock(false);
    tile.fore = Tint::Brass;
    tile.back = Tint::DarkRed;
    tile
}

/// Passable but opaque, like a closed airlock.
fn door(glyph: char) -> Tile {
    let mut tile = Tile::with_sight(false, true);
    tile.glyph = glyph;
    tile.outdoors = false;
    tile.fore = Tint::White;
    tile.back = Tint::Grey;
    tile
}

/// Wraps the map in an unbroken ring of rock.
pub(super) fn seal_border(grid: &mut Grid) {
    let right = grid.width() as i32 - 1;
    let bottom = grid.height() as i32 - 1;
    for pos in grid.positions().collect::<Vec<_>>() {
        if pos.x == 0 || pos.y == 0 || pos.x == right || pos.y == bottom {
            grid.paint(pos, rock(true));
        }
    }
}

pub(super) fn is_map_edge(grid: &Grid, pos: Pos) -> bool {
    pos.x <= 0
        || pos.y <= 0
        || pos.x >= grid.width() as i32 - 1
        || pos.y >= grid.height() as i32 - 1
}

/// Non-overlapping rooms with at least one rock cell between any two of them.
/// Each rect is the carved floor; the map border is never touched.
pub(super) fn place_rooms(
    stream: &mut SeedStream,
    width: usize,
    height: usize,
    min_size: usize,
    max_size: usize,
    attempts: usize,
) -> Vec<RoomRect> {
    let mut rooms: Vec<RoomRect> = Vec::new();
    for _ in 0..attempts {
        let room_width = stream.range(min_size, max_size);
        let room_height = stream.range(min_size, max_size);
        if room_width + 2 >= width || room_height + 2 >= height {
            continue;
        }
        let x = stream.range(1, width - room_width - 1);
        let y = stream.range(1, height - room_height - 1);
        let candidate = RoomRect { x, y, width: room_width, height: room_height };
        let candidate_with_margin = candidate.expanded(1);
        if rooms.iter().any(|existing| existing.intersects(&candidate_with_margin)) {
            continue;
        }
        rooms.push(candidate);
    }
    rooms
}

pub(super) fn carve_room(grid: &mut Grid, room: RoomRect) {
    for y in room.y..=room.bottom() {
        for x in room.x..=room.right() {
            grid.paint(Pos { y: y as i32, x: x as i32 }, cave_floor());
        }
    }
}

pub(super) fn carve_l_tunnel(grid: &mut Grid, start: Pos, end: Pos, horizontal_first: bool) {
    if horizontal_first {
        carve_horizontal_line(grid, start.y, start.x, end.x);
        carve_vertical_line(grid, end.x, start.y, end.y);
    } else {
        carve_vertical_line(grid, start.x, start.y, end.y);
        carve_horizontal_line(grid, end.y, start.x, end.x);
    }
}

fn carve_horizontal_line(grid: &mut Grid, y: i32, left_x: i32, right_x: i32) {
    for x in left_x.min(right_x)..=left_x.max(right_x) {
        let pos = Pos { y, x };
        if !is_map_edge(grid, pos) {
            grid.paint(pos, cave_floor());
        }
    }
}

fn carve_vertical_line(grid: &mut Grid, x: i32, top_y: i32, bottom_y: i32) {
    for y in top_y.min(bottom_y)..=top_y.max(bottom_y) {
        let pos = Pos { y, x };
        if !is_map_edge(grid, pos) {
            grid.paint(pos, cave_floor());
        }
    }
}

/// Clears the footprint indoors and walls its outer ring. Later buildings may
/// overlap earlier ones.
pub(super) fn raise_building(grid: &mut Grid, building: RoomRect) {
    for y in building.y..=building.bottom() {
        for x in building.x..=building.right() {
            let pos = Pos { y: y as i32, x: x as i32 };
            let on_ring = x == building.x
                || x == building.right()
                || y == building.y
                || y == building.bottom();
            grid.paint(pos, if on_ring { building_wall() } else { building_floor() });
        }
    }
}

/// One door in the middle of every wall that is still standing and not on the map edge.
pub(super) fn open_doors(grid: &mut Grid, building: RoomRect) {
    for (pos, glyph) in building.side_midpoints() {
        if grid.is_blocked(pos) && !is_map_edge(grid, pos) {
            grid.paint(pos, door(glyph));
        }
    }
}
