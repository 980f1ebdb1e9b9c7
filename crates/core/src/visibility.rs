//! Field-of-view and line-of-sight calculations over a grid's sight-blocking flags.
//! Recursive shadowcasting finds candidate cells; a direct line-of-sight pass then
//! drops cells only reachable by peeking around corners.

use std::collections::BTreeSet;

use crate::grid::Grid;
use crate::types::Pos;

/// Cells observable from an origin.
pub type FovSet = BTreeSet<Pos>;

/// Deterministic for a given grid state: same origin and radius give the same set.
/// With `light_walls` the opaque cells bounding the view are part of the set.
pub fn compute_visible(grid: &Grid, origin: Pos, radius: i32, light_walls: bool) -> FovSet {
    let mut visible = FovSet::new();
    if !grid.in_bounds(origin) {
        return visible;
    }
    visible.insert(origin);
    if radius <= 0 {
        return visible;
    }

    let mut scan = Scan { grid, origin, radius, visible: &mut visible };
    for octant in 0..8 {
        scan.octant(1, Slope::new(1, 1), Slope::new(0, 1), octant);
    }

    visible.retain(|&pos| {
        pos == origin
            || ((light_walls || !grid.blocks_sight(pos)) && has_line_of_sight(grid, origin, pos))
    });
    visible
}

fn transform_octant(orig: Pos, x: i32, y: i32, oct: u8) -> Pos {
    match oct {
        0 => Pos { y: orig.y - y, x: orig.x + x },
        1 => Pos { y: orig.y - x, x: orig.x + y },
        2 => Pos { y: orig.y - x, x: orig.x - y },
        3 => Pos { y: orig.y - y, x: orig.x - x },
        4 => Pos { y: orig.y + y, x: orig.x - x },
        5 => Pos { y: orig.y + x, x: orig.x - y },
        6 => Pos { y: orig.y + x, x: orig.x + y },
        7 => Pos { y: orig.y + y, x: orig.x + x },
        _ => orig,
    }
}

#[derive(Clone, Copy)]
struct Slope {
    y: i32,
    x: i32,
}

impl Slope {
    fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    fn greater_or_equal(&self, other: &Slope) -> bool {
        self.y * other.x >= other.y * self.x
    }

    fn greater_than(&self, other: &Slope) -> bool {
        self.y * other.x > other.y * self.x
    }
}

struct Scan<'a> {
    grid: &'a Grid,
    origin: Pos,
    radius: i32,
    visible: &'a mut FovSet,
}

impl Scan<'_> {
    fn in_radius(&self, pos: Pos) -> bool {
        let dx = pos.x - self.origin.x;
        let dy = pos.y - self.origin.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    fn octant(&mut self, dist: i32, start: Slope, end: Slope, oct: u8) {
        if dist > self.radius {
            return;
        }
        let mut blocked = false;
        let mut cur_start = start;
        for y in (0..=dist).rev() {
            let top = Slope::new(2 * y + 1, 2 * dist - 1);
            let bot = Slope::new(2 * y - 1, 2 * dist + 1);
            if cur_start.greater_or_equal(&bot) && top.greater_than(&end) {
                let p = transform_octant(self.origin, dist, y, oct);
                if self.grid.in_bounds(p) && self.in_radius(p) {
                    self.visible.insert(p);
                }
                if self.grid.blocks_sight(p) {
                    if !blocked {
                        self.octant(dist + 1, cur_start, top, oct);
                        blocked = true;
                    }
                    cur_start = bot;
                } else if blocked {
                    blocked = false;
                }
            }
        }
        if !blocked {
            self.octant(dist + 1, cur_start, end, oct);
        }
    }
}

/// Bresenham-style walk from `origin` to `target`; only the cells strictly between
/// the two endpoints are tested for opacity.
pub fn has_line_of_sight(grid: &Grid, origin: Pos, target: Pos) -> bool {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    let sx = dx.signum();
    let sy = dy.signum();
    let total_dist_x = dx.abs();
    let total_dist_y = dy.abs();

    let mut x = origin.x;
    let mut y = origin.y;
    let mut current_step_x = 0;
    let mut current_step_y = 0;

    while current_step_x < total_dist_x || current_step_y < total_dist_y {
        let lhs = (1 + 2 * current_step_x) * total_dist_y;
        let rhs = (1 + 2 * current_step_y) * total_dist_x;

        if lhs == rhs {
            x += sx;
            y += sy;
            current_step_x += 1;
            current_step_y += 1;
        } else if lhs < rhs {
            x += sx;
            current_step_x += 1;
        } else {
            y += sy;
            current_step_y += 1;
        }

        if x == target.x && y == target.y {
            break;
        }
        if grid.blocks_sight(Pos { y, x }) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::grid::Tile;
    use crate::test_support::{bordered_room, draw_fov_diag};

    #[test]
    fn open_room_is_visible_within_radius_only() {
        let grid = bordered_room(21, 21);
        let origin = Pos::new(10, 10);
        let visible = compute_visible(&grid, origin, 3, true);
        assert!(visible.contains(&origin));
        assert!(visible.contains(&Pos::new(13, 10)));
        assert!(visible.contains(&Pos::new(12, 12)));
        assert!(!visible.contains(&Pos::new(14, 10)));
        assert!(!visible.contains(&Pos::new(13, 13)), "corner lies outside the circle");
    }

    #[test]
    fn wall_occludes_cells_behind_it_in_a_corridor() {
        let mut grid = Grid::filled(11, 11, Tile::wall());
        for x in 1..10 {
            grid.set_tile(Pos::new(x, 5), Tile::ground()).unwrap();
        }
        grid.set_tile(Pos::new(6, 5), Tile::wall()).unwrap();
        let visible = compute_visible(&grid, Pos::new(3, 5), 10, true);

        assert!(visible.contains(&Pos::new(5, 5)));
        assert!(visible.contains(&Pos::new(6, 5)), "lit wall is part of the view");
        assert!(!visible.contains(&Pos::new(7, 5)), "cell behind the wall stays hidden");
    }

    #[test]
    fn unlit_walls_are_left_out_of_the_set() {
        let grid = bordered_room(9, 9);
        let origin = Pos::new(4, 4);
        let lit = compute_visible(&grid, origin, 10, true);
        let unlit = compute_visible(&grid, origin, 10, false);
        assert!(lit.contains(&Pos::new(0, 4)));
        assert!(!unlit.contains(&Pos::new(0, 4)));
        assert!(unlit.iter().all(|pos| !grid.blocks_sight(*pos)));
    }

    #[test]
    fn see_through_obstacle_does_not_cast_a_shadow() {
        let mut grid = bordered_room(15, 5);
        grid.set_tile(Pos::new(5, 2), Tile::with_sight(true, false)).unwrap();
        let visible = compute_visible(&grid, Pos::new(2, 2), 10, true);
        assert!(visible.contains(&Pos::new(8, 2)), "{}", draw_fov_diag(&grid, &visible));
    }

    #[test]
    fn light_does_not_leak_out_of_a_closed_room() {
        let mut grid = Grid::new(20, 20);
        for y in 4..=10 {
            for x in 4..=10 {
                if y == 4 || y == 10 || x == 4 || x == 10 {
                    grid.set_tile(Pos::new(x, y), Tile::wall()).unwrap();
                }
            }
        }
        for py in 5..10 {
            for px in 5..10 {
                let origin = Pos::new(px, py);
                let visible = compute_visible(&grid, origin, 15, true);
                for pos in &visible {
                    assert!(
                        (4..=10).contains(&pos.x) && (4..=10).contains(&pos.y),
                        "light leaked to {pos:?} from {origin:?}\n{}",
                        draw_fov_diag(&grid, &visible)
                    );
                }
            }
        }
    }

    #[test]
    fn origin_outside_the_grid_sees_nothing() {
        let grid = Grid::new(5, 5);
        assert!(compute_visible(&grid, Pos::new(7, 7), 4, true).is_empty());
    }

    proptest! {
        #[test]
        fn repeated_calls_return_identical_sets(
            walls in proptest::collection::vec((1i32..15, 1i32..15), 0..30),
            ox in 1i32..15,
            oy in 1i32..15,
        ) {
            let mut grid = bordered_room(16, 16);
            for (x, y) in walls {
                grid.set_tile(Pos::new(x, y), Tile::wall()).unwrap();
            }
            let origin = Pos::new(ox, oy);
            let first = compute_visible(&grid, origin, 8, true);
            let second = compute_visible(&grid, origin, 8, true);
            prop_assert_eq!(first, second);
        }
    }
}
