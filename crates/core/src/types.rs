use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct EntityId;
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    /// Straight-line distance, used for melee reach and area effects.
    pub fn distance(self, other: Pos) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Number of 8-way steps between two cells on an open grid.
    pub fn chebyshev(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn is_adjacent(self, other: Pos) -> bool {
        self.chebyshev(other) == 1
    }
}

/// The eight compass moves a player command can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// `(dx, dy)` with y growing downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }
}

/// Named palette entries for glyphs and message text. Purely cosmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tint {
    #[default]
    White,
    Black,
    Grey,
    Red,
    DarkRed,
    Orange,
    Flame,
    Yellow,
    LightYellow,
    Green,
    LightGreen,
    DarkGreen,
    Sky,
    LightBlue,
    Blue,
    DarkBlue,
    Violet,
    LightViolet,
    Magenta,
    Brass,
    Sepia,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_deltas_cover_every_neighbor_once() {
        let mut seen: Vec<(i32, i32)> = Direction::ALL.iter().map(|dir| dir.delta()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 8);
        assert!(!seen.contains(&(0, 0)));
    }

    #[test]
    fn diagonal_neighbors_count_as_adjacent() {
        let origin = Pos::new(4, 4);
        assert!(origin.is_adjacent(Pos::new(5, 5)));
        assert!(!origin.is_adjacent(origin));
        assert!(!origin.is_adjacent(Pos::new(6, 4)));
        assert!(origin.distance(Pos::new(5, 5)) < 2.0);
    }
}
