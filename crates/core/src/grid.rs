//! Tile store for one level: passability, sight blocking, exploration and
//! construction designations.
//!
//! Every mutation of `blocked` or `block_sight` bumps [`Grid::revision`], which is
//! how cached path maps and visibility sets learn that they are stale.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::CoreError;
use crate::types::{Pos, Tint};

/// What a worker should turn a designated tile into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignationKind {
    /// Dig out the tile into open ground.
    Clearing,
    /// Raise a wall on the tile.
    Wall,
}

impl DesignationKind {
    pub fn glyph(self) -> char {
        match self {
            DesignationKind::Clearing => '+',
            DesignationKind::Wall => '=',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Designation {
    pub kind: DesignationKind,
    /// Set once a worker has claimed the tile.
    pub in_progress: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub blocked: bool,
    pub block_sight: bool,
    pub explored: bool,
    pub outdoors: bool,
    pub glyph: char,
    pub fore: Tint,
    pub back: Tint,
    pub designation: Option<Designation>,
}

impl Tile {
    /// Sight blocking follows passability.
    pub fn new(blocked: bool) -> Self {
        Self::with_sight(blocked, blocked)
    }

    /// Allows see-through obstacles (`blocked && !block_sight`) and the reverse.
    pub fn with_sight(blocked: bool, block_sight: bool) -> Self {
        Self {
            blocked,
            block_sight,
            explored: false,
            outdoors: true,
            glyph: if blocked { '#' } else { ' ' },
            fore: Tint::White,
            back: Tint::Black,
            designation: None,
        }
    }

    pub fn ground() -> Self {
        Self::new(false)
    }

    pub fn wall() -> Self {
        Self::new(true)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    revision: u64,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Tile::ground())
    }

    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Self { width, height, tiles: vec![tile; width * height], revision: 0 }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Nearest in-bounds cell, for coordinates coming from outside the map area.
    pub fn clamp(&self, pos: Pos) -> Pos {
        Pos {
            y: pos.y.clamp(0, self.height as i32 - 1),
            x: pos.x.clamp(0, self.width as i32 - 1),
        }
    }

    pub fn tile_at(&self, pos: Pos) -> Result<&Tile, CoreError> {
        let idx = self.index(pos)?;
        Ok(&self.tiles[idx])
    }

    fn tile_mut(&mut self, pos: Pos) -> Result<&mut Tile, CoreError> {
        let idx = self.index(pos)?;
        Ok(&mut self.tiles[idx])
    }

    /// Changes how a tile is drawn. Never touches passability, so caches stay valid.
    pub fn set_look(&mut self, pos: Pos, glyph: char, fore: Tint) -> Result<(), CoreError> {
        let tile = self.tile_mut(pos)?;
        tile.glyph = glyph;
        tile.fore = fore;
        Ok(())
    }

    pub fn set_back(&mut self, pos: Pos, back: Tint) -> Result<(), CoreError> {
        self.tile_mut(pos)?.back = back;
        Ok(())
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, pos: Pos) -> bool {
        self.tile_at(pos).map_or(true, |tile| tile.blocked)
    }

    /// Out-of-bounds cells count as opaque.
    pub fn blocks_sight(&self, pos: Pos) -> bool {
        self.tile_at(pos).map_or(true, |tile| tile.block_sight)
    }

    pub fn set_blocked(&mut self, pos: Pos, blocked: bool) -> Result<(), CoreError> {
        let idx = self.index(pos)?;
        if self.tiles[idx].blocked != blocked {
            self.tiles[idx].blocked = blocked;
            self.revision += 1;
        }
        Ok(())
    }

    pub fn set_block_sight(&mut self, pos: Pos, block_sight: bool) -> Result<(), CoreError> {
        let idx = self.index(pos)?;
        if self.tiles[idx].block_sight != block_sight {
            self.tiles[idx].block_sight = block_sight;
            self.revision += 1;
        }
        Ok(())
    }

    /// Replaces the whole tile, keeping its exploration state.
    pub fn set_tile(&mut self, pos: Pos, tile: Tile) -> Result<(), CoreError> {
        self.index(pos)?;
        self.paint(pos, tile);
        Ok(())
    }

    /// [`Grid::set_tile`] for map generators: cells off the map are skipped.
    pub fn paint(&mut self, pos: Pos, tile: Tile) {
        let Ok(idx) = self.index(pos) else {
            return;
        };
        let explored = self.tiles[idx].explored;
        let changed = self.tiles[idx].blocked != tile.blocked
            || self.tiles[idx].block_sight != tile.block_sight;
        self.tiles[idx] = Tile { explored, ..tile };
        if changed {
            self.revision += 1;
        }
    }

    pub fn mark_explored(&mut self, pos: Pos) {
        if let Ok(idx) = self.index(pos) {
            self.tiles[idx].explored = true;
        }
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.tile_at(pos).is_ok_and(|tile| tile.explored)
    }

    /// Marks `pos` for construction. A claim already on the tile is kept so a second
    /// worker cannot take it over.
    pub fn designate(&mut self, pos: Pos, kind: DesignationKind) -> Result<(), CoreError> {
        let tile = self.tile_mut(pos)?;
        let in_progress = tile.designation.is_some_and(|designation| designation.in_progress);
        tile.designation = Some(Designation { kind, in_progress });
        Ok(())
    }

    pub fn clear_designation(&mut self, pos: Pos) -> Result<(), CoreError> {
        self.tile_mut(pos)?.designation = None;
        Ok(())
    }

    /// Flags the designation on `pos` as taken or free. No-op on undesignated tiles.
    pub fn set_designation_claimed(&mut self, pos: Pos, claimed: bool) -> Result<(), CoreError> {
        if let Some(designation) = self.tile_mut(pos)?.designation.as_mut() {
            designation.in_progress = claimed;
        }
        Ok(())
    }

    /// Every cell in row-major order, top row first.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| Pos { y: y as i32, x: x as i32 })
        })
    }

    pub fn unblocked_positions(&self) -> Vec<Pos> {
        self.positions().filter(|pos| !self.is_blocked(*pos)).collect()
    }

    /// Unclaimed designations in row-major scan order.
    pub fn open_designations(&self) -> impl Iterator<Item = Pos> + '_ {
        self.positions().filter(|pos| {
            self.tile_at(*pos)
                .ok()
                .and_then(|tile| tile.designation)
                .is_some_and(|designation| !designation.in_progress)
        })
    }

    pub fn first_open_designation(&self) -> Option<Pos> {
        self.open_designations().next()
    }

    /// The single movement authority: the tile blocks, or a blocking entity in
    /// `entities` stands on it.
    pub fn is_occupied_blocking<'a>(
        &self,
        pos: Pos,
        entities: impl IntoIterator<Item = &'a Entity>,
    ) -> bool {
        if self.is_blocked(pos) {
            return true;
        }
        entities.into_iter().any(|entity| entity.blocks && entity.pos == pos)
    }

    fn index(&self, pos: Pos) -> Result<usize, CoreError> {
        if !self.in_bounds(pos) {
            return Err(CoreError::OutOfBounds { pos });
        }
        Ok((pos.y as usize) * self.width + (pos.x as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_entity;

    #[test]
    fn sight_blocking_defaults_to_passability() {
        assert!(Tile::new(true).block_sight);
        assert!(!Tile::new(false).block_sight);
        let window = Tile::with_sight(true, false);
        assert!(window.blocked && !window.block_sight);
    }

    #[test]
    fn tile_at_rejects_coordinates_outside_the_grid() {
        let grid = Grid::new(10, 5);
        assert!(grid.tile_at(Pos::new(9, 4)).is_ok());
        for pos in [Pos::new(10, 0), Pos::new(0, 5), Pos::new(-1, 2), Pos::new(3, -1)] {
            assert_eq!(grid.tile_at(pos), Err(CoreError::OutOfBounds { pos }));
        }
    }

    #[test]
    fn passability_changes_bump_revision_once() {
        let mut grid = Grid::new(4, 4);
        let start = grid.revision();
        grid.set_blocked(Pos::new(1, 1), true).unwrap();
        grid.set_blocked(Pos::new(1, 1), true).unwrap();
        assert_eq!(grid.revision(), start + 1);
        grid.set_look(Pos::new(2, 2), '*', Tint::Brass).unwrap();
        grid.set_back(Pos::new(2, 2), Tint::DarkBlue).unwrap();
        assert_eq!(grid.revision(), start + 1, "cosmetic edits must not invalidate caches");
    }

    #[test]
    fn blocking_entity_occupies_its_cell() {
        let grid = Grid::new(5, 5);
        let mut crate_box = test_entity("crate", Pos::new(2, 2));
        crate_box.blocks = true;
        let rubble = test_entity("rubble", Pos::new(3, 3));

        assert!(grid.is_occupied_blocking(Pos::new(2, 2), [&crate_box, &rubble]));
        assert!(!grid.is_occupied_blocking(Pos::new(3, 3), [&crate_box, &rubble]));
        assert!(grid.is_occupied_blocking(Pos::new(5, 0), [&crate_box]));
    }

    #[test]
    fn designation_scan_is_row_major_and_skips_claimed_tiles() {
        let mut grid = Grid::new(6, 6);
        grid.designate(Pos::new(4, 1), DesignationKind::Clearing).unwrap();
        grid.designate(Pos::new(1, 3), DesignationKind::Clearing).unwrap();
        assert_eq!(grid.first_open_designation(), Some(Pos::new(4, 1)));

        grid.set_designation_claimed(Pos::new(4, 1), true).unwrap();
        assert_eq!(grid.first_open_designation(), Some(Pos::new(1, 3)));
    }

    #[test]
    fn redesignating_a_claimed_tile_keeps_the_claim() {
        let mut grid = Grid::new(6, 6);
        let pos = Pos::new(2, 2);
        grid.designate(pos, DesignationKind::Clearing).unwrap();
        grid.set_designation_claimed(pos, true).unwrap();

        grid.designate(pos, DesignationKind::Clearing).unwrap();
        assert_eq!(
            grid.tile_at(pos).unwrap().designation,
            Some(Designation { kind: DesignationKind::Clearing, in_progress: true })
        );
        assert_eq!(grid.first_open_designation(), None);
    }
}
