//! Read-only view of the current level for presentation layers, plus a stable hash
//! of the whole session for determinism checks.
//! This module exists so renderers never borrow live world state.
//! It does not own drawing, input or any terminal/graphics concerns.

use std::hash::Hasher;

use serde::Serialize;
use xxhash_rust::xxh3::Xxh3;

use crate::messages::Message;
use crate::types::{Pos, Tint};
use crate::world::{GameStatus, World};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TileView {
    pub glyph: char,
    pub fore: Tint,
    pub back: Tint,
    pub explored: bool,
    pub visible: bool,
    pub designated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityView {
    pub name: String,
    pub pos: Pos,
    pub glyph: char,
    pub tint: Tint,
}

/// Player stats for a status bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub hp: i32,
    pub max_hp: i32,
    pub xp: i32,
    pub level: u32,
    pub depth: usize,
    pub turn: u64,
    pub dead: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderSnapshot {
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` long.
    pub tiles: Vec<TileView>,
    /// Draw order: later entries are drawn on top.
    pub entities: Vec<EntityView>,
    pub messages: Vec<Message>,
    pub status: StatusView,
}

impl RenderSnapshot {
    pub fn tile(&self, pos: Pos) -> Option<&TileView> {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width || pos.y as usize >= self.height {
            return None;
        }
        self.tiles.get(pos.y as usize * self.width + pos.x as usize)
    }

    /// One character per cell: the top entity glyph where one is drawn, otherwise
    /// the tile glyph. Blank rock shows as `#`, blank floor as `.`, and cells never
    /// seen as a space.
    pub fn to_ascii(&self) -> String {
        let mut cells: Vec<char> = self
            .tiles
            .iter()
            .map(|tile| match (tile.explored || tile.visible, tile.glyph) {
                (false, _) => ' ',
                (true, ' ') if tile.designated => '+',
                (true, ' ') if tile.back == Tint::DarkRed => '#',
                (true, ' ') => '.',
                (true, glyph) => glyph,
            })
            .collect();
        for entity in &self.entities {
            if let Some(index) = self.index(entity.pos) {
                cells[index] = entity.glyph;
            }
        }

        let mut text = String::with_capacity(self.tiles.len() + self.height);
        for row in cells.chunks(self.width.max(1)) {
            text.extend(row);
            text.push('\n');
        }
        text
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.tile(pos).map(|_| pos.y as usize * self.width + pos.x as usize)
    }
}

impl World {
    pub fn snapshot(&self) -> RenderSnapshot {
        let level = self.level();
        let grid = &level.grid;
        let fov = self.player_fov();

        let tiles = grid
            .positions()
            .filter_map(|pos| {
                let tile = grid.tile_at(pos).ok()?;
                let glyph =
                    tile.designation.map_or(tile.glyph, |designation| designation.kind.glyph());
                Some(TileView {
                    glyph,
                    fore: tile.fore,
                    back: tile.back,
                    explored: tile.explored,
                    visible: fov.contains(&pos),
                    designated: tile.designation.is_some(),
                })
            })
            .collect();

        let entities = self
            .level_entities(self.current)
            .filter(|entity| {
                fov.contains(&entity.pos) || (entity.always_visible && grid.is_explored(entity.pos))
            })
            .map(|entity| EntityView {
                name: entity.name.clone(),
                pos: entity.pos,
                glyph: entity.glyph,
                tint: entity.tint,
            })
            .collect();

        RenderSnapshot {
            width: grid.width(),
            height: grid.height(),
            tiles,
            entities,
            messages: self.messages.lines().cloned().collect(),
            status: self.status_view(),
        }
    }

    fn status_view(&self) -> StatusView {
        let player = self.player_entity();
        let fighter = player.and_then(|entity| entity.fighter.as_ref());
        StatusView {
            hp: fighter.map_or(0, |fighter| fighter.hp),
            max_hp: self.max_hp(self.player).unwrap_or(0),
            xp: fighter.map_or(0, |fighter| fighter.xp),
            level: player.map_or(0, |entity| entity.level),
            depth: self.level().depth,
            turn: self.turn,
            dead: self.status == GameStatus::Dead,
        }
    }

    /// Stable hash over the simulation state that gameplay depends on. Cosmetic
    /// fields (tints, message text) are left out.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.seed);
        hasher.write_u64(self.turn);
        hasher.write_u64(self.rng.draws());
        hasher.write_usize(self.current);
        hasher.write_u8(match self.status {
            GameStatus::Playing => 0,
            GameStatus::Dead => 1,
        });

        for (index, level) in self.levels.iter().enumerate() {
            hasher.write_usize(index);
            hasher.write_u64(level.grid.revision());
            for pos in level.grid.positions() {
                let Ok(tile) = level.grid.tile_at(pos) else {
                    continue;
                };
                let designation = tile.designation.map_or(0, |designation| {
                    1 + u8::from(designation.in_progress) + 2 * designation.kind as u8
                });
                hasher.write_u8(
                    u8::from(tile.blocked)
                        | u8::from(tile.block_sight) << 1
                        | u8::from(tile.explored) << 2
                        | designation << 3,
                );
            }
            for entity in self.level_entities(index) {
                hasher.write_i32(entity.pos.x);
                hasher.write_i32(entity.pos.y);
                hasher.write_u32(u32::from(entity.glyph));
                hasher.write_u32(entity.wait);
                hasher.write_u8(u8::from(entity.blocks));
                if let Some(fighter) = &entity.fighter {
                    hasher.write_i32(fighter.hp);
                    hasher.write_i32(fighter.xp);
                    hasher.write_i32(fighter.base_power);
                    hasher.write_i32(fighter.base_defense);
                    hasher.write_i32(fighter.base_max_hp);
                }
                hasher.write_usize(entity.inventory.len());
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::grid::{DesignationKind, Tile};
    use crate::test_support::{add_item, add_robot, open_world};

    #[test]
    fn snapshot_covers_the_whole_grid() {
        let (world, _) = open_world(12, 7, Pos::new(3, 3));
        let snapshot = world.snapshot();
        assert_eq!(snapshot.tiles.len(), 12 * 7);
        assert!(snapshot.tile(Pos::new(3, 3)).unwrap().visible);
        assert!(snapshot.tile(Pos::new(12, 0)).is_none());
        assert_eq!(snapshot.status.depth, 0);
    }

    #[test]
    fn hidden_entities_are_not_drawn_but_explored_items_are() {
        let (mut world, _) = open_world(20, 5, Pos::new(1, 2));
        for y in 0..5 {
            world.grid_mut().set_tile(Pos::new(10, y), Tile::wall()).unwrap();
        }
        add_robot(&mut world, Pos::new(15, 2));
        let sword = add_item(&mut world, "sword", Pos::new(5, 2), None);
        world.entities[sword].always_visible = true;
        world.refresh_player_fov();

        let names: Vec<String> =
            world.snapshot().entities.into_iter().map(|entity| entity.name).collect();
        assert!(names.iter().any(|name| name == "sword"));
        assert!(!names.iter().any(|name| name == "robot"));
    }

    #[test]
    fn ascii_draws_entities_over_tiles() {
        let (mut world, _) = open_world(5, 3, Pos::new(2, 1));
        world.grid_mut().set_tile(Pos::new(0, 0), Tile::wall()).unwrap();
        world.refresh_player_fov();
        let ascii = world.snapshot().to_ascii();
        let rows: Vec<&str> = ascii.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with('#'));
        assert_eq!(rows[1].chars().nth(2), Some('@'));
    }

    #[test]
    fn designations_show_their_glyph() {
        let (mut world, _) = open_world(6, 6, Pos::new(1, 1));
        world.designate_rect(Pos::new(3, 3), Pos::new(3, 3), DesignationKind::Wall);
        let snapshot = world.snapshot();
        let tile = snapshot.tile(Pos::new(3, 3)).unwrap();
        assert!(tile.designated);
        assert_eq!(tile.glyph, '=');
    }

    #[test]
    fn hash_tracks_gameplay_state() {
        let left = World::new(EngineConfig::default(), 77);
        let right = World::new(EngineConfig::default(), 77);
        assert_eq!(left.snapshot_hash(), right.snapshot_hash());

        let mut moved = right.clone();
        let player = moved.player;
        moved.entities[player].wait = 5;
        assert_ne!(left.snapshot_hash(), moved.snapshot_hash());
        assert_ne!(left.snapshot_hash(), World::new(EngineConfig::default(), 78).snapshot_hash());
    }
}
