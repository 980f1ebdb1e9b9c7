//! Session context passed to every subsystem: levels, entity registry, message log,
//! random stream and the player's view.
//! This module exists so no gameplay state lives in globals.
//! It does not own turn ordering (see `scheduler`) or command dispatch (see `actions`).

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::content::{self, BuildKind};
use crate::entity::{Entity, Placement};
use crate::error::CoreError;
use crate::grid::{DesignationKind, Grid, Tile};
use crate::mapgen::{self, GeneratedLevel, LevelKind, MapGenParams};
use crate::messages::MessageLog;
use crate::rng::GameRng;
use crate::types::{EntityId, Pos, Tint};
use crate::visibility::{FovSet, compute_visible};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Dead,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Level {
    pub depth: usize,
    pub kind: LevelKind,
    pub grid: Grid,
    /// Loose entities in draw and turn order.
    pub objects: Vec<EntityId>,
    /// The transition marker leading to the next level.
    pub stairs: Option<EntityId>,
    pub entry: Pos,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    pub config: EngineConfig,
    pub seed: u64,
    pub entities: SlotMap<EntityId, Entity>,
    pub levels: Vec<Level>,
    pub current: usize,
    pub player: EntityId,
    pub messages: MessageLog,
    pub rng: GameRng,
    pub status: GameStatus,
    pub turn: u64,
    pub pending_level_ups: u32,
    #[serde(skip)]
    pub(crate) player_fov: FovSet,
}

impl World {
    /// Fresh game on a generated surface level.
    pub fn new(config: EngineConfig, seed: u64) -> Self {
        let params = MapGenParams::from_config(&config);
        let generated = mapgen::generate_level(&params, mapgen::derive_level_seed(seed, 0), 0);
        let mut world = Self::with_level(config, seed, generated);
        world.message(
            "Welcome to Mars! Dig, build and survive whatever the robots have in store.",
            Tint::Red,
        );
        world
    }

    /// Single hand-made level with only the player on it.
    pub fn with_grid(config: EngineConfig, seed: u64, grid: Grid, player_start: Pos) -> Self {
        Self::with_level(config, seed, GeneratedLevel::bare(grid, player_start))
    }

    fn with_level(config: EngineConfig, seed: u64, generated: GeneratedLevel) -> Self {
        let mut entities = SlotMap::with_key();
        let player = entities.insert(content::player(&config, generated.player_start));
        let messages = MessageLog::new(config.message_capacity, config.message_width);
        let mut world = Self {
            config,
            seed,
            entities,
            levels: Vec::new(),
            current: 0,
            player,
            messages,
            rng: GameRng::new(seed),
            status: GameStatus::Playing,
            turn: 0,
            pending_level_ups: 0,
            player_fov: FovSet::new(),
        };
        let level = world.install_level(generated);
        world.levels[level].objects.insert(0, player);
        world.refresh_player_fov();
        world
    }

    /// Adds a generated level and materialises its spawns. Returns the level index.
    pub fn install_level(&mut self, generated: GeneratedLevel) -> usize {
        let index = self.levels.len();
        self.levels.push(Level {
            depth: generated.depth,
            kind: generated.kind,
            grid: generated.grid,
            objects: Vec::new(),
            stairs: None,
            entry: generated.player_start,
        });
        if let Some(pos) = generated.stairs {
            let stairs = self.spawn(content::stairs(pos), index);
            self.levels[index].stairs = Some(stairs);
        }
        for spawn in generated.spawns {
            let entity = content::build(spawn.kind, spawn.pos, &self.config, &mut self.rng);
            self.spawn(entity, index);
        }
        let objects = self.levels[index].objects.len();
        info!(index, depth = generated.depth, objects, "level installed");
        index
    }

    /// Places `entity` loose on `level`, appended to the end of the turn order.
    pub fn spawn(&mut self, mut entity: Entity, level: usize) -> EntityId {
        entity.placement = Placement::OnMap { level };
        let id = self.entities.insert(entity);
        self.levels[level].objects.push(id);
        id
    }

    pub fn level(&self) -> &Level {
        &self.levels[self.current]
    }

    pub fn grid(&self) -> &Grid {
        &self.levels[self.current].grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.levels[self.current].grid
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.entities.get(self.player)
    }

    pub fn player_pos(&self) -> Pos {
        self.player_entity().map(|entity| entity.pos).unwrap_or_default()
    }

    pub fn player_fov(&self) -> &FovSet {
        &self.player_fov
    }

    /// Level index and position of an entity lying loose on a map.
    pub fn map_position(&self, id: EntityId) -> Result<(usize, Pos), CoreError> {
        let entity = self.entities.get(id).ok_or(CoreError::NoSuchEntity)?;
        match entity.placement {
            Placement::OnMap { level } => Ok((level, entity.pos)),
            Placement::Carried { .. } => Err(CoreError::NotOnMap),
        }
    }

    pub fn level_entities(&self, level: usize) -> impl Iterator<Item = &Entity> + '_ {
        self.levels[level].objects.iter().filter_map(|&id| self.entities.get(id))
    }

    /// Entities on `level` standing at `pos`, in list order.
    pub fn entities_at(&self, level: usize, pos: Pos) -> Vec<EntityId> {
        self.levels[level]
            .objects
            .iter()
            .copied()
            .filter(|&id| self.entities.get(id).is_some_and(|entity| entity.pos == pos))
            .collect()
    }

    pub fn is_occupied_blocking(&self, level: usize, pos: Pos) -> bool {
        self.levels[level].grid.is_occupied_blocking(pos, self.level_entities(level))
    }

    /// One step to an adjacent cell. Blocked or not, the mover waits out its speed.
    /// Returns whether the position changed.
    pub fn move_entity(&mut self, id: EntityId, dx: i32, dy: i32) -> Result<bool, CoreError> {
        let (level, pos) = self.map_position(id)?;
        let dest = pos.offset(dx, dy);
        let blocked = self.is_occupied_blocking(level, dest);
        let entity = &mut self.entities[id];
        entity.wait = entity.speed;
        if !blocked {
            entity.pos = dest;
        }
        Ok(!blocked)
    }

    /// Moves an entity to the front of its level list so everything else draws on top.
    pub fn send_to_back(&mut self, id: EntityId) {
        let Ok((level, _)) = self.map_position(id) else {
            return;
        };
        let objects = &mut self.levels[level].objects;
        if let Some(index) = objects.iter().position(|&other| other == id) {
            objects.remove(index);
            objects.insert(0, id);
        }
    }

    pub fn message(&mut self, text: impl AsRef<str>, tint: Tint) {
        self.messages.push(text, tint);
    }

    /// Recomputes the player's view and marks it explored.
    pub fn refresh_player_fov(&mut self) {
        let Ok((level, origin)) = self.map_position(self.player) else {
            self.player_fov.clear();
            return;
        };
        let grid = &mut self.levels[level].grid;
        self.player_fov =
            compute_visible(grid, origin, self.config.fov_radius, self.config.fov_light_walls);
        for &pos in &self.player_fov {
            grid.mark_explored(pos);
        }
    }

    /// Marks every tile of the rectangle spanned by `from` and `to` for construction.
    /// Corners outside the map are clamped onto it. Returns the number of tiles marked.
    pub fn designate_rect(&mut self, from: Pos, to: Pos, kind: DesignationKind) -> usize {
        let grid = &mut self.levels[self.current].grid;
        let a = grid.clamp(from);
        let b = grid.clamp(to);
        let mut marked = 0;
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for x in a.x.min(b.x)..=a.x.max(b.x) {
                if grid.designate(Pos { y, x }, kind).is_ok() {
                    marked += 1;
                }
            }
        }
        debug!(?a, ?b, ?kind, marked, "designated construction zone");
        marked
    }

    /// Places a player-made structure on the current level, drawn beneath everything
    /// else on its cell. Walls and cells already holding a blocker are refused.
    pub fn build_structure(&mut self, kind: BuildKind, at: Pos) -> Result<EntityId, CoreError> {
        let level = self.current;
        let grid = &self.levels[level].grid;
        grid.tile_at(at)?;
        let structure = content::structure(kind, at);
        if grid.is_blocked(at) || (structure.blocks && self.is_occupied_blocking(level, at)) {
            self.message("There is no room to build there.", Tint::Grey);
            return Err(CoreError::SiteBlocked { pos: at });
        }
        if kind == BuildKind::Water {
            self.levels[level].grid.set_back(at, Tint::DarkBlue)?;
        }
        let id = self.spawn(structure, level);
        self.send_to_back(id);
        debug!(?kind, ?at, "structure built");
        Ok(id)
    }

    /// Carries out the designation on `pos`. `Ok(false)` when a wall cannot go up
    /// because something is standing in the way.
    pub fn complete_designation(&mut self, level: usize, pos: Pos) -> Result<bool, CoreError> {
        let Some(designation) = self.levels[level].grid.tile_at(pos)?.designation else {
            return Ok(false);
        };
        let tile = match designation.kind {
            DesignationKind::Clearing => {
                let mut tile = Tile::ground();
                tile.glyph = '.';
                tile.fore = Tint::Sepia;
                tile.back = Tint::Flame;
                tile
            }
            DesignationKind::Wall => {
                if self.level_entities(level).any(|entity| entity.blocks && entity.pos == pos) {
                    return Ok(false);
                }
                let mut tile = Tile::wall();
                tile.fore = Tint::DarkRed;
                tile.back = Tint::DarkRed;
                tile
            }
        };
        self.levels[level].grid.set_tile(pos, tile)?;
        debug!(?pos, kind = ?designation.kind, "construction finished");
        if level == self.current {
            self.refresh_player_fov();
        }
        Ok(true)
    }

    /// Generates the next level on first use and moves the player onto its entry tile.
    pub fn descend(&mut self) -> Result<(), CoreError> {
        let player = self.player;
        let (level, pos) = self.map_position(player)?;
        let on_stairs = self.levels[level]
            .stairs
            .and_then(|stairs| self.entities.get(stairs))
            .is_some_and(|stairs| stairs.pos == pos);
        if !on_stairs {
            self.message("There are no stairs here.", Tint::Grey);
            return Err(CoreError::NotOnTransitionTile);
        }

        self.message("You rest for a moment and recover your strength.", Tint::LightViolet);
        let half = self.max_hp(player)? / 2;
        self.heal(player, half)?;

        let next = level + 1;
        if next >= self.levels.len() {
            let params = MapGenParams::from_config(&self.config);
            let seed = mapgen::derive_level_seed(self.seed, next);
            let generated = mapgen::generate_level(&params, seed, next);
            self.install_level(generated);
        }
        self.levels[level].objects.retain(|&id| id != player);
        let entry = self.levels[next].entry;
        self.levels[next].objects.insert(0, player);
        let entity = &mut self.entities[player];
        entity.placement = Placement::OnMap { level: next };
        entity.pos = entry;
        self.current = next;
        self.refresh_player_fov();
        self.message("You move onward to the next area...", Tint::Red);
        info!(level = next, "player descended");
        Ok(())
    }
}
