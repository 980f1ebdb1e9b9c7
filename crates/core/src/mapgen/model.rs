//! Public data models for generated levels and the spawns that populate them.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::grid::Grid;
use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelKind {
    /// Open Martian ground with buildings.
    Surface,
    /// Rock with carved rooms joined by tunnels.
    Underground,
}

impl LevelKind {
    pub fn for_depth(depth: usize) -> Self {
        if depth == 0 {
            LevelKind::Surface
        } else {
            LevelKind::Underground
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpawnKind {
    Robot,
    SecurityBot,
    Explorer,
    Worker,
    HealingPotion,
    LightningScroll,
    FireballScroll,
    ConfusionScroll,
    Sword,
    Shield,
}

impl SpawnKind {
    pub fn is_npc(self) -> bool {
        matches!(
            self,
            SpawnKind::Robot | SpawnKind::SecurityBot | SpawnKind::Explorer | SpawnKind::Worker
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    pub kind: SpawnKind,
    pub pos: Pos,
}

/// Structural knobs for one generation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MapGenParams {
    pub width: usize,
    pub height: usize,
    pub room_min_size: usize,
    pub room_max_size: usize,
    pub max_rooms: usize,
    pub building_min_size: usize,
    pub building_max_size: usize,
    pub max_buildings: usize,
}

impl MapGenParams {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            width: config.map_width,
            height: config.map_height,
            room_min_size: config.room_min_size,
            room_max_size: config.room_max_size,
            max_rooms: config.max_rooms,
            building_min_size: config.building_min_size,
            building_max_size: config.building_max_size,
            max_buildings: config.max_buildings,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedLevel {
    pub depth: usize,
    pub kind: LevelKind,
    pub grid: Grid,
    pub player_start: Pos,
    pub stairs: Option<Pos>,
    pub spawns: Vec<Spawn>,
}

impl GeneratedLevel {
    /// A hand-made grid with nothing on it but the player's start.
    pub fn bare(grid: Grid, player_start: Pos) -> Self {
        Self {
            depth: 0,
            kind: LevelKind::Surface,
            grid,
            player_start,
            stairs: None,
            spawns: Vec::new(),
        }
    }
}
