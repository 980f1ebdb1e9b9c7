//! Gameplay constants gathered into one serde-loadable table.
//! Defaults reproduce the original tuning; a TOML file may override any subset.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub map_width: usize,
    pub map_height: usize,
    pub room_min_size: usize,
    pub room_max_size: usize,
    pub max_rooms: usize,
    pub building_min_size: usize,
    pub building_max_size: usize,
    pub max_buildings: usize,

    pub fov_radius: i32,
    pub fov_light_walls: bool,

    pub player_speed: u32,
    pub default_speed: u32,
    pub default_attack_speed: u32,

    pub inventory_capacity: usize,
    pub message_capacity: usize,
    pub message_width: usize,

    pub heal_amount: i32,
    pub lightning_range: f64,
    pub lightning_damage: i32,
    pub confuse_turns: u32,
    pub confuse_range: f64,
    pub fireball_radius: f64,
    pub fireball_damage: i32,

    pub level_up_base: i32,
    pub level_up_factor: i32,

    /// Consecutive failed path steps after which an explorer or worker drops its
    /// path and plans a new one.
    pub stuck_replan_turns: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            map_width: 80,
            map_height: 43,
            room_min_size: 6,
            room_max_size: 10,
            max_rooms: 30,
            building_min_size: 6,
            building_max_size: 10,
            max_buildings: 10,
            fov_radius: 10,
            fov_light_walls: true,
            player_speed: 1,
            default_speed: 8,
            default_attack_speed: 20,
            inventory_capacity: 26,
            message_capacity: 16,
            message_width: 58,
            heal_amount: 4,
            lightning_range: 5.0,
            lightning_damage: 20,
            confuse_turns: 10,
            confuse_range: 8.0,
            fireball_radius: 3.0,
            fireball_damage: 12,
            level_up_base: 200,
            level_up_factor: 150,
            stuck_replan_turns: 3,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Experience needed to go from `level` to `level + 1`.
    pub fn level_up_threshold(&self, level: u32) -> i32 {
        self.level_up_base + (level as i32) * self.level_up_factor
    }
}
