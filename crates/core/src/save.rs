//! Whole-session save files.
//!
//! A save is one pretty-printed JSON document holding `format_version`, the
//! SHA-256 of the canonical world JSON, and the world itself. Writes go to a
//! sibling `.json.tmp` file first and are renamed into place, so an interrupted
//! save never clobbers the previous one. Path maps and the player's view are not
//! stored; they are rebuilt after loading.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::world::World;

pub const SAVE_FORMAT_VERSION: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save file checksum mismatch (expected {expected}, found {actual})")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("unsupported save format version {found} (expected {SAVE_FORMAT_VERSION})")]
    UnsupportedVersion { found: u16 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveFile {
    pub format_version: u16,
    pub checksum_sha256_hex: String,
    pub world: World,
}

fn world_sha256(world: &World) -> Result<String, SaveError> {
    let json = serde_json::to_string(world)?;
    let digest = Sha256::digest(json.as_bytes());
    Ok(format!("{digest:064x}"))
}

impl SaveFile {
    pub fn new(world: World) -> Result<Self, SaveError> {
        let checksum_sha256_hex = world_sha256(&world)?;
        Ok(Self { format_version: SAVE_FORMAT_VERSION, checksum_sha256_hex, world })
    }

    pub fn write_atomic(&self, path: &Path) -> Result<(), SaveError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        Ok(())
    }

    /// Reads and verifies a save. The world comes back ready to step.
    pub fn load(path: &Path) -> Result<Self, SaveError> {
        let content = fs::read_to_string(path)?;
        let mut save: Self = serde_json::from_str(&content)?;
        if save.format_version != SAVE_FORMAT_VERSION {
            return Err(SaveError::UnsupportedVersion { found: save.format_version });
        }
        let actual = world_sha256(&save.world)?;
        if actual != save.checksum_sha256_hex {
            return Err(SaveError::ChecksumMismatch {
                expected: save.checksum_sha256_hex,
                actual,
            });
        }
        save.world.refresh_player_fov();
        Ok(save)
    }
}

impl World {
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        SaveFile::new(self.clone())?.write_atomic(path)?;
        info!(path = %path.display(), turn = self.turn, "game saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SaveError> {
        let world = SaveFile::load(path)?.world;
        info!(path = %path.display(), turn = world.turn, "game loaded");
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::Pos;
    use tempfile::tempdir;

    #[test]
    fn write_then_load_restores_the_world() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saves").join("run.json");
        let world = World::new(EngineConfig::default(), 2024);

        world.save(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = World::load(&path).unwrap();
        assert_eq!(loaded.snapshot_hash(), world.snapshot_hash());
        assert_eq!(loaded.player_fov(), world.player_fov());
    }

    #[test]
    fn tampered_world_fails_the_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut save = SaveFile::new(World::new(EngineConfig::default(), 5)).unwrap();
        let player = save.world.player;
        save.world.entities[player].pos = Pos::new(1, 1);
        save.write_atomic(&path).unwrap();

        assert!(matches!(SaveFile::load(&path), Err(SaveError::ChecksumMismatch { .. })));
    }

    #[test]
    fn future_versions_are_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut save = SaveFile::new(World::new(EngineConfig::default(), 5)).unwrap();
        save.format_version = SAVE_FORMAT_VERSION + 1;
        save.write_atomic(&path).unwrap();

        assert!(matches!(SaveFile::load(&path), Err(SaveError::UnsupportedVersion { found: 2 })));
    }

    #[test]
    fn garbage_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SaveFile::load(&path), Err(SaveError::Json(_))));
    }
}
