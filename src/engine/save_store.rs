use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::game_save::GameSave;

const APP_DIR: &str = "dungeon_narrator";
const SAVE_FILE: &str = "game_state.json";

/// Keeps the single autosave slot on disk.
pub struct SaveStore {
    path: PathBuf,
}

impl SaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(SAVE_FILE);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when there is nothing saved yet.
    pub fn load(&self) -> Result<Option<GameSave>> {
        if !self.path.exists() {
            return Ok(None);
        }
        read_save(&self.path).map(Some)
    }

    pub fn save(&self, save: &GameSave) -> Result<()> {
        write_save(&self.path, save)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("removing {}", self.path.display()))?;
        }
        Ok(())
    }
}

pub fn read_save(path: &Path) -> Result<GameSave> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

pub fn write_save(path: &Path, save: &GameSave) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(save)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
