//! Spawn table configuration
//!
//! The TMX `Entities` object group tags objects with a tileset gid; which
//! entity a gid spawns is data, not code. The table ships with a built-in
//! default (gid 36 is the player spawn, matching the bundled tileset) and
//! can be overridden with a RON file next to the level assets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// What an object with a given gid spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    Player,
}

/// Maps tileset gids to spawn kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnTable {
    entries: HashMap<u32, SpawnKind>,
}

/// Error type for spawn table loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    ValidationError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl Default for SpawnTable {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert(36, SpawnKind::Player);
        Self { entries }
    }
}

impl SpawnTable {
    /// Look up the spawn kind for a gid.
    pub fn resolve(&self, gid: u32) -> Option<SpawnKind> {
        self.entries.get(&gid).copied()
    }

    /// Load and validate a spawn table from a RON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let table: SpawnTable = ron::from_str(&text)?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // gid 0 means "no tile" in TMX and can never tag an object
        if self.entries.contains_key(&0) {
            return Err(ConfigError::ValidationError(
                "gid 0 is reserved for empty cells".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the table from `path`, falling back to the built-in default
    /// when the file is missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(table) => {
                println!("Loaded spawn table from {}", path.display());
                table
            }
            Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                SpawnTable::default()
            }
            Err(e) => {
                eprintln!(
                    "Failed to load spawn table from {}: {}, using built-in default",
                    path.display(),
                    e
                );
                SpawnTable::default()
            }
        }
    }
}
