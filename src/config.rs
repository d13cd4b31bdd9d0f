use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "concentration";
const CONFIG_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Tunable constants for one game.
///
/// Every field has a default matching the stock 4x4 board, so a settings file
/// only needs to name the values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub total_seconds: u32,
    pub preview_seconds: u32,
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub pairs: usize,
    pub pool_size: usize,
    pub mismatch_delay_ms: u64,
    pub preview_reveal_delay_ms: u64,
    pub tick_ms: u64,
    pub start_overlay_ms: u64,
    /// End the game as soon as the last pair is found instead of waiting for
    /// the countdown.
    pub end_on_all_matched: bool,
    pub asset_dir: String,
    pub image_extension: String,
    pub back_image: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            total_seconds: 20,
            preview_seconds: 3,
            grid_cols: 4,
            grid_rows: 4,
            pairs: 8,
            pool_size: 18,
            mismatch_delay_ms: 800,
            preview_reveal_delay_ms: 100,
            tick_ms: 1000,
            start_overlay_ms: 1000,
            end_on_all_matched: false,
            asset_dir: "img".to_string(),
            image_extension: "jpg".to_string(),
            back_image: "back.png".to_string(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Loads `path`, falling back to defaults. A missing file is the normal
    /// case and is not reported.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                log::warn!("{}: {err}; using default settings", path.display());
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs == 0 {
            return Err(ConfigError::Invalid("pairs must be at least 1".into()));
        }
        if self.pairs > self.pool_size {
            return Err(ConfigError::Invalid(format!(
                "pairs ({}) exceeds image pool size ({})",
                self.pairs, self.pool_size
            )));
        }
        let cells = self.grid_cols as usize * self.grid_rows as usize;
        if cells != self.pairs * 2 {
            return Err(ConfigError::Invalid(format!(
                "a {}x{} grid holds {} cards, but {} pairs need {}",
                self.grid_cols,
                self.grid_rows,
                cells,
                self.pairs,
                self.pairs * 2
            )));
        }
        if self.total_seconds == 0 {
            return Err(ConfigError::Invalid("total_seconds must be at least 1".into()));
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be at least 1".into()));
        }
        Ok(())
    }

    pub fn deck_len(&self) -> usize {
        self.pairs * 2
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn mismatch_delay(&self) -> Duration {
        Duration::from_millis(self.mismatch_delay_ms)
    }

    pub fn preview_reveal_delay(&self) -> Duration {
        Duration::from_millis(self.preview_reveal_delay_ms)
    }

    pub fn back_image_path(&self) -> String {
        format!("{}/{}", self.asset_dir, self.back_image)
    }
}

pub fn config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}
