// User configuration: board size, tileset location, pacing and logging
// Stored as TOML in the per-project config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::tsw_tiles::TILESET_PATH;

/// Board and runtime settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rows: usize,
    pub columns: usize,
    pub mines: usize,
    pub tileset: PathBuf,      // Tileset asset, relative to the working directory
    pub frame_rate: u32,       // Target frames per second
    pub seed: Option<u64>,     // Fixed RNG seed for reproducible boards
    pub cascade: bool,         // Open neighbours of zero-danger cells
    pub log_level: String,     // tracing level name
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: 12,
            columns: 10,
            mines: 20,
            tileset: PathBuf::from(TILESET_PATH),
            frame_rate: 30,
            seed: None,
            cascade: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Delay between frames, never below 1 ms
    pub fn frame_delay_ms(&self) -> u64 {
        (1000 / self.frame_rate.max(1) as u64).max(1)
    }
}

fn project_dirs() -> Option<(ProjectDirs, String)> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem()?.to_str()?.to_string();
    let proj = ProjectDirs::from("com", "xhbl", &name)?;
    Some((proj, name))
}

/// Config file path, e.g. ~/.config/tswpr/tswpr.toml on Linux.
/// Falls back to the current directory when no home is known.
pub fn config_path() -> Option<PathBuf> {
    match project_dirs() {
        Some((proj, name)) => Some(proj.config_dir().join(format!("{}.toml", name))),
        None => {
            let name = env::current_exe().ok()?.file_stem()?.to_str()?.to_string();
            Some(env::current_dir().ok()?.join(format!("{}.toml", name)))
        }
    }
}

/// Log file path in the per-project data directory
pub fn log_path() -> Option<PathBuf> {
    match project_dirs() {
        Some((proj, name)) => Some(proj.data_dir().join(format!("{}.log", name))),
        None => Some(env::current_dir().ok()?.join("tswpr.log")),
    }
}

/// Parse a config file body; None when it is not valid TOML for Config
pub fn parse_config(text: &str) -> Option<Config> {
    toml::from_str::<Config>(text).ok()
}

/// Load the config from disk, writing defaults on first run.
/// Unreadable or invalid files fall back to defaults and are left untouched.
pub fn load_or_create_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(s) => match parse_config(&s) {
                Some(cfg) => return cfg,
                None => warn!("invalid config {}, using defaults", path.display()),
            },
            Err(e) => warn!("cannot read config {}: {}", path.display(), e),
        }
        return Config::default();
    }

    let cfg = Config::default();
    if let Ok(s) = toml::to_string(&cfg) {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&path, s) {
            warn!("cannot write default config {}: {}", path.display(), e);
        }
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg = parse_config("rows = 16\nmines = 40\n").unwrap();
        assert_eq!(cfg.rows, 16);
        assert_eq!(cfg.mines, 40);
        assert_eq!(cfg.columns, 10);
        assert_eq!(cfg.tileset, PathBuf::from("res/tileset.toml"));
        assert!(cfg.cascade);
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(parse_config("rows = \"many\"").is_none());
    }

    #[test]
    fn defaults_survive_toml() {
        let text = toml::to_string(&Config::default()).unwrap();
        assert_eq!(parse_config(&text), Some(Config::default()));
    }

    #[test]
    fn frame_delay() {
        let mut cfg = Config::default();
        assert_eq!(cfg.frame_delay_ms(), 33);
        cfg.frame_rate = 0;
        assert_eq!(cfg.frame_delay_ms(), 1000);
        cfg.frame_rate = 5000;
        assert_eq!(cfg.frame_delay_ms(), 1);
    }
}
