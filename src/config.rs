/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Minimum interval between gravity ticks, manual or held.
    pub movement_cooldown_ms: u64,
    /// Hold a direction to keep ticking, vs one press = one tick.
    pub repeat_input: bool,
    pub frame_sleep_ms: u64,
    pub levels_dir: PathBuf,
    pub start_level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    paths: TomlPaths,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default = "default_cooldown")]
    movement_cooldown_ms: u64,
    #[serde(default = "default_repeat")]
    repeat_input: bool,
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
    #[serde(default = "default_start_level")]
    start_level: String,
}

#[derive(Deserialize, Debug)]
struct TomlPaths {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

fn default_cooldown() -> u64 {
    120
}
fn default_repeat() -> bool {
    true
}
fn default_frame_sleep() -> u64 {
    5
}
fn default_start_level() -> String {
    "intro-slide".to_string()
}
fn default_levels_dir() -> String {
    "levels".to_string()
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame {
            movement_cooldown_ms: default_cooldown(),
            repeat_input: default_repeat(),
            frame_sleep_ms: default_frame_sleep(),
            start_level: default_start_level(),
        }
    }
}

impl Default for TomlPaths {
    fn default() -> Self {
        TomlPaths {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    pub fn load() -> Self {
        let parsed = read_config_file()
            .and_then(|text| toml::from_str::<TomlConfig>(&text).ok())
            .unwrap_or_default();
        GameConfig::from_toml(parsed)
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            movement_cooldown_ms: t.game.movement_cooldown_ms,
            repeat_input: t.game.repeat_input,
            frame_sleep_ms: t.game.frame_sleep_ms,
            levels_dir: PathBuf::from(t.paths.levels_dir),
            start_level: t.game.start_level,
        }
    }
}

fn read_config_file() -> Option<String> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            candidates.push(parent.join("config.toml"));
        }
    }
    candidates.push(PathBuf::from("config.toml"));

    candidates
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
}
