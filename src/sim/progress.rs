/// Per-level completion records, persisted as `progress.toml`.
///
/// One entry per level id: completion flags latch true once, best time
/// and best moves only ever improve. The simulation updates the record
/// in memory on a win; the front-end decides when to flush to disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const PROGRESS_FILE: &str = "progress.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LevelRecord {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub outbound_completed: bool,
    /// Seconds; 0.0 means "never finished timed".
    #[serde(default)]
    pub best_time: f32,
    /// 0 means "no recorded move count".
    #[serde(default)]
    pub best_moves: i32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProgressStore {
    #[serde(default)]
    levels: BTreeMap<String, LevelRecord>,
}

fn data_dir() -> PathBuf {
    // 1. Exe directory when writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_tumblegrid");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/tumblegrid");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn custom_levels_dir() -> PathBuf {
    data_dir().join("custom")
}

impl ProgressStore {
    /// Load the store from disk. Absent or unreadable file means an
    /// empty record, never an error.
    pub fn load() -> Self {
        let path = data_dir().join(PROGRESS_FILE);
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).unwrap_or_default(),
            Err(_) => ProgressStore::default(),
        }
    }

    pub fn save(&self) -> Result<(), String> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| format!("progress encode failed: {}", e))?;
        let path = data_dir().join(PROGRESS_FILE);
        std::fs::write(&path, text).map_err(|e| format!("progress write failed: {}", e))
    }

    pub fn record(&self, id: &str) -> Option<&LevelRecord> {
        self.levels.get(id)
    }

    /// Fold a finished run into the level's record.
    ///
    /// Flags only ever go false -> true. A best stat is replaced when
    /// the new value beats it, or when no real value was stored yet.
    pub fn record_win(&mut self, id: &str, outbound: bool, time: f32, moves: i32) {
        let entry = self.levels.entry(id.to_string()).or_default();
        if outbound {
            entry.outbound_completed = true;
        } else {
            entry.completed = true;
        }
        if entry.best_time == 0.0 || time < entry.best_time {
            entry.best_time = time;
        }
        if entry.best_moves == 0 || moves < entry.best_moves {
            entry.best_moves = moves;
        }
    }
}
