/// Level document loading, saving, and instantiation.
///
/// ## Sources (priority order):
///   1. Built-in embedded documents
///   2. `levels/` directory next to the executable or CWD
///   3. Custom documents under the data dir (`custom/{id}.level`)
///
/// Documents are TOML. Kind strings the engine does not recognize fall
/// back to Box, and positions outside the room envelope are clamped
/// (non-freeroam levels only), so a hand-edited file degrades instead
/// of failing.

use std::fmt;
use std::path::PathBuf;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::domain::grid::{Position, BOUNDS_X, BOUNDS_Y};
use crate::domain::tile::{Directions, Tile, TileKind};
use crate::sim::event::GameEvent;
use crate::sim::progress::custom_levels_dir;
use crate::sim::session::GameSession;

/// Id the editor plays under; collectibles stay put and no progress is
/// recorded for it.
pub const EDITOR_SESSION_ID: &str = "EditorSession";

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum LevelError {
    /// No document exists for the requested id.
    InvalidLevel { id: String },
    Io(String),
    Malformed(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::InvalidLevel { id } => write!(f, "no level with id '{}'", id),
            LevelError::Io(msg) => write!(f, "level i/o error: {}", msg),
            LevelError::Malformed(msg) => write!(f, "malformed level document: {}", msg),
        }
    }
}

impl std::error::Error for LevelError {}

// ══════════════════════════════════════════════════════════════
// Document schema
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LevelDocument {
    pub name: String,
    #[serde(default)]
    pub next_level: String,
    #[serde(default)]
    pub remix_level: String,
    /// Base64 thumbnail; opaque to the simulation.
    #[serde(default)]
    pub preview_image: String,
    #[serde(default)]
    pub difficulty: i32,
    #[serde(default)]
    pub freeroam: bool,
    #[serde(default)]
    pub hide_ui: bool,
    #[serde(default)]
    pub tiles: LayerDocs,
    #[serde(default)]
    pub custom_text: Vec<CustomTextDoc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LayerDocs {
    #[serde(default)]
    pub solids: Vec<TileDoc>,
    #[serde(default)]
    pub objects: Vec<TileDoc>,
    #[serde(default)]
    pub win_areas: Vec<TileDoc>,
    #[serde(default)]
    pub hazards: Vec<TileDoc>,
    #[serde(default)]
    pub effects: Vec<TileDoc>,
    #[serde(default)]
    pub customs: Vec<TileDoc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileDoc {
    pub kind: String,
    pub x: i32,
    pub y: i32,
    #[serde(flatten)]
    pub directions: Directions,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomTextDoc {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

// ══════════════════════════════════════════════════════════════
// Lookup
// ══════════════════════════════════════════════════════════════

/// Fetch a document by id. `external` selects the custom-level store
/// under the data dir; otherwise embedded documents and the `levels/`
/// search dirs are consulted.
pub fn get_level(id: &str, external: bool, config: &GameConfig) -> Result<LevelDocument, LevelError> {
    if external {
        let path = custom_levels_dir().join(format!("{}.level", id));
        let text = std::fs::read_to_string(&path)
            .map_err(|_| LevelError::InvalidLevel { id: id.to_string() })?;
        return parse_document(&text);
    }

    if let Some(text) = embedded_level(id) {
        return parse_document(text);
    }

    for dir in level_search_dirs(config) {
        let path = dir.join(format!("{}.level", id));
        if let Ok(text) = std::fs::read_to_string(&path) {
            return parse_document(&text);
        }
    }

    Err(LevelError::InvalidLevel { id: id.to_string() })
}

fn parse_document(text: &str) -> Result<LevelDocument, LevelError> {
    toml::from_str(text).map_err(|e| LevelError::Malformed(e.to_string()))
}

fn level_search_dirs(config: &GameConfig) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.join(&config.levels_dir));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join(&config.levels_dir));
    }
    dirs
}

// ══════════════════════════════════════════════════════════════
// Instantiation
// ══════════════════════════════════════════════════════════════

/// Load a document and rebuild the session from it.
pub fn load_level(
    session: &mut GameSession,
    id: &str,
    external: bool,
    config: &GameConfig,
) -> Result<Vec<GameEvent>, LevelError> {
    let doc = get_level(id, external, config)?;
    Ok(build(session, doc, id))
}

/// Rebuild the current level from its retained document (restart).
pub fn reload_level(session: &mut GameSession) -> Vec<GameEvent> {
    match session.current_level.clone() {
        Some(doc) => {
            let id = session.current_level_id.clone();
            build(session, doc, &id)
        }
        None => Vec::new(),
    }
}

/// Tear down all runtime state and instantiate every tile in `doc`.
pub fn build(session: &mut GameSession, doc: LevelDocument, id: &str) -> Vec<GameEvent> {
    session.reset_runtime();

    let freeroam = doc.freeroam;
    let layer_lists = [
        &doc.tiles.solids,
        &doc.tiles.objects,
        &doc.tiles.win_areas,
        &doc.tiles.hazards,
        &doc.tiles.effects,
        &doc.tiles.customs,
    ];
    for list in layer_lists {
        for tile_doc in list.iter() {
            let kind = TileKind::from_name(&tile_doc.kind);
            let pos = clamp_position(Position::new(tile_doc.x, tile_doc.y), freeroam);
            session.layers.place(Tile::new(kind, tile_doc.directions, pos));
        }
    }

    apply_custom_text(session, &doc.custom_text, freeroam);

    let name = doc.name.clone();
    session.current_level = Some(doc);
    session.current_level_id = id.to_string();

    vec![GameEvent::LevelLoaded { name }]
}

/// Positions in a bounded level are forced into the room envelope.
fn clamp_position(pos: Position, freeroam: bool) -> Position {
    if freeroam {
        return pos;
    }
    Position::new(pos.x.clamp(0, BOUNDS_X), pos.y.clamp(BOUNDS_Y, 0))
}

/// Attach text entries to the custom tiles they address, resolving the
/// sprite naming convention. Entries with no custom tile at their
/// position are dropped silently.
fn apply_custom_text(session: &mut GameSession, entries: &[CustomTextDoc], freeroam: bool) {
    use crate::domain::tile::Layer;
    for entry in entries {
        let pos = clamp_position(Position::new(entry.x, entry.y), freeroam);
        let Some(tile) = session.layers.get_in_mut(Layer::Customs, pos) else {
            continue;
        };
        match tile.kind {
            // "dialog;sprite" — the sprite segment is optional
            TileKind::Npc => {
                let mut parts = entry.text.splitn(2, ';');
                let dialog = parts.next().unwrap_or("").to_string();
                tile.sprite_name = parts.next().map(|s| s.to_string());
                tile.custom_text = Some(dialog);
            }
            // the text IS the sprite name
            TileKind::Hologram | TileKind::Fake => {
                tile.sprite_name = Some(entry.text.clone());
                tile.custom_text = Some(entry.text.clone());
            }
            _ => tile.custom_text = Some(entry.text.clone()),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Saving
// ══════════════════════════════════════════════════════════════

/// Serialize the live session back into a document and write it to the
/// custom store. Returns the id the level was saved under. Serves the
/// editor surface; the play loop never calls it.
#[allow(dead_code)]
pub fn save_level(
    session: &GameSession,
    name: &str,
    id: Option<String>,
    preview: Option<String>,
) -> Result<String, LevelError> {
    let doc = document_from(session, name, preview);
    let id = id.unwrap_or_else(|| generate_id(name));
    let text =
        toml::to_string_pretty(&doc).map_err(|e| LevelError::Malformed(e.to_string()))?;
    let dir = custom_levels_dir();
    std::fs::create_dir_all(&dir).map_err(|e| LevelError::Io(e.to_string()))?;
    std::fs::write(dir.join(format!("{}.level", id)), text)
        .map_err(|e| LevelError::Io(e.to_string()))?;
    Ok(id)
}

/// Gather the live layer contents into the document shape.
///
/// Metadata not owned by the grid (next/remix level, difficulty, flags,
/// preview) is carried forward from the loaded document.
pub fn document_from(session: &GameSession, name: &str, preview: Option<String>) -> LevelDocument {
    use crate::domain::tile::Layer;

    let forward = session.current_level.clone().unwrap_or_default();
    let mut doc = LevelDocument {
        name: name.to_string(),
        next_level: forward.next_level,
        remix_level: forward.remix_level,
        preview_image: preview.unwrap_or(forward.preview_image),
        difficulty: forward.difficulty,
        freeroam: forward.freeroam,
        hide_ui: forward.hide_ui,
        tiles: LayerDocs::default(),
        custom_text: Vec::new(),
    };

    let dump = |layer: Layer, out: &mut Vec<TileDoc>| {
        for tile in session.layers.layer(layer) {
            out.push(TileDoc {
                kind: tile.kind.name().to_string(),
                x: tile.position.x,
                y: tile.position.y,
                directions: tile.directions,
            });
        }
    };
    dump(Layer::Solids, &mut doc.tiles.solids);
    dump(Layer::Objects, &mut doc.tiles.objects);
    dump(Layer::WinAreas, &mut doc.tiles.win_areas);
    dump(Layer::Hazards, &mut doc.tiles.hazards);
    dump(Layer::Effects, &mut doc.tiles.effects);
    dump(Layer::Customs, &mut doc.tiles.customs);

    // only live custom tiles keep their text entries
    for tile in session.layers.layer(Layer::Customs) {
        let text = match (tile.kind, &tile.custom_text, &tile.sprite_name) {
            (TileKind::Npc, Some(dialog), Some(sprite)) => format!("{};{}", dialog, sprite),
            (_, Some(text), _) => text.clone(),
            _ => continue,
        };
        doc.custom_text.push(CustomTextDoc {
            x: tile.position.x,
            y: tile.position.y,
            text,
        });
    }

    doc
}

fn generate_id(name: &str) -> String {
    let n: u32 = rand::thread_rng().gen_range(1..1000);
    format!("{}-{}", name, n)
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

fn embedded_level(id: &str) -> Option<&'static str> {
    match id {
        "intro-slide" => Some(INTRO_SLIDE),
        "intro-push" => Some(INTRO_PUSH),
        "intro-remix" => Some(INTRO_REMIX),
        _ => None,
    }
}

pub fn builtin_level_ids() -> &'static [&'static str] {
    &["intro-slide", "intro-push", "intro-remix"]
}

const INTRO_SLIDE: &str = r#"
name = "First Slide"
next_level = "intro-push"
difficulty = 1

[[tiles.solids]]
kind = "Wall"
x = 6
y = -4

[[tiles.objects]]
kind = "Box"
x = 2
y = 0

[[tiles.win_areas]]
kind = "Area"
x = 2
y = -7
"#;

const INTRO_PUSH: &str = r#"
name = "Push It"
next_level = "intro-remix"
difficulty = 2

[[tiles.solids]]
kind = "Wall"
x = 0
y = -7

[[tiles.objects]]
kind = "Box"
x = 4
y = 0

[[tiles.objects]]
kind = "Circle"
x = 4
y = -3
up = false
down = false
left = false
right = false

[[tiles.win_areas]]
kind = "Area"
x = 4
y = -6

[[tiles.win_areas]]
kind = "Area"
x = 4
y = -7
"#;

const INTRO_REMIX: &str = r#"
name = "Fork"
remix_level = "intro-slide"
difficulty = 3

[[tiles.objects]]
kind = "Box"
x = 6
y = 0

[[tiles.win_areas]]
kind = "Area"
x = 6
y = -7

[[tiles.win_areas]]
kind = "InverseArea"
x = 13
y = -7

[[tiles.hazards]]
kind = "Hazard"
x = 0
y = -7
"#;
