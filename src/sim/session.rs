/// The game session: the single explicitly-constructed context object
/// every simulation function takes `&mut`. Owns the grid, the undo
/// history, the counters, and the handle to the loaded document.
///
/// There is deliberately no global state anywhere in `sim`; tests build
/// a fresh session per scenario.

use crate::domain::grid::{self, LayerSet, Position};
use crate::domain::tile::TileKind;
use crate::sim::event::GameEvent;
use crate::sim::history::{Frame, History};
use crate::sim::level::LevelDocument;
use crate::sim::progress::ProgressStore;

pub struct GameSession {
    pub layers: LayerSet,
    pub history: History,
    pub progress: ProgressStore,

    /// Document the running level was built from. `None` until the
    /// first load.
    pub current_level: Option<LevelDocument>,
    pub current_level_id: String,

    /// Bottom-left shift of the visible room (freeroam scrolling).
    pub world_offset: (i32, i32),
    /// Tile kind movement commands currently drive (Box by default,
    /// Mimic after touching one).
    pub active_form: TileKind,

    pub moves: i32,
    pub timer: f32,

    pub paused: bool,
    pub has_won: bool,
    /// Halts the remainder of the current tick (set by a Level-tile
    /// touch); cleared at the top of the next gravity call.
    pub stop_all: bool,
}

impl GameSession {
    pub fn new() -> Self {
        GameSession {
            layers: LayerSet::new(),
            history: History::new(),
            progress: ProgressStore::load(),
            current_level: None,
            current_level_id: String::new(),
            world_offset: (0, 0),
            active_form: TileKind::Box,
            moves: 0,
            timer: 0.0,
            paused: false,
            has_won: false,
            stop_all: false,
        }
    }

    // ── Play state ──────────────────────────────────────────────────

    pub fn is_play_allowed(&self) -> bool {
        !self.paused && !self.has_won && !self.stop_all
    }

    pub fn pause_resume(&mut self) {
        self.paused = !self.paused;
    }

    /// Halt movement for the remainder of the current tick.
    pub fn stop_movements(&mut self) {
        self.stop_all = true;
    }

    /// Accumulate the speedrun timer. Called once per frame while play
    /// is allowed.
    pub fn advance_timer(&mut self, dt: f32) {
        if self.is_play_allowed() {
            self.timer += dt;
        }
    }

    // ── Level metadata ──────────────────────────────────────────────

    pub fn freeroam(&self) -> bool {
        self.current_level.as_ref().map_or(false, |l| l.freeroam)
    }

    pub fn hide_ui(&self) -> bool {
        self.current_level.as_ref().map_or(false, |l| l.hide_ui)
    }

    /// Is `pos` inside the current room window? `mover_margin` grants
    /// the freeroam slack reserved for self-moving room movers.
    pub fn check_bounds(&self, pos: Position, mover_margin: bool) -> bool {
        grid::check_bounds(
            pos,
            self.world_offset,
            self.freeroam(),
            self.hide_ui(),
            mover_margin,
        )
    }

    // ── Undo ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Frame {
        Frame {
            layers: self.layers.clone(),
            room_offset: self.world_offset,
            active_form: self.active_form,
        }
    }

    /// Roll back one committed move. Silent no-op on empty history.
    pub fn undo(&mut self) -> Vec<GameEvent> {
        let Some(frame) = self.history.pop() else {
            return Vec::new();
        };
        self.layers = frame.layers;
        self.world_offset = frame.room_offset;
        self.active_form = frame.active_form;
        self.moves -= 1;
        vec![GameEvent::UndoPerformed]
    }

    /// Reset per-level runtime state (level rebuild path).
    pub fn reset_runtime(&mut self) {
        self.layers.clear();
        self.history.clear();
        self.world_offset = (0, 0);
        self.active_form = TileKind::Box;
        self.moves = 0;
        self.timer = 0.0;
        self.paused = false;
        self.has_won = false;
        self.stop_all = false;
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new()
    }
}
