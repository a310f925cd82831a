/// Presentation layer: glyph grid plus a status line.
///
/// Strictly read-only over the session — it polls getters and layer
/// contents, owns no simulation state, and never mutates the grid.
/// One full redraw per frame, batched with `queue!` and flushed once;
/// at a 14x8 room this is cheap enough that no diffing is needed.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::domain::grid::{Position, BOUNDS_X, BOUNDS_Y};
use crate::domain::tile::{Tile, TileKind};
use crate::sim::session::GameSession;
use crate::sim::win::{self, OverlapCounts};

pub struct Renderer {
    out: Stdout,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer { out: io::stdout() }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(self.out, EnterAlternateScreen, Hide, Clear(ClearType::All))
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.out, Show, LeaveAlternateScreen, ResetColor)?;
        terminal::disable_raw_mode()
    }

    /// Draw the current room window, the status line, and an optional
    /// transient message.
    pub fn render(&mut self, session: &GameSession, message: &str) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        let (ox, oy) = session.world_offset;
        for row in 0..(-BOUNDS_Y + 1) {
            queue!(self.out, MoveTo(0, row as u16))?;
            for col in 0..(BOUNDS_X + 1) {
                let pos = Position::new(ox + col, oy - row);
                let (glyph, color) = match session.layers.get(pos) {
                    Some(tile) => glyph_for(tile),
                    None => ('.', Color::DarkGrey),
                };
                queue!(
                    self.out,
                    SetForegroundColor(color),
                    Print(glyph),
                    Print(' ')
                )?;
            }
        }
        queue!(self.out, ResetColor)?;

        if !session.hide_ui() {
            self.status_line(session)?;
        }

        if !message.is_empty() {
            queue!(
                self.out,
                MoveTo(0, (-BOUNDS_Y + 3) as u16),
                SetForegroundColor(Color::Yellow),
                Print(message),
                ResetColor
            )?;
        }

        self.out.flush()
    }

    fn status_line(&mut self, session: &GameSession) -> io::Result<()> {
        let name = session
            .current_level
            .as_ref()
            .map(|l| l.name.as_str())
            .unwrap_or("");
        let counts = win::overlap_counts(session);
        let line = format!(
            "{}  moves {}  time {:>6.1}s  {}{}",
            name,
            session.moves,
            session.timer,
            count_text(&counts),
            if session.paused { "  [paused]" } else { "" },
        );
        queue!(
            self.out,
            MoveTo(0, (-BOUNDS_Y + 2) as u16),
            SetForegroundColor(Color::White),
            Print(line),
            ResetColor
        )
    }
}

fn count_text(c: &OverlapCounts) -> String {
    let mut parts = Vec::new();
    if c.areas.1 > 0 {
        parts.push(format!("areas {}/{}", c.areas.0, c.areas.1));
    }
    if c.inverse.1 > 0 {
        parts.push(format!("clear {}/{}", c.inverse.1 - c.inverse.0, c.inverse.1));
    }
    if c.outbound.1 > 0 {
        parts.push(format!("bonus {}/{}", c.outbound.0, c.outbound.1));
    }
    parts.join("  ")
}

fn glyph_for(tile: &Tile) -> (char, Color) {
    match tile.kind {
        TileKind::Wall => ('#', Color::Grey),
        TileKind::AntiWall => ('%', Color::DarkGrey),
        TileKind::Box => ('O', Color::Cyan),
        TileKind::Circle => ('o', Color::Blue),
        TileKind::Hexagon => ('H', Color::Magenta),
        TileKind::Mimic => ('M', Color::Cyan),
        TileKind::Area => ('_', Color::Green),
        TileKind::InverseArea => ('x', Color::Red),
        TileKind::OutboundArea => ('*', Color::Yellow),
        TileKind::Hazard => ('!', Color::Red),
        TileKind::Void => ('v', Color::DarkRed),
        TileKind::Invert => ('~', Color::Magenta),
        TileKind::Arrow => (arrow_glyph(tile), Color::Green),
        TileKind::NegativeArrow => (arrow_glyph(tile), Color::Red),
        TileKind::Orb => ('@', Color::Yellow),
        TileKind::Fragment => ('+', Color::Yellow),
        TileKind::Level => ('L', Color::White),
        TileKind::Hologram => ('?', Color::DarkGrey),
        TileKind::Npc => ('&', Color::White),
        TileKind::Fake => ('#', Color::Grey),
    }
}

/// Arrows point along their dominant active flag.
fn arrow_glyph(tile: &Tile) -> char {
    let d = tile.directions;
    if d.up {
        '^'
    } else if d.down {
        'v'
    } else if d.left {
        '<'
    } else if d.right {
        '>'
    } else {
        '+'
    }
}
