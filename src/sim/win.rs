/// Win evaluation: three predicates over the win-area and object
/// layers, checked after every settled movement tick.
///
/// Precedence when several hold at once: Outbound > Remix > Normal.
/// The overlap counts are exposed separately so the status line can
/// report progress on all three without re-deriving layer state.

use crate::domain::grid::Position;
use crate::domain::tile::{Layer, TileKind};
use crate::sim::event::GameEvent;
use crate::sim::level::EDITOR_SESSION_ID;
use crate::sim::session::GameSession;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WinKind {
    Normal,
    Remix,
    Outbound,
}

/// Covered / total pairs per win-area kind, for UI polling.
#[derive(Clone, Copy, Default, Debug)]
pub struct OverlapCounts {
    pub areas: (usize, usize),
    pub inverse: (usize, usize),
    pub outbound: (usize, usize),
}

fn occupied(session: &GameSession, pos: Position) -> bool {
    session.layers.get_in(Layer::Objects, pos).is_some()
}

pub fn overlap_counts(session: &GameSession) -> OverlapCounts {
    let mut counts = OverlapCounts::default();
    for tile in session.layers.layer(Layer::WinAreas) {
        let on = occupied(session, tile.position);
        let slot = match tile.kind {
            TileKind::Area => &mut counts.areas,
            TileKind::InverseArea => &mut counts.inverse,
            TileKind::OutboundArea => &mut counts.outbound,
            _ => continue,
        };
        slot.1 += 1;
        if on {
            slot.0 += 1;
        }
    }
    counts
}

/// Which predicate, if any, currently holds.
pub fn evaluate(session: &GameSession) -> Option<WinKind> {
    let c = overlap_counts(session);
    let areas_full = c.areas.0 == c.areas.1;
    let areas_empty = c.areas.0 == 0;
    let inverse_full = c.inverse.0 == c.inverse.1;
    let inverse_empty = c.inverse.0 == 0;
    let outbound_full = c.outbound.0 == c.outbound.1;

    // Outbound: every outbound and every area covered.
    if c.outbound.1 > 0 && outbound_full && areas_full {
        return Some(WinKind::Outbound);
    }

    // Remix: inverse areas covered, plain areas clear, every object
    // parked on an inverse cell, and the document names a remix target.
    if c.inverse.1 > 0 && inverse_full && areas_empty {
        let has_remix_ref = session
            .current_level
            .as_ref()
            .map_or(false, |l| !l.remix_level.is_empty());
        let all_objects_on_inverse = session.layers.layer(Layer::Objects).iter().all(|t| {
            session
                .layers
                .get_in(Layer::WinAreas, t.position)
                .map_or(false, |w| w.kind == TileKind::InverseArea)
        });
        if has_remix_ref && all_objects_on_inverse {
            return Some(WinKind::Remix);
        }
    }

    // Normal: every area covered, every inverse area clear.
    if c.areas.1 > 0 && areas_full && inverse_empty {
        return Some(WinKind::Normal);
    }

    None
}

/// Evaluate, and on a first win latch the session and fold the run
/// into the progress record. The editor session never records.
pub fn check(session: &mut GameSession) -> Vec<GameEvent> {
    if session.has_won {
        return Vec::new();
    }
    let Some(kind) = evaluate(session) else {
        return Vec::new();
    };
    session.has_won = true;
    if session.current_level_id != EDITOR_SESSION_ID {
        let id = session.current_level_id.clone();
        session
            .progress
            .record_win(&id, kind == WinKind::Outbound, session.timer, session.moves);
    }
    vec![GameEvent::WinDetected {
        kind,
        time: session.timer,
        moves: session.moves,
    }]
}
