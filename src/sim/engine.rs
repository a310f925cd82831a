/// The movement resolver: one `apply_gravity` call is one tick.
///
/// Every object tile is slid one cell in the tick's direction, with
/// push chains resolved by recursion, hazards and effects applied at
/// the landing cell, and the whole tick committed or rolled back as a
/// unit (a tick that moves nothing consumes neither history nor the
/// move counter).
///
/// Per-tick bookkeeping is keyed on tile ids, never on positions, so a
/// tile stays tracked across its own relocation within the tick.

use crate::domain::grid::{MoveDir, Position, BOUNDS_X, BOUNDS_Y, ROOM_STEP_X, ROOM_STEP_Y};
use crate::domain::tile::{Layer, TileKind};
use crate::sim::event::GameEvent;
use crate::sim::level::EDITOR_SESSION_ID;
use crate::sim::session::GameSession;
use crate::sim::win;

/// Push-chain recursion bound. A chain deeper than this (or a cyclic
/// pushable arrangement) fails the whole move instead of overflowing
/// the stack.
pub const MAX_PUSH_DEPTH: u32 = 32;

/// Transient per-tick state, reset at the top of every gravity call.
#[derive(Default)]
struct TickState {
    /// Tiles that have already resolved this tick.
    blacklist: Vec<u32>,
    /// Movers standing on a hazard after their move; removed after the
    /// pass so one destruction cannot reorder another tile's attempt.
    destroy: Vec<u32>,
    /// Hexagons waiting for a blocking object to clear; re-attempted
    /// after the main pass.
    late: Vec<u32>,
    late_pass: bool,
    moved: bool,
    events: Vec<GameEvent>,
}

impl TickState {
    fn blacklisted(&self, id: u32) -> bool {
        self.blacklist.contains(&id)
    }

    fn blacklist(&mut self, id: u32) {
        if !self.blacklist.contains(&id) {
            self.blacklist.push(id);
        }
    }
}

/// Advance the whole grid one cell in `dir`.
pub fn apply_gravity(session: &mut GameSession, dir: MoveDir) -> Vec<GameEvent> {
    // the movement halt is per-tick state, like the queues below
    session.stop_all = false;
    if !session.is_play_allowed() || session.current_level.is_none() {
        return Vec::new();
    }

    session.history.push(session.snapshot());
    let mut tick = TickState::default();

    // Hexagons act after everything else has had its chance to clear
    // a path; the sort is stable so ties keep placement order.
    let mut order: Vec<(u32, bool)> = session
        .layers
        .layer(Layer::Objects)
        .iter()
        .map(|t| (t.id, t.kind == TileKind::Hexagon))
        .collect();
    order.sort_by_key(|(_, hexagon)| *hexagon);

    for (id, _) in &order {
        if !tick.blacklisted(*id) {
            try_move(session, &mut tick, *id, dir, true, false, 0);
        }
    }

    tick.late_pass = true;
    let late = std::mem::take(&mut tick.late);
    for id in late {
        if !tick.blacklisted(id) {
            try_move(session, &mut tick, id, dir, true, false, 0);
        }
    }

    for id in std::mem::take(&mut tick.destroy) {
        if let Some(tile) = session.layers.remove(Layer::Objects, id) {
            tick.events.push(GameEvent::TileDestroyed {
                kind: tile.kind,
                position: tile.position,
            });
        }
    }

    let mut events = std::mem::take(&mut tick.events);
    if tick.moved {
        session.moves += 1;
        events.push(GameEvent::MoveCommitted { moves: session.moves });
        events.extend(win::check(session));
    } else {
        // nothing happened; the pre-tick snapshot must not linger
        session.history.discard_newest();
    }
    events
}

/// Attempt to slide one object tile one cell. Returns whether the tile
/// ended up relocated.
fn try_move(
    session: &mut GameSession,
    tick: &mut TickState,
    id: u32,
    dir: MoveDir,
    add_to_blacklist: bool,
    is_pushed: bool,
    depth: u32,
) -> bool {
    if depth > MAX_PUSH_DEPTH {
        return false;
    }
    if session.stop_all {
        return false;
    }
    let (dx, dy) = dir.delta();
    let Some(tile) = session.layers.by_id(Layer::Objects, id) else {
        return false;
    };
    let kind = tile.kind;
    let from = tile.position;
    let pushable = tile.directions.pushable;
    let allowed = tile.allows(dx, dy);

    if is_pushed && !pushable {
        return false;
    }
    if !is_pushed && tick.blacklisted(id) {
        return false;
    }

    let to = from.step(dir);

    let mover_margin = kind.is_room_mover() && !is_pushed;
    if !session.check_bounds(to, mover_margin) {
        return false;
    }

    if !is_pushed && !allowed {
        // a forbidden direction still spends the tile's turn, so a
        // later push cannot revive it this tick
        tick.blacklist(id);
        return false;
    }

    if session.layers.get_in(Layer::Solids, to).is_some() {
        return false;
    }

    if let Some(block) = session.layers.get_in(Layer::Objects, to) {
        let block_id = block.id;
        if kind == TileKind::Hexagon && !is_pushed && !tick.late_pass && !tick.blacklisted(block_id)
        {
            // the blocker has not resolved yet; wait for it
            tick.late.push(id);
            return false;
        }
        if !try_move(session, tick, block_id, dir, true, true, depth + 1) {
            return false;
        }
        tick.events.push(GameEvent::TilePushed { from: to, to: to.step(dir) });
    }

    // a push chain may have circled back and resolved this tile
    if !is_pushed && tick.blacklisted(id) {
        return false;
    }

    session.layers.relocate(Layer::Objects, id, to);
    if add_to_blacklist {
        tick.blacklist(id);
    }
    tick.moved = true;

    if session.freeroam() {
        scroll_room(session, tick, to);
    }

    if let Some(hazard) = session.layers.get_in(Layer::Hazards, to) {
        let hazard_id = hazard.id;
        let one_shot = hazard.kind.is_one_shot_hazard();
        tick.destroy.push(id);
        if one_shot {
            session.layers.remove(Layer::Hazards, hazard_id);
        }
    }

    apply_effects(session, tick, id, to);
    touch_customs(session, tick, to);

    true
}

/// Shift the visible room window when a moved tile crosses its bound.
fn scroll_room(session: &mut GameSession, tick: &mut TickState, pos: Position) {
    let (ox, oy) = session.world_offset;
    let mut shifted = (ox, oy);
    if pos.x > BOUNDS_X + ox {
        shifted.0 += ROOM_STEP_X;
    } else if pos.x < ox {
        shifted.0 -= ROOM_STEP_X;
    }
    if pos.y > oy {
        shifted.1 += ROOM_STEP_Y;
    } else if pos.y < BOUNDS_Y + oy {
        shifted.1 -= ROOM_STEP_Y;
    }
    if shifted != session.world_offset {
        session.world_offset = shifted;
        tick.events.push(GameEvent::RoomScrolled { offset: shifted });
    }
}

/// Resolve the effects layer at the mover's landing cell.
fn apply_effects(session: &mut GameSession, tick: &mut TickState, mover_id: u32, pos: Position) {
    let Some(effect) = session.layers.get_in(Layer::Effects, pos) else {
        return;
    };
    let effect_id = effect.id;
    let effect_kind = effect.kind;
    let effect_dirs = effect.directions;

    let Some(mover) = session.layers.by_id_mut(Layer::Objects, mover_id) else {
        return;
    };

    match effect_kind {
        TileKind::Invert => {
            mover.directions.invert();
            tick.events.push(GameEvent::DirectionsInverted { position: pos });
        }
        TileKind::Arrow | TileKind::NegativeArrow => {
            // an inert mover cannot be steered
            if mover.directions.active_count() == 0 {
                return;
            }
            let value = effect_kind == TileKind::Arrow;
            if effect_dirs.up {
                mover.directions.up = value;
            }
            if effect_dirs.down {
                mover.directions.down = value;
            }
            if effect_dirs.left {
                mover.directions.left = value;
            }
            if effect_dirs.right {
                mover.directions.right = value;
            }
            tick.events.push(GameEvent::ArrowApplied { position: pos });
        }
        TileKind::Orb | TileKind::Fragment => {
            if mover.directions.active_count() == 0 {
                return;
            }
            if session.current_level_id == EDITOR_SESSION_ID {
                return;
            }
            session.layers.remove(Layer::Effects, effect_id);
            tick.events.push(match effect_kind {
                TileKind::Orb => GameEvent::OrbCollected { position: pos },
                _ => GameEvent::FragmentCollected { position: pos },
            });
        }
        _ => {}
    }
}

/// Resolve the customs layer at the mover's landing cell.
fn touch_customs(session: &mut GameSession, tick: &mut TickState, pos: Position) {
    let Some(custom) = session.layers.get_in(Layer::Customs, pos) else {
        return;
    };
    match custom.kind {
        TileKind::Level => {
            let level_id = custom.custom_text.clone().unwrap_or_default();
            if !level_id.is_empty() {
                // halt the rest of the tick; the front-end will rebuild
                session.stop_movements();
                tick.events.push(GameEvent::LevelTileTouched { level_id });
            }
        }
        TileKind::Npc => {
            let text = custom.custom_text.clone().unwrap_or_default();
            tick.events.push(GameEvent::NpcTouched { text });
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::{Directions, Tile};
    use crate::sim::level::LevelDocument;

    /// Fresh session with a loaded (empty) document so gravity runs.
    fn session(freeroam: bool, hide_ui: bool) -> GameSession {
        let mut s = GameSession::new();
        let mut doc = LevelDocument::default();
        doc.freeroam = freeroam;
        doc.hide_ui = hide_ui;
        s.current_level = Some(doc);
        s.current_level_id = "test".to_string();
        s
    }

    fn put(s: &mut GameSession, kind: TileKind, x: i32, y: i32) -> u32 {
        s.layers
            .place(Tile::new(kind, Directions::all(), Position::new(x, y)))
    }

    fn put_dirs(s: &mut GameSession, kind: TileKind, x: i32, y: i32, d: Directions) -> u32 {
        s.layers.place(Tile::new(kind, d, Position::new(x, y)))
    }

    fn pos_of(s: &GameSession, id: u32) -> Position {
        s.layers.by_id(Layer::Objects, id).unwrap().position
    }

    #[test]
    fn free_tile_slides_one_cell() {
        let mut s = session(false, false);
        let id = put(&mut s, TileKind::Box, 5, 0);
        let events = apply_gravity(&mut s, MoveDir::Down);
        assert_eq!(pos_of(&s, id), Position::new(5, -1));
        assert_eq!(s.moves, 1);
        assert_eq!(s.history.len(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::MoveCommitted { moves: 1 })));
    }

    #[test]
    fn all_false_directions_never_move() {
        let mut s = session(false, false);
        let id = put_dirs(&mut s, TileKind::Box, 5, 0, Directions::new(false, false, false, false, true));
        for dir in [MoveDir::Up, MoveDir::Down, MoveDir::Left, MoveDir::Right] {
            apply_gravity(&mut s, dir);
        }
        assert_eq!(pos_of(&s, id), Position::new(5, 0));
        assert_eq!(s.moves, 0);
        assert!(s.history.is_empty());
    }

    #[test]
    fn push_chain_moves_both() {
        let mut s = session(false, false);
        let a = put(&mut s, TileKind::Box, 3, 0);
        let b = put_dirs(&mut s, TileKind::Box, 4, 0, Directions::new(false, false, false, false, true));
        let events = apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, a), Position::new(4, 0));
        assert_eq!(pos_of(&s, b), Position::new(5, 0));
        assert!(events.iter().any(|e| matches!(e, GameEvent::TilePushed { .. })));
        // one committed move, not two
        assert_eq!(s.moves, 1);
    }

    #[test]
    fn push_blocked_by_wall_is_transitive() {
        let mut s = session(false, false);
        let a = put(&mut s, TileKind::Box, 3, 0);
        let b = put(&mut s, TileKind::Box, 4, 0);
        put(&mut s, TileKind::Wall, 5, 0);
        apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, a), Position::new(3, 0));
        assert_eq!(pos_of(&s, b), Position::new(4, 0));
        assert_eq!(s.moves, 0);
        assert!(s.history.is_empty());
    }

    #[test]
    fn unpushable_blocker_stops_the_chain() {
        let mut s = session(false, false);
        let a = put(&mut s, TileKind::Box, 3, 0);
        put_dirs(&mut s, TileKind::Box, 4, 0, Directions::new(true, true, true, true, false));
        apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, a), Position::new(3, 0));
    }

    #[test]
    fn failed_tick_counts_nothing() {
        let mut s = session(false, false);
        let id = put(&mut s, TileKind::Box, 0, 0);
        apply_gravity(&mut s, MoveDir::Left); // already at the wall
        assert_eq!(pos_of(&s, id), Position::new(0, 0));
        assert_eq!(s.moves, 0);
        assert!(s.history.is_empty());
    }

    #[test]
    fn repeating_into_a_wall_only_counts_real_moves() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 1, 0);
        apply_gravity(&mut s, MoveDir::Left); // 1 -> 0, counts
        apply_gravity(&mut s, MoveDir::Left); // blocked, free
        assert_eq!(s.moves, 1);
        assert_eq!(s.history.len(), 1);
    }

    #[test]
    fn undo_roundtrip_is_exact() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 3, 0);
        put(&mut s, TileKind::Wall, 7, -3);
        put(&mut s, TileKind::Area, 1, -7);
        let before = s.layers.clone();
        apply_gravity(&mut s, MoveDir::Down);
        assert_ne!(s.layers, before);
        s.undo();
        assert_eq!(s.layers, before);
        assert_eq!(s.moves, 0);
    }

    #[test]
    fn box_rejected_at_bounds_hexagon_scrolls_in_freeroam() {
        let mut s = session(true, false);
        let boxed = put(&mut s, TileKind::Box, 13, 0);
        apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, boxed), Position::new(13, 0));

        let mut s = session(true, false);
        let hex = put(&mut s, TileKind::Hexagon, 13, 0);
        let events = apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, hex), Position::new(14, 0));
        assert_eq!(s.world_offset, (14, 0));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::RoomScrolled { offset: (14, 0) })));
    }

    #[test]
    fn hexagon_stays_inside_bounded_levels() {
        let mut s = session(false, false);
        let hex = put(&mut s, TileKind::Hexagon, 13, 0);
        apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, hex), Position::new(13, 0));
    }

    #[test]
    fn hexagon_waits_for_unresolved_blocker() {
        let mut s = session(false, false);
        let a = put(&mut s, TileKind::Hexagon, 0, 0);
        let b = put(&mut s, TileKind::Hexagon, 1, 0);
        let events = apply_gravity(&mut s, MoveDir::Right);
        // b clears first, then a takes its old cell via the late pass
        assert_eq!(pos_of(&s, a), Position::new(1, 0));
        assert_eq!(pos_of(&s, b), Position::new(2, 0));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::TilePushed { .. })));
    }

    #[test]
    fn hazard_destroys_mover_after_pass() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 5, 0);
        put(&mut s, TileKind::Hazard, 5, -1);
        let events = apply_gravity(&mut s, MoveDir::Down);
        assert_eq!(s.layers.count(Layer::Objects), 0);
        assert_eq!(s.layers.count(Layer::Hazards), 1); // plain hazard persists
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::TileDestroyed { kind: TileKind::Box, .. }
        )));
    }

    #[test]
    fn void_consumes_itself_with_the_mover() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 5, 0);
        put(&mut s, TileKind::Void, 5, -1);
        apply_gravity(&mut s, MoveDir::Down);
        assert_eq!(s.layers.count(Layer::Objects), 0);
        assert_eq!(s.layers.count(Layer::Hazards), 0);
    }

    #[test]
    fn invert_toggles_mover_directions() {
        let mut s = session(false, false);
        let id = put_dirs(&mut s, TileKind::Box, 5, 0, Directions::new(true, true, false, false, true));
        put(&mut s, TileKind::Invert, 5, -1);
        apply_gravity(&mut s, MoveDir::Down);
        let d = s.layers.by_id(Layer::Objects, id).unwrap().directions;
        assert!(!d.up && !d.down && d.left && d.right);
    }

    #[test]
    fn arrow_steers_and_negative_arrow_clears() {
        let mut s = session(false, false);
        let id = put_dirs(&mut s, TileKind::Box, 5, 0, Directions::new(false, true, false, false, true));
        put_dirs(&mut s, TileKind::Arrow, 5, -1, Directions::new(false, false, true, true, true));
        apply_gravity(&mut s, MoveDir::Down);
        let d = s.layers.by_id(Layer::Objects, id).unwrap().directions;
        assert!(d.left && d.right && d.down && !d.up);

        let mut s = session(false, false);
        let id = put(&mut s, TileKind::Box, 5, 0);
        put_dirs(&mut s, TileKind::NegativeArrow, 5, -1, Directions::new(true, false, false, false, true));
        apply_gravity(&mut s, MoveDir::Down);
        let d = s.layers.by_id(Layer::Objects, id).unwrap().directions;
        assert!(!d.up && d.down && d.left && d.right);
    }

    #[test]
    fn arrow_ignores_inert_movers() {
        let mut s = session(false, false);
        // pushed into the arrow by a live box above it
        let inert = put_dirs(&mut s, TileKind::Box, 5, -1, Directions::new(false, false, false, false, true));
        put(&mut s, TileKind::Box, 5, 0);
        put_dirs(&mut s, TileKind::Arrow, 5, -2, Directions::all());
        apply_gravity(&mut s, MoveDir::Down);
        let d = s.layers.by_id(Layer::Objects, inert).unwrap().directions;
        assert_eq!(d.active_count(), 0);
    }

    #[test]
    fn orb_collected_once() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 5, 0);
        put(&mut s, TileKind::Orb, 5, -1);
        let events = apply_gravity(&mut s, MoveDir::Down);
        assert_eq!(s.layers.count(Layer::Effects), 0);
        assert!(events.iter().any(|e| matches!(e, GameEvent::OrbCollected { .. })));
    }

    #[test]
    fn orb_untouched_in_editor_session() {
        let mut s = session(false, false);
        s.current_level_id = EDITOR_SESSION_ID.to_string();
        put(&mut s, TileKind::Box, 5, 0);
        put(&mut s, TileKind::Orb, 5, -1);
        apply_gravity(&mut s, MoveDir::Down);
        assert_eq!(s.layers.count(Layer::Effects), 1);
    }

    #[test]
    fn level_tile_raises_event_and_halts() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 5, 0);
        let id = put(&mut s, TileKind::Level, 5, -1);
        s.layers
            .by_id_mut(Layer::Customs, id)
            .unwrap()
            .custom_text = Some("intro-push".to_string());
        let events = apply_gravity(&mut s, MoveDir::Down);
        assert!(events.iter().any(
            |e| matches!(e, GameEvent::LevelTileTouched { level_id } if level_id == "intro-push")
        ));
        assert!(s.stop_all);
    }

    #[test]
    fn halted_tick_does_not_lock_the_session() {
        let mut s = session(false, false);
        let mover = put(&mut s, TileKind::Box, 5, 0);
        let portal = put(&mut s, TileKind::Level, 5, -1);
        s.layers
            .by_id_mut(Layer::Customs, portal)
            .unwrap()
            .custom_text = Some("no-such-level".to_string());
        apply_gravity(&mut s, MoveDir::Down);
        assert!(s.stop_all);

        // the front-end's follow-up load may fail; movement must still
        // resume on the next tick
        let events = apply_gravity(&mut s, MoveDir::Down);
        assert_eq!(pos_of(&s, mover), Position::new(5, -2));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::MoveCommitted { .. })));
    }

    #[test]
    fn push_depth_guard_fails_very_long_chains() {
        let mut s = session(true, true); // unbounded so only depth stops it
        let first = put(&mut s, TileKind::Box, 0, 0);
        for x in 1..40 {
            put(&mut s, TileKind::Box, x, 0);
        }
        apply_gravity(&mut s, MoveDir::Right);
        assert_eq!(pos_of(&s, first), Position::new(0, 0));
    }

    #[test]
    fn win_checked_after_settled_tick() {
        let mut s = session(false, false);
        put(&mut s, TileKind::Box, 5, 0);
        put(&mut s, TileKind::Area, 5, -7);
        let mut last = Vec::new();
        for _ in 0..7 {
            last = apply_gravity(&mut s, MoveDir::Down);
        }
        assert!(last.iter().any(|e| matches!(e, GameEvent::WinDetected { .. })));
        assert!(s.has_won);
        // further gravity is refused
        assert!(apply_gravity(&mut s, MoveDir::Up).is_empty());
    }
}
