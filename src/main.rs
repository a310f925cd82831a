/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::grid::MoveDir;
use domain::tile::Layer;
use sim::engine;
use sim::event::GameEvent;
use sim::level;
use sim::session::GameSession;
use sim::win::WinKind;
use ui::input::InputState;
use ui::renderer::Renderer;

const MESSAGE_SECS: u64 = 3;

fn main() {
    let config = GameConfig::load();

    let mut session = GameSession::new();
    if let Err(e) = level::load_level(&mut session, &config.start_level, false, &config) {
        eprintln!(
            "could not load starting level: {} (built-in levels: {})",
            e,
            level::builtin_level_ids().join(", ")
        );
        std::process::exit(1);
    }

    let mut renderer = Renderer::new();
    if renderer.init().is_err() {
        eprintln!("failed to initialize terminal");
        std::process::exit(1);
    }

    let mut input = InputState::new();
    let mut last_tick = Instant::now() - Duration::from_millis(config.movement_cooldown_ms);
    let mut last_frame = Instant::now();
    let mut message = String::new();
    let mut message_until = Instant::now();
    // where a win sends us: Some(id) once a predicate fires
    let mut pending_level: Option<String> = None;

    loop {
        input.drain_events();
        if input.ctrl_c_pressed() || input.was_pressed(KeyCode::Esc) {
            break;
        }

        let dt = last_frame.elapsed().as_secs_f32();
        last_frame = Instant::now();
        session.advance_timer(dt);

        let mut events: Vec<GameEvent> = Vec::new();

        if input.was_pressed(KeyCode::Char('p')) {
            session.pause_resume();
        }

        // undo and restart are level-bound actions; freeroam worlds
        // have neither
        if !session.freeroam() {
            if input.was_pressed(KeyCode::Char('z'))
                && !session.has_won
                && !session.history.is_empty()
            {
                events.extend(session.undo());
            }
            if input.was_pressed(KeyCode::Char('r')) {
                events.extend(level::reload_level(&mut session));
            }
        }

        if session.has_won && input.was_pressed(KeyCode::Enter) {
            if let Some(id) = pending_level.take() {
                events.extend(load_any(&mut session, &id, &config, &mut message));
            }
        }

        // cooldown-gated movement; the held/allowed condition is
        // re-evaluated every frame so a win or pause cancels a
        // repeat immediately
        let wants_move = if config.repeat_input {
            held_direction(&input)
        } else {
            pressed_direction(&input)
        };
        if let Some(dir) = wants_move {
            let cooled = last_tick.elapsed() >= Duration::from_millis(config.movement_cooldown_ms);
            if cooled && session.is_play_allowed() {
                events.extend(engine::apply_gravity(&mut session, dir));
                last_tick = Instant::now();
            }
        }

        for event in &events {
            match event {
                GameEvent::TileDestroyed { .. } => {
                    if session.layers.count(Layer::Objects) == 0 {
                        message = "all pieces lost - r to restart".to_string();
                        message_until = Instant::now() + Duration::from_secs(60);
                    }
                }
                GameEvent::NpcTouched { text } => {
                    message = text.clone();
                    message_until = Instant::now() + Duration::from_secs(MESSAGE_SECS);
                }
                GameEvent::LevelTileTouched { level_id } => {
                    let id = level_id.clone();
                    load_any(&mut session, &id, &config, &mut message);
                    if !message.is_empty() {
                        message_until = Instant::now() + Duration::from_secs(MESSAGE_SECS);
                    }
                }
                GameEvent::WinDetected { kind, .. } => {
                    // a failed flush loses nothing in-session
                    let _ = session.progress.save();
                    let doc = session.current_level.as_ref();
                    let target = match kind {
                        WinKind::Remix => doc.map(|l| l.remix_level.clone()),
                        _ => doc.map(|l| l.next_level.clone()),
                    };
                    pending_level = target.filter(|t| !t.is_empty());
                    let best = session
                        .progress
                        .record(&session.current_level_id)
                        .map(|r| format!("  best {:.1}s / {} moves", r.best_time, r.best_moves))
                        .unwrap_or_default();
                    message = if pending_level.is_some() {
                        format!("level complete{} - enter to continue", best)
                    } else {
                        format!("level complete{}", best)
                    };
                    message_until = Instant::now() + Duration::from_secs(60);
                }
                _ => {}
            }
        }

        if Instant::now() > message_until {
            message.clear();
        }

        if renderer.render(&session, &message).is_err() {
            break;
        }

        std::thread::sleep(Duration::from_millis(config.frame_sleep_ms));
    }

    let _ = renderer.cleanup();
}

/// Resolve a level id against the built-in store first, then the
/// user's custom store. A miss surfaces a transient message instead of
/// tearing the session down.
fn load_any(
    session: &mut GameSession,
    id: &str,
    config: &GameConfig,
    message: &mut String,
) -> Vec<GameEvent> {
    match level::load_level(session, id, false, config)
        .or_else(|_| level::load_level(session, id, true, config))
    {
        Ok(events) => events,
        Err(e) => {
            *message = e.to_string();
            Vec::new()
        }
    }
}

fn held_direction(input: &InputState) -> Option<MoveDir> {
    direction_by(|codes| input.any_held(codes))
}

fn pressed_direction(input: &InputState) -> Option<MoveDir> {
    direction_by(|codes| input.any_pressed(codes))
}

fn direction_by(active: impl Fn(&[KeyCode]) -> bool) -> Option<MoveDir> {
    if active(&[KeyCode::Up, KeyCode::Char('w')]) {
        Some(MoveDir::Up)
    } else if active(&[KeyCode::Down, KeyCode::Char('s')]) {
        Some(MoveDir::Down)
    } else if active(&[KeyCode::Left, KeyCode::Char('a')]) {
        Some(MoveDir::Left)
    } else if active(&[KeyCode::Right, KeyCode::Char('d')]) {
        Some(MoveDir::Right)
    } else {
        None
    }
}
