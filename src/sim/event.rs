/// Events emitted during a simulation tick.
/// The presentation layer consumes these for feedback and status text.

use crate::domain::grid::Position;
use crate::domain::tile::TileKind;
use crate::sim::win::WinKind;

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    LevelLoaded { name: String },
    MoveCommitted { moves: i32 },
    TilePushed { from: Position, to: Position },
    TileDestroyed { kind: TileKind, position: Position },
    OrbCollected { position: Position },
    FragmentCollected { position: Position },
    DirectionsInverted { position: Position },
    ArrowApplied { position: Position },
    LevelTileTouched { level_id: String },
    NpcTouched { text: String },
    WinDetected { kind: WinKind, time: f32, moves: i32 },
    UndoPerformed,
    RoomScrolled { offset: (i32, i32) },
}
