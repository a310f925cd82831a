/// Bounded undo history.
///
/// Every committed gravity tick pushes one frame; undo pops the newest.
/// When full, the oldest frame is evicted so memory stays flat no matter
/// how long a session runs.

use std::collections::VecDeque;

use crate::domain::grid::LayerSet;
use crate::domain::tile::TileKind;

pub const UNDO_CAPACITY: usize = 100;

/// A full pre-move snapshot. Cheap enough at puzzle scale that we keep
/// deep copies rather than deltas.
#[derive(Clone, Debug)]
pub struct Frame {
    pub layers: LayerSet,
    pub room_offset: (i32, i32),
    pub active_form: TileKind,
}

#[derive(Default)]
pub struct History {
    frames: VecDeque<Frame>,
}

impl History {
    pub fn new() -> Self {
        History {
            frames: VecDeque::with_capacity(UNDO_CAPACITY),
        }
    }

    /// Record a snapshot, evicting the oldest when at capacity.
    pub fn push(&mut self, frame: Frame) {
        if self.frames.len() == UNDO_CAPACITY {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Take back the newest snapshot, if any.
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop_back()
    }

    /// Discard the newest snapshot (a tick that moved nothing).
    pub fn discard_newest(&mut self) {
        self.frames.pop_back();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
