/// Tile kinds, per-kind movement capability, and the static
/// kind-to-layer classification table.
///
/// Behavior is dispatched on `TileKind` by the movement resolver
/// (`sim::engine`); this module only declares WHAT each kind is,
/// never HOW it moves.

use serde::{Deserialize, Serialize};

use super::grid::Position;

/// Every tile variant the engine knows about.
///
/// Unknown kind strings in a level document fall back to `Box`
/// (forward compatibility across format revisions).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileKind {
    // Solids
    Wall,
    AntiWall,
    // Objects (the movable pieces)
    Box,
    Circle,
    Hexagon,
    Mimic,
    // Win areas
    Area,
    InverseArea,
    OutboundArea,
    // Hazards
    Hazard,
    Void,
    // Effects
    Invert,
    Arrow,
    NegativeArrow,
    Orb,
    Fragment,
    // Customs (interactive / decorative)
    Level,
    Hologram,
    Npc,
    Fake,
}

/// The six parallel grid layers. A tile's layer is derived from its
/// kind and never changes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layer {
    Solids,
    Objects,
    WinAreas,
    Hazards,
    Effects,
    Customs,
}

impl Layer {
    /// Point-query precedence: objects first, customs last.
    /// Editor tooling and collision checks rely on this order.
    pub const SEARCH_ORDER: [Layer; 6] = [
        Layer::Objects,
        Layer::Solids,
        Layer::WinAreas,
        Layer::Hazards,
        Layer::Effects,
        Layer::Customs,
    ];
}

impl TileKind {
    /// Static classification table (kind → layer).
    pub fn layer(self) -> Layer {
        use TileKind::*;
        match self {
            Wall | AntiWall => Layer::Solids,
            Box | Circle | Hexagon | Mimic => Layer::Objects,
            Area | InverseArea | OutboundArea => Layer::WinAreas,
            Hazard | Void => Layer::Hazards,
            Invert | Arrow | NegativeArrow | Orb | Fragment => Layer::Effects,
            Level | Hologram | Npc | Fake => Layer::Customs,
        }
    }

    /// Hexagon and Mimic may exceed the plain level bounds (room
    /// scrolling) and are attempted after all other movers.
    pub fn is_room_mover(self) -> bool {
        matches!(self, TileKind::Hexagon | TileKind::Mimic)
    }

    /// One-shot hazards remove themselves after consuming an object.
    pub fn is_one_shot_hazard(self) -> bool {
        self == TileKind::Void
    }

    /// Parse a document kind string. Unknown kinds become `Box`.
    pub fn from_name(name: &str) -> TileKind {
        use TileKind::*;
        match name {
            "Wall" => Wall,
            "AntiWall" => AntiWall,
            "Circle" => Circle,
            "Hexagon" => Hexagon,
            "Mimic" => Mimic,
            "Area" => Area,
            "InverseArea" => InverseArea,
            "OutboundArea" => OutboundArea,
            "Hazard" => Hazard,
            "Void" => Void,
            "Invert" => Invert,
            "Arrow" => Arrow,
            "NegativeArrow" => NegativeArrow,
            "Orb" => Orb,
            "Fragment" => Fragment,
            "Level" => Level,
            "Hologram" => Hologram,
            "NPC" => Npc,
            "Fake" => Fake,
            _ => Box, // default, covers box types
        }
    }

    pub fn name(self) -> &'static str {
        use TileKind::*;
        match self {
            Wall => "Wall",
            AntiWall => "AntiWall",
            Box => "Box",
            Circle => "Circle",
            Hexagon => "Hexagon",
            Mimic => "Mimic",
            Area => "Area",
            InverseArea => "InverseArea",
            OutboundArea => "OutboundArea",
            Hazard => "Hazard",
            Void => "Void",
            Invert => "Invert",
            Arrow => "Arrow",
            NegativeArrow => "NegativeArrow",
            Orb => "Orb",
            Fragment => "Fragment",
            Level => "Level",
            Hologram => "Hologram",
            Npc => "NPC",
            Fake => "Fake",
        }
    }
}

/// Per-tile movement capability plus editor-only metadata.
///
/// The four direction flags and `pushable` are the hot-path fields;
/// the `editor_*` fields are set once by `prepare()` and consulted
/// only by editor tooling, never by the movement resolver.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Directions {
    #[serde(default = "flag_on")]
    pub up: bool,
    #[serde(default = "flag_on")]
    pub down: bool,
    #[serde(default = "flag_on")]
    pub left: bool,
    #[serde(default = "flag_on")]
    pub right: bool,
    #[serde(default = "flag_on")]
    pub pushable: bool,

    #[serde(skip)]
    pub editor_directions: bool,
    #[serde(skip)]
    pub editor_pushable: bool,
    #[serde(skip)]
    pub editor_minimum_directions: u8,
}

fn flag_on() -> bool {
    true
}

impl Directions {
    pub fn new(up: bool, down: bool, left: bool, right: bool, pushable: bool) -> Self {
        Directions {
            up,
            down,
            left,
            right,
            pushable,
            editor_directions: true,
            editor_pushable: true,
            editor_minimum_directions: 0,
        }
    }

    /// All four directions active, pushable.
    pub fn all() -> Self {
        Directions::new(true, true, true, true, true)
    }

    pub fn active_count(&self) -> u8 {
        [self.up, self.down, self.left, self.right]
            .iter()
            .filter(|f| **f)
            .count() as u8
    }

    /// Logical NOT of every direction flag (the Invert effect).
    pub fn invert(&mut self) {
        self.up = !self.up;
        self.down = !self.down;
        self.left = !self.left;
        self.right = !self.right;
    }
}

impl Default for Directions {
    fn default() -> Self {
        Directions::all()
    }
}

/// A placed tile. Identity (`id`) is assigned by the layer store on
/// placement and is stable for the lifetime of the level, which lets
/// the movement resolver track tiles across relocations within a tick.
#[derive(Clone, PartialEq, Debug)]
pub struct Tile {
    pub id: u32,
    pub kind: TileKind,
    pub directions: Directions,
    pub position: Position,
    /// Custom-layer payload (level id, dialog, sprite name).
    pub custom_text: Option<String>,
    /// Sprite resolved from `custom_text` for the presentation layer.
    pub sprite_name: Option<String>,
}

impl Tile {
    pub fn new(kind: TileKind, directions: Directions, position: Position) -> Self {
        let mut tile = Tile {
            id: 0,
            kind,
            directions,
            position,
            custom_text: None,
            sprite_name: None,
        };
        tile.prepare();
        tile
    }

    /// Declarative per-kind setup: object kinds keep their document
    /// flags freely editable; everything else locks direction editing
    /// off with a zero minimum.
    pub fn prepare(&mut self) {
        match self.kind.layer() {
            Layer::Objects => {
                self.directions.editor_directions = true;
                self.directions.editor_pushable = true;
                self.directions.editor_minimum_directions = 0;
            }
            _ => {
                self.directions.editor_directions = false;
                self.directions.editor_pushable = false;
                self.directions.editor_minimum_directions = 0;
            }
        }
    }

    /// May this tile advance along `(dx, dy)` of its own accord?
    pub fn allows(&self, dx: i32, dy: i32) -> bool {
        !(dy > 0 && !self.directions.up
            || dy < 0 && !self.directions.down
            || dx < 0 && !self.directions.left
            || dx > 0 && !self.directions.right)
    }
}
