/// Grid coordinates, level bounds, and the six-layer sparse tile store.
///
/// Coordinates are signed: the default play field spans x in [0, 13]
/// and y in [-7, 0] (y grows upward toward 0). Freeroam levels shift a
/// room-sized window across a larger world via a persistent offset.
///
/// "No position" is always `Option<Position>` — never a sentinel value.

use super::tile::{Layer, Tile};

/// Inclusive upper bound of x for the default room.
pub const BOUNDS_X: i32 = 13;
/// Inclusive lower bound of y for the default room.
pub const BOUNDS_Y: i32 = -7;
/// Horizontal room-scroll step (one full room width).
pub const ROOM_STEP_X: i32 = 14;
/// Vertical room-scroll step (one full room height).
pub const ROOM_STEP_Y: i32 = 8;
/// How far a room mover may poke outside the room in freeroam levels.
pub const FREEROAM_MARGIN: i32 = 2;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    pub fn shifted(self, dx: i32, dy: i32) -> Self {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn step(self, dir: MoveDir) -> Self {
        let (dx, dy) = dir.delta();
        self.shifted(dx, dy)
    }
}

/// One gravity direction per tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up => (0, 1),
            MoveDir::Down => (0, -1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }
}

/// The grid store: one ordered tile list per layer, plus the id
/// counter that stamps every placed tile with a stable identity.
///
/// Invariant: at most one tile per coordinate within a layer;
/// different layers may overlap freely.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct LayerSet {
    solids: Vec<Tile>,
    objects: Vec<Tile>,
    win_areas: Vec<Tile>,
    hazards: Vec<Tile>,
    effects: Vec<Tile>,
    customs: Vec<Tile>,
    next_id: u32,
}

impl LayerSet {
    pub fn new() -> Self {
        LayerSet::default()
    }

    pub fn layer(&self, layer: Layer) -> &[Tile] {
        match layer {
            Layer::Solids => &self.solids,
            Layer::Objects => &self.objects,
            Layer::WinAreas => &self.win_areas,
            Layer::Hazards => &self.hazards,
            Layer::Effects => &self.effects,
            Layer::Customs => &self.customs,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut Vec<Tile> {
        match layer {
            Layer::Solids => &mut self.solids,
            Layer::Objects => &mut self.objects,
            Layer::WinAreas => &mut self.win_areas,
            Layer::Hazards => &mut self.hazards,
            Layer::Effects => &mut self.effects,
            Layer::Customs => &mut self.customs,
        }
    }

    /// Insert a tile into the layer its kind classifies into, assigning
    /// an id if the tile has none. A coordinate already occupied within
    /// that layer is not re-added (returns the existing id).
    pub fn place(&mut self, mut tile: Tile) -> u32 {
        let layer = tile.kind.layer();
        if let Some(existing) = self.get_in(layer, tile.position) {
            return existing.id;
        }
        if tile.id == 0 {
            self.next_id += 1;
            tile.id = self.next_id;
        } else if tile.id > self.next_id {
            // keep the counter ahead of restored snapshot ids
            self.next_id = tile.id;
        }
        let id = tile.id;
        self.layer_mut(layer).push(tile);
        id
    }

    /// Remove a tile (by id) from its classified layer.
    pub fn remove(&mut self, layer: Layer, id: u32) -> Option<Tile> {
        let list = self.layer_mut(layer);
        let idx = list.iter().position(|t| t.id == id)?;
        Some(list.remove(idx))
    }

    /// First tile at `pos` in the declared layer search order.
    pub fn get(&self, pos: Position) -> Option<&Tile> {
        Layer::SEARCH_ORDER
            .iter()
            .find_map(|layer| self.get_in(*layer, pos))
    }

    /// Tile at `pos` within one layer.
    pub fn get_in(&self, layer: Layer, pos: Position) -> Option<&Tile> {
        self.layer(layer).iter().find(|t| t.position == pos)
    }

    pub fn get_in_mut(&mut self, layer: Layer, pos: Position) -> Option<&mut Tile> {
        self.layer_mut(layer).iter_mut().find(|t| t.position == pos)
    }

    pub fn by_id(&self, layer: Layer, id: u32) -> Option<&Tile> {
        self.layer(layer).iter().find(|t| t.id == id)
    }

    pub fn by_id_mut(&mut self, layer: Layer, id: u32) -> Option<&mut Tile> {
        self.layer_mut(layer).iter_mut().find(|t| t.id == id)
    }

    /// Relocate an object-layer tile, keeping its stored position in sync.
    pub fn relocate(&mut self, layer: Layer, id: u32, to: Position) {
        if let Some(tile) = self.by_id_mut(layer, id) {
            tile.position = to;
        }
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.layer(layer).len()
    }

    /// Empty every layer list (level teardown / rebuild).
    pub fn clear(&mut self) {
        self.solids.clear();
        self.objects.clear();
        self.win_areas.clear();
        self.hazards.clear();
        self.effects.clear();
        self.customs.clear();
    }
}

/// Is `pos` inside the current room window?
///
/// Freeroam levels that also hide the UI have no bounds at all; room
/// movers (Hexagon/Mimic) get a margin when moving under their own
/// power in freeroam levels.
pub fn check_bounds(
    pos: Position,
    offset: (i32, i32),
    freeroam: bool,
    hide_ui: bool,
    mover_margin: bool,
) -> bool {
    if freeroam && hide_ui {
        return true;
    }
    let margin = if freeroam && mover_margin { FREEROAM_MARGIN } else { 0 };
    !(pos.x < offset.0 - margin
        || pos.x > BOUNDS_X + offset.0 + margin
        || pos.y > offset.1 + margin
        || pos.y < BOUNDS_Y + offset.1 - margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::{Directions, TileKind};

    fn tile(kind: TileKind, x: i32, y: i32) -> Tile {
        Tile::new(kind, Directions::all(), Position::new(x, y))
    }

    #[test]
    fn place_classifies_by_kind() {
        let mut layers = LayerSet::new();
        layers.place(tile(TileKind::Wall, 0, 0));
        layers.place(tile(TileKind::Box, 1, 0));
        layers.place(tile(TileKind::Area, 1, 0));
        assert_eq!(layers.count(Layer::Solids), 1);
        assert_eq!(layers.count(Layer::Objects), 1);
        assert_eq!(layers.count(Layer::WinAreas), 1);
    }

    #[test]
    fn place_deduplicates_within_layer() {
        let mut layers = LayerSet::new();
        let a = layers.place(tile(TileKind::Box, 2, 0));
        let b = layers.place(tile(TileKind::Box, 2, 0));
        assert_eq!(a, b);
        assert_eq!(layers.count(Layer::Objects), 1);
    }

    #[test]
    fn layers_overlap_at_one_coordinate() {
        let mut layers = LayerSet::new();
        layers.place(tile(TileKind::Box, 3, -2));
        layers.place(tile(TileKind::Area, 3, -2));
        let pos = Position::new(3, -2);
        // objects take precedence in the search order
        assert_eq!(layers.get(pos).unwrap().kind, TileKind::Box);
        assert_eq!(
            layers.get_in(Layer::WinAreas, pos).unwrap().kind,
            TileKind::Area
        );
    }

    #[test]
    fn search_order_objects_before_solids() {
        let mut layers = LayerSet::new();
        layers.place(tile(TileKind::Wall, 5, 0));
        layers.place(tile(TileKind::Circle, 5, 0));
        assert_eq!(layers.get(Position::new(5, 0)).unwrap().kind, TileKind::Circle);
    }

    #[test]
    fn remove_only_touches_classified_layer() {
        let mut layers = LayerSet::new();
        let id = layers.place(tile(TileKind::Hazard, 4, -1));
        layers.place(tile(TileKind::Box, 4, -1));
        layers.remove(Layer::Hazards, id);
        assert_eq!(layers.count(Layer::Hazards), 0);
        assert_eq!(layers.count(Layer::Objects), 1);
    }

    #[test]
    fn ids_stay_unique_after_clone_restore() {
        let mut layers = LayerSet::new();
        layers.place(tile(TileKind::Box, 0, 0));
        let snapshot = layers.clone();
        layers.place(tile(TileKind::Box, 1, 0));

        let mut restored = snapshot;
        let new_id = restored.place(tile(TileKind::Box, 2, 0));
        assert_eq!(new_id, 2);
    }

    #[test]
    fn default_bounds_reject_outside() {
        let offset = (0, 0);
        assert!(check_bounds(Position::new(0, 0), offset, false, false, false));
        assert!(check_bounds(Position::new(13, -7), offset, false, false, false));
        assert!(!check_bounds(Position::new(14, 0), offset, false, false, false));
        assert!(!check_bounds(Position::new(0, 1), offset, false, false, false));
        assert!(!check_bounds(Position::new(-1, 0), offset, false, false, false));
        assert!(!check_bounds(Position::new(0, -8), offset, false, false, false));
    }

    #[test]
    fn freeroam_margin_for_room_movers() {
        let offset = (0, 0);
        // plain tile: rejected just outside
        assert!(!check_bounds(Position::new(14, 0), offset, true, false, false));
        // room mover in freeroam: 2-cell margin
        assert!(check_bounds(Position::new(14, 0), offset, true, false, true));
        assert!(check_bounds(Position::new(15, 0), offset, true, false, true));
        assert!(!check_bounds(Position::new(16, 0), offset, true, false, true));
        // no margin outside freeroam
        assert!(!check_bounds(Position::new(14, 0), offset, false, false, true));
    }

    #[test]
    fn bounds_follow_world_offset() {
        let offset = (14, -8);
        assert!(check_bounds(Position::new(14, -8), offset, false, false, false));
        assert!(check_bounds(Position::new(27, -15), offset, false, false, false));
        assert!(!check_bounds(Position::new(13, -8), offset, false, false, false));
    }

    #[test]
    fn freeroam_hidden_ui_is_unbounded() {
        assert!(check_bounds(Position::new(999, -999), (0, 0), true, true, false));
    }
}
