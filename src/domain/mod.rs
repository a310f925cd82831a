pub mod grid;
pub mod tile;
