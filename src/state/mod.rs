mod character;
mod stage;

pub use character::{Attack, CharacterState, StatusFlags};
pub use stage::{Platform, Snapshot, TerrainPiece};
