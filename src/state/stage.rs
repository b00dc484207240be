use serde::{Deserialize, Serialize};

use crate::infra::{Rect, Vec2};

use super::character::CharacterState;

/// Solid stage geometry (the main stage body, walls).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TerrainPiece {
    pub pos: Vec2,
    pub dim: Vec2,
}

impl TerrainPiece {
    pub fn rect(&self) -> Rect {
        Rect::from_pos_dim(self.pos, self.dim)
    }
}

/// Pass-through platform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Platform {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Platform {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }
}

/// One frame of match state, as read from the game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// The game process is still alive.
    pub active: bool,
    /// A match is currently being played.
    pub in_game: bool,
    #[serde(default)]
    pub player: CharacterState,
    #[serde(default)]
    pub opponent: CharacterState,
    #[serde(default)]
    pub terrain: Vec<TerrainPiece>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub cambounds: Rect,
    #[serde(default)]
    pub deathbounds: Rect,
}
