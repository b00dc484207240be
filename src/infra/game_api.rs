use crate::agent::ActionState;
use crate::state::{CharacterState, Platform, TerrainPiece};

use super::error::TransientStateError;
use super::types::Rect;

/// Live view of the match, refreshed once per frame by `update`.
pub trait SnapshotProvider {
    /// The game process is still running
    fn is_active(&self) -> bool;

    /// A match is in progress
    fn in_game(&self) -> bool;

    /// Refresh the cached state
    fn update(&mut self) -> Result<(), TransientStateError>;

    fn player(&self) -> &CharacterState;

    fn opponent(&self) -> &CharacterState;

    fn terrain(&self) -> &[TerrainPiece];

    fn platforms(&self) -> &[Platform];

    fn cambounds(&self) -> Rect;

    fn deathbounds(&self) -> Rect;
}

/// Presses simulated keys in the game
pub trait KeyInjector {
    fn apply_key_state(&mut self, keys: &ActionState);

    /// Release every key
    fn reset_key_state(&mut self);
}

/// Edge-triggered pause key
pub trait PauseTrigger {
    /// True if the key was pressed since the last call. Never blocks.
    fn pressed_once(&mut self) -> bool;
}
