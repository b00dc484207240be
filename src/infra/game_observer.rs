use crate::agent::{FrameView, RunStats};

use super::error::TransientStateError;
use super::types::Rect;

/// Trait for observing the control loop. Observers are read-only: nothing
/// they do feeds back into the loop.
pub trait GameObserver {
    /// Called on the first frame of a match, after max stock is captured
    fn on_match_start(&mut self, player_max_stock: u32, opponent_max_stock: u32, camera: Rect);

    /// Called after every processed frame
    fn on_frame(&mut self, frame: &FrameView);

    /// Called when a frame is skipped because the snapshot was inconsistent
    fn on_frame_skipped(&mut self, _error: &TransientStateError) {
        // Default implementation does nothing
    }

    fn on_paused(&mut self);

    fn on_resumed(&mut self);

    /// Called when the match is over; drop anything shown for it
    fn on_match_end(&mut self);

    /// Called once when the game process is gone
    fn on_run_finished(&mut self, stats: &RunStats);
}
