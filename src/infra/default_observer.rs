use tracing::{info, trace};

use crate::agent::{FrameView, RunStats};

use super::game_observer::GameObserver;
use super::types::Rect;

pub struct DefaultObserver;

impl GameObserver for DefaultObserver {
    fn on_match_start(&mut self, player_max_stock: u32, opponent_max_stock: u32, camera: Rect) {
        info!("Match started");
        info!("- stock: {} vs {}", player_max_stock, opponent_max_stock);
        info!("- camera: {}x{}", camera.width(), camera.height());
    }

    fn on_frame(&mut self, frame: &FrameView) {
        trace!(
            "frame {}: stock {:.2}/{:.2}, damage {:.2}/{:.2}",
            frame.frame,
            frame.player.stock_fraction(),
            frame.opponent.stock_fraction(),
            frame.player.damage(),
            frame.opponent.damage()
        );
    }

    fn on_paused(&mut self) {
        info!("Paused, keys released");
    }

    fn on_resumed(&mut self) {
        info!("Resumed");
    }

    fn on_match_end(&mut self) {
        info!("Not in game");
    }

    fn on_run_finished(&mut self, stats: &RunStats) {
        info!("Game closed");
        info!("- matches: {}", stats.matches);
        info!("- frames processed: {}", stats.frames_processed);
        info!("- frames skipped: {}", stats.frames_skipped);
        info!("- pauses: {}", stats.pauses);
    }
}
