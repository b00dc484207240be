use std::sync::{Arc, Mutex};

use crate::agent::{FrameView, RunStats};

use super::error::{ConfigurationError, TransientStateError};
use super::game_observer::GameObserver;
use super::types::Rect;

/// What the visualizer window draws: the latest frame, or nothing between
/// matches.
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    pub frame: Option<FrameView>,
    pub paused: bool,
    pub finished: bool,
    /// Frames skipped in the current match
    pub skipped: u64,
    /// Why the control loop stopped, when it did not end with the game
    pub failure: Option<ConfigurationError>,
}

impl SharedView {
    /// Mark the run as ended by a fatal error.
    pub fn fail(&mut self, error: ConfigurationError) {
        self.frame = None;
        self.paused = false;
        self.finished = true;
        self.failure = Some(error);
    }

    pub fn outcome(&self) -> Result<(), ConfigurationError> {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

pub struct VisualizingObserver {
    shared_view: Arc<Mutex<SharedView>>,
}

impl VisualizingObserver {
    pub fn new(shared_view: Arc<Mutex<SharedView>>) -> Self {
        Self { shared_view }
    }

    fn update_shared_view(&self, update: impl FnOnce(&mut SharedView)) {
        if let Ok(mut view) = self.shared_view.lock() {
            update(&mut view);
        } else {
            tracing::warn!("Failed to lock shared view for update");
        }
    }
}

impl GameObserver for VisualizingObserver {
    fn on_match_start(&mut self, player_max_stock: u32, opponent_max_stock: u32, camera: Rect) {
        self.update_shared_view(|view| view.skipped = 0);
        tracing::info!(
            "Match started: stock={}v{}, camera={}x{}",
            player_max_stock,
            opponent_max_stock,
            camera.width(),
            camera.height()
        );
    }

    fn on_frame(&mut self, frame: &FrameView) {
        self.update_shared_view(|view| {
            view.frame = Some(frame.clone());
            view.paused = false;
        });
    }

    fn on_frame_skipped(&mut self, _error: &TransientStateError) {
        self.update_shared_view(|view| view.skipped += 1);
    }

    fn on_paused(&mut self) {
        self.update_shared_view(|view| view.paused = true);
        tracing::info!("Paused");
    }

    fn on_resumed(&mut self) {
        self.update_shared_view(|view| view.paused = false);
        tracing::info!("Resumed");
    }

    fn on_match_end(&mut self) {
        self.update_shared_view(|view| {
            view.frame = None;
            view.paused = false;
        });
        tracing::info!("Match ended, view cleared");
    }

    fn on_run_finished(&mut self, stats: &RunStats) {
        self.update_shared_view(|view| {
            view.frame = None;
            view.finished = true;
        });
        tracing::info!(
            "Run finished: matches={}, frames={}, skipped={}",
            stats.matches,
            stats.frames_processed,
            stats.frames_skipped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Side;

    #[test]
    fn test_fail_ends_the_run_with_the_error() {
        let shared = Arc::new(Mutex::new(SharedView::default()));
        let mut observer = VisualizingObserver::new(Arc::clone(&shared));
        observer.on_paused();

        shared
            .lock()
            .unwrap()
            .fail(ConfigurationError::UninitializedMaxStock(Side::Opponent));

        let view = shared.lock().unwrap();
        assert!(view.finished);
        assert!(!view.paused);
        assert!(view.frame.is_none());
        assert_eq!(
            view.outcome(),
            Err(ConfigurationError::UninitializedMaxStock(Side::Opponent))
        );
    }

    #[test]
    fn test_normal_finish_has_no_failure() {
        let shared = Arc::new(Mutex::new(SharedView::default()));
        let mut observer = VisualizingObserver::new(Arc::clone(&shared));
        observer.on_run_finished(&RunStats::default());

        let view = shared.lock().unwrap();
        assert!(view.finished);
        assert_eq!(view.outcome(), Ok(()));
    }
}
