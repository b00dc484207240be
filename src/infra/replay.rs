use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::state::{CharacterState, Platform, Snapshot, TerrainPiece};

use super::error::{ConfigurationError, TransientStateError};
use super::game_api::SnapshotProvider;
use super::types::Rect;

type SnapshotSource = Box<dyn Iterator<Item = Result<Snapshot, TransientStateError>> + Send>;

/// Snapshot provider that plays back recorded frames, one per `update`.
///
/// Recordings are JSON lines, one `Snapshot` per line. When the recording
/// runs out the provider reports the game as no longer active.
pub struct ReplayProvider {
    frames: SnapshotSource,
    current: Snapshot,
    exhausted: bool,
    frame_delay: Option<Duration>,
    frames_read: u64,
}

impl ReplayProvider {
    fn with_source(frames: SnapshotSource) -> Self {
        Self {
            frames,
            current: Snapshot {
                active: true,
                ..Default::default()
            },
            exhausted: false,
            frame_delay: None,
            frames_read: 0,
        }
    }

    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        Self::with_source(Box::new(snapshots.into_iter().map(Ok)))
    }

    /// Frames that fail to refresh are played back as transient errors.
    pub fn from_results(frames: Vec<Result<Snapshot, TransientStateError>>) -> Self {
        Self::with_source(Box::new(frames.into_iter()))
    }

    pub fn open(path: &Path) -> Result<Self, ConfigurationError> {
        let file = File::open(path).map_err(|err| ConfigurationError::InvalidSetting {
            key: "FIGHTBOT_REPLAY",
            value: path.display().to_string(),
            reason: err.to_string(),
        })?;
        tracing::info!("Replaying snapshots from {}", path.display());

        let lines = BufReader::new(file)
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))
            .map(|(index, line)| {
                let line = line.map_err(|err| {
                    TransientStateError::Refresh(format!("line {}: {}", index + 1, err))
                })?;
                serde_json::from_str::<Snapshot>(&line).map_err(|err| {
                    TransientStateError::Refresh(format!("line {}: {}", index + 1, err))
                })
            });

        Ok(Self::with_source(Box::new(lines)))
    }

    /// Sleep before each refresh, to play back at roughly game speed
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = Some(delay);
        self
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }
}

impl SnapshotProvider for ReplayProvider {
    fn is_active(&self) -> bool {
        !self.exhausted && self.current.active
    }

    fn in_game(&self) -> bool {
        self.is_active() && self.current.in_game
    }

    fn update(&mut self) -> Result<(), TransientStateError> {
        if self.exhausted {
            return Ok(());
        }
        if let Some(delay) = self.frame_delay {
            thread::sleep(delay);
        }
        match self.frames.next() {
            Some(Ok(snapshot)) => {
                self.frames_read += 1;
                self.current = snapshot;
                Ok(())
            }
            Some(Err(err)) => {
                self.frames_read += 1;
                Err(err)
            }
            None => {
                tracing::info!("Replay finished after {} frames", self.frames_read);
                self.exhausted = true;
                Ok(())
            }
        }
    }

    fn player(&self) -> &CharacterState {
        &self.current.player
    }

    fn opponent(&self) -> &CharacterState {
        &self.current.opponent
    }

    fn terrain(&self) -> &[TerrainPiece] {
        &self.current.terrain
    }

    fn platforms(&self) -> &[Platform] {
        &self.current.platforms
    }

    fn cambounds(&self) -> Rect {
        self.current.cambounds
    }

    fn deathbounds(&self) -> Rect {
        self.current.deathbounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn menu_frame() -> Snapshot {
        Snapshot {
            active: true,
            in_game: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_snapshots_plays_in_order() {
        let mut in_game = menu_frame();
        in_game.in_game = true;
        in_game.player.lives = 4;

        let mut provider = ReplayProvider::from_snapshots(vec![menu_frame(), in_game]);
        provider.update().unwrap();
        assert!(provider.is_active());
        assert!(!provider.in_game());

        provider.update().unwrap();
        assert!(provider.in_game());
        assert_eq!(provider.player().lives, 4);

        provider.update().unwrap();
        assert!(!provider.is_active());
        assert!(!provider.in_game());
        assert_eq!(provider.frames_read(), 2);
    }

    #[test]
    fn test_open_reads_json_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"active":true,"in_game":false}}"#).unwrap();
        writeln!(file).unwrap();
        let frame = r#"{"active":true,"in_game":true,"cambounds":{"x0":0,"y0":0,"x1":600,"y1":500},
            "player":{"lives":3,"damage":12.5,"shield_power":80,"pos":{"x":10,"y":20},"dim":{"x":30,"y":40},"attack":"a_up"}}"#;
        writeln!(file, "{}", frame.replace('\n', "")).unwrap();
        writeln!(file, "not json").unwrap();

        let mut provider = ReplayProvider::open(file.path()).unwrap();
        provider.update().unwrap();
        assert!(!provider.in_game());

        provider.update().unwrap();
        assert!(provider.in_game());
        assert_eq!(provider.cambounds(), Rect::new(0.0, 0.0, 600.0, 500.0));
        assert_eq!(provider.player().damage, 12.5);
        assert_eq!(provider.player().attack, Some(crate::state::Attack::UpSmash));

        assert!(matches!(
            provider.update(),
            Err(TransientStateError::Refresh(_))
        ));
        // The previous frame stays cached.
        assert!(provider.in_game());

        provider.update().unwrap();
        assert!(!provider.is_active());
    }

    #[test]
    fn test_open_missing_file() {
        let result = ReplayProvider::open(Path::new("/nonexistent/replay.jsonl"));
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidSetting {
                key: "FIGHTBOT_REPLAY",
                ..
            })
        ));
    }
}
