use std::fmt;

use tracing::{debug, info, warn};

use crate::infra::{
    AgentError, ConfigurationError, DefaultObserver, GameObserver, KeyInjector, PauseTrigger,
    Side, SnapshotProvider, TransientStateError,
};

use super::INPUT_WIDTH;
use super::action_space::{ActionMapper, ActionState, ControlKey};
use super::encoder::{CharacterFeatures, EncoderConfig, FeatureEncoder};
use super::policy::Predictor;
use super::spatial::{SpatialEncoder, SpatialEncoding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    NotInGame,
    /// In a match, first frame not processed yet
    Uninitialized,
    Running,
    Paused,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::NotInGame => "not in game",
            LoopState::Uninitialized => "uninitialized",
            LoopState::Running => "running",
            LoopState::Paused => "paused",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a single `ControlLoop::step`.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Not in a match; nothing emitted
    Idle,
    /// Pipeline ran and these keys were sent to the injector
    Acted(ActionState),
    /// Snapshot was inconsistent; the previous keys stay held
    Skipped(TransientStateError),
    Paused,
    Resumed,
    /// The game process is gone
    Finished,
}

/// Everything computed for one processed frame, handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    /// Frame number within the current match, starting at 1
    pub frame: u64,
    pub player: CharacterFeatures,
    pub opponent: CharacterFeatures,
    pub spatial: SpatialEncoding,
    pub output: Vec<f32>,
    pub keys: ActionState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub matches: u64,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub pauses: u64,
}

/// Values captured on the first frame of a match.
#[derive(Debug, Clone)]
struct MatchContext {
    player_max_stock: u32,
    opponent_max_stock: u32,
    spatial: SpatialEncoder,
}

/// Drives the per-frame pipeline and owns everything that lives for one
/// match: the predictor memory, the max-stock markers and the camera.
pub struct ControlLoop<P: Predictor, S, K, T, O = DefaultObserver> {
    predictor: P,
    provider: S,
    injector: K,
    trigger: T,
    observer: O,
    encoder: FeatureEncoder,
    mapper: ActionMapper,
    state: LoopState,
    memory: P::State,
    current_match: Option<MatchContext>,
    last_keys: ActionState,
    match_frame: u64,
    stats: RunStats,
}

impl<P, S, K, T> ControlLoop<P, S, K, T, DefaultObserver>
where
    P: Predictor,
    S: SnapshotProvider,
    K: KeyInjector,
    T: PauseTrigger,
{
    /// Fails when the predictor's declared shape does not fit the encoders
    /// and the key set.
    pub fn new(
        predictor: P,
        provider: S,
        injector: K,
        trigger: T,
        threshold: f32,
    ) -> Result<Self, ConfigurationError> {
        if predictor.input_width() != INPUT_WIDTH {
            return Err(ConfigurationError::InputWidthMismatch {
                built: INPUT_WIDTH,
                declared: predictor.input_width(),
            });
        }
        if predictor.output_width() != ControlKey::COUNT {
            return Err(ConfigurationError::OutputWidthMismatch {
                expected: ControlKey::COUNT,
                declared: predictor.output_width(),
            });
        }

        let memory = predictor.initial_state();
        Ok(Self {
            predictor,
            provider,
            injector,
            trigger,
            observer: DefaultObserver,
            encoder: FeatureEncoder::new(EncoderConfig::default()),
            mapper: ActionMapper::new(threshold),
            state: LoopState::NotInGame,
            memory,
            current_match: None,
            last_keys: ActionState::released(),
            match_frame: 0,
            stats: RunStats::default(),
        })
    }

}

impl<P, S, K, T, O> ControlLoop<P, S, K, T, O>
where
    P: Predictor,
    S: SnapshotProvider,
    K: KeyInjector,
    T: PauseTrigger,
    O: GameObserver,
{
    pub fn with_observer<N: GameObserver>(self, observer: N) -> ControlLoop<P, S, K, T, N> {
        ControlLoop {
            predictor: self.predictor,
            provider: self.provider,
            injector: self.injector,
            trigger: self.trigger,
            observer,
            encoder: self.encoder,
            mapper: self.mapper,
            state: self.state,
            memory: self.memory,
            current_match: self.current_match,
            last_keys: self.last_keys,
            match_frame: self.match_frame,
            stats: self.stats,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Predictor memory that the next frame will be given
    pub fn memory(&self) -> &P::State {
        &self.memory
    }

    /// Keys currently held by the injector on behalf of the loop
    pub fn last_keys(&self) -> ActionState {
        self.last_keys
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn provider(&self) -> &S {
        &self.provider
    }

    pub fn injector(&self) -> &K {
        &self.injector
    }

    /// Step until the game process goes away.
    pub fn run(&mut self) -> Result<RunStats, ConfigurationError> {
        info!("Control loop started with {} predictor", self.predictor.mode());
        loop {
            if let Frame::Finished = self.step()? {
                break;
            }
        }
        self.observer.on_run_finished(&self.stats);
        Ok(self.stats)
    }

    /// Refresh the snapshot and advance the state machine by one frame.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn step(&mut self) -> Result<Frame, ConfigurationError> {
        if let Err(err) = self.provider.update() {
            // Only frames the pipeline would have processed count as skipped.
            return Ok(match self.state {
                LoopState::NotInGame => {
                    debug!("Snapshot refresh failed outside a match: {}", err);
                    Frame::Idle
                }
                LoopState::Paused => {
                    debug!("Snapshot refresh failed while paused: {}", err);
                    Frame::Paused
                }
                LoopState::Uninitialized | LoopState::Running => self.skip_frame(err),
            });
        }

        if !self.provider.is_active() {
            if self.state != LoopState::NotInGame {
                self.enter_not_in_game();
            }
            return Ok(Frame::Finished);
        }

        let in_game = self.provider.in_game();
        match self.state {
            LoopState::NotInGame if in_game => {
                self.enter_uninitialized();
                self.initialize_match()?;
                self.run_frame()
            }
            LoopState::NotInGame => Ok(Frame::Idle),
            _ if !in_game => {
                self.enter_not_in_game();
                Ok(Frame::Idle)
            }
            LoopState::Uninitialized => {
                self.initialize_match()?;
                self.run_frame()
            }
            LoopState::Running => self.run_frame(),
            LoopState::Paused => {
                if self.trigger.pressed_once() {
                    self.set_state(LoopState::Running);
                    self.observer.on_resumed();
                    Ok(Frame::Resumed)
                } else {
                    Ok(Frame::Paused)
                }
            }
        }
    }

    fn set_state(&mut self, next: LoopState) {
        if self.state != next {
            info!("State: {} -> {}", self.state, next);
            self.state = next;
        }
    }

    fn enter_uninitialized(&mut self) {
        self.set_state(LoopState::Uninitialized);
        self.memory = self.predictor.initial_state();
        self.current_match = None;
        self.match_frame = 0;
        self.stats.matches += 1;
    }

    fn initialize_match(&mut self) -> Result<(), ConfigurationError> {
        let player_max_stock = self.provider.player().lives;
        let opponent_max_stock = self.provider.opponent().lives;
        let camera = self.provider.cambounds();
        let spatial = SpatialEncoder::new(camera)?;

        info!(
            "Match {} initialized: stock {} vs {}",
            self.stats.matches, player_max_stock, opponent_max_stock
        );
        self.current_match = Some(MatchContext {
            player_max_stock,
            opponent_max_stock,
            spatial,
        });
        self.observer
            .on_match_start(player_max_stock, opponent_max_stock, camera);
        self.set_state(LoopState::Running);
        Ok(())
    }

    fn enter_not_in_game(&mut self) {
        self.set_state(LoopState::NotInGame);
        self.injector.reset_key_state();
        self.last_keys = ActionState::released();
        self.current_match = None;
        self.observer.on_match_end();
    }

    fn enter_paused(&mut self) {
        self.set_state(LoopState::Paused);
        self.injector.reset_key_state();
        self.last_keys = ActionState::released();
        self.stats.pauses += 1;
        self.observer.on_paused();
    }

    fn skip_frame(&mut self, err: TransientStateError) -> Frame {
        warn!("Skipping frame: {}", err);
        self.stats.frames_skipped += 1;
        self.observer.on_frame_skipped(&err);
        Frame::Skipped(err)
    }

    fn run_frame(&mut self) -> Result<Frame, ConfigurationError> {
        let keys = match self.process_frame() {
            Ok(keys) => keys,
            Err(AgentError::TransientState(err)) => return Ok(self.skip_frame(err)),
            Err(AgentError::Configuration(err)) => return Err(err),
        };

        if self.trigger.pressed_once() {
            self.enter_paused();
            return Ok(Frame::Paused);
        }
        Ok(Frame::Acted(keys))
    }

    fn process_frame(&mut self) -> Result<ActionState, AgentError> {
        let Some(current) = &self.current_match else {
            return Err(ConfigurationError::UninitializedMaxStock(Side::Player).into());
        };

        let player = self.provider.player();
        let opponent = self.provider.opponent();
        player.validate(Side::Player)?;
        opponent.validate(Side::Opponent)?;

        let death_bounds = self.provider.deathbounds();
        if !death_bounds.is_finite() {
            return Err(TransientStateError::NonFiniteBounds("death").into());
        }

        let player_features = self.encoder.encode(
            Side::Player,
            player,
            current.player_max_stock,
            death_bounds,
        )?;
        let opponent_features = self.encoder.encode(
            Side::Opponent,
            opponent,
            current.opponent_max_stock,
            death_bounds,
        )?;
        let spatial = current.spatial.encode(&self.provider);

        let mut input = Vec::with_capacity(INPUT_WIDTH);
        input.extend_from_slice(player_features.as_slice());
        input.extend_from_slice(opponent_features.as_slice());
        input.extend_from_slice(&spatial.platform_grid);
        input.extend_from_slice(&spatial.proximity);
        if input.len() != self.predictor.input_width() {
            return Err(ConfigurationError::InputWidthMismatch {
                built: input.len(),
                declared: self.predictor.input_width(),
            }
            .into());
        }

        let (output, next) = self.predictor.predict(&input, &self.memory);
        if output.len() != ControlKey::COUNT {
            return Err(ConfigurationError::OutputWidthMismatch {
                expected: ControlKey::COUNT,
                declared: output.len(),
            }
            .into());
        }
        self.memory = next;

        let keys = self.mapper.map(&output);
        self.injector.apply_key_state(&keys);
        self.last_keys = keys;
        self.match_frame += 1;
        self.stats.frames_processed += 1;

        debug!("output: {:.3?}, keys: {}", output, keys.describe());
        self.observer.on_frame(&FrameView {
            frame: self.match_frame,
            player: player_features,
            opponent: opponent_features,
            spatial,
            output,
            keys,
        });

        Ok(keys)
    }
}
