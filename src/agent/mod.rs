//! Per-frame control agent
//!
//! Each frame the control loop pulls a snapshot, encodes it and asks the
//! predictor which keys to hold:
//!
//! ```text
//! SnapshotProvider
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  FeatureEncoder (player, opponent)                          │
//! │  - 7 continuous + 13 status flags + 25 attack slots each    │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SpatialEncoder                                             │
//! │  - 60x50 platform grid, 60x50 opponent grid                 │
//! │  - 4 proximity values                                       │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Predictor (feed-forward / recurrent / LSTM)                │
//! │  - 3094 inputs → 11 outputs in (0, 1)                       │
//! │  - recurrent memory owned by the ControlLoop                │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ActionMapper                                               │
//! │  - output > threshold ⇒ key pressed                         │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! KeyInjector
//! ```
//!
//! The opponent grid is produced for display only; the predictor sees the
//! platform grid.

pub mod action_space;
pub mod control_loop;
pub mod encoder;
pub mod policy;
pub mod spatial;

pub use action_space::{ActionMapper, ActionState, ControlKey, DEFAULT_THRESHOLD, map_to_actions};
pub use control_loop::{ControlLoop, Frame, FrameView, LoopState, RunStats};
pub use encoder::{CHARACTER_FEATURES, CharacterFeatures, EncoderConfig, FeatureEncoder};
pub use policy::{
    AnyPredictor, FeedforwardPredictor, HiddenState, LongMemoryPredictor, LongMemoryState,
    MemoryState, Predictor, PredictorConfig, PredictorMode, RecurrentPredictor,
};
pub use spatial::{
    GRID_CELLS, GRID_HEIGHT, GRID_WIDTH, PROXIMITY_FEATURES, SpatialEncoder, SpatialEncoding,
};

/// Width of the predictor input: both characters, the platform grid and the
/// proximity vector.
pub const INPUT_WIDTH: usize = 2 * CHARACTER_FEATURES + GRID_CELLS + PROXIMITY_FEATURES;
