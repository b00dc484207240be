mod config;
mod default_observer;
mod error;
mod game_api;
mod game_observer;
mod key_injector;
mod pause;
mod replay;
mod types;
mod visualizing_observer;

pub use config::AgentConfig;
pub use default_observer::DefaultObserver;
pub use error::{AgentError, ConfigurationError, TransientStateError};
pub use game_api::{KeyInjector, PauseTrigger, SnapshotProvider};
pub use game_observer::GameObserver;
pub use key_injector::LoggingKeyInjector;
pub use pause::ChannelPauseTrigger;
pub use replay::ReplayProvider;
pub use types::{Axis, Rect, Side, Vec2};
pub use visualizing_observer::{SharedView, VisualizingObserver};
