pub mod agent;
pub mod infra;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use agent::{ActionState, AnyPredictor, ControlKey, ControlLoop, Predictor, PredictorMode};
pub use infra::{AgentConfig, ConfigurationError, Rect, TransientStateError};
pub use state::{CharacterState, Snapshot};
