use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::{DEFAULT_THRESHOLD, PredictorConfig, PredictorMode};

use super::error::ConfigurationError;

/// Run configuration, read from `FIGHTBOT_*` environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub predictor: PredictorConfig,
    pub threshold: f32,
    pub model_path: Option<PathBuf>,
    pub replay_path: Option<PathBuf>,
    pub visualizer: bool,
    pub frame_delay: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            predictor: PredictorConfig::default(),
            threshold: DEFAULT_THRESHOLD,
            model_path: None,
            replay_path: None,
            visualizer: false,
            frame_delay: None,
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();

        if let Some(mode) = lookup("FIGHTBOT_MODE") {
            config.predictor.mode = mode
                .parse::<PredictorMode>()
                .map_err(|reason| invalid("FIGHTBOT_MODE", &mode, reason))?;
        }

        if let Some(threshold) = lookup("FIGHTBOT_THRESHOLD") {
            let value = threshold
                .trim()
                .parse::<f32>()
                .map_err(|err| invalid("FIGHTBOT_THRESHOLD", &threshold, err.to_string()))?;
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(
                    "FIGHTBOT_THRESHOLD",
                    &threshold,
                    "must lie in [0, 1]".to_string(),
                ));
            }
            config.threshold = value;
        }

        if let Some(layers) = lookup("FIGHTBOT_HIDDEN_LAYERS") {
            config.predictor.hidden_layers = layers
                .split(',')
                .map(|width| width.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| invalid("FIGHTBOT_HIDDEN_LAYERS", &layers, err.to_string()))?;
            config.predictor.validate()?;
        }

        config.model_path = lookup("FIGHTBOT_MODEL_PATH").map(PathBuf::from);
        config.replay_path = lookup("FIGHTBOT_REPLAY").map(PathBuf::from);

        if let Some(visualizer) = lookup("FIGHTBOT_VISUALIZER") {
            config.visualizer = visualizer
                .trim()
                .parse::<bool>()
                .map_err(|err| invalid("FIGHTBOT_VISUALIZER", &visualizer, err.to_string()))?;
        }

        if let Some(delay) = lookup("FIGHTBOT_FRAME_DELAY_MS") {
            let millis = delay
                .trim()
                .parse::<u64>()
                .map_err(|err| invalid("FIGHTBOT_FRAME_DELAY_MS", &delay, err.to_string()))?;
            config.frame_delay = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        key,
        value: value.to_string(),
        reason,
    }
}
