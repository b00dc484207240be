use thiserror::Error;

use super::types::{Axis, Side};

/// Fatal problems: the run cannot continue with this setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{bounds} bounds have zero {axis} extent")]
    DegenerateBounds { bounds: &'static str, axis: Axis },

    #[error("max stock for {0} is zero or was never captured")]
    UninitializedMaxStock(Side),

    #[error("predictor input width mismatch: encoder builds {built} values, predictor declares {declared}")]
    InputWidthMismatch { built: usize, declared: usize },

    #[error("predictor output width mismatch: action mapper expects {expected} values, predictor declares {declared}")]
    OutputWidthMismatch { expected: usize, declared: usize },

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidSetting {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    #[error("failed to load predictor weights from {path}: {reason}")]
    ModelLoad { path: String, reason: String },
}

/// Recoverable problems with a single snapshot; the frame is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransientStateError {
    #[error("snapshot refresh failed: {0}")]
    Refresh(String),

    #[error("non-finite {field} in {side} state")]
    NonFinite { side: Side, field: &'static str },

    #[error("negative dimensions in {0} state")]
    NegativeDimensions(Side),

    #[error("non-finite {0} bounds")]
    NonFiniteBounds(&'static str),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("transient snapshot state: {0}")]
    TransientState(#[from] TransientStateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_dimension() {
        let err = ConfigurationError::InputWidthMismatch {
            built: 3094,
            declared: 3092,
        };
        let message = err.to_string();
        assert!(message.contains("3094"));
        assert!(message.contains("3092"));

        let err = ConfigurationError::DegenerateBounds {
            bounds: "death",
            axis: Axis::Vertical,
        };
        assert_eq!(err.to_string(), "death bounds have zero vertical extent");
    }

    #[test]
    fn test_agent_error_from_transient() {
        let err: AgentError = TransientStateError::NegativeDimensions(Side::Opponent).into();
        assert!(matches!(err, AgentError::TransientState(_)));
        assert!(err.to_string().contains("opponent"));
    }
}
