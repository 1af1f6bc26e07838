use thiserror::Error;

/// Everything that can go wrong between loading artifacts and labeling a prediction.
///
/// The load/config variants are startup failures; the rest are per-request.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("failed to load training schema from {path}: {reason}")]
    SchemaLoad { path: String, reason: String },

    #[error("failed to load model artifact from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("failed to load station table from {path}: {reason}")]
    StationLoad { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("shape mismatch: expected {expected} values, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
}

impl PredictorError {
    pub fn schema_load(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::SchemaLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn model_load(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn station_load(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::StationLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the caller rather than by our artifacts.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// True for errors that must stop the process before it serves anything.
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaLoad { .. } | Self::ModelLoad { .. } | Self::StationLoad { .. } | Self::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
