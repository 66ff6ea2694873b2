use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("row count mismatch: {rows} feature rows vs {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("invalid model parameters: {0}")]
    InvalidParams(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found at {path}")]
    NotFound { path: String },

    #[error("I/O error on model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("model artifact checksum mismatch")]
    ChecksumMismatch,
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("budget must be positive, got {0}")]
    InvalidBudget(i64),

    #[error("{items} items but {scores} scores")]
    LengthMismatch { items: usize, scores: usize },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} model is not loaded")]
    ModelUnavailable(&'static str),

    #[error("budget must be positive, got {0}")]
    InvalidBudget(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("prediction failed: {0}")]
    Prediction(#[from] ModelError),
}

impl From<RecommendError> for ServiceError {
    fn from(e: RecommendError) -> Self {
        match e {
            RecommendError::InvalidBudget(b) => ServiceError::InvalidBudget(b),
            other @ RecommendError::LengthMismatch { .. } => {
                ServiceError::Prediction(ModelError::SchemaMismatch(other.to_string()))
            }
        }
    }
}
