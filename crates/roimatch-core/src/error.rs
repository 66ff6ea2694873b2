use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("invalid tier: {0}")]
    InvalidTier(String),
    #[error("invalid match method: {0}")]
    InvalidMatchMethod(String),
    #[error("invalid match outcome: {0}")]
    InvalidMatchOutcome(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to decrypt ENCRYPTED_DATABASE_URL: {0}")]
    Decrypt(String),

    #[error("failed to read niches file {path}: {source}")]
    NichesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse niches file: {0}")]
    NichesFileParse(#[source] serde_yaml::Error),

    #[error("niches validation failed: {0}")]
    Validation(String),
}
