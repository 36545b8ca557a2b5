//! Custom error types for minirag

use thiserror::Error;

/// Main error type for minirag operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Backend '{0}' does not support pulling models; make sure the model name is correct")]
    PullUnsupported(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid collection name '{0}'")]
    InvalidCollectionName(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Task join error: {}", err))
    }
}

/// Result type alias for minirag
pub type Result<T> = std::result::Result<T, Error>;
