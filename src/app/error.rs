use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractError;

#[derive(Error, Debug)]
pub enum FrauditorError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Page error: {0}")]
    Page(String),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Classifier transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Classifier response error: {0}")]
    Classifier(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FrauditorError>;
