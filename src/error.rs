use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid logging level: {0}")]
    LogLevel(String),
    #[error("state lock poisoned")]
    StateLock,
}
