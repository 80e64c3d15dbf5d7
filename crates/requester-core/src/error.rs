//! Unified Error Model
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequesterError {
    #[error("EnvBlock Error:\n{0}")]
    EnvBlock(String),

    #[error("EnvFile Error:\n{0}")]
    EnvFile(String),

    #[error("Timeout Error: environment took too long to parse")]
    EnvTimeout,

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("WORKER/{0}")]
    Worker(String),
}
