//! Error types.

use std::io;
use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(String),

    #[error("yaml error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("docker api error: {0}")]
    DockerApiError(#[from] bollard::errors::Error),

    #[error("failed parsing timestamp: {0}")]
    TimestampParseError(#[from] chrono::ParseError),

    #[error("path for results files does not exist: {}", .0.display())]
    MissingResultsPath(PathBuf),

    #[error("required setting not defined: {0}")]
    MissingSetting(&'static str),

    #[error("`{0}` is not a valid configuration option")]
    UnknownConfigOption(String),

    #[error("invalid value for configuration option `{0}`: {1}")]
    InvalidConfigValue(String, String),

    #[error("other error: {0}")]
    Other(String),
}
