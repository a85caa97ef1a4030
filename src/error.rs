use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while governing the charge current.
#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} does not hold an integer: {content:?}", .path.display())]
    Parse { path: PathBuf, content: String },

    #[error("threshold request {0} is outside 39..=100")]
    InvalidInput(u8),

    #[error("live battery level unavailable: {0}")]
    TelemetryUnavailable(#[source] Box<GovernorError>),
}

impl GovernorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = GovernorError> = std::result::Result<T, E>;
