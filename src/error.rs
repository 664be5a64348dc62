use std::path::PathBuf;

use thiserror::Error;

use crate::page::PageError;

/// Errors from reading inputs and configuration.
///
/// Rendering itself never fails; these only come from the I/O and
/// decoding around it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Page(#[from] PageError),
}

pub type Result<T> = std::result::Result<T, Error>;
