//! Errors that abort a pipeline run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No checkpoints found in '{0}'")]
    NoCheckpoints(PathBuf),

    #[error("Scene '{0}' has no checkpoints to process")]
    EmptyCheckpointSet(String),

    #[error("Failed to read checkpoint directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Reference image '{0}' is missing")]
    MissingReference(String),

    #[error(transparent)]
    Store(#[from] store::Error),

    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config '{path}': {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
