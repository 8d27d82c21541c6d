//! Error types for artifact storage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::hdr::ImageDimensions;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create store directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write image '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image buffer for '{name}' has {len} samples, expected {expected}")]
    BufferLength {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("Artifact '{name}' is {actual}, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: ImageDimensions,
        actual: ImageDimensions,
    },
}
