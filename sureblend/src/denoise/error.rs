//! Error types for denoiser calls.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::hdr::ImageDimensions;

/// A failed denoiser call. Every variant means the same thing to the pipeline:
/// the current checkpoint cannot be computed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Denoiser back-end failed: {0}")]
    Backend(String),

    #[error("Denoiser did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Denoiser worker panicked")]
    WorkerPanicked,

    #[error("Failed to spawn denoiser worker: {0}")]
    Spawn(#[source] io::Error),

    #[error("Packed buffer of {len} samples does not fit a {dimensions} image")]
    PackedLength {
        len: usize,
        dimensions: ImageDimensions,
    },

    #[error("{plane} plane has {len} samples, expected {expected}")]
    PlaneLength {
        plane: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("Normal buffer requires an albedo buffer")]
    NormalWithoutAlbedo,

    #[error("Denoiser returned {len} samples, expected {expected}")]
    OutputLength { len: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = Error::Timeout(Duration::from_secs(3));
        assert!(err.to_string().contains("3s"));
    }

    #[test]
    fn test_plane_length_message() {
        let err = Error::PlaneLength {
            plane: "normal",
            len: 5,
            expected: 12,
        };
        assert_eq!(err.to_string(), "normal plane has 5 samples, expected 12");
    }
}
