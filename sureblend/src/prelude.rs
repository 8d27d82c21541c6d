//! Convenience re-exports for running the pipeline.

pub use crate::{
    AuxChannels, CheckpointSet, Denoiser, ExrStore, GaussianDenoiser, HdrImage, ImageDimensions,
    ImageStore, Pipeline, PipelineConfig, RunReport, Smoothing,
};
