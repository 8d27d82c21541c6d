//! Sureblend - SURE-driven blending of Monte-Carlo renders.
//!
//! Given a render captured at several sample-count checkpoints, this library:
//! - Estimates the per-pixel risk (SURE) of a denoiser without a reference
//! - Fits a power-law curve of that risk against sample count
//! - Turns the curve into a per-pixel weight for the denoised sample
//! - Blends the noisy and denoised images with those weights
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sureblend::{CheckpointSet, ExrStore, GaussianDenoiser, Pipeline, PipelineConfig};
//!
//! let set = CheckpointSet::discover("renders/cornell".as_ref())?;
//! let store = ExrStore::new("renders/cornell");
//! let denoiser = Box::new(GaussianDenoiser::default());
//! let mut pipeline = Pipeline::new(store, denoiser, PipelineConfig::default())?;
//!
//! let report = pipeline.run(&set)?;
//! println!("{report}");
//! ```

pub mod blend;
pub mod curve;
pub mod denoise;
pub mod hdr;
pub(crate) mod math;
pub mod pipeline;
pub mod risk;
pub mod smoothing;
pub mod store;
pub mod weight;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude;

// ============================================================================
// Core image types
// ============================================================================

pub use hdr::{CHANNELS, HdrImage, ImageDimensions};

// ============================================================================
// Estimation, fitting and weighting
// ============================================================================

pub use blend::blend;
pub use curve::{CURVE_OFFSET, CurveFitConfig, CurveParam, fit_curve, fit_curves, select_window};
pub use risk::{RiskConfig, RiskError, RiskEstimator};
pub use weight::{MAX_WEIGHT, RiskSign, compute_weights, denoised_weight, min_weight};

// ============================================================================
// Collaborators
// ============================================================================

#[cfg(feature = "oidn")]
pub use denoise::OidnDenoiser;
pub use denoise::{
    AuxChannels, DenoiseRequest, Denoiser, Error as DenoiseError, GaussianDenoiser,
    TimedDenoiser,
};
pub use smoothing::{DEFAULT_KERNEL_SIZE, bandwidth_from_mean, gaussian_blur};
pub use store::{Error as StoreError, ExrStore, ImageStore, MemoryStore};

// ============================================================================
// Pipeline
// ============================================================================

pub use pipeline::{
    ArtifactNames, CheckpointReport, CheckpointSet, Error as PipelineError, Outcome, Pipeline,
    PipelineConfig, RunReport, Smoothing,
};
