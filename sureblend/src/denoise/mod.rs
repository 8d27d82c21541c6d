//! Denoiser interface.
//!
//! The denoising filter itself is an external collaborator. The pipeline only
//! needs "apply denoiser to buffer, get denoised buffer"; back-ends implement
//! [`Denoiser`] and are owned by the caller, wrapped in a [`TimedDenoiser`].

mod error;
mod gaussian;
#[cfg(feature = "oidn")]
mod oidn;
mod timed;

pub use error::Error;
pub use gaussian::GaussianDenoiser;
#[cfg(feature = "oidn")]
pub use oidn::OidnDenoiser;
pub use timed::TimedDenoiser;

use serde::{Deserialize, Serialize};

use crate::hdr::{HdrImage, ImageDimensions};

/// Auxiliary feature buffers passed alongside the colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxChannels {
    None,
    Albedo,
    #[default]
    AlbedoNormal,
}

impl AuxChannels {
    /// Suffix used in artifact names.
    pub fn tag(&self) -> &'static str {
        match self {
            AuxChannels::None => "",
            AuxChannels::Albedo => "_alb",
            AuxChannels::AlbedoNormal => "_alb_nrm",
        }
    }

    pub fn uses_albedo(&self) -> bool {
        !matches!(self, AuxChannels::None)
    }

    pub fn uses_normal(&self) -> bool {
        matches!(self, AuxChannels::AlbedoNormal)
    }
}

/// Input of a single denoiser call.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseRequest {
    pub dimensions: ImageDimensions,
    pub color: Vec<f32>,
    pub albedo: Option<Vec<f32>>,
    pub normal: Option<Vec<f32>>,
    /// Colour is high dynamic range (not clamped to [0, 1]).
    pub hdr: bool,
    /// Auxiliary buffers are noise free and need no prefiltering.
    pub clean_aux: bool,
}

impl DenoiseRequest {
    pub fn new(color: &HdrImage) -> Self {
        Self {
            dimensions: color.dimensions,
            color: color.pixels.clone(),
            albedo: None,
            normal: None,
            hdr: true,
            clean_aux: false,
        }
    }

    /// Splits a packed buffer of colour, then albedo, then normal.
    ///
    /// The length selects the layout: `3wh` is colour only, `6wh` adds albedo
    /// and `9wh` adds albedo and normal.
    pub fn from_packed(buffer: &[f32], dimensions: ImageDimensions) -> Result<Self, Error> {
        let plane = dimensions.sample_count();
        if plane == 0 || buffer.is_empty() || buffer.len() % plane != 0 || buffer.len() / plane > 3 {
            return Err(Error::PackedLength {
                len: buffer.len(),
                dimensions,
            });
        }

        let mut planes = buffer.chunks_exact(plane).map(<[f32]>::to_vec);
        Ok(Self {
            dimensions,
            color: planes.next().unwrap_or_default(),
            albedo: planes.next(),
            normal: planes.next(),
            hdr: true,
            clean_aux: false,
        })
    }

    pub fn with_albedo(mut self, albedo: Vec<f32>) -> Self {
        self.albedo = Some(albedo);
        self
    }

    pub fn with_normal(mut self, normal: Vec<f32>) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_clean_aux(mut self, clean_aux: bool) -> Self {
        self.clean_aux = clean_aux;
        self
    }

    /// Same request with the colour replaced; auxiliary buffers are kept.
    pub fn with_color(&self, color: Vec<f32>) -> Self {
        Self {
            dimensions: self.dimensions,
            color,
            albedo: self.albedo.clone(),
            normal: self.normal.clone(),
            hdr: self.hdr,
            clean_aux: self.clean_aux,
        }
    }

    pub fn aux_channels(&self) -> AuxChannels {
        match (&self.albedo, &self.normal) {
            (Some(_), Some(_)) => AuxChannels::AlbedoNormal,
            (Some(_), None) => AuxChannels::Albedo,
            _ => AuxChannels::None,
        }
    }

    /// Colour followed by whichever auxiliary buffers are present.
    pub fn packed(&self) -> Vec<f32> {
        let mut buffer = self.color.clone();
        if let Some(albedo) = &self.albedo {
            buffer.extend_from_slice(albedo);
        }
        if let Some(normal) = &self.normal {
            buffer.extend_from_slice(normal);
        }
        buffer
    }

    pub fn validate(&self) -> Result<(), Error> {
        let expected = self.dimensions.sample_count();
        let planes = [
            ("color", Some(&self.color)),
            ("albedo", self.albedo.as_ref()),
            ("normal", self.normal.as_ref()),
        ];
        for (plane, buffer) in planes {
            if let Some(buffer) = buffer.filter(|b| b.len() != expected) {
                return Err(Error::PlaneLength {
                    plane,
                    len: buffer.len(),
                    expected,
                });
            }
        }
        if self.normal.is_some() && self.albedo.is_none() {
            return Err(Error::NormalWithoutAlbedo);
        }
        Ok(())
    }
}

/// A denoising back-end.
///
/// Implementations must be deterministic for a fixed input within a run: the
/// risk estimator compares a call on a perturbed input against the output for
/// the unperturbed one.
pub trait Denoiser: Send {
    /// Short back-end name, used in artifact names.
    fn name(&self) -> &str;

    /// Denoises `request.color`, returning a buffer of the same length.
    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error>;
}

impl<D: Denoiser + ?Sized> Denoiser for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        (**self).denoise(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ImageDimensions {
        ImageDimensions::new(2, 1)
    }

    #[test]
    fn test_from_packed_layouts() {
        let color_only = DenoiseRequest::from_packed(&[0.0; 6], dims()).unwrap();
        assert_eq!(color_only.aux_channels(), AuxChannels::None);

        let with_albedo = DenoiseRequest::from_packed(&[1.0; 12], dims()).unwrap();
        assert_eq!(with_albedo.aux_channels(), AuxChannels::Albedo);
        assert_eq!(with_albedo.color.len(), 6);

        let packed: Vec<f32> = (0..18).map(|v| v as f32).collect();
        let full = DenoiseRequest::from_packed(&packed, dims()).unwrap();
        assert_eq!(full.aux_channels(), AuxChannels::AlbedoNormal);
        assert_eq!(full.normal.as_ref().unwrap()[0], 12.0);
        assert_eq!(full.packed(), packed);
    }

    #[test]
    fn test_from_packed_rejects_bad_lengths() {
        assert!(DenoiseRequest::from_packed(&[0.0; 7], dims()).is_err());
        assert!(DenoiseRequest::from_packed(&[0.0; 24], dims()).is_err());
        assert!(DenoiseRequest::from_packed(&[], dims()).is_err());
    }

    #[test]
    fn test_with_color_keeps_aux() {
        let request = DenoiseRequest::new(&HdrImage::zeros(dims()))
            .with_albedo(vec![0.5; 6])
            .with_clean_aux(true);
        let perturbed = request.with_color(vec![1.0; 6]);
        assert_eq!(perturbed.albedo, request.albedo);
        assert!(perturbed.clean_aux);
        assert_eq!(perturbed.color, vec![1.0; 6]);
    }

    #[test]
    fn test_validate() {
        let request = DenoiseRequest::new(&HdrImage::zeros(dims()));
        assert!(request.validate().is_ok());
        assert!(matches!(
            request.clone().with_normal(vec![0.0; 6]).validate(),
            Err(Error::NormalWithoutAlbedo)
        ));
        assert!(matches!(
            request.with_albedo(vec![0.0; 3]).validate(),
            Err(Error::PlaneLength { plane: "albedo", .. })
        ));
    }

    #[test]
    fn test_aux_tags() {
        assert_eq!(AuxChannels::None.tag(), "");
        assert_eq!(AuxChannels::Albedo.tag(), "_alb");
        assert_eq!(AuxChannels::AlbedoNormal.tag(), "_alb_nrm");
    }
}
