//! Intel Open Image Denoise back-end.

use super::{DenoiseRequest, Denoiser, Error};

/// Ray-tracing filter from Open Image Denoise on the default device.
///
/// A device is created per call: the handle is not `Send`, while denoiser
/// calls run on a worker thread.
pub struct OidnDenoiser {
    _private: (),
}

impl OidnDenoiser {
    /// Fails if no Open Image Denoise device can be created.
    pub fn new() -> Result<Self, Error> {
        open_device()?;
        Ok(Self { _private: () })
    }
}

fn open_device() -> Result<oidn::Device, Error> {
    let device = oidn::Device::new();
    if let Err((_, message)) = device.get_error() {
        return Err(Error::Backend(message));
    }
    Ok(device)
}

impl Denoiser for OidnDenoiser {
    fn name(&self) -> &str {
        "oidn"
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        let device = open_device()?;
        let mut output = vec![0.0f32; request.color.len()];

        let mut filter = oidn::RayTracing::new(&device);
        filter
            .srgb(false)
            .hdr(request.hdr)
            .clean_aux(request.clean_aux)
            .image_dimensions(request.dimensions.width, request.dimensions.height);
        match (&request.albedo, &request.normal) {
            (Some(albedo), Some(normal)) => {
                filter.albedo_normal(albedo, normal);
            }
            (Some(albedo), None) => {
                filter.albedo(albedo);
            }
            _ => {}
        }

        filter
            .filter(&request.color, &mut output)
            .map_err(|e| Error::Backend(format!("{e:?}")))?;

        if let Err((_, message)) = device.get_error() {
            return Err(Error::Backend(message));
        }
        Ok(output)
    }
}
