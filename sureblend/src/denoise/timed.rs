//! Serialised, time-limited denoiser calls.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use parking_lot::Mutex;

use super::{DenoiseRequest, Denoiser, Error};

/// Owns a denoiser back-end and bounds every call by a timeout.
///
/// Calls run on a worker thread while the caller waits. The back-end sits
/// behind a mutex, so at most one call is in flight even after a timeout: the
/// next call waits for the abandoned one, and that wait counts against its own
/// timeout.
pub struct TimedDenoiser {
    inner: Arc<Mutex<Box<dyn Denoiser>>>,
    name: String,
    timeout: Option<Duration>,
}

impl TimedDenoiser {
    pub fn new(denoiser: Box<dyn Denoiser>, timeout: Option<Duration>) -> Self {
        let name = denoiser.name().to_string();
        Self {
            inner: Arc::new(Mutex::new(denoiser)),
            name,
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn run(&self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        request.validate()?;

        let output = match self.timeout {
            None => self.inner.lock().denoise(request)?,
            Some(timeout) => self.run_with_timeout(request, timeout)?,
        };

        if output.len() != request.color.len() {
            return Err(Error::OutputLength {
                len: output.len(),
                expected: request.color.len(),
            });
        }
        Ok(output)
    }

    fn run_with_timeout(
        &self,
        request: &DenoiseRequest,
        timeout: Duration,
    ) -> Result<Vec<f32>, Error> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let request = request.clone();

        std::thread::Builder::new()
            .name(format!("denoise-{}", self.name))
            .spawn(move || {
                let result = inner.lock().denoise(&request);
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(result);
            })
            .map_err(Error::Spawn)?;

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(denoiser = %self.name, ?timeout, "Denoiser call timed out");
                Err(Error::Timeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::WorkerPanicked),
        }
    }
}

impl Denoiser for TimedDenoiser {
    fn name(&self) -> &str {
        &self.name
    }

    fn denoise(&mut self, request: &DenoiseRequest) -> Result<Vec<f32>, Error> {
        self.run(request)
    }
}

impl std::fmt::Debug for TimedDenoiser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedDenoiser")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}
