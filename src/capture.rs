//! Single-frame capture from a live device.
//!
//! The host supplies a [`CaptureDevice`]; acquiring it yields a
//! [`FrameStream`] of decoded frames. [`CaptureAdapter::capture`] takes one
//! frame, zooms into its center by [`ZOOM_FACTOR`], plans the crop inside the
//! zoomed region, and encodes the result as JPEG under the fixed name
//! [`CAPTURE_NAME`]. The stream is stopped on every path once acquired.

use crate::files::TransformResult;
use crate::imaging::{
    BackendError, Constraints, CropPlan, ImageBackend, TransformEngine, plan_crop, zoom_region,
};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Fraction of each frame dimension kept around the center.
pub const ZOOM_FACTOR: f64 = 0.8;

/// Logical name of every captured file.
pub const CAPTURE_NAME: &str = "capture.jpg";

pub const CAPTURE_MIME: &str = "image/jpeg";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    Acquisition(String),
    #[error("No frame from capture device: {0}")]
    Frame(String),
    #[error("Encoding captured frame failed: {0}")]
    Transform(#[from] BackendError),
}

/// A live capture device, e.g. a camera.
pub trait CaptureDevice: Send + Sync {
    type Stream: FrameStream;

    /// Open a stream. Fails with [`CaptureError::Acquisition`] when the
    /// device is denied or missing.
    fn acquire(
        &self,
        constraints: &Constraints,
    ) -> impl Future<Output = Result<Self::Stream, CaptureError>> + Send;
}

/// An open stream of decoded frames, owned by one capture.
pub trait FrameStream: Send {
    type Frame: Send + Sync + 'static;

    /// Wait until the device signals a frame is ready.
    fn next_frame(&mut self) -> impl Future<Output = Result<Self::Frame, CaptureError>> + Send;

    /// Release the device.
    fn stop(&mut self);
}

/// Pulls one frame through the transform engine.
pub struct CaptureAdapter<B: ImageBackend, D> {
    engine: TransformEngine<B>,
    device: D,
}

impl<B, D> CaptureAdapter<B, D>
where
    B: ImageBackend,
    D: CaptureDevice,
    D::Stream: FrameStream<Frame = B::Surface>,
{
    pub fn new(engine: TransformEngine<B>, device: D) -> Self {
        Self { engine, device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Capture and encode one frame.
    ///
    /// Makes no changes anywhere on failure; the caller decides where a
    /// successful result goes.
    pub async fn capture(&self, constraints: &Constraints) -> Result<TransformResult, CaptureError> {
        let stream = self.device.acquire(constraints).await.inspect_err(|error| {
            warn!(%error, "capture device acquisition failed");
        })?;
        let mut guard = StreamGuard::new(stream);

        let result = self.capture_frame(guard.stream(), constraints).await;
        guard.stop();

        if let Err(error) = &result {
            warn!(%error, "capture failed");
        }
        result
    }

    async fn capture_frame(
        &self,
        stream: &mut D::Stream,
        constraints: &Constraints,
    ) -> Result<TransformResult, CaptureError> {
        let frame = stream.next_frame().await?;
        let plan = plan_zoomed(self.engine.dimensions(&frame), constraints);
        debug!(rect = ?plan.source_rect, output = ?plan.output, "capturing frame");

        let result = self
            .engine
            .render(
                Arc::new(frame),
                plan,
                constraints.quality,
                CAPTURE_NAME,
                CAPTURE_MIME,
            )
            .await?;
        Ok(result)
    }
}

/// Owns an acquired stream and stops it exactly once, at the latest on drop.
///
/// Dropping a pending capture future (timeout, `select!`, field teardown)
/// drops the guard, so the device is released on cancellation too.
struct StreamGuard<S: FrameStream> {
    stream: S,
    stopped: bool,
}

impl<S: FrameStream> StreamGuard<S> {
    fn new(stream: S) -> Self {
        Self {
            stream,
            stopped: false,
        }
    }

    fn stream(&mut self) -> &mut S {
        &mut self.stream
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stream.stop();
            self.stopped = true;
        }
    }
}

impl<S: FrameStream> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        if !self.stopped {
            debug!("capture dropped before completion, stopping stream");
        }
        self.stop();
    }
}

/// Plan inside the centered zoom region, in full-frame coordinates.
pub fn plan_zoomed(frame: crate::imaging::Dimensions, constraints: &Constraints) -> CropPlan {
    let zoom = zoom_region(frame, ZOOM_FACTOR);
    let inner = plan_crop(zoom.dimensions(), constraints);
    CropPlan {
        source: frame,
        source_rect: inner.source_rect.offset(zoom.x, zoom.y),
        output: inner.output,
    }
}

/// A device that serves one fixed, already-decoded frame.
///
/// Stands in for a camera on hosts without one; `stopped` reports whether
/// the last stream was released.
pub struct StillDevice<F> {
    frame: Option<F>,
    stopped: Arc<AtomicBool>,
}

impl<F: Clone + Send + Sync + 'static> StillDevice<F> {
    pub fn new(frame: F) -> Self {
        Self {
            frame: Some(frame),
            stopped: Arc::new(AtomicBool::new(true)),
        }
    }

    /// A device that refuses every acquisition.
    pub fn unavailable() -> Self {
        Self {
            frame: None,
            stopped: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct StillStream<F> {
    frame: Option<F>,
    stopped: Arc<AtomicBool>,
}

impl<F: Clone + Send + Sync + 'static> CaptureDevice for StillDevice<F> {
    type Stream = StillStream<F>;

    async fn acquire(&self, _constraints: &Constraints) -> Result<StillStream<F>, CaptureError> {
        let frame = self
            .frame
            .clone()
            .ok_or_else(|| CaptureError::Acquisition("no capture device".to_string()))?;
        self.stopped.store(false, Ordering::SeqCst);
        Ok(StillStream {
            frame: Some(frame),
            stopped: Arc::clone(&self.stopped),
        })
    }
}

impl<F: Clone + Send + Sync + 'static> FrameStream for StillStream<F> {
    type Frame = F;

    async fn next_frame(&mut self) -> Result<F, CaptureError> {
        self.frame
            .take()
            .ok_or_else(|| CaptureError::Frame("stream exhausted".to_string()))
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
