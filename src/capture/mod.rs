//! Camera Capture Layer
//!
//! Wraps a nokhwa camera device and yields sequential RGB frames on demand.
//! Capture is single-threaded and polled once per UI tick; a blocking wait
//! for the next frame is acceptable for this class of device.

pub mod frame;

use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use thiserror::Error;
use tracing::info;

pub use frame::CapturedFrame;

/// Errors from the capture device
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened. Fatal at startup.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// A frame could not be grabbed or decoded. Fatal during the loop.
    #[error("frame capture failed: {0}")]
    Frame(String),
}

/// Camera capture source
///
/// Owns the device handle for the lifetime of the program; the stream is
/// stopped when the source is dropped, so the device is released on every
/// exit path.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    /// Open the camera at the given device index and start its stream
    pub fn open(index: u32) -> Result<Self, CaptureError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        camera
            .open_stream()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        info!(
            "Opened camera: {} ({})",
            camera.info().human_name(),
            camera.camera_format()
        );

        Ok(Self { camera })
    }

    /// Grab and decode the next frame. Blocks until one is available.
    pub fn next_frame(&mut self) -> Result<CapturedFrame, CaptureError> {
        let raw = self
            .camera
            .frame()
            .map_err(|e| CaptureError::Frame(e.to_string()))?;
        let decoded = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Frame(e.to_string()))?;

        let (width, height) = decoded.dimensions();
        Ok(CapturedFrame::new(decoded.into_raw(), width, height))
    }

    /// Frame width reported by the device
    pub fn width(&self) -> u32 {
        self.camera.resolution().width()
    }

    /// Frame height reported by the device
    pub fn height(&self) -> u32 {
        self.camera.resolution().height()
    }

    /// Human-readable device name
    pub fn name(&self) -> String {
        self.camera.info().human_name()
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        let _ = self.camera.stop_stream();
    }
}

/// List available camera devices as (index, name) pairs
pub fn list_cameras() -> Vec<(u32, String)> {
    match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
        Ok(devices) => devices
            .into_iter()
            .enumerate()
            .map(|(i, info)| (i as u32, info.human_name()))
            .collect(),
        Err(_) => Vec::new(),
    }
}
