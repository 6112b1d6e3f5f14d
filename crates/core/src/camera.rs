//! Camera access.
//!
//! A camera is an exclusive device: at most one [`CameraSession`] is open at a
//! time and the session stops the underlying stream on every exit path:
//! capture, cancel, or simply being dropped when its owner goes away.
//!
//! # Example
//!
//! ```ignore
//! use photo_booth_core::camera::{default_camera, CameraSession};
//!
//! let mut device = default_camera();
//! let session = CameraSession::open(device.as_mut())?;
//! let photo = session.capture()?; // stream is stopped here
//! ```

use crate::error::{AppError, Result};
use crate::image_processing::{CapturedImage, ImageProcessor};
use image::DynamicImage;

/// Something that can be asked for a live video stream.
pub trait CameraDevice {
    /// Starts streaming from the device.
    ///
    /// # Errors
    ///
    /// [`AppError::PermissionDenied`] when the user refused access,
    /// [`AppError::DeviceUnavailable`] when there is no usable camera.
    fn open(&mut self) -> Result<Box<dyn FrameSource>>;
}

/// A running video stream.
pub trait FrameSource {
    /// Returns the most recent frame.
    fn frame(&mut self) -> Result<DynamicImage>;

    /// Stops the stream and releases the device. Must be idempotent.
    fn stop(&mut self);
}

/// Scoped handle on an open camera stream.
pub struct CameraSession {
    source: Option<Box<dyn FrameSource>>,
}

impl CameraSession {
    pub fn open(device: &mut dyn CameraDevice) -> Result<Self> {
        let source = device.open()?;
        tracing::info!("camera session opened");
        Ok(Self {
            source: Some(source),
        })
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Current frame for the live preview.
    pub fn preview_frame(&mut self) -> Result<DynamicImage> {
        match self.source.as_mut() {
            Some(source) => source.frame(),
            None => Err(AppError::DeviceUnavailable),
        }
    }

    /// Snapshots the current frame as a JPEG still, then releases the camera.
    ///
    /// The camera is released even when grabbing or encoding the frame fails.
    pub fn capture(mut self) -> Result<CapturedImage> {
        let frame = self.preview_frame();
        self.release();
        ImageProcessor::captured_from_frame(&frame?)
    }

    /// Releases the camera without producing an image.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
            tracing::info!("camera session released");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Maps a backend failure description onto the user-facing camera errors.
pub fn classify_camera_failure(message: &str) -> AppError {
    let lower = message.to_ascii_lowercase();
    let denied = ["permission", "denied", "not allowed", "notallowed", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle));

    if denied {
        AppError::PermissionDenied
    } else {
        AppError::DeviceUnavailable
    }
}

/// Device used when the build has no camera backend.
pub struct NoCamera;

impl CameraDevice for NoCamera {
    fn open(&mut self) -> Result<Box<dyn FrameSource>> {
        tracing::warn!("camera requested but this build has no camera backend");
        Err(AppError::DeviceUnavailable)
    }
}

/// The platform camera when compiled with `native-camera`, otherwise [`NoCamera`].
pub fn default_camera() -> Box<dyn CameraDevice> {
    #[cfg(feature = "native-camera")]
    {
        Box::new(native::NativeCamera::default())
    }
    #[cfg(not(feature = "native-camera"))]
    {
        Box::new(NoCamera)
    }
}

#[cfg(feature = "native-camera")]
pub mod native {
    //! Camera backend over the operating system's video API.

    use super::{classify_camera_failure, CameraDevice, FrameSource};
    use crate::error::{AppError, Result};
    use image::{DynamicImage, RgbImage};
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;

    /// The first camera the platform reports.
    #[derive(Default)]
    pub struct NativeCamera {
        pub index: u32,
    }

    impl CameraDevice for NativeCamera {
        fn open(&mut self) -> Result<Box<dyn FrameSource>> {
            let format =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

            let mut camera = Camera::new(CameraIndex::Index(self.index), format).map_err(|e| {
                tracing::warn!(error = %e, index = self.index, "failed to open camera");
                classify_camera_failure(&e.to_string())
            })?;

            camera.open_stream().map_err(|e| {
                tracing::warn!(error = %e, "failed to start camera stream");
                classify_camera_failure(&e.to_string())
            })?;

            Ok(Box::new(NativeStream {
                camera,
                stopped: false,
            }))
        }
    }

    struct NativeStream {
        camera: Camera,
        stopped: bool,
    }

    impl FrameSource for NativeStream {
        fn frame(&mut self) -> Result<DynamicImage> {
            let buffer = self
                .camera
                .frame()
                .map_err(|e| AppError::image(format!("Failed to read camera frame: {}", e)))?;

            let decoded = buffer
                .decode_image::<RgbFormat>()
                .map_err(|e| AppError::image(format!("Failed to decode camera frame: {}", e)))?;

            // Rebuild through raw bytes; the backend may link a different `image` release.
            let (width, height) = (decoded.width(), decoded.height());
            let rgb = RgbImage::from_raw(width, height, decoded.into_raw())
                .ok_or_else(|| AppError::image("Camera frame has an unexpected size"))?;

            Ok(DynamicImage::ImageRgb8(rgb))
        }

        fn stop(&mut self) {
            if self.stopped {
                return;
            }
            self.stopped = true;
            if let Err(e) = self.camera.stop_stream() {
                tracing::warn!(error = %e, "failed to stop camera stream");
            }
        }
    }
}
