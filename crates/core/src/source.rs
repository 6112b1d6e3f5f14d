//! Photo acquisition.
//!
//! The acquirer follows a small state machine:
//! `Idle -> CameraOpen -> (Idle on cancel | ImageReady on capture)`,
//! `Idle -> ImageReady` on file selection or drop, and
//! `ImageReady -> Idle` when the user chooses a different photo.

use crate::camera::{CameraDevice, CameraSession};
use crate::error::{AppError, Result};
use crate::image_processing::{is_image_mime, CapturedImage, ImageProcessor};
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};

/// A file dropped onto the window.
#[derive(Debug, Clone, Default)]
pub struct DroppedFile {
    pub name: String,
    pub path: Option<PathBuf>,
    /// Media type reported by the platform; often empty on desktop.
    pub mime: String,
    pub bytes: Option<Vec<u8>>,
}

impl DroppedFile {
    /// Declared media type, falling back to the file extension.
    pub fn declared_mime(&self) -> Option<String> {
        if !self.mime.trim().is_empty() {
            return Some(self.mime.trim().to_string());
        }
        let by_path = self
            .path
            .as_deref()
            .and_then(ImageProcessor::mime_from_path);
        let by_name = ImageProcessor::mime_from_path(Path::new(&self.name));
        by_path.or(by_name).map(str::to_string)
    }
}

/// Where the acquirer currently is.
#[derive(Default)]
pub enum SourceState {
    #[default]
    Idle,
    CameraOpen(CameraSession),
    ImageReady(CapturedImage),
}

/// Obtains the input photo from a file, a drop, or the camera.
#[derive(Default)]
pub struct ImageSourceAcquirer {
    state: SourceState,
    camera_error: Option<AppError>,
}

impl ImageSourceAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        match &self.state {
            SourceState::ImageReady(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_camera_open(&self) -> bool {
        matches!(&self.state, SourceState::CameraOpen(session) if session.is_active())
    }

    /// Last camera acquisition failure, shown until the next attempt.
    pub fn camera_error(&self) -> Option<&AppError> {
        self.camera_error.as_ref()
    }

    /// Reads an image file from disk.
    pub fn select_from_file(&mut self, path: &Path) -> Result<&CapturedImage> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::unreadable(format!("failed to read {}: {}", path.display(), e))
        })?;
        let declared = ImageProcessor::mime_from_path(path);
        self.select_from_bytes(&bytes, declared)
    }

    /// Accepts raw file content with its declared media type.
    ///
    /// On failure the previous state is kept.
    pub fn select_from_bytes(
        &mut self,
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> Result<&CapturedImage> {
        let image = ImageProcessor::captured_from_file_bytes(bytes, declared_mime)?;
        tracing::info!(mime = %image.mime_type, size = bytes.len(), "photo selected from file");
        Ok(self.set_image(image))
    }

    /// Handles a file dropped on the drop target.
    ///
    /// Files that do not declare an image type are ignored and yield
    /// `Ok(None)` without touching the current state.
    pub fn accept_drop(&mut self, file: &DroppedFile) -> Result<Option<&CapturedImage>> {
        let declared = match file.declared_mime() {
            Some(mime) if is_image_mime(&mime) => mime,
            _ => {
                tracing::debug!(name = %file.name, "ignoring non-image drop");
                return Ok(None);
            }
        };

        let bytes = match (&file.bytes, &file.path) {
            (Some(bytes), _) => bytes.clone(),
            (None, Some(path)) => fs::read(path).map_err(|e| {
                AppError::unreadable(format!("failed to read {}: {}", path.display(), e))
            })?,
            (None, None) => return Err(AppError::unreadable("the dropped file has no content")),
        };

        self.select_from_bytes(&bytes, Some(&declared)).map(Some)
    }

    /// Opens the camera for a live preview.
    ///
    /// Only allowed from `Idle`; a selected photo has to be discarded with
    /// [`choose_different`](Self::choose_different) first.
    pub fn start_camera(&mut self, device: &mut dyn CameraDevice) -> Result<()> {
        match self.state {
            SourceState::Idle => {}
            SourceState::CameraOpen(_) => return Err(AppError::CameraBusy),
            SourceState::ImageReady(_) => {
                return Err(AppError::precondition(
                    "Choose a different photo before opening the camera.",
                ));
            }
        }

        self.camera_error = None;
        match CameraSession::open(device) {
            Ok(session) => {
                self.state = SourceState::CameraOpen(session);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "camera unavailable");
                let shown = match &err {
                    AppError::PermissionDenied => AppError::PermissionDenied,
                    _ => AppError::DeviceUnavailable,
                };
                self.camera_error = Some(shown);
                Err(err)
            }
        }
    }

    /// Latest frame of the open camera, for the preview.
    pub fn preview_frame(&mut self) -> Option<Result<DynamicImage>> {
        match &mut self.state {
            SourceState::CameraOpen(session) => Some(session.preview_frame()),
            _ => None,
        }
    }

    /// Takes the snapshot and closes the camera.
    ///
    /// If the frame cannot be captured the camera is still released and the
    /// acquirer returns to `Idle`.
    pub fn capture_frame(&mut self) -> Result<&CapturedImage> {
        let session = match std::mem::take(&mut self.state) {
            SourceState::CameraOpen(session) => session,
            other => {
                self.state = other;
                return Err(AppError::precondition("The camera is not open"));
            }
        };

        let image = session.capture()?;
        tracing::info!("photo captured from camera");
        Ok(self.set_image(image))
    }

    /// Closes the camera without taking a photo.
    pub fn cancel_camera(&mut self) {
        if let SourceState::CameraOpen(session) = std::mem::take(&mut self.state) {
            session.cancel();
        }
    }

    /// Drops the selected photo and returns to `Idle`.
    pub fn choose_different(&mut self) {
        if let SourceState::ImageReady(_) = self.state {
            self.state = SourceState::Idle;
        }
    }

    /// Returns to `Idle` from any state, releasing the camera if open.
    pub fn clear(&mut self) {
        self.cancel_camera();
        self.state = SourceState::Idle;
        self.camera_error = None;
    }

    fn set_image(&mut self, image: CapturedImage) -> &CapturedImage {
        // Replacing a camera state drops the session, which stops the stream.
        self.state = SourceState::ImageReady(image);
        match &self.state {
            SourceState::ImageReady(image) => image,
            _ => unreachable!("state was just set to ImageReady"),
        }
    }
}
