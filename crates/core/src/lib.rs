//! Photo Booth Core Library
//!
//! This library provides the core functionality for the ENIE AI Christmas
//! photo booth: picking a theme, acquiring a photo, turning it into a themed
//! picture with Gemini, and keeping a local count of remaining credits.
//!
//! # Overview
//!
//! - **Themes**: The static preset catalog via the [`themes`] module
//! - **Photo Acquisition**: File, drag-and-drop and camera input via [`source`] and [`camera`]
//! - **Credits**: The persisted usage quota via [`quota`] and [`storage`]
//! - **Generation**: The per-session workflow via [`session`], backed by [`gemini`]
//! - **Results**: Download and share helpers via [`presenter`]
//! - **User Interface**: The booth window via [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use photo_booth_core::{PhotoBooth, PhotoSource};
//!
//! let booth = PhotoBooth::new();
//! let picture = booth
//!     .generate("party", PhotoSource::File("me.jpg".into()))
//!     .await?;
//! ```
//!
//! # Module Structure
//!
//! - [`camera`]: Camera devices and scoped capture sessions
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`gemini`]: Gemini image generation client
//! - [`image_processing`]: Image types and encoding
//! - [`presenter`]: Download and share actions
//! - [`quota`]: Credit counter
//! - [`session`]: Generation workflow state machine
//! - [`source`]: Photo acquisition state machine
//! - [`storage`]: Durable key/value storage
//! - [`themes`]: Style preset catalog
//! - [`ui`]: User interface components

pub mod camera;
pub mod config;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod presenter;
pub mod quota;
pub mod session;
pub mod source;
pub mod storage;
pub mod themes;
pub mod ui;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use gemini::GeminiClient;
pub use image_processing::{CapturedImage, GeneratedImage};
pub use quota::{QuotaState, QuotaStore};
pub use session::{BoothSession, ImageGenerator};
pub use themes::Theme;

use std::path::PathBuf;
use storage::Storage;

/// Where a headless generation takes its photo from.
#[derive(Debug, Clone)]
pub enum PhotoSource {
    File(PathBuf),
    /// One snapshot from the default camera.
    Camera,
}

/// Main entry point for the photo booth.
///
/// This struct provides a facade over the various subsystems. Credits are
/// read from and written to the default storage on every call, so the window
/// and the headless commands share one counter.
pub struct PhotoBooth {
    config: Config,
}

impl PhotoBooth {
    /// Creates a booth with configuration from the environment.
    ///
    /// A missing API key is tolerated here; it is reported when a generation
    /// is attempted.
    pub fn new() -> Self {
        Self {
            config: Config::load_or_default(),
        }
    }

    /// Creates a booth with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// All selectable themes.
    pub fn themes(&self) -> &'static [Theme] {
        themes::THEMES
    }

    /// Remaining credits.
    pub fn quota(&self) -> QuotaState {
        QuotaStore::load(storage::default_storage()).state()
    }

    /// Restores the credits when `code` is the refill code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRefillCode`] on a mismatch.
    pub fn refill(&self, code: &str) -> Result<QuotaState> {
        QuotaStore::load(storage::default_storage()).try_refill(code)
    }

    /// Launches the booth window.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created.
    pub fn run_interactive(self) -> Result<()> {
        ui::run_booth_ui(
            self.config,
            storage::default_storage(),
            camera::default_camera(),
        )
    }

    /// Runs a single generation without the window.
    ///
    /// Consumes one credit on success, none on failure.
    ///
    /// # Errors
    ///
    /// - [`AppError::MissingEnvVar`] when no API key is configured
    /// - any precondition, acquisition or service error of the flow
    pub async fn generate(&self, theme_id: &str, photo: PhotoSource) -> Result<GeneratedImage> {
        if self.config.gemini_api_key.trim().is_empty() {
            return Err(AppError::MissingEnvVar("GEMINI_API_KEY".to_string()));
        }

        let mut session = BoothSession::new(QuotaStore::load(storage::default_storage()));
        self.run_session(&mut session, theme_id, photo).await
    }

    async fn run_session<S: Storage>(
        &self,
        session: &mut BoothSession<S>,
        theme_id: &str,
        photo: PhotoSource,
    ) -> Result<GeneratedImage> {
        session.select_theme(theme_id)?;

        match photo {
            PhotoSource::File(path) => session.select_from_file(&path)?,
            PhotoSource::Camera => {
                let mut device = camera::default_camera();
                session.start_camera(device.as_mut())?;
                session.capture_frame()?;
            }
        }

        let client = GeminiClient::new(&self.config)?;
        session.generate(&client).await.cloned()
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    ///
    /// Allows modifying settings like the model name after initialization.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

impl Default for PhotoBooth {
    fn default() -> Self {
        Self::new()
    }
}
