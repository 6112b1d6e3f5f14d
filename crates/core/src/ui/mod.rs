//! User interface components for the photo booth.
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Screen selection and background event types
//! - [`settings`]: User preferences and persistence
//! - [`rendering`]: Drawing utilities for images, cards and badges
//! - [`booth`]: Main application logic
//!
//! # Usage
//!
//! ```ignore
//! use photo_booth_core::{camera, storage, ui, Config};
//!
//! let config = Config::load_or_default();
//! ui::run_booth_ui(config, storage::default_storage(), camera::default_camera())?;
//! ```

mod booth;
mod rendering;
mod settings;
mod state;

// Public API exports
pub use booth::BoothApp;
pub use settings::{Settings, AVAILABLE_MODELS};
pub use state::Screen;

use crate::camera::CameraDevice;
use crate::config::Config;
use crate::error::Result;
use crate::storage::Storage;

/// Launches the booth window and returns when the user closes it.
///
/// # Arguments
/// * `config` - Application configuration with API keys and settings
/// * `storage` - Durable storage for the credit counter
/// * `camera` - Device used for live capture
pub fn run_booth_ui(
    config: Config,
    storage: Box<dyn Storage>,
    camera: Box<dyn CameraDevice>,
) -> Result<()> {
    booth::run(config, storage, camera)
}
