//! UI state types and event definitions.

use crate::error::Result;
use crate::image_processing::GeneratedImage;
use eframe::egui;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Which screen the booth shows.
///
/// Derived from the session on every frame, never stored:
/// `Selection` (theme, photo, camera, generate) until a result exists, then
/// `Result` until the user starts over or picks another photo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Selection,
    Result,
}

impl Screen {
    pub fn for_result(has_result: bool) -> Self {
        if has_result { Self::Result } else { Self::Selection }
    }
}

/// Messages from the background generation thread to the UI thread.
pub(crate) enum GenerationEvent {
    /// The request for `ticket` completed, successfully or not.
    Finished {
        ticket: u64,
        outcome: Result<GeneratedImage>,
    },
}

/// A texture together with the content it was built from.
pub(crate) struct CachedTexture {
    key: u64,
    pub handle: egui::TextureHandle,
}

impl CachedTexture {
    pub fn new(key: u64, handle: egui::TextureHandle) -> Self {
        Self { key, handle }
    }

    pub fn matches(&self, key: u64) -> bool {
        self.key == key
    }
}

/// Cheap identity for base64 image content, used to detect a changed image.
pub(crate) fn content_key(data: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}
