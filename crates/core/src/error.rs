//! Error types for the photo-booth-core library.
//!
//! This module provides granular error variants for every failure mode of the
//! booth flow. All of them are terminal to the current action only; the UI
//! turns them into a message with [`AppError::user_message`] and carries on.

use thiserror::Error;

/// Message shown when a generation failure cannot be classified.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred. Please try again.";

/// Errors that can occur within the photo-booth-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing keys, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required environment variable was not found.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Generation was attempted without a theme or an image.
    #[error("{0}")]
    Precondition(String),

    /// The local quota is exhausted; a refill code is required.
    #[error("You have run out of credits. Please enter the code to refill.")]
    NoCredits,

    /// A generation request is already pending for this session.
    #[error("A generation is already in progress")]
    GenerationInFlight,

    /// The user declined camera access.
    #[error(
        "Camera access was denied. Please allow camera access in your system privacy settings."
    )]
    PermissionDenied,

    /// No usable camera, or the camera is held by another application.
    #[error(
        "Unable to access camera. Please make sure your device has a camera and it is not in use."
    )]
    DeviceUnavailable,

    /// A camera session is already open.
    #[error("The camera is already open")]
    CameraBusy,

    /// The selected file could not be read or decoded as an image.
    #[error("Could not read that file as an image: {0}")]
    UnreadableFile(String),

    /// Image processing or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The generation service reported a failure.
    #[error("{0}")]
    GenerationService(String),

    /// Rate limited by the Gemini API.
    #[error("Rate limited by Gemini API, please retry later")]
    RateLimited,

    /// The refill code did not match.
    #[error("Invalid code. Please try again.")]
    InvalidRefillCode,

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An unclassified error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a precondition error with the given message.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Creates an unreadable-file error with the given message.
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self::UnreadableFile(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates a generation service error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::GenerationService(msg.into())
    }

    /// Creates a storage error with the given message.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }

    /// Text to show the user for this error.
    ///
    /// Service errors pass their message through; anything that cannot be
    /// described collapses to [`UNKNOWN_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::GenerationService(msg) | Self::Precondition(msg) if !msg.trim().is_empty() => {
                msg.clone()
            }
            Self::GenerationService(_) | Self::Precondition(_) | Self::Unknown(_) => {
                UNKNOWN_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
