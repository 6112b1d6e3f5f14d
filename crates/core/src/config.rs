use crate::error::{AppError, Result};
use dotenvy::dotenv;
use std::env;

/// Image-capable model used when `GEMINI_IMAGE_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// Link handed out by the share action when `PHOTO_BOOTH_SHARE_URL` is not set.
pub const DEFAULT_SHARE_URL: &str = "https://enie.ai/photo-booth";

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: String,
    pub model_name: String,
    pub share_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let model_name = env::var("GEMINI_IMAGE_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let share_url = env::var("PHOTO_BOOTH_SHARE_URL")
            .unwrap_or_else(|_| DEFAULT_SHARE_URL.to_string());

        Self::builder()
            .with_api_key(api_key)
            .with_model(model_name)
            .with_share_url(share_url)
            .build()
    }

    /// Loads configuration, tolerating a missing API key.
    ///
    /// The window can start without a key; generation then fails with a
    /// configuration error until one is entered in the settings panel.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "generation is unavailable until a key is entered");
                Self::without_key()
            }
        }
    }

    // Environment is already loaded by `load` at this point.
    fn without_key() -> Self {
        let model_name = env::var("GEMINI_IMAGE_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let share_url = match env::var("PHOTO_BOOTH_SHARE_URL") {
            Ok(raw) if url::Url::parse(&raw).is_ok() => raw,
            Ok(raw) => {
                tracing::warn!(%raw, "ignoring invalid PHOTO_BOOTH_SHARE_URL");
                DEFAULT_SHARE_URL.to_string()
            }
            Err(_) => DEFAULT_SHARE_URL.to_string(),
        };

        Self {
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            model_name,
            share_url,
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    model: Option<String>,
    share_url: Option<String>,
}

impl ConfigBuilder {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_share_url(mut self, url: impl Into<String>) -> Self {
        self.share_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<Config> {
        let gemini_api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::config("A Gemini API key is required"))?;

        let model_name = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let share_url = self.share_url.unwrap_or_else(|| DEFAULT_SHARE_URL.to_string());
        url::Url::parse(&share_url)
            .map_err(|e| AppError::config(format!("Invalid share URL '{}': {}", share_url, e)))?;

        Ok(Config {
            gemini_api_key,
            model_name,
            share_url,
        })
    }
}
