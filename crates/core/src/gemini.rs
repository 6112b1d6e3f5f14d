use crate::config::Config;
use crate::error::{AppError, Result};
use crate::image_processing::{CapturedImage, GeneratedImage};
use crate::session::ImageGenerator;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use gemini_rust::{Blob, Content, Gemini, GenerationResponse, Message, Part, Role};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

pub struct GeminiClient {
    client: Gemini,
    model_name: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Explicit base URL; the default one trips a BadScheme error in some builds
        let base_url = url::Url::parse(BASE_URL)
            .map_err(|e| AppError::Config(format!("Invalid base URL: {}", e)))?;

        let model_name = if config.model_name.starts_with("models/") {
            config.model_name.clone()
        } else {
            format!("models/{}", config.model_name)
        };
        let model_url = format!("{}{}", BASE_URL, model_name);

        let client = Gemini::with_model_and_base_url(&config.gemini_api_key, model_url, base_url)
            .map_err(|e| AppError::Config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self { client, model_name })
    }

    /// Sends the photo and the theme prompt, returning the generated picture.
    pub async fn generate_themed_image(
        &self,
        image: &CapturedImage,
        prompt: &str,
    ) -> Result<GeneratedImage> {
        let image_part = Part::InlineData {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
            media_resolution: None,
        };

        let text_part = Part::Text {
            text: prompt.to_string(),
            thought: None,
            thought_signature: None,
        };

        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(vec![image_part, text_part]),
            },
        };

        tracing::info!(model = %self.model_name, mime = %image.mime_type, "requesting themed image");

        let response = self
            .client
            .generate_content()
            .with_messages(vec![message])
            .execute()
            .await
            .map_err(|e| classify_request_error(&e.to_string()))?;

        extract_image(&response)
    }
}

impl ImageGenerator for GeminiClient {
    fn generate<'a>(
        &'a self,
        image: &'a CapturedImage,
        prompt: &'a str,
    ) -> LocalBoxFuture<'a, Result<GeneratedImage>> {
        self.generate_themed_image(image, prompt).boxed_local()
    }
}

/// Picks the first inline image out of a response.
///
/// When the model answers with text only (a refusal, usually) that text
/// becomes the error message.
fn extract_image(response: &GenerationResponse) -> Result<GeneratedImage> {
    let mut text = String::new();

    for candidate in &response.candidates {
        let Some(parts) = &candidate.content.parts else {
            continue;
        };
        for part in parts {
            match part {
                Part::InlineData { inline_data, .. } if !inline_data.data.is_empty() => {
                    tracing::info!(mime = %inline_data.mime_type, "received generated image");
                    return Ok(GeneratedImage {
                        data: inline_data.data.clone(),
                        mime_type: inline_data.mime_type.clone(),
                    });
                }
                Part::Text { text: chunk, .. } => text.push_str(chunk),
                _ => {}
            }
        }
    }

    let text = text.trim();
    tracing::warn!(reply = %text, "response contained no image");
    if text.is_empty() {
        Err(AppError::generation(
            "The model did not return an image. Please try again.",
        ))
    } else {
        Err(AppError::generation(format!(
            "The model did not return an image: {}",
            text
        )))
    }
}

/// Maps a failed request onto the error taxonomy.
pub(crate) fn classify_request_error(message: &str) -> AppError {
    tracing::warn!(error = %message, "generation request failed");
    if message.contains("429") || message.contains("RESOURCE_EXHAUSTED") {
        AppError::RateLimited
    } else {
        AppError::GenerationService(format!("Image generation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_are_recognized() {
        assert!(matches!(
            classify_request_error("status 429 Too Many Requests"),
            AppError::RateLimited
        ));
        assert!(matches!(
            classify_request_error("RESOURCE_EXHAUSTED: quota"),
            AppError::RateLimited
        ));
    }

    #[test]
    fn other_failures_keep_their_message() {
        let err = classify_request_error("connection reset by peer");
        assert!(err.user_message().contains("connection reset by peer"));
    }

    fn response(parts: serde_json::Value) -> GenerationResponse {
        serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": parts } }]
        }))
        .unwrap()
    }

    #[test]
    fn first_inline_image_is_returned() {
        let reply = response(serde_json::json!([
            { "text": "Here you go" },
            { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } },
            { "inlineData": { "mimeType": "image/jpeg", "data": "d29ybGQ=" } }
        ]));
        let image = extract_image(&reply).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[test]
    fn text_only_reply_becomes_the_error() {
        let reply = response(serde_json::json!([{ "text": "I can't edit this photo." }]));
        let err = extract_image(&reply).unwrap_err();
        assert!(err.user_message().contains("I can't edit this photo."));
    }

    #[test]
    fn client_builds_with_bare_model_name() {
        let config = Config::builder()
            .with_api_key("test-key")
            .with_model("gemini-2.5-flash-image")
            .build()
            .unwrap();
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.model_name, "models/gemini-2.5-flash-image");
    }
}
