//! Download and share actions for a finished picture.

use crate::config::Config;
use crate::error::Result;
use crate::image_processing::{GeneratedImage, ImageProcessor};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Name every downloaded picture is saved under.
pub const DOWNLOAD_FILE_NAME: &str = "enie-christmas-image.png";

/// Saves the generated picture as `dir/enie-christmas-image.png`.
///
/// PNG results are written byte for byte; other formats are re-encoded so the
/// file content matches its extension. An existing file is overwritten.
pub fn download(result: &GeneratedImage, dir: &Path) -> Result<PathBuf> {
    let bytes = result.bytes()?;
    let png = if result.mime_type.eq_ignore_ascii_case("image/png") {
        bytes
    } else {
        ImageProcessor::encode_png(&ImageProcessor::decode(&bytes)?)?
    };

    fs::create_dir_all(dir)?;
    let path = dir.join(DOWNLOAD_FILE_NAME);
    fs::write(&path, png)?;

    tracing::info!(path = %path.display(), "picture saved");
    Ok(path)
}

/// The user's download folder, or the working directory when there is none.
pub fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Link that opens the booth on another device.
pub fn share_link(config: &Config) -> &str {
    &config.share_url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::tests::sample_png;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn png_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let png = sample_png();
        let result = GeneratedImage::from_bytes(&png, "image/png");

        let path = download(&result, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), DOWNLOAD_FILE_NAME);
        assert_eq!(fs::read(&path).unwrap(), png);
    }

    #[test]
    fn jpeg_is_converted_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 5, Rgb([9, 9, 9])));
        let jpeg = ImageProcessor::encode_jpeg(&frame).unwrap();
        let result = GeneratedImage::from_bytes(&jpeg, "image/jpeg");

        let path = download(&result, dir.path()).unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(
            image::guess_format(&written).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[test]
    fn share_link_comes_from_config() {
        let config = Config::builder()
            .with_api_key("k")
            .with_share_url("https://example.com/booth")
            .build()
            .unwrap();
        assert_eq!(share_link(&config), "https://example.com/booth");
    }
}
