//! UI rendering helpers.
//!
//! Reusable drawing functions for the booth window: image textures, the
//! selected-card highlight and the credits badge.

use crate::quota::QuotaState;
use eframe::egui;
use image::DynamicImage;

/// Accent color used for selection and primary actions.
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);

/// Converts a decoded image into egui's texture format.
///
/// This is the expensive step of showing an image; callers cache the
/// resulting texture instead of converting every frame.
pub fn to_color_image(image: &DynamicImage) -> egui::ColorImage {
    let buffer = image.to_rgba8();
    let size = [image.width() as usize, image.height() as usize];
    let pixels = buffer.as_flat_samples();
    egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice())
}

/// Scales `image_size` down to fit inside `bounds`, keeping the aspect ratio.
///
/// Images smaller than the bounds are not enlarged.
pub fn fit_size(image_size: egui::Vec2, bounds: egui::Vec2) -> egui::Vec2 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return egui::Vec2::ZERO;
    }
    let scale = (bounds.x / image_size.x)
        .min(bounds.y / image_size.y)
        .min(1.0);
    image_size * scale
}

/// Shows a texture scaled to fit `bounds`.
pub fn show_texture(ui: &mut egui::Ui, texture: &egui::TextureHandle, bounds: egui::Vec2) {
    let size = fit_size(texture.size_vec2(), bounds);
    ui.add(egui::Image::from_texture(egui::load::SizedTexture::new(
        texture.id(),
        size,
    )));
}

/// Draws a border around a selected card.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `rect` - The card area
/// * `stroke_width` - Width of the border line
/// * `color` - Color of the border
pub fn draw_selection_border(
    painter: &egui::Painter,
    rect: egui::Rect,
    stroke_width: f32,
    color: egui::Color32,
) {
    painter.rect_stroke(
        rect,
        6.0,
        egui::Stroke::new(stroke_width, color),
        egui::StrokeKind::Middle,
    );
}

/// Text and color of the credits badge.
pub fn quota_badge(state: QuotaState) -> (String, egui::Color32) {
    let text = format!("Credits: {} / {}", state.remaining, state.max);
    let color = if state.is_exhausted() {
        egui::Color32::from_rgb(254, 202, 202)
    } else {
        egui::Color32::from_rgb(74, 222, 128)
    };
    (text, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_images_shrink_to_fit() {
        let size = fit_size(egui::vec2(4000.0, 2000.0), egui::vec2(400.0, 400.0));
        assert_eq!(size, egui::vec2(400.0, 200.0));
    }

    #[test]
    fn small_images_keep_their_size() {
        let size = fit_size(egui::vec2(100.0, 50.0), egui::vec2(400.0, 400.0));
        assert_eq!(size, egui::vec2(100.0, 50.0));
    }

    #[test]
    fn degenerate_images_have_no_size() {
        assert_eq!(
            fit_size(egui::vec2(0.0, 10.0), egui::vec2(400.0, 400.0)),
            egui::Vec2::ZERO
        );
    }

    #[test]
    fn badge_reflects_exhaustion() {
        let (text, ok) = quota_badge(QuotaState { remaining: 3, max: 200 });
        assert_eq!(text, "Credits: 3 / 200");

        let (_, empty) = quota_badge(QuotaState { remaining: 0, max: 200 });
        assert_ne!(ok, empty);
    }

    #[test]
    fn color_image_matches_dimensions() {
        let img = DynamicImage::new_rgb8(7, 3);
        assert_eq!(to_color_image(&img).size, [7, 3]);
    }
}
