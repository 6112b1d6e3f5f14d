//! Main photo booth window.
//!
//! This module contains the `BoothApp` struct which implements the
//! `eframe::App` trait. All state lives in a [`BoothSession`]; this file only
//! draws it and forwards user actions.

use super::rendering::{
    draw_selection_border, quota_badge, show_texture, to_color_image, ACCENT,
};
use super::settings::{Settings, AVAILABLE_MODELS};
use super::state::{content_key, CachedTexture, GenerationEvent, Screen};
use crate::camera::CameraDevice;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gemini::GeminiClient;
use crate::presenter;
use crate::quota::QuotaStore;
use crate::session::BoothSession;
use crate::source::DroppedFile;
use crate::storage::Storage;
use crate::themes::THEMES;
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

const CARD_WIDTH: f32 = 220.0;
const CARD_PREVIEW_HEIGHT: f32 = 150.0;
const PREVIEW_BOUNDS: egui::Vec2 = egui::vec2(640.0, 420.0);
const RESULT_BOUNDS: egui::Vec2 = egui::vec2(460.0, 460.0);
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

/// The photo booth application.
pub struct BoothApp {
    session: BoothSession<Box<dyn Storage>>,
    camera: Box<dyn CameraDevice>,
    config: Config,

    // Background generation
    rx: Receiver<GenerationEvent>,
    tx: Sender<GenerationEvent>,

    // Texture cache
    input_texture: Option<CachedTexture>,
    result_texture: Option<CachedTexture>,
    camera_texture: Option<egui::TextureHandle>,

    // Form state
    refill_input: String,
    notice: Option<String>,

    // Settings
    settings: Settings,
    show_settings: bool,
}

impl BoothApp {
    /// Creates the booth window state.
    ///
    /// # Arguments
    /// * `config` - Application configuration
    /// * `storage` - Durable storage for the credit counter
    /// * `camera` - Device used by the "Take Photo" action
    pub fn new(config: Config, storage: Box<dyn Storage>, camera: Box<dyn CameraDevice>) -> Self {
        let (tx, rx) = channel();

        // Load settings, using config's API key as fallback
        let mut settings = Settings::load(&config.model_name);
        if settings.api_key.is_empty() {
            settings.api_key = config.gemini_api_key.clone();
        }

        Self {
            session: BoothSession::new(QuotaStore::load(storage)),
            camera,
            config,
            rx,
            tx,
            input_texture: None,
            result_texture: None,
            camera_texture: None,
            refill_input: String::new(),
            notice: None,
            settings,
            show_settings: false,
        }
    }

    /// Starts a generation on a background thread.
    ///
    /// Precondition failures are recorded in the session status and shown by
    /// the next frame; nothing is spawned for them, nor without an API key.
    fn submit_generation(&mut self, ctx: &egui::Context) {
        if !self.settings.has_api_key() {
            self.notice = Some("Enter a Gemini API key in the settings first.".to_string());
            self.show_settings = true;
            return;
        }

        let ticket = match self.session.begin_generation() {
            Ok(ticket) => ticket,
            Err(_) => return,
        };
        self.notice = None;

        if let Err(e) = self.settings.save() {
            tracing::warn!(error = %e, "failed to save settings");
        }

        let task_config = Config::builder()
            .with_api_key(&self.settings.api_key)
            .with_model(&self.settings.model)
            .with_share_url(&self.config.share_url)
            .build();

        let tx = self.tx.clone();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let outcome = run_generation(task_config, &ticket.image, ticket.prompt);
            let _ = tx.send(GenerationEvent::Finished {
                ticket: ticket.id,
                outcome,
            });
            ctx.request_repaint();
        });
    }

    /// Applies results coming back from the background thread.
    fn process_generation_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                GenerationEvent::Finished { ticket, outcome } => {
                    self.session.finish_generation(ticket, outcome);
                }
            }
        }
    }

    /// Feeds files dropped on the window into the session.
    fn process_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        // Only the first file counts, like a single-file picker.
        if let Some(file) = dropped.into_iter().next() {
            let file = DroppedFile {
                name: file.name,
                path: file.path,
                mime: file.mime,
                bytes: file.bytes.map(|b| b.to_vec()),
            };
            if self.session.is_loading() {
                return;
            }
            if self.session.source().is_camera_open() {
                self.session.cancel_camera();
            }
            let _ = self.session.accept_drop(&file);
        }
    }

    fn pick_file(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Choose a photo")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file();

        if let Some(path) = picked {
            // Errors land in the session status.
            let _ = self.session.select_from_file(&path);
        }
    }

    fn reset(&mut self) {
        self.session.reset();
        self.input_texture = None;
        self.result_texture = None;
        self.camera_texture = None;
        self.refill_input.clear();
        self.notice = None;
    }

    /// Keeps the cached textures in sync with the session's images.
    fn refresh_textures(&mut self, ctx: &egui::Context) {
        match self.session.image() {
            Some(image) => {
                let key = content_key(&image.data);
                if !self.input_texture.as_ref().is_some_and(|t| t.matches(key)) {
                    self.input_texture = match image.decode() {
                        Ok(decoded) => Some(CachedTexture::new(
                            key,
                            ctx.load_texture("input", to_color_image(&decoded), egui::TextureOptions::LINEAR),
                        )),
                        Err(e) => {
                            tracing::warn!(error = %e, "cannot preview selected photo");
                            None
                        }
                    };
                }
            }
            None => self.input_texture = None,
        }

        match self.session.result() {
            Some(result) => {
                let key = content_key(&result.data);
                if !self.result_texture.as_ref().is_some_and(|t| t.matches(key)) {
                    self.result_texture = match result.decode() {
                        Ok(decoded) => Some(CachedTexture::new(
                            key,
                            ctx.load_texture("result", to_color_image(&decoded), egui::TextureOptions::LINEAR),
                        )),
                        Err(e) => {
                            tracing::warn!(error = %e, "cannot preview generated picture");
                            None
                        }
                    };
                }
            }
            None => self.result_texture = None,
        }
    }

    /// Renders the header with title, credits badge and settings toggle.
    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new("ENIE AI Christmas Photo Booth").color(ACCENT).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⚙").clicked() {
                    self.show_settings = !self.show_settings;
                }
                let (text, color) = quota_badge(self.session.quota());
                ui.label(egui::RichText::new(text).monospace().strong().color(color));
            });
        });

        if self.show_settings {
            self.render_settings_ui(ui);
        }
    }

    /// Renders the settings panel.
    fn render_settings_ui(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.label("Settings");

        // Model selector
        egui::ComboBox::from_label("Model")
            .selected_text(&self.settings.model)
            .show_ui(ui, |ui| {
                for model in AVAILABLE_MODELS {
                    ui.selectable_value(&mut self.settings.model, model.to_string(), *model);
                }
            });

        // API Key
        ui.label("API Key:");
        ui.add(
            egui::TextEdit::singleline(&mut self.settings.api_key)
                .password(true)
                .hint_text("Paste Gemini API Key"),
        );
    }

    /// Renders step 1: the theme cards.
    fn render_theme_picker(&mut self, ui: &mut egui::Ui) {
        ui.heading("1. Choose Your Theme");
        ui.add_space(6.0);

        let selected = self.session.theme().map(|t| t.id);
        let mut clicked = None;

        ui.horizontal_wrapped(|ui| {
            for theme in THEMES {
                let response = egui::Frame::group(ui.style())
                    .show(ui, |ui| {
                        ui.set_width(CARD_WIDTH);
                        ui.add(
                            egui::Image::from_uri(theme.preview_image_url)
                                .fit_to_exact_size(egui::vec2(CARD_WIDTH, CARD_PREVIEW_HEIGHT)),
                        );
                        ui.label(egui::RichText::new(theme.title).strong().size(16.0));
                        ui.label(
                            egui::RichText::new(theme.description)
                                .small()
                                .color(egui::Color32::GRAY),
                        );
                    })
                    .response
                    .interact(egui::Sense::click());

                if response.clicked() {
                    clicked = Some(theme.id);
                }
                if selected == Some(theme.id) {
                    draw_selection_border(ui.painter(), response.rect, 2.0, ACCENT);
                }
            }
        });

        if let Some(id) = clicked {
            let _ = self.session.select_theme(id);
        }
    }

    /// Renders step 2: photo preview, live camera, or the upload choices.
    fn render_photo_source(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("2. Upload Your Photo");
        ui.add_space(6.0);

        if let Some(texture) = &self.input_texture {
            show_texture(ui, &texture.handle, PREVIEW_BOUNDS);
            if ui
                .add_enabled(!self.session.is_loading(), egui::Button::new("Choose different photo"))
                .clicked()
            {
                self.session.choose_different();
            }
            return;
        }

        if self.session.source().is_camera_open() {
            self.render_camera(ui, ctx);
            return;
        }

        ui.horizontal(|ui| {
            if ui.button("🖼 Upload Photo").clicked() {
                self.pick_file();
            }
            ui.label("OR");
            if ui.button("📷 Take Photo").clicked() {
                // Failures are kept on the acquirer and shown below.
                let _ = self.session.start_camera(self.camera.as_mut());
            }
        });
        ui.label(egui::RichText::new("Drag & drop image here").small().color(egui::Color32::GRAY));

        if let Some(err) = self.session.source().camera_error() {
            ui.add_space(6.0);
            ui.label(egui::RichText::new("Camera Error").strong().color(egui::Color32::LIGHT_RED));
            ui.label(egui::RichText::new(err.user_message()).color(egui::Color32::LIGHT_RED));
        }
    }

    /// Renders the live camera preview with capture and cancel buttons.
    fn render_camera(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        match self.session.source_mut().preview_frame() {
            Some(Ok(frame)) => {
                let image = to_color_image(&frame);
                match &mut self.camera_texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.camera_texture =
                            Some(ctx.load_texture("camera", image, egui::TextureOptions::LINEAR));
                    }
                }
            }
            Some(Err(e)) => tracing::debug!(error = %e, "camera frame unavailable"),
            None => {}
        }

        if let Some(texture) = &self.camera_texture {
            show_texture(ui, texture, PREVIEW_BOUNDS);
        } else {
            ui.spinner();
        }

        ui.horizontal(|ui| {
            if ui.button("Cancel").clicked() {
                self.session.cancel_camera();
                self.camera_texture = None;
            }
            if ui.button(egui::RichText::new("⏺ Capture").color(ACCENT)).clicked() {
                let _ = self.session.capture_frame();
                self.camera_texture = None;
            }
        });

        // Keep the preview live
        ctx.request_repaint();
    }

    /// Renders the refill prompt shown when credits run out.
    fn render_refill(&mut self, ui: &mut egui::Ui) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(egui::RichText::new("Out of Credits!").strong().color(egui::Color32::LIGHT_RED));
            ui.label("Please enter the refill code to continue generating images.");
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.refill_input)
                        .hint_text("Enter Code (e.g. ENIE...)"),
                );
                if ui.button("Refill").clicked() {
                    match self.session.submit_refill(&self.refill_input) {
                        Ok(_) => {
                            self.refill_input.clear();
                            self.notice = Some("Credits successfully refilled!".to_string());
                        }
                        Err(e) => self.notice = Some(e.user_message()),
                    }
                }
            });
        });
    }

    /// Renders the selection screen (steps 1 and 2 plus the generate button).
    fn render_selection_screen(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        self.render_theme_picker(ui);
        ui.add_space(16.0);
        self.render_photo_source(ui, ctx);
        ui.add_space(16.0);

        let quota = self.session.quota();
        if self.session.status().refill_prompt_visible || quota.is_exhausted() {
            self.render_refill(ui);
            ui.add_space(8.0);
        }

        if let Some(error) = &self.session.status().error {
            ui.label(egui::RichText::new(error).color(egui::Color32::LIGHT_RED));
        }
        if let Some(notice) = &self.notice {
            ui.label(notice);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let label = if quota.is_exhausted() { "No Credits Left" } else { "✨ Generate Magic" };
            let button = egui::Button::new(egui::RichText::new(label).size(20.0).strong());
            if ui.add_enabled(self.session.can_generate(), button).clicked() {
                self.submit_generation(ctx);
            }
            if self.session.is_loading() {
                ui.spinner();
                ui.label("Creating your masterpiece...");
            }
        });
    }

    /// Renders the result screen: original and generated side by side.
    fn render_result_screen(&mut self, ui: &mut egui::Ui) {
        ui.heading(egui::RichText::new("Your Masterpiece is Ready!").color(ACCENT));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label("Original");
                if let Some(texture) = &self.input_texture {
                    show_texture(ui, &texture.handle, RESULT_BOUNDS);
                }
            });
            ui.vertical(|ui| {
                ui.label("Generated");
                if let Some(texture) = &self.result_texture {
                    show_texture(ui, &texture.handle, RESULT_BOUNDS);
                }
            });
        });

        ui.separator();
        ui.label("Save your new image or share this booth with others.");

        let mut start_over = false;
        ui.horizontal(|ui| {
            if ui.button("Download Image").clicked() {
                self.notice = Some(self.download_result());
            }
            if ui.button("Share Link").clicked() {
                self.notice = Some(self.copy_share_link());
            }
            if ui.button("Create Another").clicked() {
                start_over = true;
            }
        });

        if let Some(notice) = &self.notice {
            ui.label(notice);
        }

        if start_over {
            self.reset();
        }
    }

    fn download_result(&self) -> String {
        let Some(result) = self.session.result() else {
            return "Nothing to download yet.".to_string();
        };
        match presenter::download(result, &presenter::default_download_dir()) {
            Ok(path) => format!("Saved to {}", path.display()),
            Err(e) => {
                tracing::warn!(error = %e, "download failed");
                format!("Could not save the image: {}", e)
            }
        }
    }

    fn copy_share_link(&self) -> String {
        let link = presenter::share_link(&self.config);
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(link)) {
            Ok(()) => format!("Link copied: {}", link),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard unavailable");
                format!("Share this link: {}", link)
            }
        }
    }
}

/// Runs one generation request to completion on a private runtime.
fn run_generation(
    config: Result<Config>,
    image: &crate::image_processing::CapturedImage,
    prompt: &str,
) -> Result<crate::image_processing::GeneratedImage> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Unknown(format!("Failed to create async runtime: {}", e)))?;

    let client = GeminiClient::new(&config?)?;
    runtime.block_on(client.generate_themed_image(image, prompt))
}

impl eframe::App for BoothApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Enforce dark mode
        ctx.set_visuals(egui::Visuals::dark());

        self.process_generation_events();
        self.process_dropped_files(ctx);
        self.refresh_textures(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.render_header(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                match Screen::for_result(self.session.result().is_some()) {
                    Screen::Selection => self.render_selection_screen(ui, ctx),
                    Screen::Result => self.render_result_screen(ui),
                }
            });
        });
    }
}

/// Launches the booth window and blocks until it is closed.
///
/// The camera is released when the window closes, whatever state it was in,
/// because dropping the app drops the session that owns it.
pub fn run(config: Config, storage: Box<dyn Storage>, camera: Box<dyn CameraDevice>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 860.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "ENIE AI Christmas Photo Booth",
        options,
        Box::new(move |cc| {
            // Theme previews are fetched over http
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(BoothApp::new(config, storage, camera)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
