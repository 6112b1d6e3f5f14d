//! Per-session booth state and the generation workflow.
//!
//! A [`BoothSession`] owns everything that lives for one visit at the booth:
//! the chosen theme, the photo, the generated result and the status shown to
//! the user. The [`QuotaStore`] is injected and is the only piece that
//! outlives the session.
//!
//! Generation is an explicit `Idle -> Loading -> {Success, Failure}`
//! transition. [`BoothSession::begin_generation`] moves into `Loading` and
//! hands out a [`GenerationTicket`]; whoever runs the request reports back
//! with [`BoothSession::finish_generation`]. Only one ticket can be
//! outstanding at a time.

use crate::camera::CameraDevice;
use crate::error::{AppError, Result};
use crate::image_processing::{CapturedImage, GeneratedImage};
use crate::quota::{QuotaState, QuotaStore};
use crate::source::{DroppedFile, ImageSourceAcquirer};
use crate::storage::Storage;
use crate::themes::{self, Theme};
use futures::future::LocalBoxFuture;
use std::path::Path;

/// The external image-generation service.
///
/// One call per generation; failures are final and never retried here.
pub trait ImageGenerator {
    fn generate<'a>(
        &'a self,
        image: &'a CapturedImage,
        prompt: &'a str,
    ) -> LocalBoxFuture<'a, Result<GeneratedImage>>;
}

/// Transient status shown alongside the flow. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub refill_prompt_visible: bool,
}

/// Everything needed to run one generation request off the UI thread.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub id: u64,
    pub image: CapturedImage,
    pub prompt: &'static str,
    pub theme_id: &'static str,
}

/// State of one user's pass through the booth.
pub struct BoothSession<S: Storage> {
    theme: Option<&'static Theme>,
    source: ImageSourceAcquirer,
    result: Option<GeneratedImage>,
    quota: QuotaStore<S>,
    status: UiStatus,
    pending: Option<u64>,
    next_ticket: u64,
}

impl<S: Storage> BoothSession<S> {
    pub fn new(quota: QuotaStore<S>) -> Self {
        let mut session = Self {
            theme: None,
            source: ImageSourceAcquirer::new(),
            result: None,
            quota,
            status: UiStatus::default(),
            pending: None,
            next_ticket: 0,
        };
        session.status.refill_prompt_visible = !session.quota.can_generate();
        session
    }

    pub fn theme(&self) -> Option<&'static Theme> {
        self.theme
    }

    pub fn source(&self) -> &ImageSourceAcquirer {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut ImageSourceAcquirer {
        &mut self.source
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.source.image()
    }

    pub fn result(&self) -> Option<&GeneratedImage> {
        self.result.as_ref()
    }

    pub fn status(&self) -> &UiStatus {
        &self.status
    }

    pub fn quota(&self) -> QuotaState {
        self.quota.state()
    }

    pub fn is_loading(&self) -> bool {
        self.status.loading
    }

    /// Whether the generate control should be enabled.
    pub fn can_generate(&self) -> bool {
        self.theme.is_some()
            && self.source.image().is_some()
            && !self.status.loading
            && self.quota.can_generate()
    }

    pub fn select_theme(&mut self, id: &str) -> Result<&'static Theme> {
        let theme = themes::find(id)
            .ok_or_else(|| AppError::precondition(format!("Unknown theme '{}'", id)))?;
        tracing::debug!(theme = theme.id, "theme selected");
        self.theme = Some(theme);
        Ok(theme)
    }

    pub fn select_from_file(&mut self, path: &Path) -> Result<()> {
        let outcome = self.source.select_from_file(path).map(|_| ());
        self.after_selection(outcome)
    }

    pub fn select_from_bytes(&mut self, bytes: &[u8], declared_mime: Option<&str>) -> Result<()> {
        let outcome = self.source.select_from_bytes(bytes, declared_mime).map(|_| ());
        self.after_selection(outcome)
    }

    /// Returns whether the drop produced a new photo.
    pub fn accept_drop(&mut self, file: &DroppedFile) -> Result<bool> {
        match self.source.accept_drop(file).map(|image| image.is_some()) {
            Ok(true) => self.after_selection(Ok(())).map(|_| true),
            Ok(false) => Ok(false),
            Err(err) => self.after_selection(Err(err)).map(|_| false),
        }
    }

    /// Opens the camera. Only possible while no photo is selected, so a
    /// result is never left without the photo it came from.
    pub fn start_camera(&mut self, device: &mut dyn CameraDevice) -> Result<()> {
        self.source.start_camera(device)?;
        self.result = None;
        self.status.error = None;
        Ok(())
    }

    pub fn capture_frame(&mut self) -> Result<()> {
        let outcome = self.source.capture_frame().map(|_| ());
        self.after_selection(outcome)
    }

    pub fn cancel_camera(&mut self) {
        self.source.cancel_camera();
    }

    /// Discards the photo and any result derived from it.
    pub fn choose_different(&mut self) {
        self.source.choose_different();
        self.result = None;
        self.status.error = None;
    }

    // A new photo invalidates the old result; a failed one is reported.
    fn after_selection(&mut self, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.result = None;
                self.status.error = None;
                Ok(())
            }
            Err(err) => {
                self.status.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Checks the preconditions and enters `Loading`.
    ///
    /// # Errors
    ///
    /// - [`AppError::GenerationInFlight`] while a previous ticket is pending
    /// - [`AppError::NoCredits`] when the quota is exhausted; the refill
    ///   prompt becomes visible
    /// - [`AppError::Precondition`] without a theme or a photo
    ///
    /// None of these contact the generation service.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket> {
        if self.status.loading {
            return Err(AppError::GenerationInFlight);
        }

        if !self.quota.can_generate() {
            self.status.refill_prompt_visible = true;
            return Err(self.fail_locally(AppError::NoCredits));
        }

        let selected = self.source.image().cloned();
        let (theme, image) = match (self.theme, selected) {
            (Some(theme), Some(image)) => (theme, image),
            _ => {
                return Err(self.fail_locally(AppError::precondition(
                    "Please select a theme and upload an image first.",
                )));
            }
        };

        self.next_ticket += 1;
        let id = self.next_ticket;
        self.pending = Some(id);
        self.status.loading = true;
        self.status.error = None;
        self.result = None;

        tracing::info!(ticket = id, theme = theme.id, "generation started");
        Ok(GenerationTicket {
            id,
            image,
            prompt: theme.prompt,
            theme_id: theme.id,
        })
    }

    /// Records the outcome of the request started with ticket `id`.
    ///
    /// Success stores the result and consumes exactly one credit; failure
    /// stores a message and leaves the quota alone. Outcomes for a ticket
    /// that is no longer pending (the session was reset) are dropped.
    pub fn finish_generation(&mut self, id: u64, outcome: Result<GeneratedImage>) {
        if self.pending != Some(id) {
            tracing::debug!(ticket = id, "discarding outcome of stale generation");
            return;
        }

        self.pending = None;
        self.status.loading = false;

        match outcome {
            Ok(image) => {
                let quota = self.quota.consume();
                tracing::info!(ticket = id, remaining = quota.remaining, "generation succeeded");
                self.result = Some(image);
                self.status.error = None;
            }
            Err(err) => {
                tracing::warn!(ticket = id, error = %err, "generation failed");
                self.status.error = Some(err.user_message());
            }
        }
    }

    /// Runs one generation against `generator` from start to finish.
    pub async fn generate(&mut self, generator: &dyn ImageGenerator) -> Result<&GeneratedImage> {
        let ticket = self.begin_generation()?;
        let outcome = generator.generate(&ticket.image, ticket.prompt).await;

        let failure = outcome.as_ref().err().map(|e| AppError::generation(e.user_message()));
        self.finish_generation(ticket.id, outcome);

        match (failure, self.result.as_ref()) {
            (Some(err), _) => Err(err),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(AppError::Unknown("generation produced no result".into())),
        }
    }

    /// Checks a refill code and hides the refill prompt on success.
    pub fn submit_refill(&mut self, code: &str) -> Result<QuotaState> {
        let state = self.quota.try_refill(code)?;
        self.status.refill_prompt_visible = false;
        self.status.error = None;
        Ok(state)
    }

    /// Back to the initial screen. The quota is kept.
    pub fn reset(&mut self) {
        self.theme = None;
        self.source.clear();
        self.result = None;
        self.pending = None;
        self.status = UiStatus {
            refill_prompt_visible: !self.quota.can_generate(),
            ..UiStatus::default()
        };
        tracing::debug!("session reset");
    }

    fn fail_locally(&mut self, err: AppError) -> AppError {
        tracing::info!(error = %err, "generation rejected locally");
        self.status.error = Some(err.user_message());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::tests::FakeCamera;
    use crate::image_processing::tests::sample_png;
    use crate::quota::{MAX_QUOTA, QUOTA_KEY, REFILL_CODE};
    use crate::storage::MemoryStorage;
    use futures::FutureExt;
    use std::cell::Cell;

    struct FakeGenerator {
        calls: Cell<u32>,
        fail: bool,
    }

    impl FakeGenerator {
        fn ok() -> Self {
            Self {
                calls: Cell::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Cell::new(0),
                fail: true,
            }
        }
    }

    impl ImageGenerator for FakeGenerator {
        fn generate<'a>(
            &'a self,
            image: &'a CapturedImage,
            prompt: &'a str,
        ) -> LocalBoxFuture<'a, Result<GeneratedImage>> {
            self.calls.set(self.calls.get() + 1);
            async move {
                assert!(!prompt.is_empty());
                if self.fail {
                    Err(AppError::generation("network unreachable"))
                } else {
                    Ok(GeneratedImage {
                        data: image.data.clone(),
                        mime_type: "image/png".into(),
                    })
                }
            }
            .boxed_local()
        }
    }

    fn session_with_quota(remaining: u32) -> BoothSession<MemoryStorage> {
        let mut storage = MemoryStorage::new();
        storage.set(QUOTA_KEY, &remaining.to_string()).unwrap();
        BoothSession::new(QuotaStore::load(storage))
    }

    fn ready_session(remaining: u32) -> BoothSession<MemoryStorage> {
        let mut session = session_with_quota(remaining);
        session.select_theme("magazine").unwrap();
        session.select_from_bytes(&sample_png(), Some("image/png")).unwrap();
        session
    }

    #[tokio::test]
    async fn success_consumes_exactly_one_credit() {
        let mut session = ready_session(10);
        let generator = FakeGenerator::ok();

        session.generate(&generator).await.unwrap();

        assert_eq!(session.quota().remaining, 9);
        assert!(session.result().is_some());
        assert!(session.status().error.is_none());
        assert!(!session.is_loading());
        assert_eq!(generator.calls.get(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_quota_and_reports_message() {
        let mut session = ready_session(10);
        let generator = FakeGenerator::failing();

        assert!(session.generate(&generator).await.is_err());

        assert_eq!(session.quota().remaining, 10);
        assert!(session.result().is_none());
        let message = session.status().error.clone().unwrap();
        assert!(!message.is_empty());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn exhausted_quota_rejects_without_calling_service() {
        let generator = FakeGenerator::ok();

        let mut empty = session_with_quota(0);
        assert!(matches!(
            empty.generate(&generator).await,
            Err(AppError::NoCredits)
        ));
        assert!(empty.status().refill_prompt_visible);

        let mut ready_but_empty = ready_session(0);
        assert!(matches!(
            ready_but_empty.generate(&generator).await,
            Err(AppError::NoCredits)
        ));
        assert_eq!(generator.calls.get(), 0);
    }

    #[tokio::test]
    async fn missing_theme_or_image_is_a_precondition_error() {
        let generator = FakeGenerator::ok();

        let mut no_theme = session_with_quota(5);
        no_theme.select_from_bytes(&sample_png(), None).unwrap();
        assert!(matches!(
            no_theme.generate(&generator).await,
            Err(AppError::Precondition(_))
        ));

        let mut no_image = session_with_quota(5);
        no_image.select_theme("studio").unwrap();
        assert!(matches!(
            no_image.generate(&generator).await,
            Err(AppError::Precondition(_))
        ));

        assert_eq!(generator.calls.get(), 0);
        assert_eq!(no_image.quota().remaining, 5);
    }

    #[test]
    fn only_one_generation_in_flight() {
        let mut session = ready_session(5);
        let ticket = session.begin_generation().unwrap();

        assert!(!session.can_generate());
        assert!(matches!(
            session.begin_generation(),
            Err(AppError::GenerationInFlight)
        ));

        session.finish_generation(ticket.id, Ok(GeneratedImage::from_bytes(&[1], "image/png")));
        assert!(session.begin_generation().is_ok());
    }

    #[test]
    fn new_photo_clears_previous_result() {
        let mut session = ready_session(5);
        let ticket = session.begin_generation().unwrap();
        session.finish_generation(ticket.id, Ok(GeneratedImage::from_bytes(&[1], "image/png")));
        assert!(session.result().is_some());

        session.select_from_bytes(&sample_png(), None).unwrap();
        assert!(session.result().is_none());
    }

    #[test]
    fn choose_different_clears_photo_and_result() {
        let mut session = ready_session(5);
        let ticket = session.begin_generation().unwrap();
        session.finish_generation(ticket.id, Ok(GeneratedImage::from_bytes(&[1], "image/png")));

        session.choose_different();
        assert!(session.image().is_none());
        assert!(session.result().is_none());
    }

    #[test]
    fn unreadable_photo_surfaces_an_error() {
        let mut session = session_with_quota(5);
        assert!(session.select_from_bytes(b"garbage", None).is_err());
        assert!(session.status().error.is_some());
        assert!(session.image().is_none());
    }

    #[test]
    fn non_image_drop_leaves_session_idle() {
        let mut session = session_with_quota(5);
        let drop = DroppedFile {
            name: "report.pdf".into(),
            mime: "application/pdf".into(),
            bytes: Some(vec![1, 2, 3]),
            ..Default::default()
        };

        assert!(!session.accept_drop(&drop).unwrap());
        assert!(session.image().is_none());
        assert!(session.status().error.is_none());
    }

    #[test]
    fn stale_outcome_after_reset_is_ignored() {
        let mut session = ready_session(5);
        let ticket = session.begin_generation().unwrap();

        session.reset();
        session.finish_generation(ticket.id, Ok(GeneratedImage::from_bytes(&[1], "image/png")));

        assert!(session.result().is_none());
        assert!(!session.is_loading());
        assert_eq!(session.quota().remaining, 5);
    }

    #[test]
    fn reset_keeps_quota_and_releases_camera() {
        let mut camera = FakeCamera::default();
        let mut session = ready_session(7);
        session.choose_different();
        session.start_camera(&mut camera).unwrap();

        session.reset();

        assert_eq!(camera.active_streams(), 0);
        assert!(session.theme().is_none());
        assert!(session.image().is_none());
        assert_eq!(session.status(), &UiStatus::default());
        assert_eq!(session.quota().remaining, 7);
    }

    #[test]
    fn camera_capture_feeds_generation() {
        let mut camera = FakeCamera::default();
        let mut session = session_with_quota(5);
        session.select_theme("party").unwrap();

        session.start_camera(&mut camera).unwrap();
        session.capture_frame().unwrap();

        assert_eq!(session.image().unwrap().mime_type, "image/jpeg");
        assert!(session.can_generate());
    }

    #[test]
    fn camera_does_not_replace_a_photo_with_a_result() {
        let mut camera = FakeCamera::default();
        let mut session = ready_session(5);
        let ticket = session.begin_generation().unwrap();
        session.finish_generation(ticket.id, Ok(GeneratedImage::from_bytes(&sample_png(), "image/png")));
        assert!(session.result().is_some());

        assert!(matches!(
            session.start_camera(&mut camera),
            Err(AppError::Precondition(_))
        ));
        session.cancel_camera();

        assert!(session.image().is_some());
        assert!(session.result().is_some());
        assert_eq!(camera.opened.get(), 0);

        session.choose_different();
        session.start_camera(&mut camera).unwrap();
        session.cancel_camera();
        assert!(session.image().is_none());
        assert!(session.result().is_none());
    }

    #[test]
    fn refill_flow() {
        let mut session = session_with_quota(0);
        assert!(session.status().refill_prompt_visible);

        assert!(matches!(
            session.submit_refill("wrong"),
            Err(AppError::InvalidRefillCode)
        ));
        assert_eq!(session.quota().remaining, 0);
        assert!(session.status().refill_prompt_visible);

        session.submit_refill(REFILL_CODE).unwrap();
        assert_eq!(session.quota().remaining, MAX_QUOTA);
        assert!(!session.status().refill_prompt_visible);
    }

    #[tokio::test]
    async fn two_hundred_generations_then_refill() {
        let generator = FakeGenerator::ok();
        let mut session = ready_session(MAX_QUOTA);

        for _ in 0..MAX_QUOTA {
            session.generate(&generator).await.unwrap();
        }
        assert_eq!(session.quota().remaining, 0);
        assert_eq!(generator.calls.get(), MAX_QUOTA);

        assert!(matches!(
            session.generate(&generator).await,
            Err(AppError::NoCredits)
        ));
        assert_eq!(generator.calls.get(), MAX_QUOTA);

        session.submit_refill(REFILL_CODE).unwrap();
        assert_eq!(session.quota().remaining, MAX_QUOTA);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let mut session = session_with_quota(5);
        assert!(session.select_theme("nope").is_err());
        assert!(session.theme().is_none());
    }
}
