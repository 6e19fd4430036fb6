//! The conversion request: all user-facing state for one attempt.
//!
//! A [`ConversionRequest`] is owned by exactly one
//! [`crate::controller::ConversionController`]. Callers read it through
//! getters; every mutation goes through the controller so the invariants
//! below always hold:
//!
//! * only the field of the current [`InputMode`] is populated;
//! * `result` is `Some` only while `status == Succeeded`;
//! * a result being replaced or cleared has its download reference revoked.

use crate::error::{ConvertError, FailureHint};
use crate::pipeline::blob::BlobHandle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which input the user is converting from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// A remote video URL the backend fetches itself. (default)
    #[default]
    Url,
    /// A local video file uploaded as multipart data.
    File,
}

/// Lifecycle state of the current attempt.
///
/// ```text
/// Idle ─▶ Validating ─▶ InFlight ─▶ Succeeded
///              │             └────▶ Failed
///              └──────────────────▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

impl RequestStatus {
    /// `Succeeded` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Succeeded | RequestStatus::Failed)
    }
}

/// A local video chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path the bytes are streamed from.
    pub path: PathBuf,
    /// File name sent in the multipart part.
    pub name: String,
    /// Declared media type, e.g. `video/mp4`.
    pub mime_type: String,
    pub size_bytes: u64,
}

/// What gets sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Url(String),
    File(SourceFile),
}

/// A successfully produced MP3.
#[derive(Debug, Serialize)]
pub struct ConversionResult {
    /// Synthesised file name, `audio_<unix-millis>.mp3`.
    pub filename: String,
    /// Where the MP3 was saved.
    pub saved_path: PathBuf,
    pub size_bytes: u64,
    pub content_type: String,
    /// Transient reference to the downloaded bytes.
    #[serde(skip)]
    pub handle: BlobHandle,
}

/// State for one conversion interaction.
#[derive(Debug, Default, Serialize)]
pub struct ConversionRequest {
    pub(crate) input_mode: InputMode,
    pub(crate) source_url: Option<String>,
    pub(crate) source_file: Option<SourceFile>,
    pub(crate) status: RequestStatus,
    pub(crate) progress_percent: u8,
    pub(crate) error_message: Option<String>,
    pub(crate) hint: Option<FailureHint>,
    pub(crate) result: Option<ConversionResult>,
}

impl ConversionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn source_file(&self) -> Option<&SourceFile> {
        self.source_file.as_ref()
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn hint(&self) -> Option<FailureHint> {
        self.hint
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    /// The payload for the current mode, if its field is populated.
    pub fn source(&self) -> Option<Source> {
        match self.input_mode {
            InputMode::Url => self.source_url.clone().map(Source::Url),
            InputMode::File => self.source_file.clone().map(Source::File),
        }
    }

    // ── Field transitions ────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<(), ConvertError> {
        if self.status == RequestStatus::InFlight {
            return Err(ConvertError::Busy);
        }
        Ok(())
    }

    /// Switch input mode, clearing the other mode's field and any error.
    pub(crate) fn select_mode(&mut self, mode: InputMode) -> Result<(), ConvertError> {
        self.ensure_idle()?;
        self.input_mode = mode;
        match mode {
            InputMode::Url => self.source_file = None,
            InputMode::File => self.source_url = None,
        }
        self.error_message = None;
        self.hint = None;
        Ok(())
    }

    pub(crate) fn set_url(&mut self, url: impl Into<String>) -> Result<(), ConvertError> {
        self.select_mode(InputMode::Url)?;
        self.source_url = Some(url.into());
        Ok(())
    }

    pub(crate) fn set_file(&mut self, file: SourceFile) -> Result<(), ConvertError> {
        self.select_mode(InputMode::File)?;
        self.source_file = Some(file);
        Ok(())
    }

    // ── Status transitions ───────────────────────────────────────────────

    /// Drop the current result, revoking its download reference first.
    pub(crate) fn clear_result(&mut self) {
        if let Some(previous) = self.result.take() {
            previous.handle.revoke();
        }
    }

    pub(crate) fn begin_validating(&mut self) {
        self.status = RequestStatus::Validating;
    }

    pub(crate) fn begin_flight(&mut self) {
        self.clear_result();
        self.error_message = None;
        self.hint = None;
        self.progress_percent = 0;
        self.status = RequestStatus::InFlight;
    }

    pub(crate) fn succeed(&mut self, result: ConversionResult) -> &ConversionResult {
        self.clear_result();
        self.error_message = None;
        self.hint = None;
        self.progress_percent = 100;
        self.status = RequestStatus::Succeeded;
        self.result.insert(result)
    }

    /// Record a rejected field change without ending an attempt.
    pub(crate) fn note_error(&mut self, error: &ConvertError) {
        self.error_message = Some(error.user_message());
        self.hint = error.hint();
    }

    pub(crate) fn fail(&mut self, error: &ConvertError) {
        self.clear_result();
        self.error_message = Some(error.user_message());
        self.hint = error.hint();
        self.progress_percent = 0;
        self.status = RequestStatus::Failed;
    }

    pub(crate) fn reset(&mut self) {
        self.clear_result();
        self.error_message = None;
        self.hint = None;
        self.progress_percent = 0;
        self.status = RequestStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn sample_file() -> SourceFile {
        SourceFile {
            path: PathBuf::from("/tmp/clip.mp4"),
            name: "clip.mp4".into(),
            mime_type: "video/mp4".into(),
            size_bytes: 42,
        }
    }

    #[test]
    fn default_is_idle_url_mode() {
        let r = ConversionRequest::new();
        assert_eq!(r.input_mode(), InputMode::Url);
        assert_eq!(r.status(), RequestStatus::Idle);
        assert_eq!(r.progress_percent(), 0);
        assert!(r.source().is_none());
    }

    #[test]
    fn switching_mode_clears_other_field() {
        let mut r = ConversionRequest::new();
        r.set_url("https://example.com/v.mp4").unwrap();
        r.set_file(sample_file()).unwrap();
        assert_eq!(r.input_mode(), InputMode::File);
        assert!(r.source_url().is_none());
        assert_eq!(r.source(), Some(Source::File(sample_file())));

        r.select_mode(InputMode::Url).unwrap();
        assert!(r.source_file().is_none());
        assert!(r.source().is_none());
    }

    #[test]
    fn selecting_mode_clears_error() {
        let mut r = ConversionRequest::new();
        r.fail(&ConvertError::Validation(ValidationError::UrlEmpty));
        assert!(r.error_message().is_some());
        r.select_mode(InputMode::File).unwrap();
        assert!(r.error_message().is_none());
    }

    #[test]
    fn field_changes_rejected_in_flight() {
        let mut r = ConversionRequest::new();
        r.begin_flight();
        assert!(matches!(
            r.set_url("https://example.com"),
            Err(ConvertError::Busy)
        ));
    }

    #[test]
    fn begin_flight_resets_progress_and_error() {
        let mut r = ConversionRequest::new();
        r.fail(&ConvertError::Timeout {
            secs: 300,
            hint: None,
        });
        assert_eq!(r.status(), RequestStatus::Failed);
        r.begin_flight();
        assert_eq!(r.status(), RequestStatus::InFlight);
        assert_eq!(r.progress_percent(), 0);
        assert!(r.error_message().is_none());
        assert!(!r.status().is_terminal());
    }

    #[test]
    fn fail_records_hint() {
        let mut r = ConversionRequest::new();
        r.fail(&ConvertError::Validation(ValidationError::UnsupportedFormat {
            mime_type: "application/pdf".into(),
        }));
        assert_eq!(r.hint(), Some(FailureHint::SwitchToUrl));
        assert!(r.error_message().unwrap().starts_with("Unsupported format"));
        assert!(r.result().is_none());
    }
}
