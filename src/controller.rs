//! The conversion request controller.
//!
//! [`ConversionController`] owns one [`ConversionRequest`] and is the only
//! thing that mutates it. Each [`submit`](ConversionController::submit) is one
//! attempt:
//!
//! ```text
//! Idle ─▶ Validating ─▶ InFlight ─▶ Succeeded | Failed ─▶ (next submit)
//! ```
//!
//! An attempt makes at most one backend call, under a hard timeout. A 2xx
//! response still fails unless it carries non-empty `audio/mpeg` content.
//! On success the bytes become a [`BlobHandle`], are saved as
//! `audio_<unix-millis>.mp3`, and the handle is revoked after a grace period,
//! when the next attempt starts, or when the controller is dropped, whichever
//! comes first.
//!
//! `submit` takes `&mut self`, so a second submit cannot start while one is
//! in flight. If a caller drops the `submit` future mid-flight, the request is
//! left `InFlight` and further edits return [`ConvertError::Busy`] until
//! [`reset`](ConversionController::reset) is called.

use crate::backend::{BackendResponse, ConversionBackend, HttpBackend};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, FailureHint, ValidationError};
use crate::pipeline::blob::BlobRegistry;
use crate::pipeline::{response, save};
use crate::progress::ConversionProgressCallback;
use crate::request::{
    ConversionRequest, ConversionResult, InputMode, RequestStatus, Source, SourceFile,
};
use crate::validate;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Drives conversion attempts for a single request.
pub struct ConversionController {
    config: ConversionConfig,
    backend: Arc<dyn ConversionBackend>,
    registry: BlobRegistry,
    request: ConversionRequest,
    revoke_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ConversionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionController")
            .field("config", &self.config)
            .field("request", &self.request)
            .field("live_blobs", &self.registry.live())
            .finish()
    }
}

impl ConversionController {
    /// Create a controller; uses [`HttpBackend`] unless the config injects a backend.
    pub fn new(config: ConversionConfig) -> Result<Self, ConvertError> {
        let backend: Arc<dyn ConversionBackend> = match config.backend {
            Some(ref b) => Arc::clone(b),
            None => Arc::new(HttpBackend::new(
                config.endpoint.clone(),
                Duration::from_secs(config.timeout_secs),
            )?),
        };
        Ok(Self {
            config,
            backend,
            registry: BlobRegistry::new(),
            request: ConversionRequest::new(),
            revoke_task: None,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    /// Registry of download references issued by this controller.
    pub fn registry(&self) -> &BlobRegistry {
        &self.registry
    }

    // ── Field changes ────────────────────────────────────────────────────

    pub fn select_mode(&mut self, mode: InputMode) -> Result<(), ConvertError> {
        self.request.select_mode(mode)
    }

    pub fn set_url(&mut self, url: impl Into<String>) -> Result<(), ConvertError> {
        self.request.set_url(url)
    }

    pub fn set_file(&mut self, file: SourceFile) -> Result<(), ConvertError> {
        self.request.set_file(file)
    }

    /// Pick a local file for upload, rejecting it immediately if it fails
    /// the type or size rules. A rejected file is not kept.
    pub fn choose_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConvertError> {
        self.request.select_mode(InputMode::File)?;
        let checked = SourceFile::from_path(path.as_ref()).and_then(|file| {
            validate::validate_file(&file, &self.config)?;
            Ok(file)
        });
        match checked {
            Ok(file) => self.request.set_file(file),
            Err(v) => {
                let err = ConvertError::from(v);
                self.request.note_error(&err);
                Err(err)
            }
        }
    }

    /// Check the current input without changing any state.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate(&self.request, &self.config)
    }

    /// Return to `Idle`, revoking any live download reference.
    pub fn reset(&mut self) {
        self.abort_revoke_task();
        self.request.reset();
        self.emit(|cb| cb.on_status_change(RequestStatus::Idle));
    }

    // ── Attempt ──────────────────────────────────────────────────────────

    /// Run one conversion attempt to a terminal status.
    ///
    /// The outcome is also recorded on [`request()`](Self::request):
    /// `Succeeded` with `progress_percent = 100` and a result, or `Failed`
    /// with an error message and optional hint.
    pub async fn submit(&mut self) -> Result<&ConversionResult, ConvertError> {
        if self.request.status() == RequestStatus::InFlight {
            return Err(ConvertError::Busy);
        }

        let mode = self.request.input_mode();
        self.emit(|cb| cb.on_attempt_start(mode));
        self.request.begin_validating();
        self.emit(|cb| cb.on_status_change(RequestStatus::Validating));

        if let Err(v) = validate::validate(&self.request, &self.config) {
            warn!("Input rejected before sending: {}", v);
            return Err(self.record_failure(ConvertError::from(v)));
        }
        let source = match self.request.source() {
            Some(s) => s,
            None => {
                return Err(self.record_failure(ConvertError::Internal(
                    "validated request has no source".into(),
                )))
            }
        };

        // Release the previous attempt's reference before anything new is issued.
        self.abort_revoke_task();
        self.request.begin_flight();
        self.emit(|cb| {
            cb.on_status_change(RequestStatus::InFlight);
            cb.on_progress(0);
        });

        match self.run_attempt(&source, mode).await {
            Ok(result) => {
                let grace = Duration::from_millis(self.config.revoke_grace_ms);
                self.revoke_task = result.handle.schedule_revoke(grace);
                info!(
                    "Conversion succeeded: {} ({} bytes)",
                    result.saved_path.display(),
                    result.size_bytes
                );
                let (path, size) = (result.saved_path.clone(), result.size_bytes);
                self.emit(|cb| {
                    cb.on_saved(&path, size);
                    cb.on_progress(100);
                    cb.on_status_change(RequestStatus::Succeeded);
                });
                Ok(self.request.succeed(result))
            }
            Err(e) => {
                warn!("Conversion failed: {}", e);
                Err(self.record_failure(e))
            }
        }
    }

    async fn run_attempt(
        &self,
        source: &Source,
        mode: InputMode,
    ) -> Result<ConversionResult, ConvertError> {
        let reply = self
            .exchange(source)
            .await
            .map_err(|e| with_mode_hint(e, mode))?;

        let content_type = reply
            .content_type
            .as_deref()
            .unwrap_or(response::EXPECTED_AUDIO_TYPE);
        let handle = self.registry.materialize(&reply.body, content_type).await?;
        let filename = save::timestamped_filename();
        let saved_path = save::save_blob(&handle, &self.config.output_dir, &filename).await?;
        debug!("Issued {} for {}", handle.uri(), saved_path.display());

        Ok(ConversionResult {
            filename: saved_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename),
            saved_path,
            size_bytes: handle.size_bytes(),
            content_type: handle.content_type().to_string(),
            handle,
        })
    }

    /// The backend call under the hard timeout, accepted only if it carries audio.
    async fn exchange(&self, source: &Source) -> Result<BackendResponse, ConvertError> {
        let secs = self.config.timeout_secs;
        let sent = tokio::time::timeout(Duration::from_secs(secs), self.backend.send(source)).await;
        let reply = match sent {
            Ok(reply) => reply?,
            Err(_) => return Err(ConvertError::Timeout { secs, hint: None }),
        };

        if !reply.is_success() {
            return Err(response::server_error(reply.status, &reply.body));
        }
        response::check_audio(reply.content_type.as_deref(), &reply.body)?;
        Ok(reply)
    }

    fn record_failure(&mut self, error: ConvertError) -> ConvertError {
        self.request.fail(&error);
        let message = error.user_message();
        let hint = error.hint();
        self.emit(|cb| {
            cb.on_failure(&message, hint);
            cb.on_status_change(RequestStatus::Failed);
        });
        error
    }

    fn abort_revoke_task(&mut self) {
        if let Some(task) = self.revoke_task.take() {
            task.abort();
        }
    }

    fn emit(&self, f: impl FnOnce(&dyn ConversionProgressCallback)) {
        if let Some(ref cb) = self.config.progress_callback {
            f(cb.as_ref());
        }
    }
}

impl Drop for ConversionController {
    fn drop(&mut self) {
        self.abort_revoke_task();
        self.request.clear_result();
    }
}

/// A URL attempt the backend could not turn into audio suggests uploading
/// the file instead, unless a more specific hint is already attached.
fn with_mode_hint(error: ConvertError, mode: InputMode) -> ConvertError {
    if mode != InputMode::Url {
        return error;
    }
    let suggest = Some(FailureHint::SwitchToFileUpload);
    match error {
        ConvertError::Network { reason, hint: None } => ConvertError::Network {
            reason,
            hint: suggest,
        },
        ConvertError::Timeout { secs, hint: None } => ConvertError::Timeout { secs, hint: suggest },
        ConvertError::Server {
            status,
            message,
            solution,
            hint: None,
        } => ConvertError::Server {
            status,
            message,
            solution,
            hint: suggest,
        },
        ConvertError::InvalidAudio { reason, hint: None } => {
            ConvertError::InvalidAudio { reason, hint: suggest }
        }
        other => other,
    }
}
