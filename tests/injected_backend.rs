//! Controller behaviour with an in-memory backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use video2mp3::{
    BackendResponse, ConversionBackend, ConversionConfig, ConversionController, ConvertError,
    FailureHint, RequestStatus, Source,
};

/// Replays queued responses; pends forever once the queue is empty.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<BackendResponse>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn with(replies: Vec<BackendResponse>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionBackend for ScriptedBackend {
    async fn send(&self, _source: &Source) -> Result<BackendResponse, ConvertError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => Ok(reply),
            None => std::future::pending().await,
        }
    }
}

fn audio(len: usize) -> BackendResponse {
    BackendResponse {
        status: 200,
        content_type: Some("audio/mpeg".into()),
        body: Bytes::from(vec![7u8; len]),
    }
}

fn controller(backend: Arc<ScriptedBackend>, out: &std::path::Path) -> ConversionController {
    let config = ConversionConfig::builder()
        .backend(backend)
        .output_dir(out)
        .build()
        .unwrap();
    ConversionController::new(config).unwrap()
}

#[tokio::test]
async fn empty_success_body_fails_then_retry_succeeds() {
    let out = tempdir().unwrap();
    let backend = ScriptedBackend::with(vec![audio(0), audio(128)]);
    let mut c = controller(Arc::clone(&backend), out.path());
    c.set_url("https://example.com/video.mp4").unwrap();

    let err = c.submit().await.unwrap_err();
    assert!(matches!(err, ConvertError::InvalidAudio { .. }));
    assert_eq!(c.request().progress_percent(), 0);

    let result = c.submit().await.unwrap();
    assert_eq!(result.size_bytes, 128);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn abandoned_submit_leaves_request_busy_until_reset() {
    let out = tempdir().unwrap();
    let backend = ScriptedBackend::with(vec![]);
    let mut c = controller(Arc::clone(&backend), out.path());
    c.set_url("https://example.com/video.mp4").unwrap();

    let abandoned = tokio::time::timeout(Duration::from_millis(50), c.submit()).await;
    assert!(abandoned.is_err());
    assert_eq!(c.request().status(), RequestStatus::InFlight);
    assert!(matches!(
        c.set_url("https://example.com/other.mp4"),
        Err(ConvertError::Busy)
    ));
    assert!(matches!(c.submit().await, Err(ConvertError::Busy)));
    assert_eq!(backend.calls(), 1);

    c.reset();
    assert_eq!(c.request().status(), RequestStatus::Idle);
    c.set_url("https://example.com/other.mp4").unwrap();
}

#[tokio::test]
async fn unknown_server_failure_falls_back_to_generic_message() {
    let out = tempdir().unwrap();
    let backend = ScriptedBackend::with(vec![BackendResponse {
        status: 502,
        content_type: None,
        body: Bytes::new(),
    }]);
    let mut c = controller(backend, out.path());
    c.set_url("https://example.com/video.mp4").unwrap();

    let err = c.submit().await.unwrap_err();
    assert_eq!(err.hint(), Some(FailureHint::SwitchToFileUpload));
    assert_eq!(
        c.request().error_message(),
        Some("Conversion failed. Try uploading the file directly instead.")
    );
}

#[tokio::test]
async fn url_error_code_in_payload_suggests_upload() {
    let out = tempdir().unwrap();
    let backend = ScriptedBackend::with(vec![BackendResponse {
        status: 400,
        content_type: Some("application/json".into()),
        body: Bytes::from_static(br#"{"error":"invalid_url"}"#),
    }]);
    let mut c = controller(backend, out.path());
    c.set_url("https://example.com/video.mp4").unwrap();

    let err = c.submit().await.unwrap_err();
    assert_eq!(err.hint(), Some(FailureHint::SwitchToFileUpload));
    assert_eq!(
        c.request().error_message(),
        Some("invalid_url Try uploading the file directly instead.")
    );
}
