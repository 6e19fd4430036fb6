//! The conversion backend seam.
//!
//! [`ConversionBackend`] is the single outbound call of an attempt: send the
//! source, get a status, a content type and a body back. [`HttpBackend`] is
//! the real implementation (multipart `POST` via reqwest); tests and embedders
//! can inject their own through
//! [`crate::config::ConversionConfigBuilder::backend`].
//!
//! ## Wire format
//!
//! ```text
//! POST <endpoint>
//! Content-Type: multipart/form-data
//!
//!   url  = <text>                      (URL mode)
//!   file = <bytes; filename; mimetype> (file mode)
//! ```
//!
//! Success is an `audio/mpeg` body; failure is JSON
//! `{ "error": string, "solution"?: string }` or plain text.

use crate::error::{ConvertError, ValidationError};
use crate::request::Source;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, info};

/// What came back from the backend, before any interpretation.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one conversion request.
///
/// Implementations return `Ok` for any HTTP response, success or not; `Err`
/// is reserved for transport failures ([`ConvertError::Network`],
/// [`ConvertError::Timeout`]) and unreadable local input.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    async fn send(&self, source: &Source) -> Result<BackendResponse, ConvertError>;
}

/// Multipart HTTP client for the conversion endpoint.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("video2mp3/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConvertError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport(&self, e: reqwest::Error) -> ConvertError {
        if e.is_timeout() {
            ConvertError::Timeout {
                secs: self.timeout.as_secs(),
                hint: None,
            }
        } else {
            ConvertError::Network {
                reason: e.to_string(),
                hint: None,
            }
        }
    }
}

/// Build the multipart body for `source`.
///
/// Files are streamed from disk rather than read into memory.
pub async fn build_form(source: &Source) -> Result<Form, ConvertError> {
    match source {
        Source::Url(url) => Ok(Form::new().text("url", url.clone())),
        Source::File(file) => {
            let handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    ValidationError::PermissionDenied {
                        path: file.path.clone(),
                    }
                } else {
                    ValidationError::FileNotFound {
                        path: file.path.clone(),
                    }
                }
            })?;
            let part = Part::stream_with_length(reqwest::Body::from(handle), file.size_bytes)
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| ConvertError::Internal(format!("invalid media type: {e}")))?;
            Ok(Form::new().part("file", part))
        }
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    async fn send(&self, source: &Source) -> Result<BackendResponse, ConvertError> {
        let form = build_form(source).await?;
        match source {
            Source::Url(url) => info!("Requesting conversion of {}", url),
            Source::File(f) => info!("Uploading {} ({} bytes)", f.name, f.size_bytes),
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            body.extend_from_slice(&chunk.map_err(|e| self.map_transport(e))?);
        }
        debug!(
            "Backend answered HTTP {} ({:?}, {} bytes)",
            status,
            content_type,
            body.len()
        );

        Ok(BackendResponse {
            status,
            content_type,
            body: Bytes::from(body),
        })
    }
}
