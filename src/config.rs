//! Configuration types for video-to-MP3 conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The limits here (allow-list, size
//! ceiling, timeout) are client-side policy: the backend enforces its own,
//! but checking locally lets us reject bad input without a round trip.

use crate::backend::ConversionBackend;
use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Conversion endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str =
    "https://video-to-audio-converter-backend.onrender.com/api/convert/";

/// Hard timeout for one attempt: 5 minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Upload size ceiling: 500 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// How long a download reference stays alive after the save was triggered.
pub const DEFAULT_REVOKE_GRACE_MS: u64 = 3_000;

/// Video container types accepted for upload.
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-msvideo",
    "video/mpeg",
];

/// Configuration for a conversion attempt.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use video2mp3::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .endpoint("http://localhost:8000/api/convert/")
///     .timeout_secs(60)
///     .output_dir("/tmp")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// URL of the conversion backend. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Hard timeout for the whole request in seconds. Default: 300.
    ///
    /// Covers upload, server-side conversion and the response body. Remote
    /// conversions of long videos routinely take minutes, so this is far
    /// larger than a typical API timeout.
    pub timeout_secs: u64,

    /// Largest file accepted for upload, in bytes. Default: 500 MiB.
    pub max_file_size: u64,

    /// Declared media types accepted for upload.
    pub allowed_types: Vec<String>,

    /// Directory where the produced MP3 is saved. Default: current directory.
    pub output_dir: PathBuf,

    /// Grace period before a download reference is revoked, in ms. Default: 3000.
    pub revoke_grace_ms: u64,

    /// Pre-constructed backend. Takes precedence over `endpoint`.
    pub backend: Option<Arc<dyn ConversionBackend>>,

    /// Receives status and progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
            output_dir: PathBuf::from("."),
            revoke_grace_ms: DEFAULT_REVOKE_GRACE_MS,
            backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_file_size", &self.max_file_size)
            .field("allowed_types", &self.allowed_types)
            .field("output_dir", &self.output_dir)
            .field("revoke_grace_ms", &self.revoke_grace_ms)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ConversionBackend>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// True if `mime_type` is in the allow-list (case-insensitive, parameters ignored).
    pub fn is_allowed_type(&self, mime_type: &str) -> bool {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(&essence))
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn revoke_grace_ms(mut self, ms: u64) -> Self {
        self.config.revoke_grace_ms = ms;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ConversionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.backend.is_none()
            && !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://"))
        {
            return Err(ConvertError::InvalidConfig(format!(
                "Endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.max_file_size == 0 {
            return Err(ConvertError::InvalidConfig(
                "Maximum file size must be > 0".into(),
            ));
        }
        if c.allowed_types.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "At least one allowed media type is required".into(),
            ));
        }
        Ok(self.config)
    }
}
