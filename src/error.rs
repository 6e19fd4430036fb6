//! Error types for the video2mp3 library.
//!
//! Two layers of error reflect two moments of failure:
//!
//! * [`ValidationError`]: the input itself is unusable (no URL, no file,
//!   unsupported container, oversized file). Caught before any network
//!   activity; nothing is sent to the backend.
//!
//! * [`ConvertError`]: the attempt as a whole failed. Wraps validation
//!   failures and adds the transport, timeout and content failures that can
//!   only happen once a request is in flight.
//!
//! Every failure carries an optional [`FailureHint`]: a small structured
//! remediation the caller can act on (e.g. offer to switch to file upload)
//! instead of pattern-matching the rendered text.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Fallback shown when the backend rejects a request without any body.
pub const GENERIC_FAILURE_MESSAGE: &str = "Conversion failed.";

/// Message for a request that exceeded the hard timeout.
pub const TIMEOUT_MESSAGE: &str = "Request timed out - try smaller files or different URL";

/// Message for any transport failure other than a timeout.
pub const NETWORK_MESSAGE: &str = "Network error - check your internet connection";

/// Message for a 2xx response whose body is not usable audio.
pub const INVALID_AUDIO_MESSAGE: &str = "Invalid audio file - conversion failed";

/// Structured remediation attached to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureHint {
    /// The remote source could not be fetched by the backend; uploading the
    /// video file directly is likely to work.
    SwitchToFileUpload,
    /// The local file was rejected; pasting a URL to the video instead may work.
    SwitchToUrl,
    /// The backend is rate limited or out of quota for now.
    RetryLater,
}

impl FailureHint {
    /// Sentence appended to the user-facing message.
    pub fn suggestion(&self) -> &'static str {
        match self {
            FailureHint::SwitchToFileUpload => "Try uploading the file directly instead.",
            FailureHint::SwitchToUrl => "Try pasting a link to the video instead.",
            FailureHint::RetryLater => "Please wait a while and try again later.",
        }
    }
}

/// Reasons an input is rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// URL mode with a blank URL.
    #[error("Please paste a video URL to convert")]
    UrlEmpty,

    /// File mode with no file chosen.
    #[error("Please choose a video file to upload")]
    NoFileSelected,

    /// Declared media type is not in the allow-list.
    #[error("Unsupported format: MP4, MOV, AVI, MPEG, WEBM only (got {mime_type})")]
    UnsupportedFormat { mime_type: String },

    /// File is larger than the configured ceiling.
    #[error("File size exceeds {}MB limit ({} bytes)", .limit_bytes / (1024 * 1024), .size_bytes)]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    /// The chosen path does not exist.
    #[error("Video file not found: '{}'", .path.display())]
    FileNotFound { path: PathBuf },

    /// The chosen path exists but cannot be read.
    #[error("Permission denied reading '{}'", .path.display())]
    PermissionDenied { path: PathBuf },
}

impl ValidationError {
    /// Remediation for the UI; rejected files can often be converted by URL.
    pub fn hint(&self) -> Option<FailureHint> {
        match self {
            ValidationError::UnsupportedFormat { .. } | ValidationError::FileTooLarge { .. } => {
                Some(FailureHint::SwitchToUrl)
            }
            _ => None,
        }
    }
}

/// All errors that end a conversion attempt.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Before the request ───────────────────────────────────────────────
    /// Input rejected by [`crate::validate::validate`]; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A field change or submit was attempted while a request is in flight.
    #[error("A conversion is already in progress")]
    Busy,

    // ── Transport ─────────────────────────────────────────────────────────
    /// Connection, DNS, TLS or body-read failure.
    #[error("{}\nDetail: {reason}", NETWORK_MESSAGE)]
    Network {
        reason: String,
        hint: Option<FailureHint>,
    },

    /// The request exceeded the hard timeout and was cancelled.
    #[error("{} (after {secs}s)", TIMEOUT_MESSAGE)]
    Timeout {
        secs: u64,
        hint: Option<FailureHint>,
    },

    /// The backend answered with a non-2xx status.
    #[error("Conversion backend returned HTTP {status}: {message}")]
    Server {
        status: u16,
        message: String,
        solution: Option<String>,
        hint: Option<FailureHint>,
    },

    // ── Content ───────────────────────────────────────────────────────────
    /// HTTP success, but the body is empty or not MP3 audio.
    #[error("{}: {reason}", INVALID_AUDIO_MESSAGE)]
    InvalidAudio {
        reason: String,
        hint: Option<FailureHint>,
    },

    // ── Output ────────────────────────────────────────────────────────────
    /// Could not write the MP3 into the output directory.
    #[error("Failed to write output file '{}': {source}", .path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Structured remediation, if one can be derived for this failure.
    pub fn hint(&self) -> Option<FailureHint> {
        match self {
            ConvertError::Validation(v) => v.hint(),
            ConvertError::Network { hint, .. }
            | ConvertError::Timeout { hint, .. }
            | ConvertError::Server { hint, .. }
            | ConvertError::InvalidAudio { hint, .. } => *hint,
            _ => None,
        }
    }

    /// True for failures that happened after the request was sent.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConvertError::Network { .. } | ConvertError::Timeout { .. } | ConvertError::Server { .. }
        )
    }

    /// The message presented to the user for this failure.
    ///
    /// Server failures render as `error - solution`, and the hint's suggestion
    /// sentence is appended when one applies.
    pub fn user_message(&self) -> String {
        let base = match self {
            ConvertError::Validation(v) => v.to_string(),
            ConvertError::Network { .. } => NETWORK_MESSAGE.to_string(),
            ConvertError::Timeout { .. } => TIMEOUT_MESSAGE.to_string(),
            ConvertError::Server {
                message, solution, ..
            } => match solution {
                Some(s) if !s.trim().is_empty() => format!("{message} - {s}"),
                _ => message.clone(),
            },
            ConvertError::InvalidAudio { .. } => INVALID_AUDIO_MESSAGE.to_string(),
            other => other.to_string(),
        };

        match self.hint() {
            Some(h) if !base.contains(h.suggestion()) => format!("{base} {}", h.suggestion()),
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = ValidationError::UnsupportedFormat {
            mime_type: "application/pdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Unsupported format"), "got: {msg}");
        assert!(msg.contains("application/pdf"));
    }

    #[test]
    fn file_too_large_display_mentions_limit() {
        let e = ValidationError::FileTooLarge {
            size_bytes: 600 * 1024 * 1024,
            limit_bytes: 500 * 1024 * 1024,
        };
        assert!(e.to_string().contains("500MB limit"), "got: {e}");
    }

    #[test]
    fn server_message_joins_solution_and_hint() {
        let e = ConvertError::Server {
            status: 500,
            message: "youtube blocked".into(),
            solution: Some("try again later".into()),
            hint: Some(FailureHint::SwitchToFileUpload),
        };
        assert_eq!(
            e.user_message(),
            "youtube blocked - try again later Try uploading the file directly instead."
        );
    }

    #[test]
    fn timeout_and_network_messages_differ() {
        let t = ConvertError::Timeout { secs: 300, hint: None };
        let n = ConvertError::Network {
            reason: "connection refused".into(),
            hint: None,
        };
        assert_eq!(t.user_message(), TIMEOUT_MESSAGE);
        assert_eq!(n.user_message(), NETWORK_MESSAGE);
        assert!(t.is_transport() && n.is_transport());
    }

    #[test]
    fn hint_not_duplicated() {
        let e = ConvertError::Server {
            status: 400,
            message: "Bad URL. Try uploading the file directly instead.".into(),
            solution: None,
            hint: Some(FailureHint::SwitchToFileUpload),
        };
        assert_eq!(
            e.user_message(),
            "Bad URL. Try uploading the file directly instead."
        );
    }

    #[test]
    fn generic_fallback_with_upload_hint() {
        let e = ConvertError::Server {
            status: 502,
            message: GENERIC_FAILURE_MESSAGE.into(),
            solution: None,
            hint: Some(FailureHint::SwitchToFileUpload),
        };
        assert_eq!(
            e.user_message(),
            "Conversion failed. Try uploading the file directly instead."
        );
    }

    #[test]
    fn validation_hints() {
        assert_eq!(ValidationError::UrlEmpty.hint(), None);
        assert_eq!(ValidationError::NoFileSelected.hint(), None);
        assert_eq!(
            ValidationError::FileTooLarge {
                size_bytes: 2,
                limit_bytes: 1
            }
            .hint(),
            Some(FailureHint::SwitchToUrl)
        );
    }
}
