//! Interpreting backend responses.
//!
//! Failures come back either as JSON `{ "error": "...", "solution": "..." }`
//! or as arbitrary text (proxy error pages, plain strings). This module turns
//! both into a [`ConvertError::Server`] with a structured [`FailureHint`]
//! inferred by fixed rules, and checks that a 2xx body really is MP3 audio.
//!
//! ## Hint rules
//!
//! Applied to the `error` field (or the raw body when it is not JSON), in order:
//!
//! 1. mentions of URLs or remote video sites → [`FailureHint::SwitchToFileUpload`]
//! 2. quota/rate-limit wording, or HTTP 429 → [`FailureHint::RetryLater`]
//! 3. an empty body → [`FailureHint::SwitchToFileUpload`] with the generic message

use crate::error::{ConvertError, FailureHint, GENERIC_FAILURE_MESSAGE};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Content type the backend sends for a converted file.
pub const EXPECTED_AUDIO_TYPE: &str = "audio/mpeg";

/// Raw-text error bodies longer than this are cut (HTML error pages).
const MAX_RAW_MESSAGE_CHARS: usize = 300;

// "url" anywhere (invalid_url, URLError) except as part of "curl".
static RE_REMOTE_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^c])url|\b(?:youtube|youtu\.be|vimeo|tiktok|links?|remote)\b").unwrap()
});

static RE_RETRY_LATER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(limit reached|rate[ -]?limit|too many requests|quota)").unwrap()
});

/// Structured error body returned by the conversion backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default)]
    pub solution: Option<String>,
}

/// Parse a JSON error body; `None` if it is not the expected shape.
pub fn parse_error_payload(body: &[u8]) -> Option<ErrorPayload> {
    serde_json::from_slice::<ErrorPayload>(body)
        .ok()
        .filter(|p| !p.error.trim().is_empty())
}

/// Infer a remediation from the failure text and HTTP status.
pub fn classify_failure(status: u16, text: &str) -> Option<FailureHint> {
    if RE_REMOTE_SOURCE.is_match(text) {
        Some(FailureHint::SwitchToFileUpload)
    } else if status == 429 || RE_RETRY_LATER.is_match(text) {
        Some(FailureHint::RetryLater)
    } else {
        None
    }
}

/// Build the error for a non-2xx response.
pub fn server_error(status: u16, body: &[u8]) -> ConvertError {
    if let Some(payload) = parse_error_payload(body) {
        let hint = classify_failure(status, &payload.error);
        return ConvertError::Server {
            status,
            message: payload.error.trim().to_string(),
            solution: payload
                .solution
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            hint,
        };
    }

    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if raw.is_empty() {
        return ConvertError::Server {
            status,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            solution: None,
            hint: Some(FailureHint::SwitchToFileUpload),
        };
    }

    ConvertError::Server {
        status,
        message: truncate_chars(raw, MAX_RAW_MESSAGE_CHARS),
        solution: None,
        hint: classify_failure(status, raw),
    }
}

/// Reject a 2xx response whose body is not usable MP3 audio.
pub fn check_audio(content_type: Option<&str>, body: &[u8]) -> Result<(), ConvertError> {
    if body.is_empty() {
        return Err(ConvertError::InvalidAudio {
            reason: "empty response body".into(),
            hint: None,
        });
    }
    match content_type {
        Some(ct) if ct.to_ascii_lowercase().contains(EXPECTED_AUDIO_TYPE) => Ok(()),
        Some(ct) => Err(ConvertError::InvalidAudio {
            reason: format!("unexpected content type '{ct}'"),
            hint: None,
        }),
        None => Err(ConvertError::InvalidAudio {
            reason: "response has no content type".into(),
            hint: None,
        }),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}
