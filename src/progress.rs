//! Progress-callback trait for conversion lifecycle events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to observe
//! an attempt as the controller drives it through its states.
//!
//! Progress is coarse: the backend reports nothing while it converts, so the
//! only percentages ever emitted are 0 (request in flight) and 100 (saved).
//!
//! # Example
//!
//! ```rust
//! use video2mp3::{ConversionConfig, ConversionProgressCallback, RequestStatus};
//! use std::sync::{Arc, Mutex};
//!
//! struct StatusLog(Mutex<Vec<RequestStatus>>);
//!
//! impl ConversionProgressCallback for StatusLog {
//!     fn on_status_change(&self, status: RequestStatus) {
//!         self.0.lock().unwrap().push(status);
//!     }
//! }
//!
//! let log = Arc::new(StatusLog(Mutex::new(Vec::new())));
//! let config = ConversionConfig::builder()
//!     .progress_callback(log as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::FailureHint;
use crate::request::{InputMode, RequestStatus};
use std::path::Path;
use std::sync::Arc;

/// Called by the controller as an attempt moves through its lifecycle.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once per `submit()`, before validation.
    fn on_attempt_start(&self, mode: InputMode) {
        let _ = mode;
    }

    /// Called on every status transition.
    fn on_status_change(&self, status: RequestStatus) {
        let _ = status;
    }

    /// Called when the coarse progress value changes.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Called after the MP3 has been written to disk.
    fn on_saved(&self, path: &Path, size_bytes: u64) {
        let _ = (path, size_bytes);
    }

    /// Called once when an attempt ends in `Failed`.
    fn on_failure(&self, message: &str, hint: Option<FailureHint>) {
        let _ = (message, hint);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
