//! Owned summary of a finished conversion.

use crate::request::{ConversionResult, InputMode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a one-shot conversion produced.
///
/// Unlike [`ConversionResult`] this holds no download reference, so it can
/// outlive the controller that produced it. The saved MP3 stays on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub mode: InputMode,
    pub filename: String,
    pub saved_path: PathBuf,
    pub size_bytes: u64,
    pub content_type: String,
    pub duration_ms: u64,
}

impl ConversionOutput {
    pub fn from_result(result: &ConversionResult, mode: InputMode, duration_ms: u64) -> Self {
        Self {
            mode,
            filename: result.filename.clone(),
            saved_path: result.saved_path.clone(),
            size_bytes: result.size_bytes,
            content_type: result.content_type.clone(),
            duration_ms,
        }
    }
}
