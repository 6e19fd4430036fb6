//! One-shot conversion entry points.
//!
//! These wrap a throwaway [`ConversionController`] for callers that just want
//! "this input in, MP3 on disk out". Use the controller directly when the
//! same request is edited and resubmitted (an interactive front end).

use crate::config::ConversionConfig;
use crate::controller::ConversionController;
use crate::error::ConvertError;
use crate::output::ConversionOutput;
use crate::request::{InputMode, Source, SourceFile};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    let input = input.trim_start();
    input.starts_with("http://") || input.starts_with("https://")
}

/// Convert a video URL or local video file to MP3.
///
/// Inputs starting with `http://` or `https://` are sent as URLs; anything
/// else is treated as a local path and uploaded.
///
/// # Errors
/// Any [`ConvertError`]; validation failures happen before any network call.
pub async fn convert(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let input = input.as_ref();
    if is_url(input) {
        convert_url(input, config).await
    } else {
        convert_file(input, config).await
    }
}

/// Convert a remote video by URL.
pub async fn convert_url(
    url: impl Into<String>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let mut controller = ConversionController::new(config.clone())?;
    controller.set_url(url)?;
    run(&mut controller).await
}

/// Upload and convert a local video file.
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let mut controller = ConversionController::new(config.clone())?;
    controller.set_file(SourceFile::from_path(path)?)?;
    run(&mut controller).await
}

async fn run(controller: &mut ConversionController) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    let mode = controller.request().input_mode();
    info!("Starting {:?}-mode conversion", mode);
    let result = controller.submit().await?;
    Ok(ConversionOutput::from_result(
        result,
        mode,
        start.elapsed().as_millis() as u64,
    ))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Validate an input without contacting the backend.
///
/// Returns what would be sent.
pub fn check(input: impl AsRef<str>, config: &ConversionConfig) -> Result<Source, ConvertError> {
    let input = input.as_ref();
    let mut controller = ConversionController::new(config.clone())?;
    if is_url(input) {
        controller.set_url(input)?;
    } else if input.trim().is_empty() {
        controller.select_mode(InputMode::Url)?;
    } else {
        controller.set_file(SourceFile::from_path(input)?)?;
    }
    controller.validate()?;
    controller
        .request()
        .source()
        .ok_or_else(|| ConvertError::Internal("validated request has no source".into()))
}
