//! Client-side input validation.
//!
//! Runs before any network activity. Each rule maps to its own
//! [`ValidationError`] variant so the caller can offer a targeted fix: a
//! blank URL needs a URL, a wrong container needs a different file (or a
//! URL), an oversized file needs a URL.

use crate::config::ConversionConfig;
use crate::error::ValidationError;
use crate::request::{ConversionRequest, InputMode, SourceFile};
use std::path::Path;
use tracing::debug;

/// Check the field of the request's current mode.
///
/// For files the media-type rule is checked before the size rule, so an
/// unsupported file is reported as such whatever its size.
pub fn validate(request: &ConversionRequest, config: &ConversionConfig) -> Result<(), ValidationError> {
    match request.input_mode() {
        InputMode::Url => match request.source_url() {
            Some(url) if !url.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::UrlEmpty),
        },
        InputMode::File => match request.source_file() {
            Some(file) => validate_file(file, config),
            None => Err(ValidationError::NoFileSelected),
        },
    }
}

/// Apply the media-type and size rules to a chosen file.
pub fn validate_file(file: &SourceFile, config: &ConversionConfig) -> Result<(), ValidationError> {
    if !config.is_allowed_type(&file.mime_type) {
        debug!("Rejecting {}: media type {}", file.name, file.mime_type);
        return Err(ValidationError::UnsupportedFormat {
            mime_type: file.mime_type.clone(),
        });
    }
    if file.size_bytes > config.max_file_size {
        debug!("Rejecting {}: {} bytes", file.name, file.size_bytes);
        return Err(ValidationError::FileTooLarge {
            size_bytes: file.size_bytes,
            limit_bytes: config.max_file_size,
        });
    }
    Ok(())
}

/// Declared media type for a file, from its extension.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" | "qt" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" | "mpe" => "video/mpeg",
        "mkv" => "video/x-matroska",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

impl SourceFile {
    /// Describe a local file for upload: name, declared type and size.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let path = path.as_ref();
        let meta = match std::fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => {
                return Err(ValidationError::FileNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(ValidationError::PermissionDenied {
                    path: path.to_path_buf(),
                })
            }
            Err(_) => {
                return Err(ValidationError::FileNotFound {
                    path: path.to_path_buf(),
                })
            }
        };

        // Metadata can succeed on files we still cannot open.
        if let Err(e) = std::fs::File::open(path) {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                return Err(ValidationError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        Ok(SourceFile {
            path: path.to_path_buf(),
            name,
            mime_type: media_type_for_path(path).to_string(),
            size_bytes: meta.len(),
        })
    }
}
