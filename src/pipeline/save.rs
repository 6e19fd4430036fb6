//! Saving a downloaded MP3: filename synthesis and the atomic write.

use crate::error::ConvertError;
use crate::pipeline::blob::BlobHandle;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// `audio_<unix-millis>.mp3` for the given timestamp.
pub fn filename_at(unix_millis: u128) -> String {
    format!("audio_{unix_millis}.mp3")
}

/// `audio_<unix-millis>.mp3` for the current time.
pub fn timestamped_filename() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    filename_at(millis)
}

/// First path in `dir` for `filename` that does not exist yet.
///
/// Two saves in the same millisecond get `audio_<ms>-1.mp3`, `-2`, ...
fn unused_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let stem = filename.strip_suffix(".mp3").unwrap_or(filename);
    (1u32..)
        .map(|n| dir.join(format!("{stem}-{n}.mp3")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Copy the blob's bytes into `dir` under `filename`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn save_blob(
    blob: &BlobHandle,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, ConvertError> {
    let source = blob
        .path()
        .ok_or_else(|| ConvertError::Internal(format!("{} was revoked before saving", blob.uri())))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let path = unused_path(dir, filename);
    debug!("Saving {} to {}", blob.uri(), path.display());
    copy_atomically(&source, &path).await?;

    info!("Saved {} bytes to {}", blob.size_bytes(), path.display());
    Ok(path)
}

/// Copy `source` to `<path>.tmp`, then rename over `path`.
///
/// The temp file is removed if either step fails.
async fn copy_atomically(source: &Path, path: &Path) -> Result<(), ConvertError> {
    let tmp_path = path.with_extension("mp3.tmp");
    let written = match tokio::fs::copy(source, &tmp_path).await {
        Ok(_) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
