//! Transient binary references for downloaded audio.
//!
//! A [`BlobHandle`] owns the MP3 bytes returned by the backend, parked in a
//! `NamedTempFile`, together with a revocable `blob:` URI that identifies it
//! while it is alive. Revoking deletes the temp file and releases the slot in
//! the issuing [`BlobRegistry`].
//!
//! ## Lifetime rules
//!
//! * Revocation is idempotent: the scheduled grace-period task, the
//!   controller superseding a result, and the controller being dropped may
//!   all call [`BlobHandle::revoke`]; only the first call releases anything.
//! * Dropping the last clone of a handle revokes it, so a reference can never
//!   outlive every owner.
//! * [`BlobRegistry::live`] counts unreleased handles. The controller keeps it
//!   at most 1 across any number of attempts.

use crate::error::ConvertError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::task::JoinHandle;
use tracing::debug;

/// Issues [`BlobHandle`]s and counts how many are still alive.
#[derive(Debug, Clone, Default)]
pub struct BlobRegistry {
    live: Arc<AtomicUsize>,
    next_id: Arc<AtomicU64>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles issued by this registry that are not yet revoked.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Park `bytes` in a temp file and return a live reference to them.
    ///
    /// The body is written through `tokio::fs`, off the async worker threads.
    pub async fn materialize(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<BlobHandle, ConvertError> {
        let file = tempfile::Builder::new()
            .prefix("video2mp3-")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| ConvertError::Internal(format!("tempfile: {e}")))?;
        tokio::fs::write(file.path(), bytes)
            .await
            .map_err(|e| ConvertError::Internal(format!("tempfile write: {e}")))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.live.fetch_add(1, Ordering::SeqCst);
        debug!("Materialised blob {} ({} bytes)", id, bytes.len());

        Ok(BlobHandle {
            inner: Arc::new(BlobInner {
                id,
                uri: format!("blob:video2mp3/{id}"),
                content_type: content_type.to_string(),
                size_bytes: bytes.len() as u64,
                file: Mutex::new(Some(file)),
                live: Arc::clone(&self.live),
            }),
        })
    }
}

#[derive(Debug)]
struct BlobInner {
    id: u64,
    uri: String,
    content_type: String,
    size_bytes: u64,
    file: Mutex<Option<NamedTempFile>>,
    live: Arc<AtomicUsize>,
}

impl BlobInner {
    fn release(&self) -> bool {
        let taken = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match taken {
            Some(file) => {
                // Deleting the temp file is best effort; the slot is released regardless.
                let _ = file.close();
                self.live.fetch_sub(1, Ordering::SeqCst);
                debug!("Revoked blob {}", self.id);
                true
            }
            None => false,
        }
    }
}

impl Drop for BlobInner {
    fn drop(&mut self) {
        self.release();
    }
}

/// A revocable reference to downloaded audio bytes. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BlobHandle {
    inner: Arc<BlobInner>,
}

impl BlobHandle {
    /// Opaque identifier, valid until revoked.
    pub fn uri(&self) -> &str {
        &self.inner.uri
    }

    pub fn content_type(&self) -> &str {
        &self.inner.content_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.inner.size_bytes
    }

    pub fn is_revoked(&self) -> bool {
        self.inner
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    /// Location of the bytes on disk, or `None` once revoked.
    pub fn path(&self) -> Option<PathBuf> {
        self.inner
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|f| f.path().to_path_buf())
    }

    /// Release the reference. Returns `true` if this call did the releasing.
    pub fn revoke(&self) -> bool {
        self.inner.release()
    }

    /// Revoke after `grace` on the current tokio runtime.
    ///
    /// Returns `None` (and revokes nothing) when called outside a runtime;
    /// the owner's own revoke-on-drop still applies.
    pub fn schedule_revoke(&self, grace: Duration) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let handle = self.clone();
        Some(runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            handle.revoke();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn materialize_and_revoke() {
        let registry = BlobRegistry::new();
        let blob = registry.materialize(&[1u8; 1024], "audio/mpeg").await.unwrap();
        assert_eq!(registry.live(), 1);
        assert_eq!(blob.size_bytes(), 1024);
        assert_eq!(blob.content_type(), "audio/mpeg");
        assert!(blob.uri().starts_with("blob:video2mp3/"));

        let path = blob.path().expect("live blob has a path");
        assert_eq!(std::fs::read(&path).unwrap().len(), 1024);

        assert!(blob.revoke());
        assert!(blob.is_revoked());
        assert!(blob.path().is_none());
        assert!(!path.exists());
        assert_eq!(registry.live(), 0);
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let registry = BlobRegistry::new();
        let blob = registry.materialize(b"ID3", "audio/mpeg").await.unwrap();
        let clone = blob.clone();
        assert!(blob.revoke());
        assert!(!clone.revoke());
        assert_eq!(registry.live(), 0);
    }

    #[tokio::test]
    async fn dropping_last_clone_releases() {
        let registry = BlobRegistry::new();
        let blob = registry.materialize(b"ID3", "audio/mpeg").await.unwrap();
        let clone = blob.clone();
        drop(blob);
        assert_eq!(registry.live(), 1);
        drop(clone);
        assert_eq!(registry.live(), 0);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let registry = BlobRegistry::new();
        let a = registry.materialize(b"a", "audio/mpeg").await.unwrap();
        let b = registry.materialize(b"b", "audio/mpeg").await.unwrap();
        assert_ne!(a.uri(), b.uri());
        assert_eq!(registry.live(), 2);
    }

    #[test]
    fn schedule_outside_runtime_is_none() {
        let registry = BlobRegistry::new();
        let blob = registry.materialize(b"a", "audio/mpeg");
        let blob = tokio_test::block_on(blob).unwrap();
        assert!(blob.schedule_revoke(Duration::from_millis(1)).is_none());
        assert!(!blob.is_revoked());
    }

    #[tokio::test]
    async fn scheduled_revoke_fires_after_grace() {
        let registry = BlobRegistry::new();
        let blob = registry.materialize(b"a", "audio/mpeg").await.unwrap();
        let task = blob.schedule_revoke(Duration::from_millis(20)).unwrap();
        assert!(!blob.is_revoked());
        task.await.unwrap();
        assert!(blob.is_revoked());
        assert_eq!(registry.live(), 0);
    }
}
