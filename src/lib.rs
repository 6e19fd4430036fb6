//! # video2mp3
//!
//! Convert videos to MP3 through a remote conversion service.
//!
//! A video is either a URL the service fetches itself, or a local file
//! uploaded as multipart data. The service answers with `audio/mpeg` bytes
//! which are saved as `audio_<unix-millis>.mp3`.
//!
//! ## Attempt Overview
//!
//! ```text
//! input
//!  │
//!  ├─ 1. Validate  URL non-empty, or file type + size (no network)
//!  ├─ 2. Send      one multipart POST, hard timeout
//!  ├─ 3. Check     status, content type, non-empty body
//!  ├─ 4. Hold      revocable download reference to the bytes
//!  └─ 5. Save      atomic write into the output directory
//! ```
//!
//! Failures carry a [`FailureHint`]: "upload the file instead" when a remote
//! source is blocked, "paste a link instead" when a file is rejected, and
//! "try again later" when the service is rate limited.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use video2mp3::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().output_dir("downloads").build()?;
//!     let output = convert("https://example.com/talk.mp4", &config).await?;
//!     println!("saved {} ({} bytes)", output.saved_path.display(), output.size_bytes);
//!     Ok(())
//! }
//! ```
//!
//! For repeated edits and resubmits of one request, drive a
//! [`ConversionController`] directly.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `video2mp3` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! video2mp3 = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BackendResponse, ConversionBackend, HttpBackend};
pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use controller::ConversionController;
pub use convert::{check, convert, convert_file, convert_sync, convert_url, is_url};
pub use error::{ConvertError, FailureHint, ValidationError};
pub use output::ConversionOutput;
pub use pipeline::blob::{BlobHandle, BlobRegistry};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{
    ConversionRequest, ConversionResult, InputMode, RequestStatus, Source, SourceFile,
};
pub use validate::validate;
