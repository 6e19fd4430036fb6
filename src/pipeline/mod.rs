//! Post-response stages of a conversion attempt.
//!
//! Everything after the backend call lives here; the call itself is
//! [`crate::backend`].
//!
//! ## Data Flow
//!
//! ```text
//! backend reply ──▶ response ──▶ blob ──▶ save
//!  (status, body)   (classify)   (handle)  (audio_<ms>.mp3)
//! ```
//!
//! 1. [`response`]: turn non-2xx replies into user-facing errors with a
//!    hint, and reject 2xx replies that are not MP3 audio
//! 2. [`blob`]:     hold the downloaded bytes behind a revocable reference
//! 3. [`save`]:     copy the bytes to the output directory atomically

pub mod blob;
pub mod response;
pub mod save;
