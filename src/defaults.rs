//! Default configuration constants for pianosheet.
//!
//! Shared by the input classifier, the backend clients and the config layer
//! so that limits and endpoints stay consistent.

/// Largest audio file accepted for upload, in bytes (20 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// MIME types the upload endpoint accepts.
pub const ALLOWED_MIME_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/x-wav", "audio/mp3"];

/// Filename extensions accepted when the declared MIME type is missing or unknown,
/// paired with the MIME type sent to the backend for them.
pub const ALLOWED_EXTENSIONS: &[(&str, &str)] = &[("mp3", "audio/mpeg"), ("wav", "audio/wav")];

/// Default backend base URL. All endpoint paths are relative to it.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";

/// Default whole-request timeout in seconds. Covers download, separation
/// and arrangement, which all happen server-side in one request.
pub const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Default TCP connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Seconds between "(i/N)" steps while an ensemble request is outstanding.
pub const ENSEMBLE_STEP_SECS: u64 = 20;

/// Upper bound accepted for `narration.ensemble_step_secs`.
pub const MAX_ENSEMBLE_STEP_SECS: u64 = 3600;

/// Separation model reported when the status endpoint cannot be reached.
pub const SEPARATION_MODEL: &str = "htdemucs";
