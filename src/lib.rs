//! pianosheet - Turn an audio file or a YouTube link into piano sheet music
//!
//! Drives a conversion session against an external transcription backend:
//! classify the input, look for piano covers, resolve the source, and
//! collect three ABC-notation arrangements.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod backend;
pub mod config;
pub mod defaults;
pub mod error;
pub mod input;
pub mod locale;
pub mod presenter;
pub mod session;

#[cfg(feature = "cli")]
pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod output;

// Backend seam
pub use backend::{HttpBackend, MockBackend, SheetBackend};

// Data model
pub use backend::types::{
    AnalysisResult, CoverCandidate, SheetMusicResult, TranscriptionMode, TranscriptionRequest,
    VideoMetadata,
};
pub use input::{MediaInput, RawInput, ValidationError, classify};

// Session
pub use presenter::{Difficulty, ResultPresenter};
pub use session::{Session, SessionNotice, SessionPhase, SessionState, SourceChoice};

// Error handling
pub use error::{PianosheetError, Result};

// Config
pub use config::Config;
pub use locale::Locale;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_only_when_built_from_git() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(hash_part.len(), 7, "Git hash should be 7 chars, got: {}", ver);
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
