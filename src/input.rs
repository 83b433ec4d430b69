//! Input classification.
//!
//! Turns what the user handed us (a file or a URL string) into a tagged
//! [`MediaInput`], rejecting anything the backend would refuse before any
//! network call is made. [`classify`] is pure; reading a file from disk lives
//! in [`read_file`].

use crate::defaults::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Reasons an input is rejected locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported format for '{name}' ({mime_type}); upload an MP3 or WAV file")]
    UnsupportedFormat { name: String, mime_type: String },

    #[error("file is too large ({size_bytes} bytes, limit {limit} bytes)")]
    FileTooLarge { size_bytes: u64, limit: u64 },

    #[error("URL is empty")]
    EmptyUrl,
}

/// Unvalidated input as supplied by the user.
#[derive(Clone, PartialEq, Eq)]
pub enum RawInput {
    File {
        bytes: Vec<u8>,
        /// Declared MIME type, if any.
        mime_type: Option<String>,
        /// Declared size. Equals `bytes.len()` unless the contents were
        /// skipped because the file is over the upload limit.
        size_bytes: u64,
        name: String,
    },
    Url(String),
}

impl RawInput {
    /// Build a file input whose size is the length of its contents.
    pub fn file(bytes: Vec<u8>, mime_type: Option<&str>, name: &str) -> Self {
        RawInput::File {
            size_bytes: bytes.len() as u64,
            bytes,
            mime_type: mime_type.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn url(url: &str) -> Self {
        RawInput::Url(url.to_string())
    }
}

impl fmt::Debug for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawInput::File {
                bytes,
                mime_type,
                size_bytes,
                name,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("mime_type", mime_type)
                .field("size_bytes", size_bytes)
                .field("loaded_bytes", &bytes.len())
                .finish(),
            RawInput::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// A validated audio file ready for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub bytes: Vec<u8>,
    /// One of the allowed MIME types; the backend re-checks it.
    pub mime_type: String,
    pub size_bytes: u64,
    pub name: String,
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

/// Validated input, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInput {
    LocalFile(LocalFile),
    /// Trimmed, non-empty URL. Its shape is left for the backend to judge.
    RemoteUrl(String),
}

/// Validate and tag a raw input.
///
/// Files are checked for size first, so every oversized file fails with
/// [`ValidationError::FileTooLarge`] regardless of its format. The declared
/// MIME type is matched against the allow-list, falling back to the filename
/// extension.
pub fn classify(input: RawInput) -> Result<MediaInput, ValidationError> {
    match input {
        RawInput::File {
            bytes,
            mime_type,
            size_bytes,
            name,
        } => {
            if size_bytes > MAX_UPLOAD_BYTES {
                return Err(ValidationError::FileTooLarge {
                    size_bytes,
                    limit: MAX_UPLOAD_BYTES,
                });
            }
            let accepted = mime_type
                .as_deref()
                .and_then(allowed_mime)
                .or_else(|| mime_for_extension(&name))
                .ok_or_else(|| ValidationError::UnsupportedFormat {
                    name: name.clone(),
                    mime_type: mime_type.clone().unwrap_or_else(|| "unknown".to_string()),
                })?;
            Ok(MediaInput::LocalFile(LocalFile {
                bytes,
                mime_type: accepted.to_string(),
                size_bytes,
                name,
            }))
        }
        RawInput::Url(url) => {
            let trimmed = url.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::EmptyUrl);
            }
            Ok(MediaInput::RemoteUrl(trimmed.to_string()))
        }
    }
}

/// Normalize a declared MIME type (`Audio/MPEG; charset=x` → `audio/mpeg`)
/// and return the allow-list entry it matches.
fn allowed_mime(declared: &str) -> Option<&'static str> {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    ALLOWED_MIME_TYPES
        .iter()
        .copied()
        .find(|allowed| *allowed == essence)
}

fn mime_for_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .map(|(_, mime)| *mime)
}

/// Read a file from disk into a [`RawInput`].
///
/// The MIME type is sniffed from the contents. Contents are only loaded when
/// the file is within the upload limit; an oversized file is returned with its
/// real size and no bytes so that classification rejects it.
pub fn read_file(path: &Path) -> std::io::Result<RawInput> {
    let size_bytes = fs::metadata(path)?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if size_bytes > MAX_UPLOAD_BYTES {
        return Ok(RawInput::File {
            bytes: Vec::new(),
            mime_type: None,
            size_bytes,
            name,
        });
    }

    let bytes = fs::read(path)?;
    let mime_type = infer::get(&bytes).map(|kind| kind.mime_type().to_string());
    Ok(RawInput::File {
        size_bytes: bytes.len() as u64,
        bytes,
        mime_type,
        name,
    })
}
