//! Data model shared by the backend clients and the session.
//!
//! Response types deserialize the backend's snake_case JSON and accept the
//! camelCase spellings as aliases. Request bodies are private to the clients.

use crate::defaults::SEPARATION_MODEL;
use crate::input::LocalFile;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Read an optional string, treating `""` as absent.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Metadata for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(alias = "videoId")]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel: String,
    #[serde(rename = "thumbnail", alias = "thumbnailUrl", default)]
    pub thumbnail_url: String,
    #[serde(alias = "durationSeconds", default)]
    pub duration_seconds: u64,
    #[serde(
        alias = "songTitle",
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub song_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub artist: Option<String>,
}

impl VideoMetadata {
    /// Title/artist hints carried into a transcription request.
    pub fn hints(&self) -> SongHints {
        SongHints {
            song_title: self.song_title.clone(),
            artist: self.artist.clone(),
        }
    }
}

/// A piano-only rendition of the analysed song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverCandidate {
    #[serde(flatten)]
    pub metadata: VideoMetadata,
    #[serde(rename = "url", alias = "sourceUrl")]
    pub source_url: String,
}

/// Result of analysing a URL: the video itself plus cover candidates,
/// in the order the backend returned them.
///
/// Immutable once built; there is no way to reorder or edit the covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    original: VideoMetadata,
    #[serde(rename = "piano_covers", alias = "pianoCovers", default)]
    covers: Vec<CoverCandidate>,
}

impl AnalysisResult {
    pub fn new(original: VideoMetadata, covers: Vec<CoverCandidate>) -> Self {
        Self { original, covers }
    }

    pub fn original(&self) -> &VideoMetadata {
        &self.original
    }

    pub fn covers(&self) -> &[CoverCandidate] {
        &self.covers
    }

    pub fn has_covers(&self) -> bool {
        !self.covers.is_empty()
    }
}

/// The three ways a song can be transcribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptionMode {
    Direct,
    SourceSeparated,
    EnsembleOfCovers,
}

impl fmt::Display for TranscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionMode::Direct => write!(f, "direct"),
            TranscriptionMode::SourceSeparated => write!(f, "source-separated"),
            TranscriptionMode::EnsembleOfCovers => write!(f, "ensemble"),
        }
    }
}

/// Optional disambiguation hints for the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongHints {
    pub song_title: Option<String>,
    pub artist: Option<String>,
}

/// One transcription request. Each variant maps to one backend call shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionRequest {
    /// Multipart upload of a local file.
    Upload(LocalFile),
    /// A single YouTube URL, optionally source-separated first.
    YouTube {
        url: String,
        separate: bool,
        hints: SongHints,
    },
    /// Several cover URLs reconciled by the backend into one result.
    Ensemble { urls: Vec<String>, hints: SongHints },
}

impl TranscriptionRequest {
    pub fn upload(file: LocalFile) -> Self {
        TranscriptionRequest::Upload(file)
    }

    pub fn direct(url: &str, hints: SongHints) -> Self {
        TranscriptionRequest::YouTube {
            url: url.to_string(),
            separate: false,
            hints,
        }
    }

    pub fn separated(url: &str, hints: SongHints) -> Self {
        TranscriptionRequest::YouTube {
            url: url.to_string(),
            separate: true,
            hints,
        }
    }

    /// Bundle every cover, in analysis order, into one request carrying the
    /// original video's hints. `None` when the analysis found no covers.
    pub fn ensemble(analysis: &AnalysisResult) -> Option<Self> {
        if !analysis.has_covers() {
            return None;
        }
        Some(TranscriptionRequest::Ensemble {
            urls: analysis
                .covers()
                .iter()
                .map(|c| c.source_url.clone())
                .collect(),
            hints: analysis.original().hints(),
        })
    }

    pub fn mode(&self) -> TranscriptionMode {
        match self {
            TranscriptionRequest::Upload(_) => TranscriptionMode::Direct,
            TranscriptionRequest::YouTube { separate: false, .. } => TranscriptionMode::Direct,
            TranscriptionRequest::YouTube { separate: true, .. } => {
                TranscriptionMode::SourceSeparated
            }
            TranscriptionRequest::Ensemble { .. } => TranscriptionMode::EnsembleOfCovers,
        }
    }

    /// Number of source references (1 except for ensembles).
    pub fn source_count(&self) -> usize {
        match self {
            TranscriptionRequest::Ensemble { urls, .. } => urls.len(),
            _ => 1,
        }
    }
}

/// Three ABC-notation scores plus the detected key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMusicResult {
    beginner: String,
    intermediate: String,
    advanced: String,
    key: String,
}

impl SheetMusicResult {
    pub fn new(beginner: &str, intermediate: &str, advanced: &str, key: &str) -> Self {
        Self {
            beginner: beginner.to_string(),
            intermediate: intermediate.to_string(),
            advanced: advanced.to_string(),
            key: key.to_string(),
        }
    }

    pub fn beginner(&self) -> &str {
        &self.beginner
    }

    pub fn intermediate(&self) -> &str {
        &self.intermediate
    }

    pub fn advanced(&self) -> &str {
        &self.advanced
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All four fields populated.
    pub fn is_complete(&self) -> bool {
        [
            &self.beginner,
            &self.intermediate,
            &self.advanced,
            &self.key,
        ]
        .iter()
        .all(|s| !s.trim().is_empty())
    }
}

/// Availability of the source-separation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeparationStatus {
    pub available: bool,
    #[serde(alias = "modelName", default)]
    pub model_name: String,
}

impl SeparationStatus {
    /// What a failed status check is read as.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            model_name: SEPARATION_MODEL.to_string(),
        }
    }
}

/// Response of the backend's root health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

// Request bodies

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeBody<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct YouTubeBody<'a> {
    pub url: &'a str,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnsembleBody<'a> {
    pub urls: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<&'a str>,
}

/// Error body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}
