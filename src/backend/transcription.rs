//! Transcription client.
//!
//! Dispatches a [`TranscriptionRequest`] to one of the backend's four call
//! shapes and normalizes every response into a [`SheetMusicResult`]. Each call
//! is single-shot.

use crate::backend::http::BackendHttp;
use crate::backend::types::{
    EnsembleBody, SeparationStatus, SheetMusicResult, TranscriptionRequest, YouTubeBody,
};
use crate::error::{PianosheetError, Result};
use crate::input::LocalFile;
use crate::locale::Locale;
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};

const UPLOAD_PATH: &str = "/transcribe/upload";
const YOUTUBE_PATH: &str = "/transcribe/youtube";
const ENSEMBLE_PATH: &str = "/transcribe/ensemble";
const SEPARATION_STATUS_PATH: &str = "/separation/status";

/// Wire value of the `mode` field for a YouTube request.
fn youtube_mode(separate: bool) -> &'static str {
    if separate { "demucs" } else { "direct" }
}

#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    http: BackendHttp,
}

impl TranscriptionClient {
    pub fn new(http: BackendHttp) -> Self {
        Self { http }
    }

    /// Run one transcription request.
    ///
    /// # Errors
    ///
    /// Returns `PianosheetError::TranscriptionFailed` carrying the backend's
    /// detail message (or the localized fallback) on any failure, including a
    /// response with an empty score or key.
    pub async fn transcribe(&self, request: &TranscriptionRequest) -> Result<SheetMusicResult> {
        tracing::debug!(
            mode = %request.mode(),
            sources = request.source_count(),
            "Dispatching transcription request"
        );

        let builder = self.build(request)?;
        let response = builder
            .send()
            .await
            .map_err(|e| PianosheetError::TranscriptionFailed {
                message: self.http.send_failure(&e),
            })?;

        let result: SheetMusicResult = self
            .http
            .read_json(response)
            .await
            .map_err(|message| PianosheetError::TranscriptionFailed { message })?;

        if !result.is_complete() {
            tracing::warn!("Backend returned an incomplete sheet music result");
            return Err(PianosheetError::TranscriptionFailed {
                message: self.http.locale().generic_failure().to_string(),
            });
        }

        tracing::info!(mode = %request.mode(), key = %result.key(), "Transcription complete");
        Ok(result)
    }

    fn build(&self, request: &TranscriptionRequest) -> Result<RequestBuilder> {
        let client = self.http.client();
        let builder = match request {
            TranscriptionRequest::Upload(file) => client
                .post(self.http.endpoint(UPLOAD_PATH))
                .multipart(upload_form(file, self.http.locale())?),
            TranscriptionRequest::YouTube {
                url,
                separate,
                hints,
            } => client
                .post(self.http.endpoint(YOUTUBE_PATH))
                .json(&YouTubeBody {
                    url,
                    mode: youtube_mode(*separate),
                    song_title: hints.song_title.as_deref(),
                    artist: hints.artist.as_deref(),
                }),
            TranscriptionRequest::Ensemble { urls, hints } => client
                .post(self.http.endpoint(ENSEMBLE_PATH))
                .json(&EnsembleBody {
                    urls,
                    song_title: hints.song_title.as_deref(),
                    artist: hints.artist.as_deref(),
                }),
        };
        Ok(builder)
    }

    /// Ask whether source separation is available.
    ///
    /// Never fails: any error is read as "unavailable".
    pub async fn separation_status(&self) -> SeparationStatus {
        let response = match self
            .http
            .client()
            .get(self.http.endpoint(SEPARATION_STATUS_PATH))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Separation status check failed");
                return SeparationStatus::unavailable();
            }
        };

        match self.http.read_json::<SeparationStatus>(response).await {
            Ok(status) => status,
            Err(message) => {
                tracing::warn!(%message, "Separation status check failed");
                SeparationStatus::unavailable()
            }
        }
    }
}

fn upload_form(file: &LocalFile, locale: Locale) -> Result<Form> {
    let part = Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| {
            tracing::warn!(mime = %file.mime_type, error = %e, "Failed to create upload part");
            PianosheetError::TranscriptionFailed {
                message: locale.generic_failure().to_string(),
            }
        })?;
    Ok(Form::new().part("file", part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_mode_wire_values() {
        assert_eq!(youtube_mode(false), "direct");
        assert_eq!(youtube_mode(true), "demucs");
    }

    #[test]
    fn test_upload_form_accepts_allowed_mime() {
        let file = LocalFile {
            bytes: vec![1, 2, 3],
            mime_type: "audio/x-wav".to_string(),
            size_bytes: 3,
            name: "take.wav".to_string(),
        };
        assert!(upload_form(&file, Locale::En).is_ok());
    }

    #[test]
    fn test_bad_upload_mime_fails_with_localized_message() {
        let file = LocalFile {
            bytes: vec![1, 2, 3],
            mime_type: "not a mime".to_string(),
            size_bytes: 3,
            name: "take.wav".to_string(),
        };
        match upload_form(&file, Locale::Ja) {
            Err(PianosheetError::TranscriptionFailed { message }) => {
                assert_eq!(message, Locale::Ja.generic_failure())
            }
            other => panic!("Expected TranscriptionFailed, got {:?}", other.map(|_| ())),
        }
    }
}
