//! Transcription backend: data model, HTTP clients and the seam the session
//! talks to.

pub mod analysis;
pub mod http;
pub mod mock;
pub mod transcription;
pub mod types;

pub use analysis::VideoAnalysisClient;
pub use http::BackendHttp;
pub use mock::MockBackend;
pub use transcription::TranscriptionClient;
pub use types::{
    AnalysisResult, CoverCandidate, HealthStatus, SeparationStatus, SheetMusicResult, SongHints,
    TranscriptionMode, TranscriptionRequest, VideoMetadata,
};

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Everything the session needs from the backend.
///
/// This trait allows swapping implementations (real HTTP vs mock).
#[async_trait]
pub trait SheetBackend: Send + Sync {
    /// Fetch metadata and piano-cover candidates for a URL.
    async fn analyze(&self, url: &str) -> Result<AnalysisResult>;

    /// Run one transcription request to completion.
    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<SheetMusicResult>;

    /// Whether source separation can be offered. Infallible: a failed check
    /// reads as unavailable.
    async fn separation_status(&self) -> SeparationStatus;
}

/// Implement SheetBackend for Arc<T> to allow sharing across sessions.
#[async_trait]
impl<T: SheetBackend + ?Sized> SheetBackend for Arc<T> {
    async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        (**self).analyze(url).await
    }

    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<SheetMusicResult> {
        (**self).transcribe(request).await
    }

    async fn separation_status(&self) -> SeparationStatus {
        (**self).separation_status().await
    }
}

/// The real backend, reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    analysis: VideoAnalysisClient,
    transcription: TranscriptionClient,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let http = BackendHttp::new(&config.backend, config.output.locale)?;
        Ok(Self {
            analysis: VideoAnalysisClient::new(http.clone()),
            transcription: TranscriptionClient::new(http),
        })
    }

    /// Query the backend's health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.analysis.health().await
    }
}

#[async_trait]
impl SheetBackend for HttpBackend {
    async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        self.analysis.analyze(url).await
    }

    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<SheetMusicResult> {
        self.transcription.transcribe(request).await
    }

    async fn separation_status(&self) -> SeparationStatus {
        self.transcription.separation_status().await
    }
}
