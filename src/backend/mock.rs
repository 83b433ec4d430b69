//! In-memory backend for tests.

use crate::backend::SheetBackend;
use crate::backend::types::{
    AnalysisResult, SeparationStatus, SheetMusicResult, TranscriptionRequest,
};
use crate::error::{PianosheetError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Mock backend with canned responses and a call log.
#[derive(Debug)]
pub struct MockBackend {
    analysis: std::result::Result<AnalysisResult, String>,
    transcription: std::result::Result<SheetMusicResult, String>,
    separation: SeparationStatus,
    latency: Duration,
    analyzed: Mutex<Vec<String>>,
    transcribed: Mutex<Vec<TranscriptionRequest>>,
    status_checks: Mutex<usize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A backend whose analysis finds no covers and whose transcriptions succeed.
    pub fn new() -> Self {
        Self {
            analysis: Err("no analysis configured".to_string()),
            transcription: Ok(SheetMusicResult::new(
                "X:1\nT:Beginner\nK:C\nC2 E2 G2|",
                "X:1\nT:Intermediate\nK:C\nCE EG Gc|",
                "X:1\nT:Advanced\nK:C\n[CEG]2 [EGc]2|",
                "C major",
            )),
            separation: SeparationStatus::unavailable(),
            latency: Duration::ZERO,
            analyzed: Mutex::new(Vec::new()),
            transcribed: Mutex::new(Vec::new()),
            status_checks: Mutex::new(0),
        }
    }

    /// Configure the analysis result.
    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.analysis = Ok(analysis);
        self
    }

    /// Configure analysis to fail with a detail message.
    pub fn with_analysis_failure(mut self, message: &str) -> Self {
        self.analysis = Err(message.to_string());
        self
    }

    /// Configure the transcription result.
    pub fn with_result(mut self, result: SheetMusicResult) -> Self {
        self.transcription = Ok(result);
        self
    }

    /// Configure transcription to fail with a detail message.
    pub fn with_transcription_failure(mut self, message: &str) -> Self {
        self.transcription = Err(message.to_string());
        self
    }

    pub fn with_separation(mut self, available: bool) -> Self {
        self.separation = SeparationStatus {
            available,
            model_name: "htdemucs".to_string(),
        };
        self
    }

    /// Delay every analysis and transcription call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// URLs passed to `analyze`, in call order.
    pub fn analyzed_urls(&self) -> Vec<String> {
        self.analyzed.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Requests passed to `transcribe`, in call order.
    pub fn transcription_requests(&self) -> Vec<TranscriptionRequest> {
        self.transcribed.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn separation_checks(&self) -> usize {
        self.status_checks.lock().map(|n| *n).unwrap_or_default()
    }

    /// Total number of calls that would have hit the network.
    pub fn network_calls(&self) -> usize {
        self.analyzed_urls().len() + self.transcription_requests().len() + self.separation_checks()
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl SheetBackend for MockBackend {
    async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        if let Ok(mut calls) = self.analyzed.lock() {
            calls.push(url.to_string());
        }
        self.delay().await;
        self.analysis
            .clone()
            .map_err(|message| PianosheetError::AnalysisFailed { message })
    }

    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<SheetMusicResult> {
        if let Ok(mut calls) = self.transcribed.lock() {
            calls.push(request.clone());
        }
        self.delay().await;
        self.transcription
            .clone()
            .map_err(|message| PianosheetError::TranscriptionFailed { message })
    }

    async fn separation_status(&self) -> SeparationStatus {
        if let Ok(mut n) = self.status_checks.lock() {
            *n += 1;
        }
        self.separation.clone()
    }
}
