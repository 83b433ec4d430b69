//! Video analysis client.
//!
//! Fetches metadata and piano-cover candidates for a URL in one request.
//! Nothing is retried, re-ranked or deduplicated here.

use crate::backend::http::BackendHttp;
use crate::backend::types::{AnalysisResult, AnalyzeBody, HealthStatus};
use crate::error::{PianosheetError, Result};

const ANALYZE_PATH: &str = "/youtube/analyze";

#[derive(Debug, Clone)]
pub struct VideoAnalysisClient {
    http: BackendHttp,
}

impl VideoAnalysisClient {
    pub fn new(http: BackendHttp) -> Self {
        Self { http }
    }

    /// Analyse a URL.
    ///
    /// # Errors
    ///
    /// Returns `PianosheetError::AnalysisFailed` carrying the backend's detail
    /// message (or the localized fallback) on any failure.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        let endpoint = self.http.endpoint(ANALYZE_PATH);
        tracing::debug!(%url, %endpoint, "Requesting video analysis");

        let response = self
            .http
            .client()
            .post(&endpoint)
            .json(&AnalyzeBody { url })
            .send()
            .await
            .map_err(|e| PianosheetError::AnalysisFailed {
                message: self.http.send_failure(&e),
            })?;

        let analysis: AnalysisResult = self
            .http
            .read_json(response)
            .await
            .map_err(|message| PianosheetError::AnalysisFailed { message })?;

        tracing::info!(
            video_id = %analysis.original().video_id,
            covers = analysis.covers().len(),
            "Video analysed"
        );
        Ok(analysis)
    }

    /// Query the backend's root health endpoint.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .client()
            .get(self.http.root())
            .send()
            .await
            .map_err(|e| PianosheetError::Other(self.http.send_failure(&e)))?;

        self.http
            .read_json(response)
            .await
            .map_err(PianosheetError::Other)
    }
}
