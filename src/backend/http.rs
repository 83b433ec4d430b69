//! Shared HTTP plumbing for the backend clients.

use crate::backend::types::ErrorBody;
use crate::config::BackendConfig;
use crate::error::{PianosheetError, Result};
use crate::locale::Locale;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("pianosheet/", env!("CARGO_PKG_VERSION"));

/// A configured HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendHttp {
    client: Client,
    base_url: String,
    locale: Locale,
}

impl BackendHttp {
    pub fn new(config: &BackendConfig, locale: Locale) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PianosheetError::HttpClient {
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            locale,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Join an endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The server root, where the health endpoint lives whatever the API prefix.
    pub fn root(&self) -> String {
        match reqwest::Url::parse(&self.base_url) {
            Ok(mut url) => {
                url.set_path("/");
                url.set_query(None);
                url.to_string()
            }
            Err(_) => self.endpoint("/"),
        }
    }

    /// Message for a request that never got a response.
    pub fn send_failure(&self, err: &reqwest::Error) -> String {
        format!("{} ({err})", self.locale.backend_unreachable())
    }

    /// Read a response: decode the body on success, or extract the
    /// backend's `detail` message on failure.
    ///
    /// The error side is the message only; callers wrap it in the variant
    /// that fits their operation.
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> std::result::Result<T, String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = detail_message(&body, self.locale);
            tracing::debug!(status = status.as_u16(), %message, "Backend returned an error");
            return Err(message);
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("{} ({e})", self.locale.generic_failure()))?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "Unexpected response body from backend");
            self.locale.generic_failure().to_string()
        })
    }
}

/// Pull the human-readable `detail` out of an error body, or fall back to
/// the localized generic message.
pub fn detail_message(body: &str, locale: Locale) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.detail)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| locale.generic_failure().to_string())
}
