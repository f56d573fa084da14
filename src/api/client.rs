use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::error::ApiError;

/// Thin JSON-over-HTTP transport. One request per call; no retries.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("brandwatch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// POST `body` as JSON to `endpoint` and decode the JSON answer.
    ///
    /// Non-2xx answers become [`ApiError::Status`], carrying the body's
    /// `message` field when there is one.
    pub fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = endpoint_url(&self.base_url, endpoint)?;
        let start_time = Instant::now();
        info!(action = "start", component = "api_client", url = %url, "Sending request");

        let response = self.client.post(url.clone()).json(body).send()?;
        let status = response.status();
        let text = response.text()?;

        info!(
            action = "complete",
            component = "api_client",
            status = status.as_u16(),
            bytes = text.len(),
            duration_ms = start_time.elapsed().as_millis(),
            "Received response"
        );

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &text);
            warn!(action = "error", component = "api_client", status = status.as_u16(), error = %err, "Request failed");
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            message: format!("Failed to decode response from {}: {}", url, e),
        })
    }
}

/// Join a base URL and an endpoint path; the leading slash on the path is optional.
pub fn endpoint_url(base: &Url, endpoint: &str) -> Result<Url, ApiError> {
    let path = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{}", endpoint)
    };

    let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| ApiError::Transport {
        message: format!("Invalid endpoint URL '{}': {}", joined, e),
    })
}
