use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::{AsilSyncError, Result};

const API_PREFIX: &str = "/rest/api/3";

/// Authenticated Jira REST client.
///
/// The host platform is expected to supply the credential; locally it comes
/// from configuration. All request/response bodies are JSON; non-2xx
/// responses surface as `AsilSyncError::Api` carrying status and body text.
#[derive(Debug)]
pub struct JiraClient {
    client: Client,
    base_url: String,
}

impl JiraClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        // Validate early so malformed config fails at startup, not mid-run
        Url::parse(base_url)
            .map_err(|e| AsilSyncError::Config(format!("Invalid Jira base URL: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("asilsync/0.3"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| AsilSyncError::Config(format!("Invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AsilSyncError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// `GET` a REST path (relative to `/rest/api/3`) and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.api_url(path)).send().await?;
        Self::decode(response).await
    }

    /// `POST` a JSON body to a REST path and decode the JSON response.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(AsilSyncError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
