use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::config::{HttpSettings, SanitySettings};
use crate::error::{Error, Result};

/// GROQ query client for one Sanity project and dataset.
#[derive(Debug, Clone)]
pub struct SanityClient {
    client: Client,
    endpoint: Url,
    token: Option<String>,
    timeout_duration: Duration,
}

impl SanityClient {
    pub fn new(
        project_id: &str,
        dataset: &str,
        settings: &SanitySettings,
        http: &HttpSettings,
    ) -> Result<Self> {
        let timeout_duration = Duration::from_secs(http.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout_duration)
            .user_agent(http.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let host = match &settings.api_host {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.{}.sanity.io",
                project_id,
                if settings.use_cdn { "apicdn" } else { "api" }
            ),
        };
        let version = settings.api_version.trim_start_matches('v');
        let endpoint = Url::parse(&format!("{}/v{}/data/query/{}", host, version, dataset))
            .map_err(|e| Error::Config(format!("Invalid Sanity endpoint: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            token: settings.token.clone(),
            timeout_duration,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run `query` with `params` bound as `$name`, returning the `result`
    /// member of the response envelope.
    pub async fn query(&self, query: &str, params: &[(&str, Value)]) -> Result<Value> {
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }

        debug!("Sanity query against {} ({} params)", self.endpoint, params.len());

        let response = timeout(self.timeout_duration, self.send(&pairs))
            .await
            .map_err(|_| Error::Connection(format!("Request to {} timed out", self.endpoint)))??;

        if !response.status().is_success() {
            return Err(Error::from_status(response.status(), self.endpoint.path()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Connection(format!("Failed to read response body: {}", e)))?;

        let mut envelope: Value = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("Sanity returned malformed JSON: {}", e)))?;

        match envelope.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(Error::InvalidResponse(
                "Sanity response has no result member".to_string(),
            )),
        }
    }

    async fn send(&self, pairs: &[(String, String)]) -> Result<Response> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .query(pairs)
            .header("Accept", "application/json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        Ok(request.send().await?)
    }
}
