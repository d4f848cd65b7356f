use reqwest::{Client, Response};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::config::HttpSettings;
use crate::error::{Error, Result};

/// Upper bound on pages walked for one collection.
const MAX_PAGES: u64 = 50;

pub const PAGE_SIZE: u64 = 100;

/// REST client for a Strapi server's `/api` routes.
#[derive(Debug, Clone)]
pub struct StrapiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    timeout_duration: Duration,
}

impl StrapiClient {
    pub fn new(base_url: &str, token: Option<String>, http: &HttpSettings) -> Result<Self> {
        let timeout_duration = Duration::from_secs(http.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout_duration)
            .user_agent(http.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = Url::parse(&format!("{}/", base_url.trim().trim_end_matches('/')))
            .map_err(|e| Error::Config(format!("Invalid Strapi URL {}: {}", base_url, e)))?;

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
            timeout_duration,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /api/{path}`, returning the flattened `data` member.
    pub async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let (data, _) = self.get_page(path, params).await?;
        Ok(data)
    }

    /// Walk every page of a collection route and concatenate the entries.
    pub async fn get_all(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        self.collect_pages(path, params, None).await
    }

    /// The first `limit` entries of a collection route. Strapi caps
    /// `pageSize` at its `maxLimit`, so large limits span several pages.
    pub async fn get_first(
        &self,
        path: &str,
        params: &[(String, String)],
        limit: usize,
    ) -> Result<Value> {
        self.collect_pages(path, params, Some(limit.max(1))).await
    }

    async fn collect_pages(
        &self,
        path: &str,
        params: &[(String, String)],
        limit: Option<usize>,
    ) -> Result<Value> {
        let page_size = match limit {
            Some(limit) => (limit as u64).min(PAGE_SIZE),
            None => PAGE_SIZE,
        };
        let mut entries = Vec::new();
        let mut page = 1;

        loop {
            let mut paged = params.to_vec();
            paged.push(("pagination[page]".to_string(), page.to_string()));
            paged.push(("pagination[pageSize]".to_string(), page_size.to_string()));

            let (data, page_count) = self.get_page(path, &paged).await?;
            match data {
                Value::Array(items) => entries.extend(items),
                Value::Null => {}
                other => {
                    return Err(Error::InvalidResponse(format!(
                        "Expected a list from /api/{}, got {}",
                        path,
                        crate::raw::kind(&other)
                    )))
                }
            }

            if let Some(limit) = limit {
                if entries.len() >= limit {
                    entries.truncate(limit);
                    break;
                }
            }
            if page >= page_count.min(MAX_PAGES) {
                break;
            }
            page += 1;
        }

        Ok(Value::Array(entries))
    }

    async fn get_page(&self, path: &str, params: &[(String, String)]) -> Result<(Value, u64)> {
        let url = self
            .base_url
            .join(&format!("api/{}", path.trim_start_matches('/')))
            .map_err(|e| Error::Config(format!("Invalid Strapi route {}: {}", path, e)))?;

        debug!("Strapi request {} ({} params)", url, params.len());

        let response = timeout(self.timeout_duration, self.send(url.clone(), params))
            .await
            .map_err(|_| Error::Connection(format!("Request to {} timed out", url)))??;

        if !response.status().is_success() {
            return Err(Error::from_status(response.status(), url.path()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Connection(format!("Failed to read response body: {}", e)))?;

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("Strapi returned malformed JSON: {}", e)))?;

        let mut envelope = match envelope {
            Value::Object(envelope) => envelope,
            other => {
                return Err(Error::InvalidResponse(format!(
                    "Strapi response is {}, not an envelope",
                    crate::raw::kind(&other)
                )))
            }
        };

        let page_count = envelope
            .get("meta")
            .and_then(|meta| meta.get("pagination"))
            .and_then(|pagination| pagination.get("pageCount"))
            .and_then(Value::as_u64)
            .unwrap_or(1);

        match envelope.remove("data") {
            Some(data) => Ok((flatten(data), page_count)),
            None => Err(Error::InvalidResponse(
                "Strapi response has no data member".to_string(),
            )),
        }
    }

    async fn send(&self, url: Url, params: &[(String, String)]) -> Result<Response> {
        let mut request = self
            .client
            .get(url)
            .query(params)
            .header("Accept", "application/json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        Ok(request.send().await?)
    }
}

/// Collapse Strapi's `{ data: { id, attributes } }` nesting into plain
/// records at every level, so relations and media read like inline fields.
/// Opaque JSON fields are carried through untouched.
pub fn flatten(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(flatten).collect()),
        Value::Object(mut doc) => {
            if is_relation_wrapper(&doc) {
                return doc.remove("data").map(flatten).unwrap_or(Value::Null);
            }

            if is_entry(&doc) {
                let mut flat = Map::new();
                if let Some(id) = doc.remove("id") {
                    flat.insert("id".to_string(), id);
                }
                if let Some(Value::Object(attributes)) = doc.remove("attributes") {
                    flat.extend(flatten_fields(attributes));
                }
                return Value::Object(flat);
            }

            Value::Object(flatten_fields(doc))
        }
        other => other,
    }
}

fn flatten_fields(doc: Map<String, Value>) -> Map<String, Value> {
    doc.into_iter()
        .map(|(key, value)| {
            if is_opaque_field(&key) {
                (key, value)
            } else {
                let value = flatten(value);
                (key, value)
            }
        })
        .collect()
}

/// JSON fields whose content belongs to the site, not to Strapi.
fn is_opaque_field(key: &str) -> bool {
    key == "constellation" || key.starts_with("content")
}

/// A v4 entry: exactly `id` plus an `attributes` object.
fn is_entry(doc: &Map<String, Value>) -> bool {
    doc.len() == 2
        && doc.contains_key("id")
        && matches!(doc.get("attributes"), Some(Value::Object(_)))
}

/// `{ data }` (optionally with `meta`) around nothing, one entry or a list
/// of entries.
fn is_relation_wrapper(doc: &Map<String, Value>) -> bool {
    if !doc.keys().all(|key| key == "data" || key == "meta") {
        return false;
    }

    let is_entry_value = |value: &Value| matches!(value, Value::Object(entry) if is_entry(entry));
    match doc.get("data") {
        Some(Value::Null) => true,
        Some(Value::Array(items)) => items.iter().all(is_entry_value),
        Some(value) => is_entry_value(value),
        None => false,
    }
}
