//! REST transport for the product graph.
//!
//! # Configuration
//!
//! `GraphClientConfig::from_env` reads:
//! - `PRODUCT_GRAPH_API_URL`: API base URL (default `http://localhost:8000/api`)
//! - `PRODUCT_GRAPH_API_TOKEN`: optional bearer token
//! - `PRODUCT_GRAPH_TIMEOUT_SECS`: request timeout in seconds (default 30)

use std::fmt;
use std::time::Duration;

use anyhow::anyhow;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{LibError, Result};
use crate::models::{CatalogProduct, CatalogResponse, ProductGraph, SaveReceipt};
use crate::store::GraphStore;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const GRAPH_LOAD_PATH: &str = "/graph/products";
pub const GRAPH_SAVE_PATH: &str = "/graph/save";
pub const CATALOG_PATH: &str = "/products/";

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GraphClientConfig {
    pub base_url: String,
    /// Read from config sources but never written back out.
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// Resolve node labels from the product catalog on load.
    pub resolve_labels: bool,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            resolve_labels: true,
        }
    }
}

impl fmt::Debug for GraphClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("resolve_labels", &self.resolve_labels)
            .finish()
    }
}

impl GraphClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PRODUCT_GRAPH_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_token: std::env::var("PRODUCT_GRAPH_API_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            timeout_secs: std::env::var("PRODUCT_GRAPH_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            resolve_labels: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(LibError::unknown(
                "Graph API URL is required",
                anyhow!("empty base_url"),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(LibError::unknown(
                "Graph API timeout must be positive",
                anyhow!("timeout_secs is 0"),
            ));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// `GraphStore` backed by the console's REST API.
#[derive(Debug, Clone)]
pub struct HttpGraphStore {
    config: GraphClientConfig,
    http: Client,
}

impl HttpGraphStore {
    pub fn new(config: GraphClientConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| LibError::unknown("Failed to build HTTP client", anyhow!(err)))?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GraphClientConfig::from_env())
    }

    pub fn config(&self) -> &GraphClientConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, action: &'static str) -> Result<Response> {
        let response = self.authorize(request).send().await.map_err(|err| {
            tracing::error!(action, error = %err, "graph service request failed");
            LibError::from(err)
        })?;
        check_status(response, action).await
    }
}

async fn check_status(response: Response, action: &'static str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(action, %status, body = %body, "graph service returned an error status");
    let source = anyhow!("{} returned {}: {}", action, status, body);

    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let details = serde_json::from_str(&body)
                .ok()
                .or_else(|| (!body.is_empty()).then(|| serde_json::Value::String(body)));
            LibError::rejected("Graph service rejected the graph", details, source)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LibError::forbidden("Not authorized to access the product graph", source)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            LibError::network("Graph service is temporarily unavailable", source)
        }
        status if status.is_server_error() => {
            LibError::network("Graph service is temporarily unavailable", source)
        }
        _ => LibError::unknown("Unexpected response from graph service", source),
    })
}

impl GraphStore for HttpGraphStore {
    async fn load_graph(&self) -> Result<ProductGraph> {
        let request = self.http.get(self.config.url(GRAPH_LOAD_PATH));
        let response = self.send(request, "load graph").await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| {
            LibError::malformed(
                "graph_undecodable",
                "Remote graph could not be decoded",
                anyhow!(err),
            )
        })
    }

    async fn save_graph(&self, graph: &ProductGraph) -> Result<SaveReceipt> {
        let request = self.http.post(self.config.url(GRAPH_SAVE_PATH)).json(graph);
        let response = self.send(request, "save graph").await?;
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(SaveReceipt::default());
        }
        // The backend may acknowledge with any JSON body; only `edgeIds` matters.
        Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "save response carried no edge id assignments");
            SaveReceipt::default()
        }))
    }

    async fn list_products(&self) -> Result<Option<Vec<CatalogProduct>>> {
        if !self.config.resolve_labels {
            return Ok(None);
        }
        let request = self.http.get(self.config.url(CATALOG_PATH));
        let response = self.send(request, "list products").await?;
        let catalog: CatalogResponse = response.json().await?;
        Ok(Some(catalog.into_products()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_empty_url_and_zero_timeout() {
        let err = GraphClientConfig::new("  ")
            .validate()
            .expect_err("empty url should fail");
        assert_eq!(err.public, "Graph API URL is required");

        let config = GraphClientConfig {
            timeout_secs: 0,
            ..GraphClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = GraphClientConfig::new("http://localhost:8000/api/");
        assert_eq!(
            config.url(GRAPH_LOAD_PATH),
            "http://localhost:8000/api/graph/products"
        );
    }

    #[test]
    fn default_config_matches_console_backend() {
        let config = GraphClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn token_is_redacted_from_debug_and_serialization() {
        let config = GraphClientConfig {
            api_token: Some("operator-secret".to_string()),
            ..GraphClientConfig::default()
        };

        let debug = format!("{config:?}");
        assert!(!debug.contains("operator-secret"));
        assert!(debug.contains("<redacted>"));

        let store = HttpGraphStore::new(config.clone()).expect("client builds");
        assert!(!format!("{store:?}").contains("operator-secret"));

        let value = serde_json::to_value(&config).expect("config serializes");
        assert!(value.get("api_token").is_none());

        let parsed: GraphClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "http://graph.internal/api",
            "api_token": "operator-secret",
            "timeout_secs": 5,
            "resolve_labels": false
        }))
        .expect("config deserializes");
        assert_eq!(parsed.api_token.as_deref(), Some("operator-secret"));
    }
}
