//! Store client trait and its reqwest implementation

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::response::{ResponseBody, StoreResponse};
use crate::token::TokenProvider;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Authenticated access to the store's metadata and data endpoints
///
/// Implementations perform exactly one HTTP call per method and never
/// retry. A non-2xx status is returned as `Ok`; only transport failures
/// are `Err`.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// GET a path
    async fn get(&self, path: &str) -> StoreResult<StoreResponse>;

    /// POST a JSON body to a path
    async fn post(&self, path: &str, body: &Value) -> StoreResult<StoreResponse>;

    /// PATCH a JSON body to a path
    async fn patch(&self, path: &str, body: &Value) -> StoreResult<StoreResponse>;

    /// DELETE a path
    async fn delete(&self, path: &str) -> StoreResult<StoreResponse>;
}

#[async_trait]
impl<C: StoreClient + ?Sized> StoreClient for Arc<C> {
    async fn get(&self, path: &str) -> StoreResult<StoreResponse> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, body: &Value) -> StoreResult<StoreResponse> {
        (**self).post(path, body).await
    }

    async fn patch(&self, path: &str, body: &Value) -> StoreResult<StoreResponse> {
        (**self).patch(path, body).await
    }

    async fn delete(&self, path: &str) -> StoreResult<StoreResponse> {
        (**self).delete(path).await
    }
}

/// reqwest-backed store client
#[derive(Clone)]
pub struct HttpStoreClient {
    http: Client,
    api_root: String,
    scopes: Vec<String>,
    timeout_secs: u64,
    token: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for HttpStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStoreClient")
            .field("api_root", &self.api_root)
            .field("scopes", &self.scopes)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl HttpStoreClient {
    /// Create client for configuration and credential provider
    ///
    /// # Errors
    /// - `StoreError::InvalidUrl` if the configured base URL does not parse
    /// - `StoreError::Network` if the HTTP client cannot be built
    pub fn new(config: &StoreConfig, token: Arc<dyn TokenProvider>) -> StoreResult<Self> {
        let api_root = config.api_root();
        Url::parse(&api_root).map_err(|e| StoreError::InvalidUrl(format!("{api_root}: {e}")))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::network(&api_root, e.to_string()))?;

        Ok(Self {
            http,
            api_root,
            scopes: config.effective_scopes(),
            timeout_secs: config.timeout_secs,
            token,
        })
    }

    /// Absolute URL for a relative store path
    fn url(&self, path: &str) -> StoreResult<Url> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.api_root, path.trim_start_matches('/'))
        };
        Url::parse(&raw).map_err(|e| StoreError::InvalidUrl(format!("{raw}: {e}")))
    }

    fn transport_error(&self, path: &str, err: &reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::timeout(path, self.timeout_secs)
        } else {
            StoreError::network(path, err.to_string())
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> StoreResult<StoreResponse> {
        let url = self.url(path)?;
        let token = self.token.token(&self.scopes).await?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header("OData-Version", "4.0")
            .header("OData-MaxVersion", "4.0");
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(path, &e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::timeout(path, self.timeout_secs)
            } else {
                StoreError::Decode {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!(%method, path, status, "store call");

        Ok(StoreResponse {
            status,
            headers,
            body: ResponseBody::from_text(text),
        })
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn get(&self, path: &str) -> StoreResult<StoreResponse> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> StoreResult<StoreResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Value) -> StoreResult<StoreResponse> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> StoreResult<StoreResponse> {
        self.send(Method::DELETE, path, None).await
    }
}
