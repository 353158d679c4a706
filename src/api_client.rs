//! Authenticated API client with coordinated token refresh

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::token_store::{TokenStorage, TokenStore};
use crate::types::{RefreshRequest, RefreshResponse};
use async_singleflight::Group;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// There is one credential pair per client, so every refresh shares this key
const REFRESH_FLIGHT_KEY: &str = "refresh";

/// Whether a 401 on this call may trigger one refresh-and-retry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowRefreshRetry {
    Yes,
    No,
}

/// Description of one API call, kept around so it can be re-issued after a refresh
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    body: Option<Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Override or add a header. Overrides win over the client's defaults.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Client for the SuperTry REST API
///
/// Owns the access/refresh token pair. Every request carries the current
/// access token; a 401 triggers at most one refresh-then-retry cycle, and
/// concurrent 401s share a single refresh call.
pub struct ApiClient {
    config: ClientConfig,
    http_client: Client,
    tokens: TokenStore,
    /// Singleflight group so concurrent 401s join one refresh call.
    /// Errors travel as String so followers can receive a clone
    refresh_singleflight: Group<bool, String>,
}

impl ApiClient {
    /// Create a client for `base_url` with in-memory token storage
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a client from a loaded configuration
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Create a client configured from `SUPERTRY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.refresh_token()
    }

    /// Replace the access token; `None` also removes it from storage
    pub fn set_access_token(&self, token: Option<String>) {
        self.tokens.set_access_token(token);
    }

    /// Replace the refresh token; `None` also removes it from storage
    pub fn set_refresh_token(&self, token: Option<String>) {
        self.tokens.set_refresh_token(token);
    }

    /// Get the token store (for advanced usage)
    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Perform a request and decode the JSON response body
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        retry: AllowRefreshRetry,
    ) -> Result<T> {
        let response = self.send(&request, retry).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Perform a request whose response body is not needed
    pub async fn request_unit(&self, request: ApiRequest, retry: AllowRefreshRetry) -> Result<()> {
        self.send(&request, retry).await?;
        Ok(())
    }

    async fn send(&self, request: &ApiRequest, retry: AllowRefreshRetry) -> Result<Response> {
        let (response, sent_with) = self.dispatch(request).await?;

        if response.status() != StatusCode::UNAUTHORIZED || retry == AllowRefreshRetry::No {
            return check_status(response).await;
        }

        if self.tokens.refresh_token().is_none() {
            debug!(endpoint = %request.endpoint, "Unauthorized and no refresh token available");
            return Err(ClientError::AuthExpired);
        }

        if !self.refresh_access_token(sent_with).await {
            return Err(ClientError::AuthExpired);
        }

        let (response, _) = self.dispatch(request).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(endpoint = %request.endpoint, "Request rejected again after token refresh");
            return Err(ClientError::AuthExpired);
        }

        check_status(response).await
    }

    /// Issue one HTTP call; returns the response and the access token it carried
    async fn dispatch(&self, request: &ApiRequest) -> Result<(Response, Option<String>)> {
        let access_token = self.tokens.access_token();
        let url = format!("{}{}", self.config.base_url, request.endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(token) = &access_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                ClientError::Configuration(
                    "access token contains characters not allowed in a header".to_string(),
                )
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        headers.extend(request.headers.clone());

        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            authenticated = access_token.is_some(),
            "Sending request"
        );

        let response = builder.send().await?;
        Ok((response, access_token))
    }

    /// Run the refresh protocol, joining an in-flight refresh if there is one
    ///
    /// `stale` is the access token the failed request carried. Returns whether
    /// a usable access token is now stored. If the caller leading the flight is
    /// dropped before it finishes, a waiting caller takes the refresh over.
    async fn refresh_access_token(&self, stale: Option<String>) -> bool {
        loop {
            let (refreshed, error, _shared) = self
                .refresh_singleflight
                .work(REFRESH_FLIGHT_KEY, self.perform_refresh(stale.clone()))
                .await;

            match (refreshed, error) {
                (Some(refreshed), _) => return refreshed,
                (None, Some(err)) => {
                    warn!(error = %err, "Token refresh failed");
                    return false;
                }
                // No outcome: the leader either failed and cleared the
                // credentials, or was cancelled mid-flight
                (None, None) => {
                    if self.tokens.refresh_token().is_none() {
                        return false;
                    }
                    debug!("Refresh leader was cancelled, retrying the refresh");
                }
            }
        }
    }

    async fn perform_refresh(&self, stale: Option<String>) -> std::result::Result<bool, String> {
        // A flight that completed between our 401 and this call already rotated the token
        let current = self.tokens.access_token();
        if current.is_some() && current != stale {
            debug!("Access token already rotated, skipping refresh");
            return Ok(true);
        }

        let Some(refresh_token) = self.tokens.refresh_token() else {
            return Ok(false);
        };

        let url = format!("{}/auth/refresh", self.config.base_url);
        let response = match self
            .http_client
            .post(&url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.tokens.clear();
                return Err(format!("refresh request failed: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                status = %status,
                error = %error_message(status, &text),
                "Refresh token rejected, clearing credentials"
            );
            self.tokens.clear();
            return Ok(false);
        }

        let refreshed: RefreshResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                self.tokens.clear();
                return Err(format!("invalid refresh response: {e}"));
            }
        };

        self.tokens.set_access_token(Some(refreshed.access_token));
        if let Some(rotated) = refreshed.refresh_token {
            self.tokens.set_refresh_token(Some(rotated));
        }
        info!(expires_in = ?refreshed.expires_in, "Access token refreshed successfully");

        Ok(true)
    }
}

/// Turn a non-success response into an [`ClientError::Api`]
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message: error_message(status, &text),
    })
}

/// Server-provided `message` (string or list of strings), else the status text
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("message") {
            Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
            Some(Value::Array(items)) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            _ => None,
        });

    from_body.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    })
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    storage: Option<Arc<dyn TokenStorage>>,
}

impl ApiClientBuilder {
    /// Start from a full configuration; individual setters still override it
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use `storage` for durable tokens instead of the one the config selects
    pub fn token_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let mut config = self.config.unwrap_or_default();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }
        let config = config.validate()?;

        let http_client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let storage = self.storage.unwrap_or_else(|| config.token_storage());
        let tokens = TokenStore::hydrate(storage);

        debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            has_session = tokens.refresh_token().is_some(),
            "API client created"
        );

        Ok(ApiClient {
            config,
            http_client,
            tokens,
            refresh_singleflight: Group::new(),
        })
    }
}
