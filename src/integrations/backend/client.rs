// src/integrations/backend/client.rs
//
// Backend HTTP client.
//
// ARCHITECTURE:
// - Stateless per call; the only shared state is the SessionContext
// - Every request carries the current bearer token when one is held
// - A 401 outside /auth/ triggers one single-flight refresh and exactly one
//   retry of the original request
// - Non-2xx answers become AppError::Api with the backend's message
// - Maps wire envelopes → domain records (NO store mutation here)

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::envelope::{ApiEnvelope, RefreshBody};
use super::session::SessionContext;
use crate::error::{AppError, AppResult};

const USER_AGENT_VALUE: &str = concat!("f1insight/", env!("CARGO_PKG_VERSION"));

pub(crate) const REFRESH_PATH: &str = "/auth/refresh";

/// A request description that can be dispatched more than once
/// (the refresh protocol replays it).
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(crate) fn json<B: Serialize + ?Sized>(mut self, body: &B) -> AppResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Auth endpoints never go through refresh-and-retry.
    fn is_auth_endpoint(&self) -> bool {
        self.path.starts_with("/auth/")
    }
}

/// Backend API client
///
/// Cheap to clone; clones share the connection pool, cookie jar and session.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// The cookie store holds the httpOnly refresh cookie set by the login
    /// endpoints.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionContext>,
    ) -> AppResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .default_headers(default_headers)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    // ========================================================================
    // INTERNAL: request pipeline
    // ========================================================================

    /// Run a request through the token pipeline and return the 2xx response.
    pub(crate) async fn execute(&self, request: &ApiRequest) -> AppResult<Response> {
        let sent_token = self.session.access_token();
        let response = self.dispatch(request, sent_token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.is_auth_endpoint() {
            return ensure_success(response).await;
        }

        log::debug!(
            "{} {} answered 401, renewing session",
            request.method,
            request.path
        );

        let token = self
            .session
            .renew(sent_token.as_deref(), || self.refresh_access_token())
            .await?;

        let retried = self.dispatch(request, Some(&token)).await?;
        ensure_success(retried).await
    }

    /// Execute and decode the `{ success, data, ... }` envelope.
    pub(crate) async fn fetch_envelope<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> AppResult<ApiEnvelope<T>> {
        let response = self.execute(request).await?;
        decode_envelope(response, &request.path).await
    }

    /// Execute and return `data`, reading a missing payload as empty.
    pub(crate) async fn fetch_data<T: DeserializeOwned + Default>(
        &self,
        request: &ApiRequest,
    ) -> AppResult<T> {
        Ok(self.fetch_envelope(request).await?.into_data())
    }

    /// Execute and require a `data` payload.
    pub(crate) async fn fetch_required<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> AppResult<T> {
        self.fetch_envelope(request).await?.data.ok_or_else(|| {
            AppError::Decode(format!("{} returned no data", request.path))
        })
    }

    /// Execute and ignore the body.
    pub(crate) async fn send(&self, request: &ApiRequest) -> AppResult<()> {
        self.execute(request).await?;
        Ok(())
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> AppResult<Response> {
        let url = self.url(&request.path);
        log::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| {
            AppError::Network(format!("{} {} failed: {}", request.method, request.path, e))
        })
    }

    /// Ask the backend for a new access token using the refresh cookie.
    ///
    /// Sent outside the request pipeline: it carries no bearer token and a
    /// 401 here is final.
    pub(crate) async fn refresh_access_token(&self) -> AppResult<String> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| AppError::Network(format!("POST {} failed: {}", REFRESH_PATH, e)))?;

        let response = ensure_success(response).await?;
        let body: RefreshBody = response
            .json()
            .await
            .map_err(|e| AppError::Decode(format!("Failed to parse refresh response: {}", e)))?;

        body.into_token()
            .ok_or_else(|| AppError::Decode("Refresh response carried no access token".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a non-2xx response to `AppError::Api`, keeping the backend's message
/// and JSON body when it sent one.
async fn ensure_success(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let details: Option<serde_json::Value> = serde_json::from_str(&text).ok();
    let message = details
        .as_ref()
        .and_then(|body| body.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    Err(AppError::Api {
        status: status.as_u16(),
        message,
        details,
    })
}

async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
    path: &str,
) -> AppResult<ApiEnvelope<T>> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(ApiEnvelope::empty());
    }

    serde_json::from_str(&text)
        .map_err(|e| AppError::Decode(format!("Failed to parse response from {}: {}", path, e)))
}
