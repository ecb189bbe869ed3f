//! REST client for the reports and auth endpoints.
//!
//! `ReportsBackend` and `AuthBackend` are the seams the store and the CLI
//! depend on; `HttpApi` is the reqwest implementation. URL building and
//! response parsing are plain functions so they can be tested without HTTP.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is an `ApiError`. The report store turns create/vote errors
//! into local fallbacks; reads, deletes and auth surface them to the caller.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;
use frames::{
    AuthSession, Category, PriceReport, ReportDraft, User, VoteCounts, VoteDirection, WireError, encode_draft,
    parse_auth_response, parse_report, parse_report_list, parse_user, parse_vote_counts, vote_body,
};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::util::format::now_ms;

const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned status {status}")]
    Response { status: u16, body: String },

    #[error("response parse failed: {0}")]
    Parse(String),

    /// The endpoint needs a bearer token and the session has none.
    #[error("not signed in")]
    Unauthenticated,
}

impl From<WireError> for ApiError {
    fn from(err: WireError) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Query filters for `GET /api/reports`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub category: Option<Category>,
    pub wilaya: Option<String>,
}

#[async_trait]
pub trait ReportsBackend: Send + Sync {
    async fn list_reports(&self, filters: &ReportFilters) -> Result<Vec<PriceReport>, ApiError>;
    async fn create_report(&self, draft: &ReportDraft) -> Result<PriceReport, ApiError>;
    async fn vote(&self, id: &str, direction: VoteDirection) -> Result<VoteCounts, ApiError>;
    async fn delete_report(&self, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError>;
    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession, ApiError>;
    async fn me(&self) -> Result<User, ApiError>;
}

// =============================================================================
// ENDPOINTS
// =============================================================================

pub(crate) fn reports_endpoint(base: &str, filters: &ReportFilters) -> String {
    let url = format!("{base}/api/reports");
    let mut params: Vec<(&str, &str)> = Vec::new();
    if let Some(category) = filters.category {
        params.push(("category", category.as_str()));
    }
    if let Some(wilaya) = filters.wilaya.as_deref().filter(|w| !w.trim().is_empty()) {
        params.push(("wilaya", wilaya));
    }
    if params.is_empty() {
        return url;
    }
    reqwest::Url::parse_with_params(&url, &params).map_or(url, |u| u.to_string())
}

/// `<base>/api/reports/<id>[/<tail>]` with `id` encoded as a single path segment.
fn report_url(base: &str, id: &str, tail: Option<&str>) -> Result<reqwest::Url, ApiError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| ApiError::Request(format!("invalid base url {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Request(format!("base url {base} cannot take a path")))?
        .pop_if_empty()
        .extend(["api", "reports", id])
        .extend(tail);
    Ok(url)
}

pub(crate) fn report_endpoint(base: &str, id: &str) -> Result<reqwest::Url, ApiError> {
    report_url(base, id, None)
}

pub(crate) fn vote_endpoint(base: &str, id: &str) -> Result<reqwest::Url, ApiError> {
    report_url(base, id, Some("vote"))
}

pub(crate) fn auth_endpoint(base: &str, action: &str) -> String {
    format!("{base}/api/auth/{action}")
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    /// Build a client against `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to initialize.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.into().trim_end_matches('/').to_owned(), token: None })
    }

    /// # Errors
    ///
    /// See [`HttpApi::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and return the body text for 2xx responses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Response { status, body: text });
        }
        Ok(text)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let text = self.send(request).await?;
        parse_body(&text)
    }
}

fn parse_body(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Create responses come back either bare or wrapped in `{ report }`.
fn parse_created(body: &Value, received_at_ms: i64) -> Result<PriceReport, ApiError> {
    let value = body.get("report").unwrap_or(body);
    Ok(parse_report(value, received_at_ms)?)
}

#[async_trait]
impl ReportsBackend for HttpApi {
    async fn list_reports(&self, filters: &ReportFilters) -> Result<Vec<PriceReport>, ApiError> {
        let url = reports_endpoint(&self.base_url, filters);
        debug!(%url, "fetching reports");
        let body = self.send_json(self.http.get(url)).await?;
        Ok(parse_report_list(&body, now_ms()))
    }

    async fn create_report(&self, draft: &ReportDraft) -> Result<PriceReport, ApiError> {
        let url = reports_endpoint(&self.base_url, &ReportFilters::default());
        let body = self.send_json(self.http.post(url).json(&encode_draft(draft))).await?;
        parse_created(&body, now_ms())
    }

    async fn vote(&self, id: &str, direction: VoteDirection) -> Result<VoteCounts, ApiError> {
        let url = vote_endpoint(&self.base_url, id)?;
        let body = self.send_json(self.http.post(url).json(&vote_body(direction))).await?;
        Ok(parse_vote_counts(&body)?)
    }

    async fn delete_report(&self, id: &str) -> Result<(), ApiError> {
        if self.token.is_none() {
            return Err(ApiError::Unauthenticated);
        }
        let url = report_endpoint(&self.base_url, id)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for HttpApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let payload = serde_json::json!({ "email": email, "password": password });
        let body = self
            .send_json(self.http.post(auth_endpoint(&self.base_url, "login")).json(&payload))
            .await?;
        Ok(parse_auth_response(&body, now_ms())?)
    }

    async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession, ApiError> {
        let payload = serde_json::json!({ "email": email, "password": password, "name": name });
        let body = self
            .send_json(self.http.post(auth_endpoint(&self.base_url, "register")).json(&payload))
            .await?;
        Ok(parse_auth_response(&body, now_ms())?)
    }

    async fn me(&self) -> Result<User, ApiError> {
        if self.token.is_none() {
            return Err(ApiError::Unauthenticated);
        }
        let body = self.send_json(self.http.get(auth_endpoint(&self.base_url, "me"))).await?;
        let user = body.get("user").unwrap_or(&body);
        Ok(parse_user(user, now_ms())?)
    }
}
