// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `reqwest`-backed fallback API client.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::error::ApiError;
use super::{ApiFuture, ApiRequest, FallbackApi, Method, LOG_TARGET};
use crate::credentials::CredentialStore;

/// API root used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Settings for [`HttpFallbackApi`].
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Server root or API root; `/api` is appended when missing.
    pub base_url: String,
    /// Timeout for requests that do not set their own.
    pub timeout: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        HttpApiConfig {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Trims trailing slashes and makes sure the URL ends with `/api`.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Fallback API over HTTP with bearer authentication.
#[derive(Clone)]
pub struct HttpFallbackApi {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpFallbackApi {
    pub fn new(config: HttpApiConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        HttpFallbackApi {
            http: reqwest::Client::new(),
            base_url: normalize_base_url(&config.base_url),
            timeout: config.timeout,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let route = request.route();
        let url = self.url_for(&request.path);
        debug!(target: LOG_TARGET, %route, "request");

        let mut builder = self
            .http
            .request(request.method.into(), &url)
            .timeout(request.timeout.unwrap_or(self.timeout));
        if let Some(token) = self.credentials.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(target: LOG_TARGET, %route, error = %e, "no response");
            ApiError::Network(e.to_string())
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if status.is_success() {
            debug!(target: LOG_TARGET, %route, status = status.as_u16(), "response");
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        let error = ApiError::from_status(status.as_u16(), &body);
        match &error {
            ApiError::Unauthorized => {
                warn!(target: LOG_TARGET, %route, "token rejected; clearing it");
                if let Err(e) = self.credentials.set_token(None) {
                    warn!(target: LOG_TARGET, error = %e, "failed to clear token");
                }
            }
            ApiError::Conflict(message) => {
                debug!(target: LOG_TARGET, %route, %message, "conflict");
            }
            _ => warn!(target: LOG_TARGET, %route, status = status.as_u16(), "request failed"),
        }
        Err(error)
    }
}

impl FallbackApi for HttpFallbackApi {
    fn call(&self, request: ApiRequest) -> ApiFuture<'_> {
        Box::pin(self.execute(request))
    }
}
