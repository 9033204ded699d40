// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! REST fallback API.
//!
//! The store uses this path whenever the real-time channel is unavailable or
//! a channel request fails. Requests are built by [`endpoints`] and executed
//! by a [`FallbackApi`] implementation; [`HttpFallbackApi`] is the real one.

pub mod endpoints;
mod error;
mod http;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

pub use error::ApiError;
pub use http::{normalize_base_url, HttpApiConfig, HttpFallbackApi, DEFAULT_API_URL};

pub(crate) const LOG_TARGET: &str = "firemail::api";

/// HTTP method of a fallback request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One request against the fallback API, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    pub body: Option<Value>,
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// "METHOD /path", as used in logs.
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Boxed future returned by [`FallbackApi::call`].
pub type ApiFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ApiError>> + Send + 'a>>;

/// Executes fallback requests and returns the decoded JSON body.
///
/// A successful response with an empty body yields `Value::Null`.
pub trait FallbackApi: Send + Sync {
    fn call(&self, request: ApiRequest) -> ApiFuture<'_>;
}
