// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use url::form_urlencoded;

use crate::error::ApiError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// HTTP methods used against the upstream API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A single API request: target, query parameters, optional JSON body and headers
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            json: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn query<K: Into<String>, V: Into<String>>(
        mut self,
        params: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn headers(mut self, headers: &[(String, String)]) -> Self {
        self.headers.extend_from_slice(headers);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The URL with query parameters applied, as it goes on the wire
    pub fn resolved_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, encoded)
    }
}

/// HTTP response with status, final URL and the full body
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// URL the response was served from
    pub url: String,
    /// Raw response body
    pub body: Bytes,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and read the whole response body
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with default settings
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestClient with a custom reqwest::Client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse, reqwest::Error> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, request.resolved_url())
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.bytes().await?;

        Ok(HttpResponse { status, url, body })
    }
}

/// Send a request and normalise the outcome into decoded JSON or an `ApiError`.
///
/// A body that is not JSON is a decode failure carrying the HTTP status. A JSON
/// object with `"status": false` is a logical failure whose message comes from
/// the body's `message` field.
pub async fn request_json<C: HttpClient + ?Sized>(
    client: &C,
    request: &ApiRequest,
) -> Result<Value, ApiError> {
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                method = %request.method,
                url = %request.resolved_url(),
                error = %e,
                "request failed"
            );
            return Err(ApiError::Transport(e));
        }
    };

    tracing::info!("{} {} -> {}", request.method, response.url, response.status);

    let data: Value = match serde_json::from_slice(&response.body) {
        Ok(data) => data,
        Err(e) => {
            let preview: String = String::from_utf8_lossy(&response.body)
                .chars()
                .take(400)
                .collect();
            tracing::warn!(error = %e, body = %preview, "JSON decode error");
            return Err(ApiError::Decode {
                status: response.status,
            });
        }
    };

    if let Some(object) = data.as_object()
        && object.get("status").and_then(Value::as_bool) == Some(false)
    {
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("API returned status false");
        return Err(ApiError::Logical(message.to_string()));
    }

    Ok(data)
}
