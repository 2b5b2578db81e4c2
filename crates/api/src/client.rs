//! Cookie-affine HTTP session backed by `reqwest`.

use std::time::Duration;

use reqwest::{Client, header};
use tracing::debug;
use veil_types::TransportError;
use veil_util::{block_on_future, redact_sensitive};

use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Browser-like user agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

/// Options used to build a [`SessionClient`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Thin wrapper around a configured `reqwest::Client` with its own cookie jar.
///
/// Every instance is an isolated browser-like session: cookies set by one
/// response are replayed on later requests made through the same instance and
/// never leak into another instance.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: Client,
}

impl SessionClient {
    pub fn new(options: SessionOptions) -> Result<Self, TransportError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
        default_headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_static("en-US,en;q=0.9"));

        let http = Client::builder()
            .cookie_store(true)
            .user_agent(options.user_agent)
            .default_headers(default_headers)
            .timeout(options.timeout)
            .build()
            .map_err(|error| TransportError::InvalidRequest(format!("build http client: {error}")))?;

        Ok(Self { http })
    }

    async fn send_async(http: Client, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|error| TransportError::Body(error.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

impl Transport for SessionClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(
            method = %request.method,
            url = %request.url,
            body = %request.body.as_deref().map(redact_sensitive).unwrap_or_default(),
            "sending request"
        );
        let future = Self::send_async(self.http.clone(), request);
        let response = block_on_future(future).map_err(|error| TransportError::Connect(error.to_string()))??;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }
}

fn map_send_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Connect(error.to_string())
    }
}
