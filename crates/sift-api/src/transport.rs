//! HTTP transport backed by `reqwest`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use sift_types::transport::{ByteStream, SearchRequest, Transport};
use sift_types::{ApiError, ConfigError};

/// Overrides applied when the client builds its own `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Deadline for the whole request, including reading the stream.
    ///
    /// A long search is cut off when this elapses, even while results are
    /// still arriving. Prefer `read_timeout` for streams.
    pub timeout: Option<Duration>,
    /// Longest wait for the next body chunk. Resets on every read.
    pub read_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

/// [`Transport`] that issues a GET with `reqwest` and streams the body.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(options: &TransportOptions) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidValue {
                    key: format!("header {name}"),
                    message: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
                key: format!("header {name}"),
                message: e.to_string(),
            })?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = options.read_timeout {
            builder = builder.read_timeout(timeout);
        }
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.as_str());
        }

        let http = builder.build().map_err(|e| ConfigError::InvalidValue {
            key: "transport".into(),
            message: e.to_string(),
        })?;
        Ok(Self { http })
    }

    /// Use a caller-configured `reqwest::Client` as-is.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn send(&self, request: &SearchRequest) -> Result<ByteStream, ApiError> {
        let authorization =
            HeaderValue::from_str(&request.authorization).map_err(|_| ApiError::Auth {
                message: "Invalid credential format".into(),
            })?;

        tracing::debug!("GET {} ({} params)", request.url, request.params.len());

        let response = self
            .http
            .get(&request.url)
            .query(&request.params)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body_text, retry_after));
        }
        if status == StatusCode::NO_CONTENT {
            return Err(ApiError::EmptyBody);
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(network_error)),
        ))
    }
}

impl Transport for HttpTransport {
    fn open<'a>(
        &'a self,
        request: &'a SearchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ByteStream, ApiError>> + Send + 'a>> {
        Box::pin(self.send(request))
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn network_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed ApiError.
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ApiError {
    // Error bodies are either {"error": "..."} / {"message": "..."} JSON or plain text
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => ApiError::Auth { message },
        400 => ApiError::BadRequest { message },
        429 => ApiError::RateLimited {
            retry_after_ms: retry_after,
        },
        _ => ApiError::Server { status, message },
    }
}
