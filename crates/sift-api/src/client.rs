//! Streaming search client.

use std::sync::Arc;

use reqwest::Url;
use reqwest::header::HeaderValue;
use sift_types::transport::{SearchRequest, Transport};
use sift_types::{ApiError, ConfigError, Credential, ErrorPolicy, SearchOptions};

use crate::query::search_params;
use crate::router::{MatchesRouter, RawRouter};
use crate::stream::{RawEventStream, SearchStream};
use crate::transport::{HttpTransport, TransportOptions};

/// Everything needed to build a [`SearchClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the streaming search endpoint.
    pub base_url: String,
    pub credential: Credential,
    pub error_policy: ErrorPolicy,
    pub transport: TransportOptions,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            credential,
            error_policy: ErrorPolicy::default(),
            transport: TransportOptions::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
        self.transport = options;
        self
    }
}

/// Client for the streaming search API.
///
/// Immutable once built; cheap to clone. Every call gets its own stream
/// state, so one client can serve many calls.
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    authorization: String,
    error_policy: ErrorPolicy,
}

impl SearchClient {
    /// Create a client that talks HTTP via `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(&config.transport)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport. `config.transport` is ignored.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".into(),
            message: format!("{}: {e}", config.base_url),
        })?;

        let authorization = config.credential.authorization();
        HeaderValue::from_str(&authorization).map_err(|_| ConfigError::InvalidValue {
            key: "credential".into(),
            message: "token contains characters not allowed in an HTTP header".into(),
        })?;

        Ok(Self {
            transport,
            base_url: config.base_url,
            authorization,
            error_policy: config.error_policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `Authorization` header value sent with every request.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Build the request a search call would send.
    pub fn request(&self, query: &str, options: &SearchOptions) -> SearchRequest {
        SearchRequest {
            url: self.base_url.clone(),
            params: search_params(query, options),
            authorization: self.authorization.clone(),
        }
    }

    /// Run a search and stream individual results until `done` or end of body.
    ///
    /// Transport failures are returned here, before any result is yielded.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchStream, ApiError> {
        let request = self.request(query, options);
        let body = self.transport.open(&request).await?;
        Ok(SearchStream::with_router(
            body,
            MatchesRouter::new(self.error_policy),
        ))
    }

    /// Run a search and stream every classified event until end of body.
    pub async fn search_raw(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<RawEventStream, ApiError> {
        let request = self.request(query, options);
        let body = self.transport.open(&request).await?;
        Ok(RawEventStream::with_router(
            body,
            RawRouter::new(self.error_policy),
        ))
    }
}
