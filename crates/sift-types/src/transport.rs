//! Transport trait: the byte-stream source behind a search call.

use crate::ApiError;
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;

/// A boxed stream of raw response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, ApiError>> + Send>>;

/// Everything a transport needs to open one search stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub url: String,
    pub params: Vec<(&'static str, String)>,
    /// Full `Authorization` header value.
    pub authorization: String,
}

/// Opens the response body for a search request.
///
/// Implementations must fail (rather than return an empty stream) when the
/// server answers with a non-success status. Dyn-compatible so clients can
/// hold an `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    fn open<'a>(
        &'a self,
        request: &'a SearchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ByteStream, ApiError>> + Send + 'a>>;

    /// Transport name for logging.
    fn name(&self) -> &str;
}
