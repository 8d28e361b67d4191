//! Streaming search client with SSE decoding for Sift.

mod client;
mod query;
mod router;
mod sse;
mod stream;
mod transport;

pub use client::{ClientConfig, SearchClient};
pub use query::search_params;
pub use router::{
    DONE_EVENT, Flow, MATCHES_EVENT, MatchesRouter, RawRouter, Router, decode_payload,
};
pub use sse::{FrameBuffer, FrameError, SseEvent, classify};
pub use stream::{EventStream, RawEventStream, SearchStream};
pub use transport::{HttpTransport, TransportOptions};
