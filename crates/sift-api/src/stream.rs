//! Async streams that drive the frame → event → item pipeline.

use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use futures_util::StreamExt;
use pin_project_lite::pin_project;
use sift_types::transport::ByteStream;
use sift_types::{ApiError, ErrorPolicy};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::router::{Flow, MatchesRouter, RawRouter, Router};
use crate::sse::{FrameBuffer, classify};

/// Stream of individual search results. Ends at the `done` event.
pub type SearchStream = EventStream<MatchesRouter>;

/// Stream of every classified event. Ends when the response body does.
pub type RawEventStream = EventStream<RawRouter>;

pin_project! {
    #[project = BodyStateProjection]
    enum BodyState {
        Open {
            #[pin]
            body: ByteStream,
        },
        Closed,
    }
}

pin_project! {
    /// Pulls response chunks, splits them into frames, and yields whatever
    /// the router produces.
    ///
    /// Dropping the stream, calling [`close`](Self::close), or cancelling an
    /// attached token releases the response body without draining it.
    pub struct EventStream<R>
    where
        R: Router,
    {
        #[pin]
        state: BodyState,
        frames: FrameBuffer,
        router: R,
        pending: VecDeque<R::Item>,
        failure: Option<ApiError>,
        cancel: Option<Pin<Box<WaitForCancellationFutureOwned>>>,
    }
}

impl<R: Router> EventStream<R> {
    /// Drive `body` through `router`.
    pub fn with_router(body: ByteStream, router: R) -> Self {
        Self {
            state: BodyState::Open { body },
            frames: FrameBuffer::new(),
            router,
            pending: VecDeque::new(),
            failure: None,
            cancel: None,
        }
    }

    /// End the stream as soon as `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(Box::pin(token.cancelled_owned()));
        self
    }

    /// Release the response body and discard anything not yet yielded.
    pub fn close(&mut self) {
        self.state = BodyState::Closed;
        self.frames.clear();
        self.pending.clear();
        self.failure = None;
        self.cancel = None;
    }

    /// `true` once the body has been released, for whatever reason.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, BodyState::Closed)
    }
}

impl SearchStream {
    /// Create a SearchStream from any byte stream (e.g. `reqwest::Response::bytes_stream`).
    pub fn new<S, B, E>(byte_stream: S, policy: ErrorPolicy) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<bytes::Bytes>,
        E: Display,
    {
        Self::with_router(box_byte_stream(byte_stream), MatchesRouter::new(policy))
    }
}

impl RawEventStream {
    /// Create a RawEventStream from any byte stream.
    pub fn new<S, B, E>(byte_stream: S, policy: ErrorPolicy) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<bytes::Bytes>,
        E: Display,
    {
        Self::with_router(box_byte_stream(byte_stream), RawRouter::new(policy))
    }
}

fn box_byte_stream<S, B, E>(byte_stream: S) -> ByteStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: Into<bytes::Bytes>,
    E: Display,
{
    Box::pin(byte_stream.map(|chunk| {
        chunk
            .map(Into::into)
            .map_err(|e| ApiError::Network(e.to_string()))
    }))
}

impl<R: Router> Stream for EventStream<R> {
    type Item = Result<R::Item, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            let cancelled = match this.cancel.as_mut() {
                Some(cancel) => cancel.as_mut().poll(cx).is_ready(),
                None => false,
            };
            if cancelled {
                tracing::debug!("Search stream cancelled; releasing response body");
                *this.cancel = None;
                this.state.set(BodyState::Closed);
                this.frames.clear();
                this.pending.clear();
                *this.failure = None;
                return Poll::Ready(None);
            }

            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }
            if let Some(err) = this.failure.take() {
                return Poll::Ready(Some(Err(err)));
            }

            let body = match this.state.as_mut().project() {
                BodyStateProjection::Open { body } => body,
                BodyStateProjection::Closed => return Poll::Ready(None),
            };

            match ready!(body.poll_next(cx)) {
                Some(Ok(bytes)) => {
                    for frame in this.frames.push_bytes(&bytes) {
                        match this.router.route(classify(&frame), &mut *this.pending) {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Stop) => {
                                tracing::debug!("Received terminal event");
                                this.state.set(BodyState::Closed);
                                break;
                            }
                            Err(e) => {
                                *this.failure = Some(e);
                                this.state.set(BodyState::Closed);
                                break;
                            }
                        }
                    }
                    if this.state.is_closed() {
                        this.frames.clear();
                    }
                }
                Some(Err(e)) => {
                    this.state.set(BodyState::Closed);
                    this.frames.clear();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    if !this.frames.remainder().trim().is_empty() {
                        tracing::debug!(
                            "Response ended inside a frame; dropping {} buffered bytes",
                            this.frames.remainder().len()
                        );
                    }
                    this.state.set(BodyState::Closed);
                    this.frames.clear();
                }
            }
        }
    }
}

impl BodyState {
    fn is_closed(&self) -> bool {
        matches!(self, BodyState::Closed)
    }
}
