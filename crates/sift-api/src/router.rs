//! Routing of classified frames to stream items.
//!
//! A [`Router`] decides what each frame contributes to the consumer and
//! whether the stream should keep reading. Both routers carry the client's
//! [`ErrorPolicy`] and apply it to every frame they cannot use.

use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::Value;
use sift_types::{ApiError, ErrorPolicy, Event, Payload, SearchResult};

use crate::sse::{FrameError, SseEvent};

/// Event name carrying an array of search results.
pub const MATCHES_EVENT: &str = "matches";

/// Event name signalling the server has finished.
pub const DONE_EVENT: &str = "done";

/// What the stream should do after a frame has been routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Maps frames to items.
pub trait Router: Send {
    type Item;

    /// Route one frame, pushing any items it produces onto `out`.
    ///
    /// Returns `Err` only when the error policy says a bad frame ends the call.
    fn route(
        &mut self,
        frame: Result<SseEvent, FrameError>,
        out: &mut VecDeque<Self::Item>,
    ) -> Result<Flow, ApiError>;
}

/// Parse a raw payload as JSON. No fallback coercion.
pub fn decode_payload(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Apply `policy` to a per-frame error: log and skip, or escalate.
fn reject(policy: ErrorPolicy, err: ApiError) -> Result<(), ApiError> {
    match policy {
        ErrorPolicy::Skip => {
            tracing::warn!("Skipping bad frame: {err}");
            Ok(())
        }
        ErrorPolicy::Fail => Err(err),
    }
}

fn framing_error(err: FrameError) -> ApiError {
    ApiError::Framing {
        reason: err.to_string(),
    }
}

/// Decode a `matches` payload into its array elements.
fn decode_matches(raw: &str) -> Result<Vec<Value>, String> {
    match decode_payload(raw).map_err(|e| e.to_string())? {
        Value::Array(elements) => Ok(elements),
        other => Err(format!("expected an array, found {}", json_kind(&other))),
    }
}

fn matches_error(message: String) -> ApiError {
    ApiError::Decode {
        event: MATCHES_EVENT.to_string(),
        message,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Yields individual search results; stops at the `done` event.
#[derive(Debug, Clone)]
pub struct MatchesRouter {
    policy: ErrorPolicy,
}

impl MatchesRouter {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self { policy }
    }
}

impl Router for MatchesRouter {
    type Item = SearchResult;

    fn route(
        &mut self,
        frame: Result<SseEvent, FrameError>,
        out: &mut VecDeque<SearchResult>,
    ) -> Result<Flow, ApiError> {
        let event = match frame {
            Ok(event) => event,
            Err(e) => {
                reject(self.policy, framing_error(e))?;
                return Ok(Flow::Continue);
            }
        };

        match event.name.as_str() {
            DONE_EVENT => Ok(Flow::Stop),
            MATCHES_EVENT => {
                let elements = match decode_matches(&event.data) {
                    Ok(elements) => elements,
                    Err(message) => {
                        reject(self.policy, matches_error(message))?;
                        return Ok(Flow::Continue);
                    }
                };
                // Elements decode independently of their siblings.
                for (index, element) in elements.into_iter().enumerate() {
                    match SearchResult::deserialize(element) {
                        Ok(result) => out.push_back(result),
                        Err(e) => {
                            reject(self.policy, matches_error(format!("element {index}: {e}")))?
                        }
                    }
                }
                Ok(Flow::Continue)
            }
            other => {
                tracing::debug!("Ignoring '{other}' event");
                Ok(Flow::Continue)
            }
        }
    }
}

/// Yields every classified event; never stops on an event name.
#[derive(Debug, Clone)]
pub struct RawRouter {
    policy: ErrorPolicy,
}

impl RawRouter {
    pub fn new(policy: ErrorPolicy) -> Self {
        Self { policy }
    }
}

impl Router for RawRouter {
    type Item = Event;

    fn route(
        &mut self,
        frame: Result<SseEvent, FrameError>,
        out: &mut VecDeque<Event>,
    ) -> Result<Flow, ApiError> {
        match frame {
            Ok(SseEvent { name, data }) => out.push_back(Event {
                payload: Payload::from_raw(&data),
                name,
            }),
            Err(e) => reject(self.policy, framing_error(e))?,
        }
        Ok(Flow::Continue)
    }
}
