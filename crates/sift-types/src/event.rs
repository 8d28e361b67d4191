//! Classified events surfaced by the raw search operation.

use serde::Serialize;

/// A classified SSE event with its payload opportunistically decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub name: String,
    #[serde(rename = "data")]
    pub payload: Payload,
}

/// An event payload: decoded JSON when possible, the original text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(serde_json::Value),
    Raw(String),
}

impl Payload {
    /// Decode `raw` as JSON, falling back to the raw string.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Raw(raw.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }
}
