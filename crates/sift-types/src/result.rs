//! Search result records carried by `matches` events.
//!
//! Results are open records: fields this crate does not model are kept in
//! `extra` and written back out on serialization. A known field whose value
//! has an unexpected shape is also kept in `extra` rather than failing the
//! whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The kind of a search result (wire key `type`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultKind {
    Content,
    Path,
    Repo,
    /// A kind this client does not know about, kept verbatim.
    Other(String),
}

impl From<String> for ResultKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "content" => ResultKind::Content,
            "path" => ResultKind::Path,
            "repo" => ResultKind::Repo,
            _ => ResultKind::Other(value),
        }
    }
}

impl From<ResultKind> for String {
    fn from(kind: ResultKind) -> Self {
        match kind {
            ResultKind::Content => "content".into(),
            ResultKind::Path => "path".into(),
            ResultKind::Repo => "repo".into(),
            ResultKind::Other(other) => other,
        }
    }
}

/// A single search result.
///
/// Deserializes from any JSON object. Only non-objects are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResultKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(rename = "repositoryID", skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_stars: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_matches: Vec<LineMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chunk_matches: Vec<ChunkMatch>,
    /// Every field not listed above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResult {
    /// Build a result from a JSON object's fields.
    ///
    /// Known keys are lifted into typed fields when their values fit; every
    /// other entry stays in `extra`.
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        Self {
            kind: take_field(&mut fields, "type"),
            path: take_field(&mut fields, "path"),
            repository: take_field(&mut fields, "repository"),
            repository_id: take_field(&mut fields, "repositoryID"),
            repo_stars: take_field(&mut fields, "repoStars"),
            commit: take_field(&mut fields, "commit"),
            branches: take_field(&mut fields, "branches").unwrap_or_default(),
            language: take_field(&mut fields, "language"),
            line_matches: take_field(&mut fields, "lineMatches").unwrap_or_default(),
            chunk_matches: take_field(&mut fields, "chunkMatches").unwrap_or_default(),
            extra: fields,
        }
    }

    /// Number of highlighted ranges in this result (0 for path/repo results).
    pub fn match_count(&self) -> usize {
        let lines: usize = self
            .line_matches
            .iter()
            .map(|m| m.offset_and_lengths.len())
            .sum();
        let chunks: usize = self.chunk_matches.iter().map(|m| m.ranges.len()).sum();
        lines + chunks
    }
}

impl<'de> Deserialize<'de> for SearchResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_fields)
    }
}

/// Remove `key` and decode it as `T`. A value that does not fit goes back
/// into `fields` untouched.
fn take_field<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.remove(key)?;
    match T::deserialize(&value) {
        Ok(typed) => Some(typed),
        Err(_) => {
            fields.insert(key.to_string(), value);
            None
        }
    }
}

/// A whole-line match with `[offset, length]` pairs into `line`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineMatch {
    pub line: String,
    pub line_number: u32,
    pub offset_and_lengths: Vec<[u32; 2]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A multi-line window of content around one or more match ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkMatch {
    pub content: String,
    pub content_start: Location,
    pub ranges: Vec<Range>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A position in a file. Lines and columns are zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}
