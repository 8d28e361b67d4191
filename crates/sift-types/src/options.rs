//! Per-call search options and the per-client error policy.

use serde::{Deserialize, Serialize};

/// Optional knobs for a single search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Query syntax version (`v`).
    pub version: Option<String>,
    /// Pattern type, e.g. `literal`, `regexp`, `structural` (`t`).
    pub pattern_type: Option<String>,
    /// Maximum number of results the server should display (`display`).
    pub display_limit: Option<u32>,
    /// Truncate matched lines to this many characters (`max-line-len`).
    pub max_line_length: Option<u32>,
    /// Return chunk matches instead of line matches (`cm`).
    pub enable_chunk_matches: bool,
    /// Lines of context around each chunk match (`cl`).
    /// Ignored unless `enable_chunk_matches` is set.
    pub context_lines: Option<u32>,
}

/// What the stream does with a frame it cannot classify or decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the problem and drop the frame; iteration continues.
    #[default]
    Skip,
    /// Yield the error and end the stream.
    Fail,
}

impl ErrorPolicy {
    /// Map a `throw_on_error` style flag to a policy.
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ErrorPolicy::Fail
        } else {
            ErrorPolicy::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_skips() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Skip);
        assert_eq!(ErrorPolicy::from_strict(true), ErrorPolicy::Fail);
        assert_eq!(ErrorPolicy::from_strict(false), ErrorPolicy::Skip);
    }

    #[test]
    fn options_deserialize_partially() {
        let opts: SearchOptions =
            serde_json::from_str(r#"{"pattern_type":"regexp","context_lines":2}"#).unwrap();
        assert_eq!(opts.pattern_type.as_deref(), Some("regexp"));
        assert_eq!(opts.context_lines, Some(2));
        assert!(!opts.enable_chunk_matches);
    }
}
