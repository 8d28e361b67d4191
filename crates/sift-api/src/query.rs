//! Query-string construction for search requests.

use sift_types::SearchOptions;

/// Build the query parameters for one search call.
///
/// `q` is always present. Numeric options are only sent when non-zero, and
/// `cl` is only sent together with chunk matches.
pub fn search_params(query: &str, options: &SearchOptions) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.to_string())];

    if let Some(version) = &options.version {
        params.push(("v", version.clone()));
    }
    if let Some(pattern_type) = &options.pattern_type {
        params.push(("t", pattern_type.clone()));
    }
    if let Some(len) = options.max_line_length.filter(|&n| n > 0) {
        params.push(("max-line-len", len.to_string()));
    }
    if options.enable_chunk_matches {
        params.push(("cm", "true".to_string()));
    }
    if let Some(limit) = options.display_limit.filter(|&n| n > 0) {
        params.push(("display", limit.to_string()));
    }
    if let Some(lines) = options
        .context_lines
        .filter(|&n| n > 0 && options.enable_chunk_matches)
    {
        params.push(("cl", lines.to_string()));
    }

    params
}
