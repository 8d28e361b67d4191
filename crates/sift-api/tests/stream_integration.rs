//! Integration tests for the full bytes → frames → events → items pipeline.
//!
//! These feed complete SSE bodies through `SearchStream` / `RawEventStream`,
//! split in many different ways, and check what comes out the other end.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::json;
use sift_api::{RawEventStream, SearchStream};
use sift_types::{ApiError, ErrorPolicy, Event, Payload, ResultKind, SearchResult};

/// A realistic response: progress, two matches frames, filters, done.
const SEARCH_BODY: &str = "\
event: progress\n\
data: {\"done\":false,\"matchCount\":0,\"durationMs\":3}\n\
\n\
event: matches\n\
data: [{\"type\":\"content\",\"path\":\"src/lib.rs\",\"repository\":\"github.com/acme/widgets\",\"lineMatches\":[{\"line\":\"pub fn gizmo() {}\",\"lineNumber\":10,\"offsetAndLengths\":[[7,5]]}]},{\"type\":\"path\",\"path\":\"docs/gizmo.md\",\"repository\":\"github.com/acme/widgets\"}]\n\
\n\
event: ping\n\
\n\
event: matches\n\
data: [{\"type\":\"repo\",\"repository\":\"github.com/acme/gizmos\",\"repoStars\":12,\"description\":\"Gizmos — ünïcödé\"}]\n\
\n\
event: filters\n\
data: [{\"value\":\"lang:rust\",\"count\":1}]\n\
\n\
event: done\n\
data: {}\n\
\n";

fn chunks_of(parts: Vec<Vec<u8>>) -> Vec<Result<Bytes, std::io::Error>> {
    parts.into_iter().map(|p| Ok(Bytes::from(p))).collect()
}

fn search_stream(parts: Vec<Vec<u8>>, policy: ErrorPolicy) -> SearchStream {
    SearchStream::new(futures_util::stream::iter(chunks_of(parts)), policy)
}

fn raw_stream(parts: Vec<Vec<u8>>, policy: ErrorPolicy) -> RawEventStream {
    RawEventStream::new(futures_util::stream::iter(chunks_of(parts)), policy)
}

fn whole(text: &str) -> Vec<Vec<u8>> {
    vec![text.as_bytes().to_vec()]
}

async fn collect_results(mut stream: SearchStream) -> Vec<SearchResult> {
    let mut results = Vec::new();
    while let Some(result) = stream.next().await {
        results.push(result.expect("search result should decode"));
    }
    results
}

async fn collect_events(mut stream: RawEventStream) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.expect("raw event should classify"));
    }
    events
}

// ---------------------------------------------------------------------------
// Filtered operation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_realistic_search_response() {
    let results = collect_results(search_stream(whole(SEARCH_BODY), ErrorPolicy::Skip)).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].kind, Some(ResultKind::Content));
    assert_eq!(results[0].path.as_deref(), Some("src/lib.rs"));
    assert_eq!(results[0].line_matches[0].line_number, 10);
    assert_eq!(results[1].kind, Some(ResultKind::Path));
    assert_eq!(results[2].kind, Some(ResultKind::Repo));
    assert_eq!(results[2].repo_stars, Some(12));
    assert_eq!(
        results[2].extra.get("description"),
        Some(&json!("Gizmos — ünïcödé"))
    );
}

#[tokio::test]
async fn test_every_byte_split_yields_same_results() {
    let expected = collect_results(search_stream(whole(SEARCH_BODY), ErrorPolicy::Skip)).await;
    let bytes = SEARCH_BODY.as_bytes();

    for split in 1..bytes.len() {
        let parts = vec![bytes[..split].to_vec(), bytes[split..].to_vec()];
        let results = collect_results(search_stream(parts, ErrorPolicy::Skip)).await;
        assert_eq!(results, expected, "split at byte {split}");
    }
}

#[tokio::test]
async fn test_byte_at_a_time_yields_same_results() {
    let expected = collect_results(search_stream(whole(SEARCH_BODY), ErrorPolicy::Skip)).await;
    let parts = SEARCH_BODY.bytes().map(|b| vec![b]).collect();
    let results = collect_results(search_stream(parts, ErrorPolicy::Skip)).await;
    assert_eq!(results, expected);
}

#[tokio::test]
async fn test_framing_invalid_block_is_dropped() {
    let body = "event:matches\ndata:[{},{}]\n\nevent:custom\n\ndata:[{},{},{}]\n\n";
    let results = collect_results(search_stream(whole(body), ErrorPolicy::Skip)).await;
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_malformed_frames_only_yield_nothing() {
    let body = "event:ping\n\nevent:custom\nno:data\n\n";
    let mut stream = search_stream(whole(body), ErrorPolicy::Skip);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_non_matches_events_are_absorbed() {
    let body = "event:progress\ndata:{}\n\nevent:alert\ndata:{\"title\":\"slow\"}\n\nevent:matches\ndata:[{\"type\":\"path\"}]\n\n";
    let results = collect_results(search_stream(whole(body), ErrorPolicy::Fail)).await;
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_stream_without_done_ends_at_exhaustion() {
    let body = "event:matches\ndata:[{}]\n\nevent:matches\ndata:[{}]\n\nevent:matches\ndata:[{}]";
    // The last frame is never terminated and is dropped.
    let results = collect_results(search_stream(whole(body), ErrorPolicy::Skip)).await;
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_done_stops_consuming_input() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let parts = vec![
        "event:matches\ndata:[{},{}]\n\n",
        "event:done\ndata:{}\n\n",
        "event:matches\ndata:[{}]\n\n",
        "event:matches\ndata:[{}]\n\n",
    ];
    let byte_stream = futures_util::stream::iter(parts).map(move |p| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, std::io::Error>(Bytes::from(p))
    });

    let results = collect_results(SearchStream::new(byte_stream, ErrorPolicy::Skip)).await;
    assert_eq!(results.len(), 2);
    assert_eq!(pulled.load(Ordering::SeqCst), 2, "no chunk after done is read");
}

#[tokio::test]
async fn test_strict_policy_fails_after_earlier_results() {
    let body = "event:matches\ndata:[{\"path\":\"a\"}]\n\nevent:matches\ndata:{oops\n\nevent:matches\ndata:[{\"path\":\"b\"}]\n\n";
    let mut stream = search_stream(whole(body), ErrorPolicy::Fail);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.path.as_deref(), Some("a"));

    match stream.next().await {
        Some(Err(ApiError::Decode { event, .. })) => assert_eq!(event, "matches"),
        other => panic!("Expected Decode error, got {other:?}"),
    }
    assert!(stream.next().await.is_none(), "strict failure ends the call");
    assert!(stream.is_closed());
}

#[tokio::test]
async fn test_strict_policy_fails_on_missing_data_line() {
    let mut stream = search_stream(
        whole("event:ping\n\nevent:matches\ndata:[{}]\n\n"),
        ErrorPolicy::Fail,
    );
    match stream.next().await {
        Some(Err(ApiError::Framing { reason })) => {
            assert!(reason.contains("no data line"), "reason: {reason}")
        }
        other => panic!("Expected Framing error, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_default_policy_skips_bad_json() {
    let body = "event:matches\ndata:{oops\n\nevent:matches\ndata:\"a string\"\n\nevent:matches\ndata:[{}]\n\n";
    let results = collect_results(search_stream(whole(body), ErrorPolicy::Skip)).await;
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_odd_field_values_do_not_drop_results() {
    let body = concat!(
        "event:matches\n",
        r#"data:[{"type":"path","path":"a"},{"type":"content","path":"b","branches":null},"#,
        r#"{"type":"repo","repository":"c","repoStars":-5},7,{"type":"path","path":"d"}]"#,
        "\n\n",
    );
    let results = collect_results(search_stream(whole(body), ErrorPolicy::Skip)).await;

    let paths: Vec<_> = results
        .iter()
        .map(|r| r.path.as_deref().or(r.repository.as_deref()))
        .collect();
    assert_eq!(paths, vec![Some("a"), Some("b"), Some("c"), Some("d")]);
    assert_eq!(results[2].kind, Some(ResultKind::Repo));
    assert_eq!(results[2].extra.get("repoStars"), Some(&json!(-5)));
}

#[tokio::test]
async fn test_early_drop_stops_pulling() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let byte_stream = futures_util::stream::repeat("event:matches\ndata:[{}]\n\n").map(move |p| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, std::io::Error>(Bytes::from(p))
    });

    let stream = SearchStream::new(byte_stream, ErrorPolicy::Skip);
    let first_three: Vec<_> = stream.take(3).collect().await;
    assert_eq!(first_three.len(), 3);
    assert_eq!(pulled.load(Ordering::SeqCst), 3);
}

// ---------------------------------------------------------------------------
// Raw operation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_raw_emits_one_event_per_valid_frame() {
    let events = collect_events(raw_stream(whole(SEARCH_BODY), ErrorPolicy::Skip)).await;
    let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["progress", "matches", "matches", "filters", "done"]);
    assert_eq!(events[4].payload, Payload::Json(json!({})));
}

#[tokio::test]
async fn test_raw_does_not_stop_at_done() {
    let body = "event:done\ndata:{}\n\nevent:late\ndata:still here\n\n";
    let events = collect_events(raw_stream(whole(body), ErrorPolicy::Skip)).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].payload, Payload::Raw("still here".into()));
}

#[tokio::test]
async fn test_raw_every_byte_split_yields_same_events() {
    let body = "event:a\ndata:{\"n\":1}\n\nevent:b\ndata:naïve text\n\nevent:c\r\ndata:[1,2]\r\n\r\n";
    let expected = collect_events(raw_stream(whole(body), ErrorPolicy::Skip)).await;
    assert_eq!(expected.len(), 3);

    let bytes = body.as_bytes();
    for split in 1..bytes.len() {
        let parts = vec![bytes[..split].to_vec(), bytes[split..].to_vec()];
        let events = collect_events(raw_stream(parts, ErrorPolicy::Skip)).await;
        assert_eq!(events, expected, "split at byte {split}");
    }
}

#[tokio::test]
async fn test_raw_strict_policy_fails_on_malformed_frame() {
    let mut stream = raw_stream(whole("event:a\ndata:1\n\ndata:orphan\n\n"), ErrorPolicy::Fail);
    assert!(matches!(stream.next().await, Some(Ok(_))));
    assert!(matches!(
        stream.next().await,
        Some(Err(ApiError::Framing { .. }))
    ));
    assert!(stream.next().await.is_none());
}
