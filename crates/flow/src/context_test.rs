//! Tests for the request context and replay envelope

use super::*;

fn request() -> GatewayRequest {
    GatewayRequest::new("POST", "http://127.0.0.1:9200/logs/_bulk?refresh=true")
        .with_header("Content-Type", "application/x-ndjson")
        .with_body(&b"{\"delete\":{}}\n"[..])
}

#[test]
fn test_uri_parts() {
    let req = request();
    assert_eq!(req.scheme(), Some("http"));
    assert_eq!(req.host(), Some("127.0.0.1:9200"));
    assert_eq!(req.path(), "/logs/_bulk");
    assert_eq!(req.path_and_query(), "/logs/_bulk?refresh=true");
}

#[test]
fn test_path_only_uri() {
    let req = GatewayRequest::new("GET", "/_cat/indices?v");
    assert_eq!(req.scheme(), None);
    assert_eq!(req.host(), None);
    assert_eq!(req.path(), "/_cat/indices");
    assert_eq!(req.path_and_query(), "/_cat/indices?v");
}

#[test]
fn test_set_scheme_and_host() {
    let mut req = request();
    req.set_scheme_and_host("https", "10.0.0.5:9243");
    assert_eq!(req.uri, "https://10.0.0.5:9243/logs/_bulk?refresh=true");

    // Path-only URIs become absolute
    let mut req = GatewayRequest::new("GET", "/x");
    req.set_scheme_and_host("http", "h:1");
    assert_eq!(req.uri, "http://h:1/x");
}

#[test]
fn test_headers_case_insensitive() {
    let mut req = request();
    assert_eq!(req.header("content-type"), Some("application/x-ndjson"));

    req.set_header("Content-Encoding", "gzip");
    req.set_header("content-encoding", "identity");
    assert_eq!(req.header("Content-Encoding"), Some("identity"));

    req.remove_header("CONTENT-ENCODING");
    assert_eq!(req.header("Content-Encoding"), None);
}

#[test]
fn test_encode_decode_round_trip() {
    let req = request();
    let decoded = GatewayRequest::decode(&req.encode()).unwrap();
    assert_eq!(decoded, req);
}

#[test]
fn test_decode_garbage_fails() {
    assert!(matches!(
        GatewayRequest::decode(b"\xff\xff\xff"),
        Err(FlowError::Decode(_))
    ));
}

#[test]
fn test_override_body_encode() {
    let mut req = request();
    req.set_header("Content-Length", "14");
    req.set_header("Content-Encoding", "gzip");

    let decoded =
        GatewayRequest::decode(&req.override_body_encode(b"{\"index\":{}}\n{}\n")).unwrap();
    assert_eq!(decoded.body, b"{\"index\":{}}\n{}\n");
    assert_eq!(decoded.header("Content-Length"), None);
    assert_eq!(decoded.header("Content-Encoding"), None);
    // Untouched headers and the URI survive
    assert_eq!(decoded.header("Content-Type"), Some("application/x-ndjson"));
    assert_eq!(decoded.uri, req.uri);
}

#[test]
fn test_context_flags() {
    let mut ctx = RequestContext::new(request());
    assert!(ctx.should_continue());
    assert!(!ctx.is_finished());

    ctx.stop();
    assert!(!ctx.should_continue());
    assert!(!ctx.is_finished());

    let mut ctx = RequestContext::new(request());
    ctx.finish();
    assert!(ctx.is_finished());
    assert!(!ctx.should_continue());

    let mut ctx = RequestContext::new(request());
    ctx.cancel();
    assert!(ctx.is_cancelled());
    assert!(!ctx.should_continue());
}

#[test]
fn test_tags() {
    let mut ctx = RequestContext::new(request());
    ctx.add_tags(&["b", "a", "b"]);
    assert!(ctx.has_tag("a"));
    assert_eq!(ctx.tags().collect::<Vec<_>>(), vec!["a", "b"]);

    ctx.remove_tags(&["a"]);
    assert!(!ctx.has_tag("a"));
}

#[test]
fn test_scratch_map_is_typed() {
    let mut ctx = RequestContext::new(request());
    ctx.set("count", 7usize);
    ctx.set("label", "seven".to_string());

    assert_eq!(ctx.get::<usize>("count"), Some(&7));
    assert_eq!(ctx.get::<String>("label").map(String::as_str), Some("seven"));
    // Wrong type reads as absent
    assert_eq!(ctx.get::<u32>("count"), None);
    assert_eq!(ctx.get::<usize>("missing"), None);
}

#[test]
fn test_flow_trace() {
    let mut ctx = RequestContext::new(request());
    ctx.add_flow_process("retry_flow:r1");
    ctx.add_flow_process("retry_flow:r1");
    assert_eq!(ctx.flow_trace(), ["retry_flow:r1", "retry_flow:r1"]);
}
