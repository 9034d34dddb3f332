//! Tests for compare items and diff records

use super::*;

#[test]
fn test_parse_line() {
    let item = CompareItem::parse_line(b"doc-1,abc123").unwrap();
    assert_eq!(item.key, "doc-1");
    assert_eq!(item.hash, "abc123");
}

#[test]
fn test_parse_line_rejects_malformed() {
    assert!(CompareItem::parse_line(b"").is_none());
    assert!(CompareItem::parse_line(b"no-comma").is_none());
    assert!(CompareItem::parse_line(b"a,b,c").is_none());
    assert!(CompareItem::parse_line(b",").is_none());
    assert!(CompareItem::parse_line(b"\xff\xfe,hash").is_none());
}

#[test]
fn test_record_constructors() {
    let a = CompareItem::new("k", "h1");
    let b = CompareItem::new("k", "h2");

    let record = DiffRecord::only_in_source(a.clone(), true);
    assert_eq!(record.kind, DiffKind::OnlyInSource);
    assert_eq!(record.key, "k");
    assert_eq!(record.source, Some(a.clone()));
    assert_eq!(record.target, None);

    let record = DiffRecord::only_in_target(b.clone(), false);
    assert_eq!(record.kind, DiffKind::OnlyInTarget);
    assert_eq!(record.target, None);

    let record = DiffRecord::diff_both(a.clone(), b.clone(), true);
    assert_eq!(record.kind, DiffKind::DiffBoth);
    assert_eq!(record.source, Some(a));
    assert_eq!(record.target, Some(b));
}

#[test]
fn test_record_json_round_trip() {
    let record = DiffRecord::diff_both(
        CompareItem::new("k", "h1"),
        CompareItem::new("k", "h2"),
        true,
    );
    let json = serde_json::to_string(&record).unwrap();
    assert!(json.contains("\"type\":\"DiffBoth\""));

    let back: DiffRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn test_key_only_record_omits_items() {
    let record = DiffRecord::only_in_source(CompareItem::new("k", "h"), false);
    let json = serde_json::to_string(&record).unwrap();
    assert!(!json.contains("source"));
    assert!(!json.contains("hash"));
}
