//! Tests for log record encoding and decoding
//!
//! These tests verify:
//! - The exact tab-separated line layout
//! - Raw keys and percent-escaped values
//! - Rejection of malformed records

use kvwal::wal::{escape, unescape};
use kvwal::{Event, EventType};

// =============================================================================
// Record Layout Tests
// =============================================================================

#[test]
fn test_encode_put() {
    let event = Event::put(1, "a", "1");
    assert_eq!(event.encode(), b"1\t2\ta\t1\n".to_vec());
}

#[test]
fn test_encode_delete_has_empty_value() {
    let event = Event::delete(3, "a");
    assert_eq!(event.encode(), b"3\t1\ta\t\n".to_vec());
}

#[test]
fn test_encode_escapes_value() {
    let event = Event::put(7, "x", "hello world");
    assert_eq!(event.encode(), b"7\t2\tx\thello%20world\n".to_vec());
}

#[test]
fn test_encode_writes_key_raw() {
    let event = Event::put(1, "user:1/name", "v");
    assert_eq!(event.encode(), b"1\t2\tuser:1/name\tv\n".to_vec());

    let event = Event::delete(2, "50%off");
    assert_eq!(event.encode(), b"2\t1\t50%off\t\n".to_vec());
}

#[test]
fn test_valid_keys() {
    assert!(Event::is_valid_key("user:1/name"));
    assert!(Event::is_valid_key("50% off + more"));
    assert!(Event::is_valid_key(""));
    assert!(!Event::is_valid_key("a\tb"));
    assert!(!Event::is_valid_key("a\nb"));
}

#[test]
fn test_event_type_codes() {
    assert_eq!(EventType::Delete.code(), 1);
    assert_eq!(EventType::Put.code(), 2);
    assert_eq!(EventType::from_code(1), Some(EventType::Delete));
    assert_eq!(EventType::from_code(2), Some(EventType::Put));
    assert_eq!(EventType::from_code(0), None);
    assert_eq!(EventType::from_code(3), None);
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_put() {
    let event = Event::decode("12\t2\tkey\tvalue").unwrap();
    assert_eq!(event, Event::put(12, "key", "value"));
}

#[test]
fn test_decode_delete() {
    let event = Event::decode("3\t1\ta\t").unwrap();
    assert_eq!(event, Event::delete(3, "a"));
}

#[test]
fn test_decode_unescapes_value() {
    let event = Event::decode("1\t2\tx\thello%20world").unwrap();
    assert_eq!(event.value, "hello world");
}

#[test]
fn test_decode_plus_as_space() {
    let event = Event::decode("1\t2\tx\thello+world").unwrap();
    assert_eq!(event.value, "hello world");
}

#[test]
fn test_decode_reverses_encode_for_awkward_text() {
    let original = Event::put(99, "k:%+ é/", "line one\nline two\t100% + €");
    let bytes = original.encode();
    let line = std::str::from_utf8(&bytes).unwrap().trim_end_matches('\n');

    assert_eq!(Event::decode(line).unwrap(), original);
}

#[test]
fn test_decode_keeps_key_raw() {
    let event = Event::decode("1\t2\t50%off\tyes").unwrap();
    assert_eq!(event, Event::put(1, "50%off", "yes"));

    let event = Event::decode("2\t1\ta+b\t").unwrap();
    assert_eq!(event, Event::delete(2, "a+b"));
}

#[test]
fn test_decode_rejects_raw_tab_in_value() {
    // Two records run together on one line
    let err = Event::decode("1\t2\ta\tx2\t2\tb\t2").unwrap_err();
    assert!(err.contains("raw tab"), "{}", err);
}

#[test]
fn test_decode_missing_field() {
    let err = Event::decode("1\t2\tx").unwrap_err();
    assert!(err.contains("4 tab-separated fields"), "{}", err);
}

#[test]
fn test_decode_bad_sequence() {
    assert!(Event::decode("abc\t2\tx\ty").is_err());
    assert!(Event::decode("-1\t2\tx\ty").is_err());
    assert!(Event::decode("\t2\tx\ty").is_err());
}

#[test]
fn test_decode_unknown_event_type() {
    let err = Event::decode("1\t9\tx\ty").unwrap_err();
    assert!(err.contains("unknown event type"), "{}", err);
}

#[test]
fn test_decode_bad_value_escape() {
    let err = Event::decode("1\t2\tx\tbad%zzvalue").unwrap_err();
    assert!(err.contains("value decoding failure"), "{}", err);
}

#[test]
fn test_decode_ignores_value_of_delete() {
    let event = Event::decode("4\t1\tx\tleftover").unwrap();
    assert_eq!(event, Event::delete(4, "x"));
}

// =============================================================================
// Escape Tests
// =============================================================================

#[test]
fn test_escape_leaves_unreserved_alone() {
    assert_eq!(escape("AZaz09-_.~"), "AZaz09-_.~");
}

#[test]
fn test_escape_reserved_and_multibyte() {
    assert_eq!(escape("a b"), "a%20b");
    assert_eq!(escape("a+b"), "a%2Bb");
    assert_eq!(escape("100%"), "100%25");
    assert_eq!(escape("€"), "%E2%82%AC");
}

#[test]
fn test_unescape_valid() {
    assert_eq!(unescape("%E2%82%AC").unwrap(), "€");
    assert_eq!(unescape("%e2%82%ac").unwrap(), "€");
    assert_eq!(unescape("plain").unwrap(), "plain");
    assert_eq!(unescape("").unwrap(), "");
}

#[test]
fn test_unescape_truncated_escape() {
    assert!(unescape("%4").is_err());
    assert!(unescape("abc%").is_err());
}

#[test]
fn test_unescape_non_utf8() {
    let err = unescape("%FF").unwrap_err();
    assert!(err.contains("UTF-8"), "{}", err);
}
