//! WAL Entry definitions
//!
//! Defines the structure of individual log records and their text encoding.

use std::fmt;

use bytes::{BufMut, BytesMut};

use super::escape::{escape_into, unescape};

/// Kind of mutation recorded by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventType {
    Delete = 1,
    Put = 2,
}

impl EventType {
    /// Numeric code written to the log
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventType::Delete),
            2 => Some(EventType::Put),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Delete => f.write_str("DELETE"),
            EventType::Put => f.write_str("PUT"),
        }
    }
}

/// A single mutation in the transaction log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Sequence number - strictly increasing, starts at 1
    pub sequence: u64,

    /// The action taken
    pub event_type: EventType,

    /// The key affected
    pub key: String,

    /// The value of a put; empty for deletes
    pub value: String,
}

impl Event {
    pub fn put(sequence: u64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            sequence,
            event_type: EventType::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(sequence: u64, key: impl Into<String>) -> Self {
        Self {
            sequence,
            event_type: EventType::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Append the full record, including its trailing newline, to `buf`
    ///
    /// The key goes out as-is; see [`Event::is_valid_key`].
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_slice(self.sequence.to_string().as_bytes());
        buf.put_u8(b'\t');
        buf.put_slice(self.event_type.code().to_string().as_bytes());
        buf.put_u8(b'\t');
        buf.put_slice(self.key.as_bytes());
        buf.put_u8(b'\t');
        if self.event_type == EventType::Put {
            escape_into(&self.value, buf);
        }
        buf.put_u8(b'\n');
    }

    /// Whether `key` can be written without breaking the record framing
    pub fn is_valid_key(key: &str) -> bool {
        !key.contains(['\t', '\n'])
    }

    /// Encode the full record, including its trailing newline
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(32 + self.key.len() + self.value.len());
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    /// Parse one record with its line terminator already stripped
    ///
    /// Returns the reason on failure; the reader attaches the line number.
    pub fn decode(line: &str) -> std::result::Result<Self, String> {
        let mut fields = line.splitn(4, '\t');
        let (sequence, code, key, value) =
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(s), Some(c), Some(k), Some(v)) => (s, c, k, v),
                _ => return Err("expected 4 tab-separated fields".to_string()),
            };

        let sequence: u64 = sequence
            .parse()
            .map_err(|_| format!("invalid sequence number {:?}", sequence))?;

        let event_type = code
            .parse::<u8>()
            .ok()
            .and_then(EventType::from_code)
            .ok_or_else(|| format!("unknown event type {:?}", code))?;

        match event_type {
            EventType::Put => {
                if value.contains('\t') {
                    return Err("raw tab in value field".to_string());
                }
                let value =
                    unescape(value).map_err(|e| format!("value decoding failure: {}", e))?;
                Ok(Event::put(sequence, key, value))
            }
            EventType::Delete => Ok(Event::delete(sequence, key)),
        }
    }
}
