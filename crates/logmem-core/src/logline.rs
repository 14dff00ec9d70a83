//! The fixed-size log record
//!
//! Records are directly addressable by index in the mapped store, so both
//! fields have a fixed width and the serialized form is exactly
//! [`RECORD_SIZE`] bytes: the timestamp field followed by the message field,
//! each zero-padded and truncated to its declared width.

use crate::error::ProtocolError;
use crate::{MESSAGE_SIZE, RECORD_SIZE, TIME_SIZE};

/// Delimiter separating the timestamp from the message in an ADD payload.
pub const FIELD_DELIMITER: char = '>';

/// One cached log line: a bounded timestamp and a bounded message body
#[derive(Clone, PartialEq, Eq)]
pub struct LogLine {
    time: [u8; TIME_SIZE],
    message: [u8; MESSAGE_SIZE],
}

impl LogLine {
    /// Create a record from its two text fields, truncating each to its
    /// fixed width
    pub fn new(time: &str, message: &str) -> Self {
        let mut line = Self {
            time: [0u8; TIME_SIZE],
            message: [0u8; MESSAGE_SIZE],
        };
        copy_truncated(&mut line.time, time.as_bytes());
        copy_truncated(&mut line.message, message.as_bytes());
        line
    }

    /// Parse an ADD payload of the form `<timestamp>><message>`
    ///
    /// The delimiter belongs to neither field. A payload without a delimiter
    /// is rejected rather than guessed at.
    pub fn parse(payload: &str) -> Result<Self, ProtocolError> {
        let (time, message) = payload
            .split_once(FIELD_DELIMITER)
            .ok_or(ProtocolError::MalformedLogLine)?;
        Ok(Self::new(time, message))
    }

    /// The timestamp field with its zero padding stripped
    pub fn time(&self) -> &str {
        field_text(&self.time)
    }

    /// The message field with its zero padding stripped
    pub fn message(&self) -> &str {
        field_text(&self.message)
    }

    /// Serialize into one fixed-size record
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..TIME_SIZE].copy_from_slice(&self.time);
        buf[TIME_SIZE..].copy_from_slice(&self.message);
        buf
    }

    /// Reinterpret one serialized record
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`RECORD_SIZE`]; callers slice out
    /// of a region whose length is a record multiple.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut line = Self {
            time: [0u8; TIME_SIZE],
            message: [0u8; MESSAGE_SIZE],
        };
        line.time.copy_from_slice(&bytes[..TIME_SIZE]);
        line.message.copy_from_slice(&bytes[TIME_SIZE..RECORD_SIZE]);
        line
    }
}

impl std::fmt::Debug for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLine")
            .field("time", &self.time())
            .field("message", &self.message())
            .finish()
    }
}

fn copy_truncated(dst: &mut [u8], src: &[u8]) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
}

/// Decode a zero-padded field. Fields written through the protocol are
/// printable ASCII, but a reused backing file may hold arbitrary bytes, so
/// anything past the first NUL is ignored and invalid UTF-8 maps to "".
fn field_text(field: &[u8]) -> &str {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_at_first_delimiter() {
        let line = LogLine::parse("2024-01-01T00:00:00>hello>world").unwrap();
        assert_eq!(line.time(), "2024-01-01T00:00:00");
        assert_eq!(line.message(), "hello>world");
    }

    #[test]
    fn test_parse_rejects_missing_delimiter() {
        assert_eq!(
            LogLine::parse("no delimiter here"),
            Err(ProtocolError::MalformedLogLine)
        );
    }

    #[test]
    fn test_round_trip() {
        let line = LogLine::new("2024-01-01T00:00:00", "hello");
        let restored = LogLine::from_bytes(&line.to_bytes());
        assert_eq!(restored, line);
        assert_eq!(restored.time(), "2024-01-01T00:00:00");
        assert_eq!(restored.message(), "hello");
    }

    #[test]
    fn test_fields_truncate_to_declared_width() {
        let long_time = "x".repeat(TIME_SIZE * 2);
        let long_message = "y".repeat(MESSAGE_SIZE * 2);
        let line = LogLine::new(&long_time, &long_message);
        assert_eq!(line.time().len(), TIME_SIZE);
        assert_eq!(line.message().len(), MESSAGE_SIZE);
    }

    #[test]
    fn test_empty_message_allowed() {
        let line = LogLine::parse("2024-01-01T00:00:00>").unwrap();
        assert_eq!(line.message(), "");
    }
}
