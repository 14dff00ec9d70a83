//! Frame encoding helpers
//!
//! Every reply travels as one frame of exactly [`LINE_SIZE`] bytes,
//! zero-padded. Requests arrive as a single frame of at most
//! [`COMMAND_SIZE`] bytes.

use crate::{COMMAND_SIZE, LINE_SIZE};

/// Encode a reply string into one fixed-size frame, truncating if the text
/// does not fit
pub fn encode_reply(text: &str) -> [u8; LINE_SIZE] {
    let mut frame = [0u8; LINE_SIZE];
    let bytes = text.as_bytes();
    let n = bytes.len().min(LINE_SIZE);
    frame[..n].copy_from_slice(&bytes[..n]);
    frame
}

/// Encode a record's serialized bytes into one fixed-size frame
pub fn encode_record(record: &[u8]) -> [u8; LINE_SIZE] {
    let mut frame = [0u8; LINE_SIZE];
    let n = record.len().min(LINE_SIZE);
    frame[..n].copy_from_slice(&record[..n]);
    frame
}

/// Decode a received request frame into its textual command line
///
/// Strips the zero padding and any trailing newline a line-oriented client
/// may have sent. Returns `None` when the frame is not valid UTF-8 at all;
/// byte-level payload validation happens later, against the printable-ASCII
/// rule.
pub fn decode_request(frame: &[u8]) -> Option<&str> {
    let frame = &frame[..frame.len().min(COMMAND_SIZE)];
    let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
    let text = std::str::from_utf8(&frame[..end]).ok()?;
    Some(text.trim_end_matches(['\r', '\n']))
}

/// Decode a reply frame back into its text, for clients and tests
pub fn decode_reply(frame: &[u8]) -> &str {
    let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
    std::str::from_utf8(&frame[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_frames_are_fixed_size() {
        let frame = encode_reply("connected");
        assert_eq!(frame.len(), LINE_SIZE);
        assert_eq!(decode_reply(&frame), "connected");
    }

    #[test]
    fn test_oversized_reply_truncates() {
        let text = "x".repeat(LINE_SIZE * 2);
        let frame = encode_reply(&text);
        assert_eq!(decode_reply(&frame).len(), LINE_SIZE);
    }

    #[test]
    fn test_decode_request_strips_padding_and_newline() {
        let mut frame = [0u8; COMMAND_SIZE];
        frame[..12].copy_from_slice(b"connect svc\n");
        assert_eq!(decode_request(&frame), Some("connect svc"));
    }

    #[test]
    fn test_decode_request_rejects_invalid_utf8() {
        assert_eq!(decode_request(&[0xff, 0xfe, 0x01]), None);
    }
}
