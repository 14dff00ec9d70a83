//! Protocol-level error types
//!
//! Every variant here is recoverable: the session reports it to the client
//! in a `FAILED:` reply and keeps serving. The rendered message is exactly
//! the `<reason>` text the client sees.

use thiserror::Error;

/// Errors produced while parsing and validating a single request frame
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The request frame exceeded the maximum frame size
    #[error("message too long")]
    MessageTooLong,

    /// The payload contained a byte outside printable ASCII, or a required
    /// argument was missing or unusable
    #[error("invalid argument provided")]
    InvalidArgument,

    /// An ADD payload without the `>` timestamp/message delimiter
    #[error("malformed log line")]
    MalformedLogLine,

    /// The operation token matched nothing in the command table
    #[error("unknown command")]
    UnknownCommand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_reply_reasons() {
        assert_eq!(ProtocolError::MessageTooLong.to_string(), "message too long");
        assert_eq!(
            ProtocolError::InvalidArgument.to_string(),
            "invalid argument provided"
        );
        assert_eq!(ProtocolError::UnknownCommand.to_string(), "unknown command");
    }
}
