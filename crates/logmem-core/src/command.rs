//! Command table, parser, and payload validation
//!
//! A request frame is `<op-token>[ <payload>]` with a single space between
//! token and payload; the payload is the rest of the line, uninterpreted
//! here. An unrecognized token still parses — it becomes [`OpCode::Unknown`]
//! and fails at dispatch, not at parse.

use crate::error::ProtocolError;

/// The fixed set of operations a client can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// Bind this session to a named cache, creating it if needed
    Connect,
    /// Alias of [`OpCode::Connect`] with its own token and reply
    Subscribe,
    /// Report server time, cached kilobytes, and line count
    Stat,
    /// Append one log line to the bound cache
    Add,
    /// Sync the bound cache's mapped bytes to its backing file
    Flush,
    /// Close the session without touching the cache
    Disconnect,
    /// Remove the bound cache from the registry and close the session
    Unsubscribe,
    /// Stream every cached log line back to the client
    GetLogs,
    /// Anything else; rejected at dispatch
    Unknown,
}

impl OpCode {
    fn from_token(token: &str) -> Self {
        match token {
            "connect" => Self::Connect,
            "subscribe" => Self::Subscribe,
            "stat" => Self::Stat,
            "add" => Self::Add,
            "flush" => Self::Flush,
            "disconnect" => Self::Disconnect,
            "unsubscribe" => Self::Unsubscribe,
            "getlogs" => Self::GetLogs,
            _ => Self::Unknown,
        }
    }

    /// Whether the operation requires the session to already be bound to a
    /// cache. Binding itself and a bare disconnect are the only exemptions.
    pub fn requires_binding(&self) -> bool {
        !matches!(self, Self::Connect | Self::Subscribe | Self::Disconnect | Self::Unknown)
    }

    /// The positive reply literal for operations acknowledged with one
    /// fixed string. STAT and GETLOGS build their replies from store state
    /// instead.
    pub fn ack(&self) -> &'static str {
        match self {
            Self::Connect => "connected",
            Self::Subscribe => "subscribed",
            Self::Add => "log added",
            Self::Flush => "flushed",
            Self::Disconnect => "disconnected",
            Self::Unsubscribe => "unsubscribed",
            Self::Stat | Self::GetLogs | Self::Unknown => "",
        }
    }
}

/// One parsed request: an operation and its optional payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The requested operation
    pub op: OpCode,
    /// Everything after the first space, unsplit
    pub payload: Option<String>,
}

impl Command {
    /// Split a raw request line into operation token and payload
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(' ') {
            Some((token, payload)) => Self {
                op: OpCode::from_token(token),
                payload: Some(payload.to_string()),
            },
            None => Self {
                op: OpCode::from_token(raw),
                payload: None,
            },
        }
    }

    /// The payload, required: missing or empty payloads are invalid
    /// arguments for operations that need one
    pub fn require_payload(&self) -> Result<&str, ProtocolError> {
        match self.payload.as_deref() {
            Some(p) if !p.is_empty() => Ok(p),
            _ => Err(ProtocolError::InvalidArgument),
        }
    }
}

/// Validate that every payload byte is printable ASCII
pub fn validate_payload(payload: &str) -> Result<(), ProtocolError> {
    if payload.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_and_payload() {
        let cmd = Command::parse("connect svc1");
        assert_eq!(cmd.op, OpCode::Connect);
        assert_eq!(cmd.payload.as_deref(), Some("svc1"));
    }

    #[test]
    fn test_parse_bare_token() {
        let cmd = Command::parse("stat");
        assert_eq!(cmd.op, OpCode::Stat);
        assert_eq!(cmd.payload, None);
    }

    #[test]
    fn test_payload_is_not_split_further() {
        let cmd = Command::parse("add 2024-01-01T00:00:00>hello world");
        assert_eq!(cmd.op, OpCode::Add);
        assert_eq!(cmd.payload.as_deref(), Some("2024-01-01T00:00:00>hello world"));
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        assert_eq!(Command::parse("CONNECT svc1").op, OpCode::Unknown);
    }

    #[test]
    fn test_unknown_token_parses() {
        let cmd = Command::parse("frobnicate now");
        assert_eq!(cmd.op, OpCode::Unknown);
        assert_eq!(cmd.payload.as_deref(), Some("now"));
    }

    #[test]
    fn test_binding_policy() {
        assert!(!OpCode::Connect.requires_binding());
        assert!(!OpCode::Subscribe.requires_binding());
        assert!(!OpCode::Disconnect.requires_binding());
        assert!(OpCode::Stat.requires_binding());
        assert!(OpCode::Add.requires_binding());
        assert!(OpCode::Flush.requires_binding());
        assert!(OpCode::Unsubscribe.requires_binding());
        assert!(OpCode::GetLogs.requires_binding());
    }

    #[test]
    fn test_validate_rejects_control_bytes() {
        assert!(validate_payload("plain ascii 123").is_ok());
        assert_eq!(
            validate_payload("tab\there"),
            Err(ProtocolError::InvalidArgument)
        );
        assert_eq!(
            validate_payload("nul\0byte"),
            Err(ProtocolError::InvalidArgument)
        );
        assert_eq!(validate_payload("émoji"), Err(ProtocolError::InvalidArgument));
    }

    #[test]
    fn test_require_payload() {
        assert!(Command::parse("connect svc1").require_payload().is_ok());
        assert_eq!(
            Command::parse("connect").require_payload(),
            Err(ProtocolError::InvalidArgument)
        );
        assert_eq!(
            Command::parse("connect ").require_payload(),
            Err(ProtocolError::InvalidArgument)
        );
    }
}
