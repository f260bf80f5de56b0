//! Newline-delimited JSON transport.
//!
//! One JSON-RPC message per line on the reader, one response per line on the
//! writer. Logs must never go to the writer.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Message that can be received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Line-oriented JSON-RPC transport over any reader/writer pair.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

/// Transport bound to the process's stdin and stdout.
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next message. Blank lines are skipped; `Ok(None)` means EOF.
    ///
    /// A line that is not a JSON-RPC message yields `InvalidData`; the
    /// transport stays usable afterwards.
    pub fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let line = line.trim();
        debug!(line = line, "Received");
        parse_message(line).map(Some)
    }

    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Serialization error: {}", e))
        })?;

        debug!(line = %json, "Sending");
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }

    /// Give back the writer, for inspecting output in tests.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Requests carry an `id`; notifications do not.
fn parse_message(line: &str) -> io::Result<IncomingMessage> {
    let invalid = |detail: String| {
        warn!(line = line, "Failed to parse message");
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid JSON-RPC message: {}", detail),
        )
    };

    let value: Value = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
    let has_id = value.get("id").is_some();

    if has_id {
        serde_json::from_value(value)
            .map(IncomingMessage::Request)
            .map_err(|e| invalid(e.to_string()))
    } else {
        serde_json::from_value(value)
            .map(IncomingMessage::Notification)
            .map_err(|e| invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestId;
    use std::io::Cursor;

    fn transport(input: &str) -> LineTransport<Cursor<Vec<u8>>, Vec<u8>> {
        LineTransport::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_read_request() {
        let mut transport =
            transport("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n");

        match transport.read_message().unwrap() {
            Some(IncomingMessage::Request(req)) => {
                assert_eq!(req.method, "tools/list");
                assert_eq!(req.id, RequestId::Number(1));
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_read_notification() {
        let mut transport =
            transport("{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n");

        match transport.read_message().unwrap() {
            Some(IncomingMessage::Notification(notif)) => {
                assert_eq!(notif.method, "notifications/initialized");
            }
            other => panic!("Expected notification, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut transport = transport("\n   \n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
        assert!(matches!(
            transport.read_message().unwrap(),
            Some(IncomingMessage::Request(_))
        ));
        assert!(transport.read_message().unwrap().is_none());
    }

    #[test]
    fn test_invalid_line_then_recovery() {
        let mut transport =
            transport("not json\n{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n");

        let err = transport.read_message().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(transport.read_message().unwrap().is_some());
    }

    #[test]
    fn test_request_missing_method_is_invalid() {
        let mut transport = transport("{\"jsonrpc\":\"2.0\",\"id\":4}\n");
        assert!(transport.read_message().is_err());
    }

    #[test]
    fn test_write_response() {
        let mut transport = transport("");
        let response =
            JsonRpcResponse::success(RequestId::Number(1), serde_json::json!({"ok": true}));

        transport.write_response(&response).unwrap();

        let output = String::from_utf8(transport.into_writer()).unwrap();
        assert_eq!(output, "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}\n");
    }

    #[test]
    fn test_read_eof() {
        let mut transport = transport("");
        assert!(transport.read_message().unwrap().is_none());
    }
}
