//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - collect, parse and render EPIC updates
//! 3. Shutdown - stop at end of input

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use epicwatch_core::IssueSource;
use epicwatch_epic::TemplateMatcher;
use epicwatch_report::ReportRenderer;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, LineTransport, StdioTransport};

/// Name reported in the initialize handshake.
pub const SERVER_NAME: &str = "epicwatch-mcp";

/// MCP server exposing the EPIC update tools.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    /// Create a server without an issue source. Only the offline tools
    /// (parsing and rendering) will succeed.
    pub fn new() -> Self {
        Self {
            handler: ToolHandler::new(None),
            initialized: false,
        }
    }

    /// Create a server that fetches issues from `source`.
    pub fn with_source(source: Arc<dyn IssueSource>) -> Self {
        Self {
            handler: ToolHandler::new(Some(source)),
            initialized: false,
        }
    }

    pub fn with_matcher(mut self, matcher: TemplateMatcher) -> Self {
        self.handler = self.handler.with_matcher(matcher);
        self
    }

    pub fn with_renderer(mut self, renderer: ReportRenderer) -> Self {
        self.handler = self.handler.with_renderer(renderer);
        self
    }

    pub fn has_source(&self) -> bool {
        self.handler.has_source()
    }

    /// Run the MCP server over stdin/stdout until EOF.
    pub async fn run(&mut self) -> io::Result<()> {
        info!(source = self.has_source(), "Starting MCP server");
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Serve messages from any line transport until EOF.
    ///
    /// A malformed line is answered with a parse error and the loop keeps
    /// going; a failed write ends it.
    pub async fn serve<R: BufRead, W: Write>(
        &mut self,
        transport: &mut LineTransport<R, W>,
    ) -> io::Result<()> {
        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(response) = self.handle_message(msg).await {
                        if let Err(e) = transport.write_response(&response) {
                            error!(error = %e, "Failed to write response");
                            return Err(e);
                        }
                    }
                }
                Ok(None) => {
                    info!("EOF received, shutting down");
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    let response = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    transport.write_response(&response)?;
                }
                Err(e) => {
                    error!(error = %e, "Transport error");
                    return Err(e);
                }
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
        }
    }

    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %req.method, id = %req.id, "Handling request");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                warn!(method, "Unknown method");
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => info!("Client initialized"),
            "notifications/cancelled" => debug!("Request cancelled by client"),
            _ => debug!(method, "Ignoring notification"),
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => {
                    let client = init.client_info.as_ref();
                    info!(
                        client = client.map_or("unknown", |c| c.name.as_str()),
                        version = client.and_then(|c| c.version.as_deref()).unwrap_or("-"),
                        protocol = init.protocol_version.as_deref().unwrap_or("-"),
                        "Client connected"
                    );
                }
                Err(e) => warn!(error = %e, "Failed to parse initialize params"),
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_serializable(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        JsonRpcResponse::from_serializable(id, &result)
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(&e.to_string()),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        info!(tool = %params.name, "Calling tool");

        let result = self.handler.execute(&params.name, params.arguments).await;
        JsonRpcResponse::from_serializable(id, &result)
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JSONRPC_VERSION;
    use std::io::Cursor;

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    fn responses(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_server_creation() {
        let server = McpServer::new();
        assert!(!server.has_source());
        assert!(!server.initialized);
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let mut server = McpServer::new();

        let resp = server
            .handle_request(request(
                1,
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "1.0.0" }
                })),
            ))
            .await;

        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert!(server.initialized);
    }

    #[test]
    fn test_initialize_without_params() {
        let mut server = McpServer::new();
        let resp = server.handle_initialize(RequestId::Number(1), None);
        assert!(resp.result.is_some());
        assert!(server.initialized);
    }

    #[test]
    fn test_initialize_with_invalid_params() {
        let mut server = McpServer::new();
        let resp = server.handle_initialize(
            RequestId::Number(1),
            Some(serde_json::json!({"clientInfo": 42})),
        );
        assert!(resp.result.is_some());
        assert!(server.initialized);
    }

    #[test]
    fn test_double_initialize_error() {
        let mut server = McpServer::new();
        server.initialized = true;

        let resp = server.handle_initialize(RequestId::Number(2), None);

        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_tools_list() {
        let server = McpServer::new();
        let resp = server.handle_tools_list(RequestId::Number(1));

        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(result.tools.len(), 7);
        assert!(result.tools.iter().any(|t| t.name == "collect_epic_updates"));
        assert!(result.tools.iter().any(|t| t.name == "analyze_epic_trends"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut server = McpServer::new();
        let resp = server.handle_request(request(1, "resources/list", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let mut server = McpServer::new();
        let resp = server.handle_request(request(1, "tools/call", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let mut server = McpServer::new();
        let resp = server
            .handle_request(request(
                1,
                "tools/call",
                Some(serde_json::json!("not an object")),
            ))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_without_source_is_tool_error() {
        let mut server = McpServer::new();
        let resp = server
            .handle_request(request(
                1,
                "tools/call",
                Some(serde_json::json!({
                    "name": "collect_epic_updates",
                    "arguments": { "repo": "LDFLK/launch", "issue_numbers": [151] }
                })),
            ))
            .await;

        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("No GitHub source configured"));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mut server = McpServer::new();
        let msg = IncomingMessage::Notification(crate::protocol::JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "notifications/initialized".to_string(),
            params: None,
        });

        assert!(server.handle_message(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_serve_session() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"t"}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "this is not json",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"parse_epic_update","arguments":{"body":"**Date:** 2025-08-07"}}}"#,
            r#"{"jsonrpc":"2.0","id":"last","method":"ping"}"#,
        ]
        .join("\n");
        let mut transport = LineTransport::new(Cursor::new(input.into_bytes()), Vec::new());

        let mut server = McpServer::new();
        server.serve(&mut transport).await.unwrap();

        let responses = responses(transport.into_writer());
        assert_eq!(responses.len(), 5);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 7);
        assert!(responses[2]["id"].is_null());
        assert_eq!(responses[2]["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(responses[3]["id"], 3);
        let text = responses[3]["result"]["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["is_epic_update"], false);
        assert_eq!(responses[4]["id"], "last");
    }
}
