use serde_json::{json, Value};
use tokio::time::{timeout, Duration};

use super::transport::Transport;
use super::types::{
    CallToolResult, ClientInfo, IncomingMessage, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, McpTool, ServerInfo, ToolListResponse,
};
use crate::error::{Error, Result};

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const METHOD_NOT_FOUND: i64 = -32601;

/// A live MCP session over one transport.
///
/// Requests are issued one at a time; the session is the only reader of the
/// transport, so anything that is not the awaited response is handled or
/// skipped inline.
pub struct McpSession {
    transport: Box<dyn Transport>,
    next_id: u64,
    request_timeout: Duration,
    server_info: ServerInfo,
    protocol_version: String,
    closed: bool,
}

impl McpSession {
    /// Run the `initialize` handshake and return a ready session.
    pub async fn initialize(
        transport: Box<dyn Transport>,
        client_info: ClientInfo,
        request_timeout: Duration,
    ) -> Result<Self> {
        let mut session = Self {
            transport,
            next_id: 1,
            request_timeout,
            server_info: ServerInfo {
                name: String::new(),
                version: String::new(),
            },
            protocol_version: String::new(),
            closed: false,
        };

        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": client_info,
        });
        let response = session.request("initialize", params).await?;
        let init: InitializeResult = serde_json::from_value(response)?;

        tracing::debug!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            protocol = %init.protocol_version,
            "MCP session initialized"
        );

        session.server_info = init.server_info;
        session.protocol_version = init.protocol_version;
        session.notify("notifications/initialized", None).await?;

        Ok(session)
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    pub async fn list_tools(&mut self) -> Result<Vec<McpTool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = match &cursor {
                Some(c) => json!({ "cursor": c }),
                None => json!({}),
            };
            let response = self.request("tools/list", params).await?;
            let page: ToolListResponse = serde_json::from_value(response)?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }

    pub async fn call_tool(&mut self, name: &str, arguments: &Value) -> Result<CallToolResult> {
        let params = json!({
            "name": name,
            "arguments": arguments,
        });
        let response = self.request("tools/call", params).await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.transport.close().await
    }

    async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }

        let id = self.next_id;
        self.next_id += 1;

        let request = serde_json::to_value(JsonRpcRequest::new(id, method, params))?;
        self.transport.send(&request).await?;

        match timeout(self.request_timeout, self.await_response(id)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "'{}' response after {} seconds",
                method,
                self.request_timeout.as_secs()
            ))),
        }
    }

    async fn await_response(&mut self, id: u64) -> Result<Value> {
        loop {
            let raw = self
                .transport
                .receive()
                .await?
                .ok_or(Error::ConnectionClosed)?;

            let message: IncomingMessage = match serde_json::from_value(raw) {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed JSON-RPC message");
                    continue;
                }
            };

            if message.is_response_to(id) {
                if let Some(error) = message.error {
                    return Err(Error::Mcp {
                        code: error.code,
                        message: error.message,
                    });
                }
                return Ok(message.result.unwrap_or(Value::Null));
            }

            if message.is_server_request() {
                self.answer_server_request(&message).await?;
                continue;
            }

            match message.method.as_deref() {
                Some(method) => tracing::debug!(method, "MCP notification"),
                None => tracing::debug!(id = ?message.id, "skipping unexpected MCP response"),
            }
        }
    }

    async fn answer_server_request(&mut self, message: &IncomingMessage) -> Result<()> {
        let method = message.method.as_deref().unwrap_or_default();
        let id = message.id.clone().unwrap_or(Value::Null);

        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            tracing::debug!(method, "rejecting unsupported server request");
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": METHOD_NOT_FOUND, "message": format!("Method not found: {}", method) }
            })
        };

        self.transport.send(&reply).await
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = serde_json::to_value(JsonRpcNotification::new(method, params))?;
        self.transport.send(&notification).await
    }
}
