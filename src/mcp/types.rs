use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<McpTool>,
    #[serde(rename = "nextCursor", default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// Text of the first content block, or an empty string when the first
    /// block is missing or carries no text.
    pub fn first_text(&self) -> String {
        match self.content.first() {
            Some(ToolContent::Text { text }) => text.clone(),
            _ => String::new(),
        }
    }

    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_error(&self) -> bool {
        self.is_error == Some(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    #[serde(default)]
    pub capabilities: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> JsonRpcNotification<'a> {
    pub fn new(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Any message read from the server. Which fields are present decides
/// whether it is a response, a notification or a server-initiated request.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl IncomingMessage {
    pub fn is_response_to(&self, id: u64) -> bool {
        self.method.is_none() && self.id.as_ref().and_then(Value::as_u64) == Some(id)
    }

    pub fn is_server_request(&self) -> bool {
        self.method.is_some() && self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_text_takes_only_the_first_block() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "Found 3 documents" },
                { "type": "text", "text": "{\"_id\": 1}" }
            ]
        }))
        .unwrap();
        assert_eq!(result.first_text(), "Found 3 documents");
        assert_eq!(result.joined_text(), "Found 3 documents\n{\"_id\": 1}");
        assert!(!result.is_error());
    }

    #[test]
    fn test_empty_and_non_text_content() {
        let empty: CallToolResult = serde_json::from_value(json!({ "content": [] })).unwrap();
        assert_eq!(empty.first_text(), "");

        let image: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "image", "data": "AAAA", "mimeType": "image/png" }],
            "isError": true
        }))
        .unwrap();
        assert_eq!(image.first_text(), "");
        assert!(image.is_error());
    }

    #[test]
    fn test_unknown_content_kind_is_tolerated() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "audio", "data": "..." }]
        }))
        .unwrap();
        assert_eq!(result.content, vec![ToolContent::Unknown]);
    }

    #[test]
    fn test_tool_without_schema_gets_object_schema() {
        let tool: McpTool = serde_json::from_value(json!({ "name": "list-databases" })).unwrap();
        assert_eq!(tool.input_schema, json!({ "type": "object" }));
        assert!(tool.description.is_none());
    }

    #[test]
    fn test_incoming_message_classification() {
        let response: IncomingMessage =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 4, "result": {} })).unwrap();
        assert!(response.is_response_to(4));
        assert!(!response.is_response_to(5));

        let ping: IncomingMessage =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 9, "method": "ping" })).unwrap();
        assert!(ping.is_server_request());
        assert!(!ping.is_response_to(9));
    }
}
