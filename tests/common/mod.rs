#![allow(dead_code)]

use async_trait::async_trait;
use mongodb_mcp_client::api::{Completion, CompletionRequest, LanguageModel};
use mongodb_mcp_client::mcp::{LineTransport, Transport};
use mongodb_mcp_client::{ClientOptions, MongoMcpClient, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// An in-memory MongoDB MCP server speaking newline-delimited JSON-RPC.
pub struct FakeServer {
    pub tools: Vec<Value>,
    /// Result object returned for `tools/call` per tool name.
    pub results: HashMap<String, Value>,
    /// Lines written before each response, e.g. notifications or pings.
    pub preamble: Vec<Value>,
    /// Drop the connection instead of answering this method.
    pub hang_up_on: Option<String>,
}

/// Every request the server received, in order.
pub type Received = Arc<Mutex<Vec<Value>>>;

pub fn mongo_tools() -> Vec<Value> {
    let db_coll = |extra: Value| {
        let mut props = json!({
            "database": { "type": "string" },
            "collection": { "type": "string" }
        });
        if let (Some(p), Some(e)) = (props.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                p.insert(k.clone(), v.clone());
            }
        }
        json!({ "type": "object", "properties": props, "required": ["database", "collection"] })
    };

    vec![
        json!({ "name": "find", "description": "Run a find query", "inputSchema": db_coll(json!({
            "filter": { "type": "object" }, "projection": { "type": "object" },
            "sort": { "type": "object" }, "limit": { "type": "number" }
        })) }),
        json!({ "name": "aggregate", "description": "Run an aggregation", "inputSchema": db_coll(json!({
            "pipeline": { "type": "array", "items": { "type": "object" } }
        })) }),
        json!({ "name": "count", "description": "Count documents", "inputSchema": db_coll(json!({
            "query": { "type": "object" }
        })) }),
        json!({ "name": "list-databases", "description": "List databases", "inputSchema": { "type": "object", "properties": {} } }),
        json!({ "name": "list-collections", "description": "List collections", "inputSchema": {
            "type": "object", "properties": { "database": { "type": "string" } }, "required": ["database"]
        } }),
        json!({ "name": "collection-schema", "description": "Describe a collection", "inputSchema": db_coll(json!({})) }),
    ]
}

pub fn text_result(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            tools: mongo_tools(),
            results: HashMap::new(),
            preamble: Vec::new(),
            hang_up_on: None,
        }
    }
}

impl FakeServer {
    pub fn with_result(mut self, tool: &str, result: Value) -> Self {
        self.results.insert(tool.to_string(), result);
        self
    }

    /// Start serving; returns the client end and the request log.
    pub fn start(self) -> (Box<dyn Transport>, Received) {
        let (client_side, server_side) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_side);
        let (server_read, mut server_write) = tokio::io::split(server_side);
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let Ok(message) = serde_json::from_str::<Value>(&line) else {
                    continue;
                };
                log.lock().unwrap().push(message.clone());

                let Some(method) = message.get("method").and_then(Value::as_str) else {
                    continue;
                };
                let Some(id) = message.get("id").cloned() else {
                    continue;
                };
                if self.hang_up_on.as_deref() == Some(method) {
                    return;
                }

                for extra in &self.preamble {
                    let out = format!("{}\n", extra);
                    if server_write.write_all(out.as_bytes()).await.is_err() {
                        return;
                    }
                }

                let reply = match method {
                    "initialize" => json!({ "jsonrpc": "2.0", "id": id, "result": {
                        "protocolVersion": "2024-11-05",
                        "serverInfo": { "name": "mongodb-mcp-server", "version": "1.0.0" },
                        "capabilities": { "tools": {} }
                    }}),
                    "tools/list" => json!({ "jsonrpc": "2.0", "id": id, "result": { "tools": self.tools } }),
                    "tools/call" => {
                        let name = message["params"]["name"].as_str().unwrap_or_default();
                        match self.results.get(name) {
                            Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                            None => json!({ "jsonrpc": "2.0", "id": id, "error": {
                                "code": -32602, "message": format!("Tool {} not found", name)
                            }}),
                        }
                    }
                    other => json!({ "jsonrpc": "2.0", "id": id, "error": {
                        "code": -32601, "message": format!("Method not found: {}", other)
                    }}),
                };

                let out = format!("{}\n", reply);
                if server_write.write_all(out.as_bytes()).await.is_err() {
                    return;
                }
            }
        });

        (Box::new(LineTransport::new(client_read, client_write)), received)
    }
}

/// Requests with the given method, in order.
pub fn requests_for(received: &Received, method: &str) -> Vec<Value> {
    received
        .lock()
        .unwrap()
        .iter()
        .filter(|m| m.get("method").and_then(Value::as_str) == Some(method))
        .cloned()
        .collect()
}

/// A language model that replays canned completions and keeps every request.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    pub replies: Arc<Mutex<VecDeque<Completion>>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| mongodb_mcp_client::Error::Other("script exhausted".to_string()))
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }
}

pub fn quiet_options() -> ClientOptions {
    ClientOptions::new(Some("mongodb://localhost:27017".to_string()))
        .unwrap()
        .with_verbose(false)
}

/// A client connected to `server`, driven by `model`.
pub async fn connected_client(server: FakeServer, model: ScriptedModel) -> (MongoMcpClient, Received) {
    let (transport, received) = server.start();
    let mut client = MongoMcpClient::new(quiet_options(), Box::new(model));
    client.connect_with(transport).await.unwrap();
    (client, received)
}
