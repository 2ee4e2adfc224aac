use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::client::HttpClient;
use super::models::{
    ChatMessage, Completion, CompletionRequest, ContentBlock, LanguageModel, StopReason,
};
use crate::error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: HttpClient,
}

impl AnthropicClient {
    pub fn new(api_key: &str, endpoint: Option<&str>, timeout: Duration) -> Result<Self> {
        let url = messages_url(endpoint.unwrap_or(DEFAULT_ENDPOINT));
        let http = HttpClient::new(
            &url,
            &[
                ("x-api-key", api_key.to_string()),
                ("anthropic-version", API_VERSION.to_string()),
            ],
            timeout,
        )?;
        Ok(Self { http })
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = request_body(request);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending Messages API request"
        );
        let response = self.http.post_json(&body).await?;
        parse_response(&response)
    }

    fn provider(&self) -> &'static str {
        "anthropic"
    }
}

/// Accepts a bare host, a `/v1` base or the full messages URL.
pub fn messages_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.ends_with("/v1/messages") {
        endpoint.to_string()
    } else if endpoint.ends_with("/v1") {
        format!("{}/messages", endpoint)
    } else {
        format!("{}/v1/messages", endpoint)
    }
}

pub fn request_body(request: &CompletionRequest) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_to_wire).collect();

    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "system": request.system,
        "messages": messages,
    });

    if !request.tools.is_empty() {
        body["tools"] = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": tool.input_schema,
                })
            })
            .collect();
    }

    body
}

fn message_to_wire(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::User(text) => json!({ "role": "user", "content": text }),
        ChatMessage::Assistant(blocks) => {
            let content: Vec<Value> = blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text(text) => json!({ "type": "text", "text": text }),
                    ContentBlock::ToolUse { id, name, input } => json!({
                        "type": "tool_use",
                        "id": id,
                        "name": name,
                        "input": input,
                    }),
                })
                .collect();
            json!({ "role": "assistant", "content": content })
        }
        ChatMessage::ToolResults(results) => {
            let content: Vec<Value> = results
                .iter()
                .map(|result| {
                    let mut block = json!({
                        "type": "tool_result",
                        "tool_use_id": result.tool_use_id,
                        "content": result.content,
                    });
                    if result.is_error {
                        block["is_error"] = json!(true);
                    }
                    block
                })
                .collect();
            json!({ "role": "user", "content": content })
        }
    }
}

pub fn parse_response(response: &Value) -> Result<Completion> {
    let blocks = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| Error::Other("No content in response".to_string()))?;

    let mut content = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                let text = block.get("text").and_then(|t| t.as_str()).unwrap_or_default();
                content.push(ContentBlock::Text(text.to_string()));
            }
            Some("tool_use") => {
                let id = block
                    .get("id")
                    .and_then(|i| i.as_str())
                    .ok_or_else(|| Error::Other("tool_use block missing 'id'".to_string()))?;
                let name = block
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| Error::Other("tool_use block missing 'name'".to_string()))?;
                content.push(ContentBlock::ToolUse {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: block.get("input").cloned().unwrap_or_else(|| json!({})),
                });
            }
            other => {
                tracing::debug!(block_type = ?other, "ignoring content block");
            }
        }
    }

    let stop_reason =
        StopReason::from_anthropic(response.get("stop_reason").and_then(|s| s.as_str()));

    Ok(Completion {
        content,
        stop_reason,
    })
}
