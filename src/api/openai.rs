use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::client::HttpClient;
use super::models::{
    ChatMessage, Completion, CompletionRequest, ContentBlock, LanguageModel, StopReason,
};
use crate::error::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1";

/// Any server speaking the OpenAI chat-completions dialect (OpenRouter,
/// a local Ollama, ...).
pub struct OpenAiClient {
    http: HttpClient,
}

impl OpenAiClient {
    pub fn new(api_key: &str, endpoint: Option<&str>, timeout: Duration) -> Result<Self> {
        let url = completions_url(endpoint.unwrap_or(DEFAULT_ENDPOINT));
        let http = HttpClient::new(
            &url,
            &[("authorization", format!("Bearer {}", api_key))],
            timeout,
        )?;
        Ok(Self { http })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = request_body(request);
        tracing::debug!(
            model = %request.model,
            endpoint = %self.http.endpoint(),
            messages = request.messages.len(),
            "sending chat completions request"
        );
        let response = self.http.post_json(&body).await?;
        parse_response(&response)
    }

    fn provider(&self) -> &'static str {
        "openai"
    }
}

pub fn completions_url(endpoint: &str) -> String {
    if endpoint.ends_with("/chat/completions") {
        endpoint.to_string()
    } else if endpoint.ends_with("/v1") {
        format!("{}/chat/completions", endpoint)
    } else if endpoint.ends_with("/v1/") {
        format!("{}chat/completions", endpoint)
    } else {
        format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'))
    }
}

pub fn request_body(request: &CompletionRequest) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": request.system })];
    for message in &request.messages {
        append_wire_messages(message, &mut messages);
    }

    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "messages": messages,
    });

    if !request.tools.is_empty() {
        body["tools"] = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            })
            .collect();
    }

    body
}

fn append_wire_messages(message: &ChatMessage, out: &mut Vec<Value>) {
    match message {
        ChatMessage::User(text) => out.push(json!({ "role": "user", "content": text })),
        ChatMessage::Assistant(blocks) => {
            let text: String = blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text(t) => Some(t.as_str()),
                    ContentBlock::ToolUse { .. } => None,
                })
                .collect();
            let tool_calls: Vec<Value> = blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => Some(json!({
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": input.to_string(),
                        }
                    })),
                    ContentBlock::Text(_) => None,
                })
                .collect();

            let mut wire = json!({
                "role": "assistant",
                "content": if text.is_empty() { Value::Null } else { Value::String(text) },
            });
            if !tool_calls.is_empty() {
                wire["tool_calls"] = Value::Array(tool_calls);
            }
            out.push(wire);
        }
        ChatMessage::ToolResults(results) => {
            for result in results {
                let content = if result.is_error && !result.content.starts_with("Error") {
                    format!("Error: {}", result.content)
                } else {
                    result.content.clone()
                };
                out.push(json!({
                    "role": "tool",
                    "tool_call_id": result.tool_use_id,
                    "content": content,
                }));
            }
        }
    }
}

pub fn parse_response(response: &Value) -> Result<Completion> {
    let choices = response
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| Error::Other("No choices in response".to_string()))?;

    let first_choice = choices
        .first()
        .ok_or_else(|| Error::Other("Empty choices array".to_string()))?;

    let message = first_choice
        .get("message")
        .ok_or_else(|| Error::Other("No message in response".to_string()))?;

    let mut content = Vec::new();
    if let Some(text) = message.get("content").and_then(|c| c.as_str()) {
        if !text.is_empty() {
            content.push(ContentBlock::Text(text.to_string()));
        }
    }

    let tool_calls = message
        .get("tool_calls")
        .and_then(|tc| tc.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    for call in tool_calls {
        let id = call
            .get("id")
            .and_then(|i| i.as_str())
            .ok_or_else(|| Error::Other("Tool call missing required 'id' field".to_string()))?;
        let function = call.get("function").ok_or_else(|| {
            Error::Other(format!("Tool call {} missing required 'function' field", id))
        })?;
        let name = function.get("name").and_then(|n| n.as_str()).ok_or_else(|| {
            Error::Other(format!("Tool call {} missing required 'function.name' field", id))
        })?;
        let arguments = function
            .get("arguments")
            .and_then(|a| a.as_str())
            .unwrap_or("{}");
        let input = match serde_json::from_str::<Value>(arguments) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "unparsable tool arguments, sending {{}}");
                json!({})
            }
        };

        content.push(ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input,
        });
    }

    let mut stop_reason =
        StopReason::from_openai(first_choice.get("finish_reason").and_then(|r| r.as_str()));
    // Some compatible servers report "stop" even when they return tool calls.
    if !tool_calls.is_empty() {
        stop_reason = StopReason::ToolUse;
    }

    Ok(Completion {
        content,
        stop_reason,
    })
}
