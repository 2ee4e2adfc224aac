use mongodb_mcp_client::api::{anthropic, openai};
use mongodb_mcp_client::api::{
    ChatMessage, CompletionRequest, ContentBlock, StopReason, ToolResult, ToolSpec,
};
use serde_json::json;

fn request_with_history() -> CompletionRequest {
    CompletionRequest {
        model: "test-model".to_string(),
        system: "You are a MongoDB expert assistant.".to_string(),
        max_tokens: 4096,
        tools: vec![ToolSpec {
            name: "count".to_string(),
            description: "Count documents".to_string(),
            input_schema: json!({ "type": "object" }),
        }],
        messages: vec![
            ChatMessage::User("How many movies?".to_string()),
            ChatMessage::Assistant(vec![
                ContentBlock::Text("Counting.".to_string()),
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "count".to_string(),
                    input: json!({ "database": "sample_mflix", "collection": "movies" }),
                },
            ]),
            ChatMessage::ToolResults(vec![ToolResult {
                tool_use_id: "call_1".to_string(),
                content: "Found 23530 documents".to_string(),
                is_error: false,
            }]),
        ],
    }
}

#[test]
fn test_anthropic_parse_tool_use() {
    let response = json!({
        "content": [
            { "type": "text", "text": "Let me count." },
            { "type": "tool_use", "id": "toolu_1", "name": "count",
              "input": { "database": "sample_mflix", "collection": "movies" } }
        ],
        "stop_reason": "tool_use"
    });

    let completion = anthropic::parse_response(&response).unwrap();
    assert_eq!(completion.stop_reason, StopReason::ToolUse);
    assert_eq!(completion.text(), "Let me count.");
    let uses = completion.tool_uses();
    assert_eq!(uses.len(), 1);
    assert_eq!(uses[0].1, "count");
    assert_eq!(uses[0].2["collection"], "movies");
}

#[test]
fn test_anthropic_parse_ignores_unknown_blocks() {
    let response = json!({
        "content": [
            { "type": "thinking", "thinking": "hmm" },
            { "type": "text", "text": "There are 23530 movies." }
        ],
        "stop_reason": "end_turn"
    });

    let completion = anthropic::parse_response(&response).unwrap();
    assert_eq!(completion.content.len(), 1);
    assert_eq!(completion.text(), "There are 23530 movies.");
    assert!(!completion.wants_tools());
}

#[test]
fn test_anthropic_parse_missing_content() {
    assert!(anthropic::parse_response(&json!({ "type": "error" })).is_err());
}

#[test]
fn test_anthropic_tool_use_without_id_is_rejected() {
    let response = json!({
        "content": [{ "type": "tool_use", "name": "count", "input": {} }],
        "stop_reason": "tool_use"
    });
    assert!(anthropic::parse_response(&response).is_err());
}

#[test]
fn test_anthropic_request_body() {
    let body = anthropic::request_body(&request_with_history());

    assert_eq!(body["model"], "test-model");
    assert_eq!(body["system"], "You are a MongoDB expert assistant.");
    assert_eq!(body["tools"][0]["input_schema"], json!({ "type": "object" }));

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"][1]["type"], "tool_use");
    assert_eq!(messages[2]["role"], "user");
    assert_eq!(messages[2]["content"][0]["type"], "tool_result");
    assert_eq!(messages[2]["content"][0]["tool_use_id"], "call_1");
    assert!(messages[2]["content"][0].get("is_error").is_none());
}

#[test]
fn test_anthropic_request_body_marks_errors() {
    let mut request = request_with_history();
    request.messages[2] = ChatMessage::ToolResults(vec![ToolResult {
        tool_use_id: "call_1".to_string(),
        content: "collection not found".to_string(),
        is_error: true,
    }]);

    let body = anthropic::request_body(&request);
    assert_eq!(body["messages"][2]["content"][0]["is_error"], true);
}

#[test]
fn test_anthropic_request_body_without_tools() {
    let mut request = request_with_history();
    request.tools.clear();
    assert!(anthropic::request_body(&request).get("tools").is_none());
}

#[test]
fn test_anthropic_messages_url() {
    assert_eq!(
        anthropic::messages_url("https://api.anthropic.com"),
        "https://api.anthropic.com/v1/messages"
    );
    assert_eq!(
        anthropic::messages_url("https://proxy.local/v1/"),
        "https://proxy.local/v1/messages"
    );
    assert_eq!(
        anthropic::messages_url("https://proxy.local/v1/messages"),
        "https://proxy.local/v1/messages"
    );
}

#[test]
fn test_openai_parse_content() {
    let response = json!({
        "choices": [{
            "message": { "role": "assistant", "content": "Hello, world!" },
            "finish_reason": "stop"
        }]
    });

    let completion = openai::parse_response(&response).unwrap();
    assert_eq!(completion.text(), "Hello, world!");
    assert_eq!(completion.stop_reason, StopReason::EndTurn);
}

#[test]
fn test_openai_parse_empty_choices() {
    assert!(openai::parse_response(&json!({ "choices": [] })).is_err());
    assert!(openai::parse_response(&json!({})).is_err());
}

#[test]
fn test_openai_parse_tool_calls() {
    let response = json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_123",
                    "type": "function",
                    "function": {
                        "name": "find",
                        "arguments": "{\"database\": \"sample_mflix\", \"collection\": \"movies\"}"
                    }
                }]
            },
            "finish_reason": "stop"
        }]
    });

    let completion = openai::parse_response(&response).unwrap();
    assert_eq!(completion.stop_reason, StopReason::ToolUse);
    let uses = completion.tool_uses();
    assert_eq!(uses[0].0, "call_123");
    assert_eq!(uses[0].2["database"], "sample_mflix");
}

#[test]
fn test_openai_parse_bad_arguments_become_empty_object() {
    let response = json!({
        "choices": [{
            "message": {
                "tool_calls": [{
                    "id": "call_1",
                    "function": { "name": "list-databases", "arguments": "{not json" }
                }]
            },
            "finish_reason": "tool_calls"
        }]
    });

    let completion = openai::parse_response(&response).unwrap();
    assert_eq!(completion.tool_uses()[0].2, &json!({}));
}

#[test]
fn test_openai_parse_tool_call_missing_function() {
    let response = json!({
        "choices": [{
            "message": { "tool_calls": [{ "id": "call_1", "type": "function" }] }
        }]
    });

    let err = openai::parse_response(&response).unwrap_err();
    assert!(err.to_string().contains("missing required 'function' field"));
}

#[test]
fn test_openai_request_body() {
    let body = openai::request_body(&request_with_history());
    let messages = body["messages"].as_array().unwrap();

    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["content"], "Counting.");
    assert_eq!(messages[2]["tool_calls"][0]["function"]["name"], "count");

    let arguments = messages[2]["tool_calls"][0]["function"]["arguments"]
        .as_str()
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(arguments).unwrap();
    assert_eq!(parsed["collection"], "movies");

    assert_eq!(messages[3]["role"], "tool");
    assert_eq!(messages[3]["tool_call_id"], "call_1");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["parameters"], json!({ "type": "object" }));
}

#[test]
fn test_openai_request_body_prefixes_errors() {
    let mut request = request_with_history();
    request.messages[2] = ChatMessage::ToolResults(vec![ToolResult {
        tool_use_id: "call_1".to_string(),
        content: "collection not found".to_string(),
        is_error: true,
    }]);

    let body = openai::request_body(&request);
    assert_eq!(body["messages"][3]["content"], "Error: collection not found");
}

#[test]
fn test_openai_completions_url() {
    assert_eq!(
        openai::completions_url("https://openrouter.ai/api/v1"),
        "https://openrouter.ai/api/v1/chat/completions"
    );
    assert_eq!(
        openai::completions_url("http://localhost:11434/v1/"),
        "http://localhost:11434/v1/chat/completions"
    );
    assert_eq!(
        openai::completions_url("http://localhost:11434"),
        "http://localhost:11434/v1/chat/completions"
    );
    assert_eq!(
        openai::completions_url("https://api.openai.com/v1/chat/completions"),
        "https://api.openai.com/v1/chat/completions"
    );
}
