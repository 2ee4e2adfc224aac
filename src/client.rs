//! The MongoDB client: a language model on one side, the MongoDB MCP server
//! on the other.
//!
//! [`MongoMcpClient::query`] runs the model's tool-use loop against the
//! server's tools. The direct wrappers (`find`, `count`, ...) skip the model
//! and call one MCP tool with the arguments given.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::api::{
    build_model, ApiSettings, ChatMessage, Completion, CompletionRequest, ContentBlock,
    LanguageModel, ToolResult,
};
use crate::error::{Error, Result};
use crate::mcp::{
    CallToolResult, ClientInfo, McpSession, McpTool, ServerInfo, ServerLaunch, StdioTransport,
    ToolCatalog, Transport, DEFAULT_REQUEST_TIMEOUT,
};
use crate::ui;

pub const CONNECTION_STRING_ENV: &str = "MDB_MCP_CONNECTION_STRING";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 25;
pub const DEFAULT_FIND_LIMIT: u32 = 10;
pub const DEFAULT_SERVER_COMMAND: &str = "npx";
pub const DEFAULT_SERVER_ARGS: &[&str] = &["-y", "mongodb-mcp-server"];

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a MongoDB expert assistant. When users ask questions about their data:
1. Use the available MongoDB tools to query the database
2. Analyze the results and provide clear, helpful responses
3. If you need to run multiple queries, do so to get complete answers
4. Format numbers and data in a readable way
5. If an error occurs, explain what went wrong and suggest fixes";

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub command: String,
    pub args: Vec<String>,
    /// Extra variables for the server, on top of the inherited environment.
    pub env: HashMap<String, String>,
    pub inherit_stderr: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            command: DEFAULT_SERVER_COMMAND.to_string(),
            args: DEFAULT_SERVER_ARGS.iter().map(|s| s.to_string()).collect(),
            env: HashMap::new(),
            inherit_stderr: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub connection_string: String,
    pub model: String,
    pub verbose: bool,
    /// Replaces [`DEFAULT_SYSTEM_PROMPT`] for every query.
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub max_tool_rounds: usize,
    pub server: ServerOptions,
    /// Deadline for each MCP request, tool calls included.
    pub request_timeout: Duration,
}

impl ClientOptions {
    /// Options for `connection_string`, falling back to
    /// `MDB_MCP_CONNECTION_STRING` when it is `None`.
    pub fn new(connection_string: Option<String>) -> Result<Self> {
        let connection_string = connection_string
            .or_else(|| env::var(CONNECTION_STRING_ENV).ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "MongoDB connection string is required. Provide it directly or set \
                     MDB_MCP_CONNECTION_STRING environment variable."
                        .to_string(),
                )
            })?;

        Ok(Self {
            connection_string,
            model: DEFAULT_MODEL.to_string(),
            verbose: true,
            system_prompt: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            server: ServerOptions::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Variables set for the server on top of the inherited environment:
    /// configured extras and the connection string.
    pub fn server_launch(&self) -> ServerLaunch {
        let mut env = self.server.env.clone();
        env.insert(
            CONNECTION_STRING_ENV.to_string(),
            self.connection_string.clone(),
        );

        ServerLaunch {
            command: self.server.command.clone(),
            args: self.server.args.clone(),
            env,
            inherit_stderr: self.server.inherit_stderr,
        }
    }
}

/// Optional parts of a `find` call. Empty documents are not forwarded.
#[derive(Debug, Clone)]
pub struct FindOptions {
    pub filter: Option<Value>,
    pub projection: Option<Value>,
    pub sort: Option<Value>,
    pub limit: u32,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            filter: None,
            projection: None,
            sort: None,
            limit: DEFAULT_FIND_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// The model's final answer.
    pub response: String,
    /// Every MCP tool the model called, in order.
    pub tool_calls: Vec<ToolInvocation>,
    /// First text block of each tool result, parallel to `tool_calls`.
    pub raw_results: Vec<String>,
}

struct Connection {
    session: McpSession,
    catalog: ToolCatalog,
}

pub struct MongoMcpClient {
    options: ClientOptions,
    model: Box<dyn LanguageModel>,
    connection: Option<Connection>,
}

impl MongoMcpClient {
    pub fn new(options: ClientOptions, model: Box<dyn LanguageModel>) -> Self {
        Self {
            options,
            model,
            connection: None,
        }
    }

    pub fn from_settings(options: ClientOptions, api: &ApiSettings) -> Result<Self> {
        Ok(Self::new(options, build_model(api)?))
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn tools(&self) -> &[McpTool] {
        self.connection
            .as_ref()
            .map(|c| c.catalog.tools())
            .unwrap_or_default()
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.connection.as_ref().map(|c| c.session.server_info())
    }

    /// Spawn the MongoDB MCP server and open a session with it.
    pub async fn connect(&mut self) -> Result<()> {
        let launch = self.options.server_launch();
        let transport = StdioTransport::spawn(&launch).map_err(Error::connect_failed)?;
        tracing::debug!(pid = ?transport.id(), "MCP server started");
        self.connect_with(Box::new(transport)).await
    }

    /// Open a session over an already established transport.
    pub async fn connect_with(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        if let Some(mut previous) = self.connection.take() {
            let _ = previous.session.close().await;
        }

        let mut session = McpSession::initialize(
            transport,
            ClientInfo::default(),
            self.options.request_timeout,
        )
        .await
        .map_err(Error::connect_failed)?;

        let tools = match session.list_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                let _ = session.close().await;
                return Err(Error::connect_failed(e));
            }
        };

        tracing::info!(
            server = %session.server_info().name,
            tools = tools.len(),
            "connected to MongoDB MCP server"
        );

        let catalog = ToolCatalog::new(tools);
        if self.options.verbose {
            ui::display_connected(catalog.len());
        }

        self.connection = Some(Connection { session, catalog });
        Ok(())
    }

    /// Close the session and stop the server. Calling it twice is harmless.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        let result = connection.session.close().await;
        if self.options.verbose {
            ui::display_closed();
        }
        result
    }

    /// Answer `prompt` by letting the model call MongoDB tools until it
    /// produces a final response.
    pub async fn query(&mut self, prompt: &str, system_prompt: Option<&str>) -> Result<QueryResult> {
        if self.connection.is_none() {
            return Err(Error::not_connected());
        }
        self.run_query(prompt, system_prompt)
            .await
            .map_err(Error::query_failed)
    }

    async fn run_query(&mut self, prompt: &str, system_prompt: Option<&str>) -> Result<QueryResult> {
        let verbose = self.options.verbose;
        let system = system_prompt
            .or(self.options.system_prompt.as_deref())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
            .to_string();

        let tools = self
            .connection
            .as_ref()
            .map(|c| c.catalog.specs())
            .unwrap_or_default();

        let mut request = CompletionRequest {
            model: self.options.model.clone(),
            system,
            max_tokens: self.options.max_tokens,
            tools,
            messages: vec![ChatMessage::User(prompt.to_string())],
        };
        let mut result = QueryResult::default();

        if verbose {
            ui::display_query(prompt);
        }

        let mut completion = self.model.complete(&request).await?;
        let mut rounds = 0usize;

        while completion.wants_tools() {
            rounds += 1;
            if rounds > self.options.max_tool_rounds {
                return Err(Error::Other(format!(
                    "model requested tools for more than {} rounds",
                    self.options.max_tool_rounds
                )));
            }

            let tool_results = self.execute_tool_uses(&completion, &mut result).await?;
            request
                .messages
                .push(ChatMessage::Assistant(completion.content.clone()));
            request.messages.push(ChatMessage::ToolResults(tool_results));

            completion = self.model.complete(&request).await?;
        }

        result.response = completion.text();
        tracing::debug!(
            provider = self.model.provider(),
            tool_calls = result.tool_calls.len(),
            stop_reason = ?completion.stop_reason,
            "query finished"
        );

        if verbose {
            ui::display_response(&result.response);
        }

        Ok(result)
    }

    async fn execute_tool_uses(
        &mut self,
        completion: &Completion,
        result: &mut QueryResult,
    ) -> Result<Vec<ToolResult>> {
        let verbose = self.options.verbose;
        let connection = self.connection.as_mut().ok_or_else(Error::not_connected)?;
        let mut tool_results = Vec::new();

        for block in &completion.content {
            let ContentBlock::ToolUse { id, name, input } = block else {
                continue;
            };

            result.tool_calls.push(ToolInvocation {
                tool: name.clone(),
                input: input.clone(),
            });
            if verbose {
                ui::display_tool_call(name, input);
            }

            // A rejected call goes back to the model so it can correct itself.
            if let Err(message) = connection.catalog.validate(name, input) {
                if verbose {
                    ui::display_tool_error(name, &message);
                }
                result.raw_results.push(message.clone());
                tool_results.push(ToolResult {
                    tool_use_id: id.clone(),
                    content: message,
                    is_error: true,
                });
                continue;
            }

            let call = connection.session.call_tool(name, input).await?;
            let text = call.first_text();
            tracing::debug!(tool = %name, is_error = call.is_error(), bytes = text.len(), "tool call returned");

            if verbose {
                ui::display_tool_result(&text);
            }

            result.raw_results.push(text.clone());
            tool_results.push(ToolResult {
                tool_use_id: id.clone(),
                content: text,
                is_error: call.is_error(),
            });
        }

        Ok(tool_results)
    }

    /// Call any MCP tool directly and return the first text block of its result.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<String> {
        let connection = self.connection.as_mut().ok_or_else(Error::not_connected)?;

        connection
            .catalog
            .validate(name, &arguments)
            .map_err(Error::Query)?;

        let result: CallToolResult = connection
            .session
            .call_tool(name, &arguments)
            .await
            .map_err(|e| Error::Query(format!("Tool '{}' failed: {}", name, e)))?;

        if result.is_error() {
            return Err(Error::Query(format!(
                "Tool '{}' reported an error: {}",
                name,
                result.joined_text()
            )));
        }

        Ok(result.first_text())
    }

    /// Run an aggregation pipeline.
    pub async fn aggregate(
        &mut self,
        database: &str,
        collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<String> {
        self.call_tool(
            "aggregate",
            json!({
                "database": database,
                "collection": collection,
                "pipeline": pipeline,
            }),
        )
        .await
    }

    pub async fn find(
        &mut self,
        database: &str,
        collection: &str,
        options: FindOptions,
    ) -> Result<String> {
        let mut params = Map::new();
        params.insert("database".to_string(), json!(database));
        params.insert("collection".to_string(), json!(collection));
        params.insert("limit".to_string(), json!(options.limit));
        insert_if_present(&mut params, "filter", options.filter);
        insert_if_present(&mut params, "projection", options.projection);
        insert_if_present(&mut params, "sort", options.sort);

        self.call_tool("find", Value::Object(params)).await
    }

    /// Count documents, optionally restricted by `query`.
    pub async fn count(
        &mut self,
        database: &str,
        collection: &str,
        query: Option<Value>,
    ) -> Result<String> {
        let mut params = Map::new();
        params.insert("database".to_string(), json!(database));
        params.insert("collection".to_string(), json!(collection));
        insert_if_present(&mut params, "query", query);

        self.call_tool("count", Value::Object(params)).await
    }

    pub async fn list_databases(&mut self) -> Result<String> {
        self.call_tool("list-databases", json!({})).await
    }

    pub async fn list_collections(&mut self, database: &str) -> Result<String> {
        self.call_tool("list-collections", json!({ "database": database }))
            .await
    }

    /// Schema the server infers from a sample of the collection.
    pub async fn get_schema(&mut self, database: &str, collection: &str) -> Result<String> {
        self.call_tool(
            "collection-schema",
            json!({ "database": database, "collection": collection }),
        )
        .await
    }
}

/// Add `key` unless the value is absent, null or an empty document.
fn insert_if_present(params: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::Object(ref map)) if map.is_empty() => {}
        Some(value) => {
            params.insert(key.to_string(), value);
        }
    }
}
