pub mod client;
pub mod tools;
pub mod transport;
pub mod types;

pub use client::{McpSession, DEFAULT_REQUEST_TIMEOUT, MCP_PROTOCOL_VERSION};
pub use tools::ToolCatalog;
pub use transport::{LineTransport, ServerLaunch, StdioTransport, Transport};
pub use types::{CallToolResult, ClientInfo, McpTool, ServerInfo, ToolContent};
