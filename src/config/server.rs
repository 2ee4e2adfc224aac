use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::defaults::{
    default_inherit_stderr, default_server_args, default_server_command,
    is_default_inherit_stderr,
};

/// How the MongoDB MCP server is launched.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_command")]
    pub command: String,
    #[serde(default = "default_server_args")]
    pub args: Vec<String>,
    /// Extra variables for the server process (with ${VAR} expansion).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_timeout: Option<u64>,
    #[serde(
        default = "default_inherit_stderr",
        skip_serializing_if = "is_default_inherit_stderr"
    )]
    pub inherit_stderr: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: default_server_command(),
            args: default_server_args(),
            env: HashMap::new(),
            tool_timeout: None,
            inherit_stderr: default_inherit_stderr(),
        }
    }
}
