use clap::Parser;

use crate::api::Provider;
use crate::demos::Example;

#[derive(Parser, Debug, Default)]
#[command(name = "mdb-ai")]
#[command(about = "Natural language queries for MongoDB through the MongoDB MCP server")]
#[command(after_help = "Examples:
  mdb-ai
      Start the interactive query shell

  mdb-ai \"How many movies are in sample_mflix?\"
      Run a single query

  mdb-ai --quiet \"Count all users\"
      Run a query with minimal output

  mdb-ai --example basic
      Run the basic example")]
pub struct Args {
    #[arg(short = 'q', long = "quiet", help = "Minimal output (only show final response)")]
    pub quiet: bool,

    #[arg(short = 'e', long = "example", value_enum, help = "Run an example script")]
    pub example: Option<Example>,

    #[arg(long = "model", help = "Language model to use")]
    pub model: Option<String>,

    #[arg(long = "provider", value_enum, help = "Language model API dialect")]
    pub provider: Option<Provider>,

    #[arg(
        long = "api-endpoint",
        help = "Custom API base URL (e.g., http://localhost:11434/v1)"
    )]
    pub api_endpoint: Option<String>,

    #[arg(
        long = "connection-string",
        help = "MongoDB connection string (defaults to MDB_MCP_CONNECTION_STRING)"
    )]
    pub connection_string: Option<String>,

    #[arg(
        long = "max-tool-rounds",
        help = "Maximum model/tool round trips per query"
    )]
    pub max_tool_rounds: Option<usize>,

    #[arg(long = "server-stderr", help = "Show the MCP server's stderr output")]
    pub server_stderr: bool,

    #[arg(long = "config-init", help = "Write an example config file and exit")]
    pub config_init: bool,

    #[arg(help = "Query to execute (starts interactive mode if not provided)")]
    pub query: Vec<String>,
}

impl Args {
    pub fn query_text(&self) -> Option<String> {
        let text = self.query.join(" ");
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
