use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub fn example_config() -> &'static str {
    r#"# mdb-ai configuration
#
# Precedence: command line > environment variables > this file > defaults.
# API keys are only read from the environment (ANTHROPIC_API_KEY or
# OPENAI_API_KEY, or the variable named by api.api_key_env).

# connection_string: mongodb://localhost:27017

api:
  provider: anthropic
  # endpoint: https://api.anthropic.com
  # api_key_env: ANTHROPIC_API_KEY
  request_timeout: 120
  max_tokens: 4096

model:
  default_model: claude-sonnet-4-20250514
  # system_prompt: You are a MongoDB expert assistant.

server:
  command: npx
  args: ["-y", "mongodb-mcp-server"]
  # Extra variables for the server; ${VAR} is expanded from the environment.
  env:
    MDB_MCP_READ_ONLY: "true"
  # tool_timeout: 120

session:
  verbose: true
  max_tool_rounds: 25
"#
}

/// Write the example config to `dir/config.yaml`. Refuses to overwrite.
pub fn init_config_file(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("config.yaml");
    if path.exists() {
        return Err(Error::Config(format!(
            "Config file already exists: {}",
            path.display()
        )));
    }

    fs::create_dir_all(dir)?;
    fs::write(&path, example_config())?;
    Ok(path)
}
