mod api;
mod defaults;
mod init;
mod server;
mod validation;

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ApiSettings, Provider};
use crate::cli::Args;
use crate::client::{ClientOptions, ServerOptions, CONNECTION_STRING_ENV, DEFAULT_MODEL};
use crate::error::{Error, Result};

pub use api::ApiConfig;
pub use defaults::DEFAULT_REQUEST_TIMEOUT_SECS;
pub use init::{example_config, init_config_file};
pub use server::ServerConfig;
pub use validation::{expand_env_var_in_string_with, expand_env_vars};

pub const DEFAULT_OPENAI_MODEL: &str = "anthropic/claude-sonnet-4";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<usize>,
}

/// Contents of a `.mdb-ai.yaml` / `config.json` file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Settings after merging CLI args, environment and config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    pub api_endpoint: Option<String>,
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub request_timeout: u64,
    pub verbose: bool,
    pub max_tool_rounds: Option<usize>,
    pub connection_string: Option<String>,
    pub server: ServerConfig,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file_config = FileConfig::load()?;
        Self::resolve(args, file_config, |name| env::var(name).ok())
    }

    /// Merge settings with precedence CLI args > environment > file > defaults.
    pub fn resolve<F>(args: &Args, file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match args.provider {
            Some(p) => p,
            None => match lookup("MDB_AI_PROVIDER") {
                Some(p) => p.parse()?,
                None => file.api.provider.unwrap_or_default(),
            },
        };

        // The key itself never comes from a file.
        let api_key_env = file
            .api
            .api_key_env
            .clone()
            .unwrap_or_else(|| provider.default_api_key_env().to_string());
        let api_key = lookup(&api_key_env)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("{} environment variable not set", api_key_env))
            })?;

        let api_endpoint = args
            .api_endpoint
            .clone()
            .or_else(|| lookup("MDB_AI_API_ENDPOINT"))
            .or(file.api.endpoint.clone());

        let model = args
            .model
            .clone()
            .or_else(|| lookup("MDB_AI_MODEL"))
            .or(file.model.default_model.clone())
            .unwrap_or_else(|| match provider {
                Provider::Anthropic => DEFAULT_MODEL.to_string(),
                Provider::Openai => DEFAULT_OPENAI_MODEL.to_string(),
            });

        let system_prompt = lookup("MDB_AI_SYSTEM_PROMPT").or(file.model.system_prompt.clone());

        let request_timeout = lookup("MDB_AI_REQUEST_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .or(file.api.request_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        // --quiet wins over everything; otherwise verbose is the default.
        let verbose = if args.quiet {
            false
        } else {
            lookup("MDB_AI_VERBOSE")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .or(file.session.verbose)
                .unwrap_or(true)
        };

        let max_tool_rounds = args.max_tool_rounds.or(file.session.max_tool_rounds);

        let connection_string = args
            .connection_string
            .clone()
            .or_else(|| lookup(CONNECTION_STRING_ENV))
            .or(file.connection_string.clone())
            .filter(|s| !s.is_empty());

        let mut server = file.server;
        server.env = expand_env_vars(&server.env, &lookup);
        if args.server_stderr {
            server.inherit_stderr = true;
        }

        Ok(Config {
            provider,
            api_key,
            api_endpoint,
            model,
            system_prompt,
            max_tokens: file.api.max_tokens,
            request_timeout,
            verbose,
            max_tool_rounds,
            connection_string,
            server,
        })
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            provider: self.provider,
            api_key: self.api_key.clone(),
            endpoint: self.api_endpoint.clone(),
            timeout: Duration::from_secs(self.request_timeout),
        }
    }

    /// Client options, failing when no connection string was found anywhere.
    pub fn client_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::new(self.connection_string.clone())?
            .with_model(&self.model)
            .with_verbose(self.verbose);

        if let Some(prompt) = &self.system_prompt {
            options.system_prompt = Some(prompt.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            options.max_tokens = max_tokens;
        }
        if let Some(rounds) = self.max_tool_rounds {
            options.max_tool_rounds = rounds;
        }
        if let Some(secs) = self.server.tool_timeout {
            options.request_timeout = Duration::from_secs(secs);
        }
        options.server = ServerOptions {
            command: self.server.command.clone(),
            args: self.server.args.clone(),
            env: self.server.env.clone(),
            inherit_stderr: self.server.inherit_stderr,
        };

        Ok(options)
    }
}

impl FileConfig {
    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Ok(Self::load_from(&path)?);
            }
        }
        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> AnyResult<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&contents).with_context(|| {
                format!("Failed to parse YAML config file: {}", path.display())
            })?
        } else {
            serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse JSON config file: {}", path.display())
            })?
        };

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".mdb-ai.yaml"),
            PathBuf::from(".mdb-ai.yml"),
            PathBuf::from(".mdb-ai.json"),
        ];

        if let Some(config_dir) = user_config_dir() {
            paths.push(config_dir.join("config.yaml"));
            paths.push(config_dir.join("config.yml"));
            paths.push(config_dir.join("config.json"));
        }

        paths
    }
}

pub fn user_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("mdb-ai"))
}
