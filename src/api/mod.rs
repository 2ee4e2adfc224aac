pub mod anthropic;
pub mod client;
pub mod models;
pub mod openai;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub use anthropic::AnthropicClient;
pub use models::{
    ChatMessage, Completion, CompletionRequest, ContentBlock, LanguageModel, StopReason, ToolResult,
    ToolSpec,
};
pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    /// OpenAI-compatible chat completions.
    Openai,
}

impl Provider {
    pub fn default_api_key_env(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Openai => "OPENAI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Openai => write!(f, "openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" | "openrouter" => Ok(Provider::Openai),
            other => Err(Error::Config(format!(
                "Unknown provider '{}' (expected anthropic or openai)",
                other
            ))),
        }
    }
}

/// Everything needed to build a [`LanguageModel`] client.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub provider: Provider,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

pub fn build_model(settings: &ApiSettings) -> Result<Box<dyn LanguageModel>> {
    let endpoint = settings.endpoint.as_deref();
    Ok(match settings.provider {
        Provider::Anthropic => Box::new(AnthropicClient::new(
            &settings.api_key,
            endpoint,
            settings.timeout,
        )?),
        Provider::Openai => Box::new(OpenAiClient::new(
            &settings.api_key,
            endpoint,
            settings.timeout,
        )?),
    })
}
