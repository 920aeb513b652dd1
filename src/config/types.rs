use anyhow::anyhow;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENROUTER_BASE_URL};

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub models: ModelSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub timeout_secs: u64,
    pub base_url: String,
    pub user_agent: String,
}

impl LlmSettings {
    /// Selects `provider`; a change also resets the base URL to its default.
    pub fn switch_provider(&mut self, provider: LlmProvider) {
        if self.provider != provider {
            self.provider = provider;
            self.base_url = provider.default_base_url().to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    OpenAi,
    OpenRouter,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(LlmProvider::OpenAi),
            "openrouter" => Ok(LlmProvider::OpenRouter),
            other => Err(anyhow!("Unknown LLM provider '{other}'")),
        }
    }
}

impl LlmProvider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => DEFAULT_OPENAI_BASE_URL,
            LlmProvider::OpenRouter => DEFAULT_OPENROUTER_BASE_URL,
        }
    }

    pub fn api_key_env_var(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OpenAI",
            LlmProvider::OpenRouter => "OpenRouter",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub generator: String,
    /// Upper bound on completion tokens per attempt.
    pub max_tokens: u32,
    pub context_window: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub max_attempts: u32,
    /// Overall time budget for one request's attempts; 0 disables it.
    pub deadline_secs: u64,
    /// Ask the provider to enforce the declared schema while decoding.
    pub structured_output: bool,
    /// Reject keys the program contract does not declare.
    pub strict_schema: bool,
}

impl GenerationSettings {
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs))
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    /// Shared secret callers must present as a bearer token, when set.
    pub access_token: Option<String>,
}

// File configuration types
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FileConfig {
    pub llm: FileLlmSettings,
    pub models: FileModelSettings,
    pub generation: FileGenerationSettings,
    pub server: FileServerSettings,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FileLlmSettings {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FileModelSettings {
    pub generator: Option<String>,
    pub max_tokens: Option<u32>,
    pub context_window: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FileGenerationSettings {
    pub max_attempts: Option<u32>,
    pub deadline_secs: Option<u64>,
    pub structured_output: Option<bool>,
    pub strict_schema: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct FileServerSettings {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub access_token: Option<String>,
}
