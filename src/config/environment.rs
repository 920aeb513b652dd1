use anyhow::{Context, Result, anyhow};
use std::env;
use std::str::FromStr;

use super::builder::{ConfigBuilder, ConfigSource};
use super::types::{Config, LlmProvider};

/// Settings taken from `OPENAI_API_KEY`, `OPENROUTER_API_KEY` and the
/// `PROGRAM_BUILDER_*` variables. Parsed up front so a malformed value
/// fails the load instead of being skipped.
#[derive(Debug, Default)]
struct EnvOverrides {
    provider: Option<LlmProvider>,
    base_url: Option<String>,
    api_keys: Vec<(LlmProvider, String)>,
    timeout_secs: Option<u64>,
    model: Option<String>,
    max_tokens: Option<u32>,
    max_attempts: Option<u32>,
    deadline_secs: Option<u64>,
    structured_output: Option<bool>,
    strict_schema: Option<bool>,
    bind: Option<String>,
    port: Option<u16>,
    /// `Some(None)` when the variable is set but blank.
    access_token: Option<Option<String>>,
}

impl EnvOverrides {
    fn from_env() -> Result<Self> {
        let provider = env_string("PROGRAM_BUILDER_PROVIDER")?
            .map(|raw| {
                raw.parse::<LlmProvider>()
                    .with_context(|| format!("Failed to parse PROGRAM_BUILDER_PROVIDER value '{raw}'"))
            })
            .transpose()?;

        let mut api_keys = Vec::new();
        for provider in [LlmProvider::OpenAi, LlmProvider::OpenRouter] {
            if let Some(key) = env_string(provider.api_key_env_var())? {
                api_keys.push((provider, key));
            }
        }

        Ok(Self {
            provider,
            base_url: env_string("PROGRAM_BUILDER_BASE_URL")?,
            api_keys,
            timeout_secs: env_parse("PROGRAM_BUILDER_TIMEOUT_SECS")?,
            model: env_string("PROGRAM_BUILDER_MODEL")?,
            max_tokens: env_parse("PROGRAM_BUILDER_MAX_TOKENS")?,
            max_attempts: env_parse("PROGRAM_BUILDER_MAX_ATTEMPTS")?,
            deadline_secs: env_parse("PROGRAM_BUILDER_DEADLINE_SECS")?,
            structured_output: env_bool("PROGRAM_BUILDER_STRUCTURED_OUTPUT")?,
            strict_schema: env_bool("PROGRAM_BUILDER_STRICT_SCHEMA")?,
            bind: env_string("PROGRAM_BUILDER_BIND")?,
            port: env_parse("PROGRAM_BUILDER_PORT")?,
            access_token: env_string("PROGRAM_BUILDER_ACCESS_TOKEN")?
                .map(|token| (!token.trim().is_empty()).then_some(token)),
        })
    }

    fn apply(self, config: &mut Config) {
        if let Some(provider) = self.provider {
            config.llm.switch_provider(provider);
        }
        if let Some(base_url) = self.base_url {
            config.llm.base_url = base_url;
        }
        // Only the key belonging to the active provider is used.
        let active = config.llm.provider;
        if let Some((_, key)) = self.api_keys.into_iter().find(|(provider, _)| *provider == active) {
            config.llm.api_key = key;
        }
        if let Some(timeout) = self.timeout_secs {
            config.llm.timeout_secs = timeout;
        }

        if let Some(model) = self.model {
            config.models.generator = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.models.max_tokens = max_tokens;
        }

        if let Some(attempts) = self.max_attempts {
            config.generation.max_attempts = attempts;
        }
        if let Some(deadline) = self.deadline_secs {
            config.generation.deadline_secs = deadline;
        }
        if let Some(enabled) = self.structured_output {
            config.generation.structured_output = enabled;
        }
        if let Some(enabled) = self.strict_schema {
            config.generation.strict_schema = enabled;
        }

        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(token) = self.access_token {
            config.server.access_token = token;
        }
    }
}

pub fn apply_env_overrides(builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let overrides = EnvOverrides::from_env()?;
    Ok(builder.layer(ConfigSource::Environment, |config| overrides.apply(config)))
}

pub fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(anyhow!("{key} contains invalid UTF-8")),
    }
}

pub fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_string(key)? {
        Some(value) => {
            let parsed = value
                .trim()
                .parse::<T>()
                .with_context(|| format!("Failed to parse {key} value '{value}'"))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

pub fn env_bool(key: &str) -> Result<Option<bool>> {
    match env_string(key)? {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(anyhow!("Failed to parse {key} value '{other}' as a boolean")),
        },
        None => Ok(None),
    }
}
