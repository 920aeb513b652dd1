use anyhow::{Context, Result};
use dirs::home_dir;
use std::{fs, path::Path};

use super::builder::{ConfigBuilder, ConfigSource};
use super::environment::apply_env_overrides;
use super::types::{FileConfig, LlmProvider};
use super::validation::{validate_credentials, validate_settings};
use super::Config;

impl Config {
    pub fn config_path() -> Result<std::path::PathBuf> {
        let mut path = home_dir().context("Could not determine home directory")?;
        path.push(".program-builder/config");
        Ok(path)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Defaults, then the config file (if present), then environment variables.
    ///
    /// The API key is not required here; callers decide whether a missing
    /// credential is fatal (see [`Config::validate`]).
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut builder = Self::builder();

        if path.exists() {
            builder = Self::apply_file(builder, &path)?;
        }

        apply_env_overrides(builder)?.build()
    }

    /// Full validation, including the model provider credential.
    pub fn validate(&self) -> Result<()> {
        validate_settings(self)?;
        validate_credentials(self)
    }

    /// Message describing the missing credential, if there is one.
    pub fn missing_secret(&self) -> Option<String> {
        if self.llm.api_key.trim().is_empty() {
            Some(format!("{} not set", self.llm.provider.api_key_env_var()))
        } else {
            None
        }
    }

    pub(super) fn apply_file(builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config at {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(builder);
        }

        let file: FileConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing JSON config at {}", path.display()))?;

        file.apply(builder, path)
    }
}

impl FileConfig {
    pub fn apply(self, builder: ConfigBuilder, path: &Path) -> Result<ConfigBuilder> {
        let provider = self
            .llm
            .provider
            .as_deref()
            .map(str::parse::<LlmProvider>)
            .transpose()
            .context("Invalid llm.provider in config file")?;

        let FileConfig {
            llm,
            models,
            generation,
            server,
        } = self;

        Ok(builder.layer(ConfigSource::File(path.to_path_buf()), |config| {
            if let Some(provider) = provider {
                config.llm.switch_provider(provider);
            }
            let settings = &mut config.llm;
            if let Some(api_key) = llm.api_key {
                settings.api_key = api_key;
            }
            if let Some(timeout) = llm.timeout_secs {
                settings.timeout_secs = timeout;
            }
            if let Some(base_url) = llm.base_url {
                settings.base_url = base_url;
            }
            if let Some(user_agent) = llm.user_agent {
                settings.user_agent = user_agent;
            }

            let settings = &mut config.models;
            if let Some(generator) = models.generator {
                settings.generator = generator;
            }
            if let Some(max_tokens) = models.max_tokens {
                settings.max_tokens = max_tokens;
            }
            if let Some(context_window) = models.context_window {
                settings.context_window = context_window;
            }
            if let Some(temperature) = models.temperature {
                settings.temperature = temperature;
            }

            let settings = &mut config.generation;
            if let Some(max_attempts) = generation.max_attempts {
                settings.max_attempts = max_attempts;
            }
            if let Some(deadline) = generation.deadline_secs {
                settings.deadline_secs = deadline;
            }
            if let Some(enabled) = generation.structured_output {
                settings.structured_output = enabled;
            }
            if let Some(enabled) = generation.strict_schema {
                settings.strict_schema = enabled;
            }

            let settings = &mut config.server;
            if let Some(bind) = server.bind {
                settings.bind = bind;
            }
            if let Some(port) = server.port {
                settings.port = port;
            }
            if let Some(token) = server.access_token {
                settings.access_token = Some(token);
            }
        }))
    }
}
