use anyhow::{Result, anyhow, bail};

use super::constants::MAX_ATTEMPTS_LIMIT;
use super::types::Config;

pub fn validate_settings(config: &Config) -> Result<()> {
    if config.llm.base_url.trim().is_empty() {
        bail!("LLM base URL cannot be empty");
    }

    check_max_attempts(config.generation.max_attempts)?;

    if config.models.max_tokens == 0 {
        bail!("max_tokens must be greater than zero");
    }

    Ok(())
}

pub fn check_max_attempts(attempts: u32) -> Result<()> {
    if attempts == 0 || attempts > MAX_ATTEMPTS_LIMIT {
        bail!("max_attempts must be between 1 and {MAX_ATTEMPTS_LIMIT}, got {attempts}");
    }
    Ok(())
}

pub fn validate_credentials(config: &Config) -> Result<()> {
    if config.llm.api_key.trim().is_empty() {
        let provider = config.llm.provider;
        let env_var = provider.api_key_env_var();
        Err(anyhow!(
            "{} API key not found. Set {} or add it to {}",
            provider.display_name(),
            env_var,
            Config::config_path()?.display()
        ))
    } else {
        Ok(())
    }
}
