use super::constants::*;
use super::types::{Config, GenerationSettings, LlmProvider, LlmSettings, ModelSettings, ServerSettings};

pub fn default_user_agent() -> String {
    format!("program-builder/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            models: ModelSettings::default(),
            generation: GenerationSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        let provider = LlmProvider::OpenAi;
        Self {
            provider,
            api_key: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: provider.default_base_url().to_string(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            generator: DEFAULT_GENERATOR_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            context_window: DEFAULT_CONTEXT_WINDOW,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            structured_output: true,
            strict_schema: true,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            access_token: None,
        }
    }
}
