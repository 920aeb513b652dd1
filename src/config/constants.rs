pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_GENERATOR_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// One initial attempt plus two corrective retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const MAX_ATTEMPTS_LIMIT: u32 = 5;
pub const DEFAULT_DEADLINE_SECS: u64 = 150;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
