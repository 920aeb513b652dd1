use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::builder::{ConfigBuilder, ConfigSource};
use crate::config::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_OPENROUTER_BASE_URL};
use crate::config::environment::{apply_env_overrides, env_bool, env_parse, env_string};
use crate::config::types::LlmProvider;
use crate::config::{Config, check_max_attempts};
use crate::test_support::{EnvGuard, env_lock};

fn write_config_file(home: &TempDir, contents: &str) {
    let config_dir = home.path().join(".program-builder");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config"), contents).unwrap();
}

#[test]
fn load_from_env_only() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("OPENAI_API_KEY", Some("env-key")),
        ("PROGRAM_BUILDER_TIMEOUT_SECS", Some("45")),
        ("PROGRAM_BUILDER_MAX_TOKENS", Some("4096")),
        ("PROGRAM_BUILDER_MODEL", Some("env-model")),
        ("PROGRAM_BUILDER_DEADLINE_SECS", Some("0")),
        ("PROGRAM_BUILDER_STRUCTURED_OUTPUT", Some("false")),
        ("PROGRAM_BUILDER_PORT", Some("8080")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.llm.api_key, "env-key");
    assert_eq!(config.llm.timeout_secs, 45);
    assert_eq!(config.models.max_tokens, 4096);
    assert_eq!(config.models.generator, "env-model");
    assert_eq!(config.generation.deadline(), None);
    assert!(!config.generation.structured_output);
    assert!(config.generation.strict_schema);
    assert_eq!(config.generation.max_attempts, DEFAULT_MAX_ATTEMPTS);
    assert_eq!(config.server.port, 8080);
    assert!(config.validate().is_ok());
    assert_eq!(config.missing_secret(), None);
}

#[test]
fn load_prefers_env_over_file() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();
    write_config_file(
        &temp_home,
        r#"{
            "llm": { "api_key": "file-key", "timeout_secs": 20 },
            "models": { "generator": "file-model", "max_tokens": 1024 },
            "generation": { "max_attempts": 2, "deadline_secs": 90 },
            "server": { "access_token": "file-token" }
        }"#,
    );

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("OPENAI_API_KEY", Some("env-key")),
        ("PROGRAM_BUILDER_TIMEOUT_SECS", Some("40")),
        ("PROGRAM_BUILDER_MODEL", Some("env-model")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.llm.api_key, "env-key");
    assert_eq!(config.llm.timeout_secs, 40);
    assert_eq!(config.models.max_tokens, 1024);
    assert_eq!(config.models.generator, "env-model");
    assert_eq!(config.generation.max_attempts, 2);
    assert_eq!(config.generation.deadline(), Some(Duration::from_secs(90)));
    assert_eq!(config.server.access_token.as_deref(), Some("file-token"));
}

#[test]
fn load_tolerates_missing_key_but_validate_reports_it() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let config = Config::load().unwrap();
    assert_eq!(config.missing_secret().as_deref(), Some("OPENAI_API_KEY not set"));

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("OpenAI API key not found"));
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn load_supports_openrouter_provider() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("PROGRAM_BUILDER_PROVIDER", Some("openrouter")),
        ("OPENAI_API_KEY", Some("ignored")),
        ("OPENROUTER_API_KEY", Some("or-key")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.llm.provider, LlmProvider::OpenRouter);
    assert_eq!(config.llm.api_key, "or-key");
    assert_eq!(config.llm.base_url, DEFAULT_OPENROUTER_BASE_URL);
}

#[test]
fn load_rejects_out_of_range_attempts() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("PROGRAM_BUILDER_MAX_ATTEMPTS", Some("9")),
    ]);

    let err = Config::load().unwrap_err();
    assert!(err.to_string().contains("max_attempts must be between 1 and 5"));
}

#[test]
fn load_rejects_unknown_provider_in_file() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();
    write_config_file(&temp_home, r#"{ "llm": { "provider": "mystery" } }"#);

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let err = Config::load().unwrap_err();
    assert!(format!("{err:#}").contains("Unknown LLM provider 'mystery'"));
}

#[test]
fn blank_access_token_is_treated_as_unset() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("PROGRAM_BUILDER_ACCESS_TOKEN", Some("  ")),
    ]);

    let config = Config::load().unwrap();
    assert_eq!(config.server.access_token, None);
}

#[test]
fn load_records_each_layer_in_order() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();
    write_config_file(&temp_home, r#"{ "generation": { "max_attempts": 4 } }"#);

    let _env = EnvGuard::new(&[("HOME", Some(home.as_str()))]);

    let path = Config::config_path().unwrap();
    let builder = Config::apply_file(Config::builder(), &path).unwrap();
    let builder = apply_env_overrides(builder).unwrap();
    assert_eq!(
        builder.sources(),
        &[
            ConfigSource::Defaults,
            ConfigSource::File(path.clone()),
            ConfigSource::Environment,
        ]
    );
    assert_eq!(builder.build().unwrap().generation.max_attempts, 4);
}

#[test]
fn later_layers_override_earlier_ones() {
    let config = ConfigBuilder::new()
        .layer(ConfigSource::File(PathBuf::from("a")), |config| {
            config.models.generator = "from-file".to_string();
            config.server.port = 9000;
        })
        .layer(ConfigSource::Environment, |config| {
            config.models.generator = "from-env".to_string();
        })
        .build()
        .unwrap();

    assert_eq!(config.models.generator, "from-env");
    assert_eq!(config.server.port, 9000);
}

#[test]
fn build_rejects_invalid_settings() {
    let err = ConfigBuilder::new()
        .layer(ConfigSource::Environment, |config| {
            config.generation.max_attempts = 0;
        })
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("max_attempts must be between 1 and 5"));

    let err = ConfigBuilder::new()
        .layer(ConfigSource::Environment, |config| config.llm.base_url.clear())
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("base URL"));
}

#[test]
fn switching_provider_resets_base_url_only_on_change() {
    let mut config = Config::default();
    config.llm.base_url = "http://proxy.local/v1".to_string();

    config.llm.switch_provider(LlmProvider::OpenAi);
    assert_eq!(config.llm.base_url, "http://proxy.local/v1");

    config.llm.switch_provider(LlmProvider::OpenRouter);
    assert_eq!(config.llm.base_url, DEFAULT_OPENROUTER_BASE_URL);
}

#[test]
fn max_attempts_bounds_are_inclusive() {
    assert!(check_max_attempts(1).is_ok());
    assert!(check_max_attempts(5).is_ok());
    assert!(check_max_attempts(0).is_err());
    assert!(check_max_attempts(6).is_err());
}

#[test]
fn malformed_env_value_fails_the_load() {
    let _lock = env_lock();
    let temp_home = TempDir::new().unwrap();
    let home = temp_home.path().to_str().unwrap().to_string();

    let _env = EnvGuard::new(&[
        ("HOME", Some(home.as_str())),
        ("PROGRAM_BUILDER_PORT", Some("eighty")),
    ]);

    let err = Config::load().unwrap_err();
    assert!(format!("{err:#}").contains("PROGRAM_BUILDER_PORT"));
}

#[test]
fn test_env_string() {
    let _lock = env_lock();
    let _env = EnvGuard::new(&[("PB_TEST_VAR", Some("test_value"))]);

    assert_eq!(env_string("PB_TEST_VAR").unwrap(), Some("test_value".to_string()));
    assert_eq!(env_string("PB_NONEXISTENT_VAR").unwrap(), None);
}

#[test]
fn test_env_parse() {
    let _lock = env_lock();
    let _env = EnvGuard::new(&[("PB_TEST_U64", Some("123")), ("PB_TEST_BAD", Some("abc"))]);

    assert_eq!(env_parse::<u64>("PB_TEST_U64").unwrap(), Some(123));
    assert_eq!(env_parse::<u32>("PB_NONEXISTENT_VAR").unwrap(), None);
    assert!(env_parse::<u16>("PB_TEST_BAD").is_err());
}

#[test]
fn test_env_bool() {
    let _lock = env_lock();
    let _env = EnvGuard::new(&[
        ("PB_TEST_ON", Some("yes")),
        ("PB_TEST_OFF", Some("0")),
        ("PB_TEST_BAD", Some("maybe")),
    ]);

    assert_eq!(env_bool("PB_TEST_ON").unwrap(), Some(true));
    assert_eq!(env_bool("PB_TEST_OFF").unwrap(), Some(false));
    assert!(env_bool("PB_TEST_BAD").is_err());
}
