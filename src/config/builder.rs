use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use super::types::Config;
use super::validation::validate_settings;

/// Origin of one layer of settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    Environment,
}

/// Folds layers of settings over the defaults; a later layer wins.
#[derive(Debug)]
pub struct ConfigBuilder {
    config: Config,
    sources: Vec<ConfigSource>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            sources: vec![ConfigSource::Defaults],
        }
    }

    pub fn layer<F>(mut self, source: ConfigSource, apply: F) -> Self
    where
        F: FnOnce(&mut Config),
    {
        apply(&mut self.config);
        self.sources.push(source);
        self
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Checks the merged settings. The credential is checked separately by
    /// [`Config::validate`].
    pub fn build(self) -> Result<Config> {
        validate_settings(&self.config)?;
        debug!(sources = ?self.sources(), "configuration assembled");
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
