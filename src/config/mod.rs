//! Configuration for the program-builder service.
//!
//! Settings are layered:
//! - built-in defaults
//! - an optional JSON file at `~/.program-builder/config`
//! - environment variable overrides (`OPENAI_API_KEY`, `PROGRAM_BUILDER_*`)
//!
//! Assembled once at startup and passed explicitly to the components that
//! need it.

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use types::{Config, GenerationSettings, LlmSettings, ModelSettings};
pub use validation::check_max_attempts;

#[cfg(test)]
mod tests;
