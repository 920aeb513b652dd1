//! Console logging via `tracing-subscriber`.
//!
//! Output goes to stderr so `generate --json` and `schema` keep stdout
//! clean for piping. `RUST_LOG` wins when set; otherwise the level is
//! `info`, or `debug` for this crate with `--verbose`.

use tracing_subscriber::EnvFilter;

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info,program_builder=debug"
    } else {
        "info"
    }
}

pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level_only() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).contains("program_builder=debug"));
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }
}
