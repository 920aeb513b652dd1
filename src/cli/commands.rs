use anyhow::Result;

use crate::config::Config;
use crate::server;

use super::args::{Cli, Command, ServeArgs};
use super::{check, generate};

/// Settings are loaded only by the commands that use them, so `schema` and
/// `check` work offline with a broken config.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve(args) => run_serve(args, Config::load()?).await,
        Command::Generate(args) => generate::handle_generate(args, Config::load()?).await,
        Command::Schema => check::print_schema(),
        Command::Check(args) => check::handle_check(args),
    }
}

async fn run_serve(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    server::run_serve(&config).await
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::cli::args::{CheckArgs, GenerateArgs};
    use crate::test_support::{EnvGuard, env_lock, sample_program_json};

    fn broken_config_env(home: &TempDir) -> EnvGuard {
        EnvGuard::new(&[
            ("HOME", home.path().to_str()),
            ("PROGRAM_BUILDER_MAX_ATTEMPTS", Some("9")),
        ])
    }

    fn cli(command: Command) -> Cli {
        Cli {
            command,
            verbose: false,
        }
    }

    #[tokio::test]
    async fn offline_commands_ignore_a_broken_config() {
        let _lock = env_lock();
        let home = TempDir::new().unwrap();
        let _env = broken_config_env(&home);
        assert!(Config::load().is_err());

        let candidate = home.path().join("program.json");
        std::fs::write(&candidate, sample_program_json(3).to_string()).unwrap();

        assert!(run(cli(Command::Schema)).await.is_ok());
        let check = Command::Check(CheckArgs {
            input: candidate,
            loose: false,
            days: Some(3),
        });
        assert!(run(cli(check)).await.is_ok());
    }

    #[tokio::test]
    async fn generate_surfaces_the_config_error() {
        let _lock = env_lock();
        let home = TempDir::new().unwrap();
        let _env = broken_config_env(&home);

        let generate = Command::Generate(GenerateArgs {
            input: PathBuf::from("-"),
            json: true,
            max_attempts: None,
        });
        let err = run(cli(generate)).await.unwrap_err();
        assert!(err.to_string().contains("max_attempts must be between 1 and 5"));
    }
}
