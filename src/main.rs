mod cli;
mod client;
mod config;
mod contract;
mod diagnostic;
mod generator;
mod logging;
mod prompt;
mod repair;
mod server;
mod tokens;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);
    cli.run().await
}
