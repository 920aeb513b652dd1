mod args;
mod check;
mod commands;
mod generate;
mod util;

pub use args::Cli;
