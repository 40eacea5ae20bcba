//! Binary entry point: argument parsing, logging setup, command dispatch,
//! and exit-code mapping.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jsv::cli::{Cli, Command};
use jsv::error::ProgramError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{error}");
            error.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32, ProgramError> {
    match cli.command {
        Command::Validate(args) => jsv::commands::validate::run(args).await,
        Command::Compile(args) => jsv::commands::compile::run(args).await,
        Command::Test(args) => jsv::commands::test::run(args).await,
    }
}
