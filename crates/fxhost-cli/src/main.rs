//! fxhost binary entry point.
//!
//! Parses arguments, builds the CLI context and dispatches to a handler.
//! Failures carrying a [`CliError`] exit with that error's code.

use clap::{CommandFactory, Parser};

use fxhost_cli::handlers;
use fxhost_cli::{Cli, CliError, Commands, bootstrap, init_tracing};

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        // Works on the raw file, no bootstrap
        Commands::Config { command } => handlers::config::execute(&cli.config, command),
        Commands::Run => handlers::run::execute(&bootstrap(&cli.config)?).await,
        Commands::Update => handlers::update::execute(&bootstrap(&cli.config)?).await,
        Commands::UpdateData => handlers::update::execute_data(&bootstrap(&cli.config)?).await,
        Commands::Args => handlers::args::execute(&bootstrap(&cli.config)?),
        Commands::Status => handlers::status::execute(&bootstrap(&cli.config)?).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}
