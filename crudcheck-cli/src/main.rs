//! crudcheck -- CRUD scenario suite for appliance entities

use clap::Parser;
use colored::Colorize;
use tracing::info;

use crudcheck_cli::cli::{Cli, Commands};
use crudcheck_cli::commands;
use crudcheck_cli::error::CliError;
use crudcheck_cli::logging;
use crudcheck_cli::output::OutputWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 설정 파일이 잘못되어도 로깅은 기본값으로 올립니다.
    let mut general = commands::load_config(&cli.config)
        .await
        .map(|c| c.general)
        .unwrap_or_default();
    if let Some(level) = cli.log_level.clone() {
        general.log_level = level;
    }
    logging::init_tracing(&general)?;

    info!(config = %cli.config.display(), "crudcheck starting");

    if let Err(e) = dispatch(cli).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Run(args) => {
            let config = commands::load_config(&cli.config).await?;
            commands::run::execute(args, &config, &writer).await
        }
        Commands::List(args) => {
            let config = commands::load_config(&cli.config).await?;
            commands::list::execute(args, &config, &writer)
        }
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
