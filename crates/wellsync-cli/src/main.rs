//! wellsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use wellsync_core::{LogConfig, init_tracing};

use wellsync_cli::cli::{Cli, Command, ConfigAction, EventAction};
use wellsync_cli::commands;
use wellsync_cli::config::CliConfig;
use wellsync_cli::error::{CliError, CliResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => CliConfig::load_from(path).map_err(CliError::Config)?,
        None => CliConfig::load().map_err(CliError::Config)?,
    };

    let log_config = if cli.debug || config.debug {
        LogConfig::verbose()
    } else {
        LogConfig::cli()
    };
    if let Err(e) = init_tracing(log_config) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Command::Sync { google, json } => commands::sync::sync(&config, google, json).await,
        Command::Status { json } => commands::sync::status(&config, json).await,
        Command::Enable => commands::sync::enable(&config).await,
        Command::Disable => commands::sync::disable(&config),
        Command::Event { action } => match action {
            EventAction::Create {
                calendar,
                title,
                start,
                end,
                description,
                location,
                all_day,
            } => {
                let event = commands::events::NewEvent {
                    calendar,
                    title,
                    start,
                    end,
                    description,
                    location,
                    all_day,
                };
                commands::events::create(&config, event).await
            }
            EventAction::Update {
                id,
                title,
                description,
                start,
                end,
                location,
            } => {
                let times = start.zip(end);
                let patch = commands::events::build_patch(title, description, times, location);
                commands::events::update(&config, &id, patch).await
            }
            EventAction::Delete { id } => commands::events::delete(&config, &id).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config),
        },
    }
}
