//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

/// wellsync - keep your wellness calendar in sync
#[derive(Debug, Parser)]
#[command(name = "wellsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "WELLSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a sync pass and print the merged events
    Sync {
        /// Authorize Google Calendar first and include it in the pass
        #[arg(long)]
        google: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show sync status
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Turn sync on (runs a pass immediately)
    Enable,

    /// Turn sync off
    Disable,

    /// Create, update or delete managed events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Managed event actions.
#[derive(Debug, Subcommand)]
pub enum EventAction {
    /// Create a managed event
    Create {
        /// Calendar to create the event in
        #[arg(long)]
        calendar: String,

        /// Event title
        #[arg(long)]
        title: String,

        /// Start time (RFC 3339, e.g. 2024-01-01T07:00:00Z)
        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,

        /// End time (RFC 3339)
        #[arg(long, value_parser = parse_datetime)]
        end: DateTime<Utc>,

        /// Event description
        #[arg(long)]
        description: Option<String>,

        /// Event location
        #[arg(long)]
        location: Option<String>,

        /// Treat start and end as dates
        #[arg(long)]
        all_day: bool,
    },

    /// Update a managed event
    Update {
        /// Event id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_parser = parse_datetime, requires = "end")]
        start: Option<DateTime<Utc>>,

        #[arg(long, value_parser = parse_datetime, requires = "start")]
        end: Option<DateTime<Utc>>,

        #[arg(long)]
        location: Option<String>,
    },

    /// Delete an event
    Delete {
        /// Event id
        id: String,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file and data paths
    Path,
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from(["wellsync", "sync", "--google", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Sync {
                google: true,
                json: true
            }
        ));
    }

    #[test]
    fn parses_event_create() {
        let cli = Cli::try_parse_from([
            "wellsync",
            "event",
            "create",
            "--calendar",
            "personal",
            "--title",
            "Morning Run",
            "--start",
            "2024-01-01T08:00:00+01:00",
            "--end",
            "2024-01-01T09:00:00+01:00",
        ])
        .unwrap();

        let Command::Event {
            action: EventAction::Create { start, title, .. },
        } = cli.command
        else {
            panic!("expected event create");
        };
        assert_eq!(title, "Morning Run");
        assert_eq!(start, "2024-01-01T07:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn update_times_come_in_pairs() {
        let result = Cli::try_parse_from([
            "wellsync",
            "event",
            "update",
            "evt-1",
            "--start",
            "2024-01-01T08:00:00Z",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_timestamp() {
        assert!(parse_datetime("tomorrow").is_err());
    }
}
