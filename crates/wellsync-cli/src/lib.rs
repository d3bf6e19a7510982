//! Command-line front end for the wellsync engine
//!
//! This crate provides the `wellsync` binary: a local ICS calendar store,
//! optional Google Calendar sync, and persisted sync settings.

pub mod callback;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;
pub mod settings;

pub use cli::Cli;
pub use error::{CliError, CliResult};
