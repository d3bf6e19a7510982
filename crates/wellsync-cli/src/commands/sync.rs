//! Sync, status and enable/disable commands.

use tracing::{info, warn};
use wellsync_core::EventRecord;
use wellsync_engine::{SyncEngine, SyncReport, SyncState};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::settings::save_enabled;

/// Runs a pass and prints the merged events.
pub async fn sync(config: &CliConfig, google: bool, json: bool) -> CliResult<()> {
    let engine = super::build_engine(config, google)?;

    if google {
        authorize(&engine, config).await?;
    }

    let report = engine.synchronize().await?;
    save_enabled(&super::settings_store(config), report.status.enabled)?;
    print_report(&report, json)
}

/// Turns sync on and runs the first pass.
pub async fn enable(config: &CliConfig) -> CliResult<()> {
    let engine = super::build_engine(config, false)?;
    let report = match engine.enable(true).await {
        Some(result) => result?,
        None => engine.synchronize().await?,
    };
    save_enabled(&super::settings_store(config), true)?;
    println!(
        "Sync enabled: {} event(s) from {} calendar(s).",
        report.events.len(),
        report.status.connected_calendar_ids.len()
    );
    Ok(())
}

/// Turns sync off. Calendar data is left untouched.
pub fn disable(config: &CliConfig) -> CliResult<()> {
    save_enabled(&super::settings_store(config), false)?;
    println!("Sync disabled.");
    Ok(())
}

/// Prints the sync status, restoring the persisted flag first.
pub async fn status(config: &CliConfig, json: bool) -> CliResult<()> {
    let engine = super::build_engine(config, false)?;
    let store = super::settings_store(config);
    if let Some(Err(e)) = super::restore(&engine, &store).await? {
        warn!(error = %e, "restoring sync failed");
        eprintln!("warning: {}", e);
    }

    let status = engine.status();
    if json {
        let output = serde_json::to_string_pretty(&status)
            .map_err(|e| CliError::Config(format!("failed to serialize status: {}", e)))?;
        println!("{}", output);
    } else {
        print!("{}", format_status(&status));
    }
    Ok(())
}

#[cfg(feature = "google")]
async fn authorize(engine: &SyncEngine, config: &CliConfig) -> CliResult<()> {
    use crate::callback::{CALLBACK_TIMEOUT, CallbackReceiver};

    let port = config
        .google
        .as_ref()
        .map(|google| google.redirect_port)
        .unwrap_or_default();
    let receiver = CallbackReceiver::bind(port).await?;
    let pending = engine.begin_authorization()?;

    println!("Opening your browser to authorize Google Calendar...");
    if let Err(e) = open::that(pending.url.as_str()) {
        warn!(error = %e, "failed to open browser");
        println!("Open this URL to continue:");
        println!();
        println!("  {}", pending.url);
        println!();
    }

    let params = receiver.wait(CALLBACK_TIMEOUT).await?;
    engine
        .complete_authorization(&params.code, &params.state)
        .await?;
    info!("Google Calendar connected");
    println!("Google Calendar connected.");
    Ok(())
}

#[cfg(not(feature = "google"))]
async fn authorize(_engine: &SyncEngine, _config: &CliConfig) -> CliResult<()> {
    Err(CliError::Config(
        "this build has no Google Calendar support".to_string(),
    ))
}

fn print_report(report: &SyncReport, json: bool) -> CliResult<()> {
    if json {
        let output = serde_json::json!({
            "events": report.events,
            "status": report.status,
        });
        let output = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::Config(format!("failed to serialize report: {}", e)))?;
        println!("{}", output);
        return Ok(());
    }

    if report.events.is_empty() {
        println!("No events in the sync window.");
    }
    for event in &report.events {
        println!("{}", format_event_line(event));
    }
    for error in &report.status.errors {
        eprintln!("warning: {}", error);
    }
    Ok(())
}

/// Formats one event for terminal output.
pub fn format_event_line(event: &EventRecord) -> String {
    let when = if event.is_all_day() {
        format!("{} (all day)", event.start().format("%Y-%m-%d"))
    } else {
        event.start().format("%Y-%m-%d %H:%M").to_string()
    };
    let managed = if event.is_managed() { " *" } else { "" };
    format!(
        "{:<16}  {:<9}  {} ({}){}",
        when,
        event.category().as_str(),
        event.title(),
        event.origin(),
        managed
    )
}

fn format_status(status: &SyncState) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "enabled:      {}\n",
        if status.enabled { "yes" } else { "no" }
    ));
    let last = match (status.last_sync_at, status.time_since_sync()) {
        (Some(at), Some(ago)) => format!("{} ({}s ago)", at.to_rfc3339(), ago.as_secs()),
        _ => "never".to_string(),
    };
    out.push_str(&format!("last sync:    {}\n", last));
    if status.connected_calendar_ids.is_empty() {
        out.push_str("calendars:    none\n");
    } else {
        let ids: Vec<&str> = status
            .connected_calendar_ids
            .iter()
            .map(String::as_str)
            .collect();
        out.push_str(&format!("calendars:    {}\n", ids.join(", ")));
    }
    for error in &status.errors {
        out.push_str(&format!("error:        {}\n", error));
    }
    out
}
