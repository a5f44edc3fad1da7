//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use william_core::{Proposal, Resource};

use crate::error::CliError;

/// Unwrap a fetched resource, turning its error into a `CliError`.
pub fn loaded<T>(resource: Resource<T>) -> Result<Arc<T>, CliError> {
    match resource.error {
        Some(err) => Err(err.into()),
        None => Ok(resource.data),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, `--yes` is required.
pub fn confirm(proposal: &Proposal, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: proposal.prompt.clone(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(&proposal.prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Check that `id` is among `ids`.
pub fn require_member<'a>(
    mut ids: impl Iterator<Item = &'a str>,
    id: &str,
    resource_type: &str,
) -> Result<(), CliError> {
    if ids.any(|candidate| candidate == id) {
        Ok(())
    } else {
        Err(CliError::not_found(format!("{resource_type} '{id}' not found")))
    }
}

pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

/// Wait for Ctrl-C.
pub async fn interrupted() {
    until_signal(tokio::signal::ctrl_c()).await;
}

/// Resolve when `signal` fires. A handler that cannot be installed is
/// reported and never resolves, so watch loops keep running.
async fn until_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(err) = signal.await {
        tracing::warn!(error = %err, "cannot listen for Ctrl-C; stop with a kill signal");
        std::future::pending::<()>().await;
    }
}
