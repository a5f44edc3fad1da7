//! Command dispatch: bridges CLI args -> core views -> output formatting.

pub mod config_cmd;
pub mod emails;
pub mod firewall;
pub mod interfaces;
pub mod me;
pub mod peers;
pub mod stats;
pub mod util;
pub mod wg_config;

use william_core::{AdminController, ConsoleView, ServiceConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: &ServiceConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Me(args) = cmd {
        let console = ConsoleView::connect(config)?;
        return me::handle(&console, args, global).await;
    }

    let controller = AdminController::connect(config)?;
    match cmd {
        Command::Interfaces(args) => interfaces::handle(&controller, args, global).await,
        Command::Peers(args) => peers::handle(&controller, args, global).await,
        Command::Emails(args) => emails::handle(&controller, args, global).await,
        Command::WgConfig(args) => wg_config::handle(&controller, args, global).await,
        Command::Firewall(args) => firewall::handle(&controller, args, global).await,
        Command::Stats(args) => stats::handle(&controller, args, global).await,
        // Handled before dispatch
        Command::Me(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
