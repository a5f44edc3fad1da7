//! Live peer stats handler.

use chrono::Utc;
use tabled::Tabled;
use william_core::{AdminController, PeerStatRow, StatusView};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Shown when a stat's peer is missing from the peer list.
const UNKNOWN_EMAIL: &str = "Unknown Email";

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Peer ID")]
    peer_id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "RX")]
    rx: String,
    #[tabled(rename = "TX")]
    tx: String,
    #[tabled(rename = "Last Handshake")]
    handshake: String,
}

impl From<&PeerStatRow> for StatRow {
    fn from(s: &PeerStatRow) -> Self {
        Self {
            peer_id: s.peer_id.clone(),
            email: s.email.clone().unwrap_or_else(|| UNKNOWN_EMAIL.into()),
            interface: s.interface_name.clone(),
            rx: s.rx.clone(),
            tx: s.tx.clone(),
            handshake: s.handshake.label(),
        }
    }
}

fn render(view: &StatusView, global: &GlobalOpts) -> String {
    let rows = view.rows(Utc::now());
    output::render_list(
        &global.output,
        &rows,
        |s| StatRow::from(s),
        |s| s.peer_id.clone(),
    )
}

pub async fn handle(
    controller: &AdminController,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = StatusView::new(controller.clone());
    util::loaded(view.load().await)?;
    if let Some(message) = view.error() {
        return Err(CliError::Failed { message });
    }
    output::print_output(&render(&view, global), global.quiet);

    if !args.watch {
        return Ok(());
    }

    let mut updates = view.watch();
    loop {
        tokio::select! {
            () = util::interrupted() => return Ok(()),
            snapshot = updates.changed() => {
                let Some(snapshot) = snapshot else { return Ok(()) };
                if snapshot.is_loading {
                    continue;
                }
                match snapshot.error_message() {
                    Some(message) => output::print_status(&format!("refresh failed: {message}"), global.quiet),
                    None => output::print_output(&render(&view, global), global.quiet),
                }
            }
        }
    }
}
