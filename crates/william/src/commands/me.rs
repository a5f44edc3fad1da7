//! End-user handlers: the caller's own peer on the public service.

use chrono::Utc;
use william_core::lifecycle::MISSING_IDENTITY;
use william_core::{ConsoleView, HandshakeAge, PeerConfig, PeerPresence, PeerSummary};

use crate::cli::{GlobalOpts, MeArgs, MeCommand, MeTarget};
use crate::error::CliError;
use crate::output;

use super::interfaces::InterfaceRow;
use super::util;

fn peer_detail(peer: &PeerConfig) -> String {
    format!("# Peer ID: {}\n{}", peer.peer_id, peer.config.trim_end())
}

fn summary_detail(summary: &PeerSummary, color: bool) -> String {
    let status = &summary.status;
    let handshake = HandshakeAge::since(status.last_handshake, Utc::now());
    let state = if summary.traffic.recent_handshake {
        "connected"
    } else {
        "idle"
    };
    [
        format!("Peer ID:    {}", status.peer_id),
        format!("Interface:  {}", status.interface_name),
        format!("Traffic:    {}", summary.traffic.label),
        format!(
            "Handshake:  {} ({})",
            output::status_label(state, summary.traffic.recent_handshake, color),
            handshake.label()
        ),
    ]
    .join("\n")
}

fn require_identity(console: &ConsoleView) -> Result<(), CliError> {
    if console.has_identity() {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "email".into(),
            reason: MISSING_IDENTITY.into(),
        })
    }
}

fn surface(console: &ConsoleView) -> Result<(), CliError> {
    match console.error() {
        Some(message) => Err(CliError::Failed { message }),
        None => Ok(()),
    }
}

/// Select the target interface and resolve the caller's peer on it.
async fn resolve(console: &ConsoleView, target: &MeTarget) -> Result<PeerPresence, CliError> {
    require_identity(console)?;
    let interfaces = util::loaded(console.load_interfaces().await)?;
    let presence = match target.interface.as_deref() {
        Some(id) => {
            util::require_member(interfaces.iter().map(|i| i.id.as_str()), id, "interface")?;
            console.select_interface(id).await
        }
        None => console.resolve().await,
    };
    surface(console)?;
    Ok(presence)
}

fn selected_interface(console: &ConsoleView) -> String {
    console.selection().as_key().to_owned()
}

fn no_peer(console: &ConsoleView) -> CliError {
    let interface = selected_interface(console);
    if interface.is_empty() {
        CliError::not_found("No interfaces are available to you")
    } else {
        CliError::not_found(format!(
            "You have no peer on interface '{interface}'. Create one with: william me create -i {interface}"
        ))
    }
}

pub async fn handle(console: &ConsoleView, args: MeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        MeCommand::Interfaces => {
            require_identity(console)?;
            let interfaces = util::loaded(console.load_interfaces().await)?;
            let out = output::render_list(
                &global.output,
                interfaces.as_slice(),
                |i| InterfaceRow::from(i),
                |i| i.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MeCommand::Show(target) => match resolve(console, &target).await? {
            PeerPresence::Exists { peer_id, config } => {
                let peer = PeerConfig { peer_id, config };
                let out = output::render_single(&global.output, &peer, peer_detail, |p| {
                    p.config.trim_end().to_owned()
                });
                output::print_output(&out, global.quiet);
                Ok(())
            }
            PeerPresence::Absent | PeerPresence::Unknown => Err(no_peer(console)),
        },

        MeCommand::Load => {
            require_identity(console)?;
            let peer = console.load_my_peer().await.into_result()?;
            let out = output::render_single(&global.output, &peer, peer_detail, |p| {
                p.config.trim_end().to_owned()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MeCommand::Create(target) => {
            resolve(console, &target).await?;
            let peer = console.create_peer().await.into_result()?;
            output::print_status(
                &format!("Created peer {} on {}", peer.peer_id, selected_interface(console)),
                global.quiet,
            );
            let out = output::render_single(&global.output, &peer, peer_detail, |p| {
                p.config.trim_end().to_owned()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MeCommand::Delete(target) => {
            if resolve(console, &target).await?.peer_id().is_none() {
                return Err(no_peer(console));
            }
            let proposal = console.propose_delete()?;
            if !util::confirm(&proposal, global.yes)? {
                console.lifecycle().cancel_delete();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            let confirmed = console.confirm_delete(&proposal).ok_or_else(|| CliError::Failed {
                message: "The deletion was cancelled or replaced.".into(),
            })?;
            console.delete_peer(confirmed).await.into_result()?;
            output::print_status(
                &format!("Deleted your peer on {}", selected_interface(console)),
                global.quiet,
            );
            Ok(())
        }

        MeCommand::Status { target, watch } => {
            let Some(peer_id) = resolve(console, &target).await?.peer_id().map(str::to_owned) else {
                return Err(no_peer(console));
            };
            let color = output::should_color(&global.color);
            let render = |summary: Option<PeerSummary>| match summary {
                Some(summary) => output::render_single(
                    &global.output,
                    &summary,
                    |s| summary_detail(s, color),
                    |s| s.traffic.label.clone(),
                ),
                None => format!("No status reported yet for peer {peer_id}"),
            };

            let summary = console.load_status(Utc::now()).await;
            surface(console)?;
            output::print_output(&render(summary), global.quiet);

            if !watch.watch {
                return Ok(());
            }

            let mut updates = console.watch_status();
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
                            None => {
                                let summary = console.load_status(Utc::now()).await;
                                output::print_output(&render(summary), global.quiet);
                            }
                        }
                    }
                }
            }
        }
    }
}
