//! Peer command handlers (peers + peer routes).

use tabled::Tabled;
use william_core::{AdminController, Peer, PeersView};

use crate::cli::{GlobalOpts, PeersArgs, PeersCommand, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::interfaces::RouteRow;
use super::util;

#[derive(Tabled)]
struct PeerRow {
    #[tabled(rename = "Peer ID")]
    peer_id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Interface")]
    interface_id: String,
    #[tabled(rename = "Allowed IP")]
    allowed_ip: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Peer> for PeerRow {
    fn from(p: &Peer) -> Self {
        Self {
            peer_id: p.peer_id.clone(),
            email: p.email.clone(),
            interface_id: p.interface_id.clone(),
            allowed_ip: p.allowed_ip.clone(),
            created: util::format_time(p.created_at),
        }
    }
}

pub async fn handle(
    controller: &AdminController,
    args: PeersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = PeersView::new(controller.clone());

    match args.command {
        PeersCommand::List { interface } => {
            if let Some(ref interface) = interface {
                let interfaces = util::loaded(view.load_interfaces().await)?;
                util::require_member(
                    interfaces.iter().map(|i| i.id.as_str()),
                    interface,
                    "interface",
                )?;
                view.set_filter(interface);
            }
            let peers = util::loaded(view.load().await)?;
            let out = output::render_list(
                &global.output,
                peers.as_slice(),
                |p| PeerRow::from(p),
                |p| p.peer_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PeersCommand::Delete { peer_id } => {
            let proposal = view.propose_delete(&peer_id)?;
            if !util::confirm(&proposal, global.yes)? {
                view.cancel();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            view.confirm(&proposal).await.into_result()?;
            output::print_status(&format!("Deleted peer {peer_id}"), global.quiet);
            Ok(())
        }

        PeersCommand::Routes(routes) => handle_routes(&view, routes.command, global).await,
    }
}

/// Load every peer and select `peer_id`, failing if it does not exist.
async fn select(view: &PeersView, peer_id: &str) -> Result<(), CliError> {
    let peers = util::loaded(view.load().await)?;
    util::require_member(peers.iter().map(|p| p.peer_id.as_str()), peer_id, "peer")?;
    view.select(peer_id);
    Ok(())
}

async fn handle_routes(
    view: &PeersView,
    cmd: RoutesCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        RoutesCommand::List { owner } => {
            select(view, &owner).await?;
            let routes = util::loaded(view.load_routes().await)?;
            let out = output::render_list(
                &global.output,
                routes.as_slice(),
                |r| RouteRow::from(r),
                |r| r.cidr.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoutesCommand::Add { owner, cidr } => {
            select(view, &owner).await?;
            let proposal = view.propose_add_route(&cidr)?;
            if !util::confirm(&proposal, global.yes)? {
                view.cancel();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            view.confirm(&proposal).await.into_result()?;
            output::print_status(&format!("Added route {cidr} to peer {owner}"), global.quiet);
            Ok(())
        }

        RoutesCommand::Remove { owner, cidr } => {
            select(view, &owner).await?;
            let proposal = view.propose_remove_route(&cidr)?;
            if !util::confirm(&proposal, global.yes)? {
                view.cancel();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            view.confirm(&proposal).await.into_result()?;
            output::print_status(&format!("Removed route {cidr} from peer {owner}"), global.quiet);
            Ok(())
        }
    }
}
