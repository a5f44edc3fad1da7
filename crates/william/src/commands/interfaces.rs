//! Interface command handlers (interfaces + interface routes).

use tabled::Tabled;
use william_core::{AdminController, Interface, InterfaceSpec, InterfacesView, Route};

use crate::cli::{GlobalOpts, InterfacesArgs, InterfacesCommand, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct InterfaceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Port")]
    listen_port: u16,
    #[tabled(rename = "MTU")]
    mtu: u32,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
}

impl From<&Interface> for InterfaceRow {
    fn from(i: &Interface) -> Self {
        Self {
            id: i.id.clone(),
            name: i.name.clone(),
            address: i.address.clone(),
            listen_port: i.listen_port,
            mtu: i.mtu,
            endpoint: if i.endpoint.is_empty() { "-".into() } else { i.endpoint.clone() },
        }
    }
}

fn interface_detail(i: &Interface) -> String {
    [
        format!("ID:         {}", i.id),
        format!("Name:       {}", i.name),
        format!("Address:    {}", i.address),
        format!("Port:       {}", i.listen_port),
        format!("MTU:        {}", i.mtu),
        format!("Endpoint:   {}", if i.endpoint.is_empty() { "-" } else { &i.endpoint }),
        format!("Public key: {}", if i.public_key.is_empty() { "-" } else { &i.public_key }),
    ]
    .join("\n")
}

#[derive(Tabled)]
pub(super) struct RouteRow {
    #[tabled(rename = "CIDR")]
    cidr: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Route> for RouteRow {
    fn from(r: &Route) -> Self {
        Self {
            cidr: r.cidr.clone(),
            created: util::format_time(r.created_at),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &AdminController,
    args: InterfacesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = InterfacesView::new(controller.clone());

    match args.command {
        InterfacesCommand::List => {
            let interfaces = util::loaded(view.load().await)?;
            let out = output::render_list(
                &global.output,
                interfaces.as_slice(),
                |i| InterfaceRow::from(i),
                |i| i.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Create {
            name,
            address,
            listen_port,
            mtu,
            endpoint,
        } => {
            let spec = InterfaceSpec {
                name,
                address,
                listen_port,
                mtu,
                endpoint,
            };
            let created = view.create(spec).await.into_result()?;
            let out = output::render_single(&global.output, &created, interface_detail, |i| {
                i.id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Update {
            id,
            name,
            address,
            listen_port,
            mtu,
            endpoint,
        } => {
            let current = select(&view, &id).await?;
            let mut spec = InterfaceSpec::from(&current);
            if let Some(name) = name {
                spec.name = name;
            }
            if let Some(address) = address {
                spec.address = address;
            }
            if let Some(port) = listen_port {
                spec.listen_port = port;
            }
            if let Some(mtu) = mtu {
                spec.mtu = mtu;
            }
            if let Some(endpoint) = endpoint {
                spec.endpoint = endpoint;
            }

            let proposal = view.propose_update(spec)?;
            if !util::confirm(&proposal, global.yes)? {
                view.cancel();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            view.confirm(&proposal).await.into_result()?;
            if let Some(updated) = view.selected() {
                let out = output::render_single(&global.output, &updated, interface_detail, |i| {
                    i.id.clone()
                });
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        InterfacesCommand::Delete { id } => {
            select(&view, &id).await?;
            let proposal = view.propose_delete()?;
            if !util::confirm(&proposal, global.yes)? {
                view.cancel();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            view.confirm(&proposal).await.into_result()?;
            output::print_status(&format!("Deleted interface {id}"), global.quiet);
            Ok(())
        }

        InterfacesCommand::Routes(routes) => handle_routes(&view, routes.command, global).await,
    }
}

/// Load the list and select `id`, failing if it does not exist.
async fn select(view: &InterfacesView, id: &str) -> Result<Interface, CliError> {
    let interfaces = util::loaded(view.load().await)?;
    util::require_member(interfaces.iter().map(|i| i.id.as_str()), id, "interface")?;
    view.select(id);
    view.selected()
        .ok_or_else(|| CliError::not_found(format!("interface '{id}' not found")))
}

async fn handle_routes(
    view: &InterfacesView,
    cmd: RoutesCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        RoutesCommand::List { owner } => {
            select(view, &owner).await?;
            let routes = util::loaded(view.load_routes().await)?;
            let out = output::render_list(&global.output, routes.as_slice(), |r| RouteRow::from(r), |r| {
                r.cidr.clone()
            });
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
            output::print_status(&format!("Added route {cidr} to {owner}"), global.quiet);
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
            output::print_status(&format!("Removed route {cidr} from {owner}"), global.quiet);
            Ok(())
        }
    }
}
