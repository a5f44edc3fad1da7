//! Allowed-email command handlers.

use tabled::Tabled;
use william_core::{AdminController, AllowedEmail, AllowedEmailsView, Selection};

use crate::cli::{EmailsArgs, EmailsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EmailRow {
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Interface")]
    interface_id: String,
    #[tabled(rename = "Added")]
    created: String,
}

impl From<&AllowedEmail> for EmailRow {
    fn from(e: &AllowedEmail) -> Self {
        Self {
            email: e.email.clone(),
            interface_id: e.interface_id.clone(),
            created: util::format_time(e.created_at),
        }
    }
}

pub async fn handle(
    controller: &AdminController,
    args: EmailsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = AllowedEmailsView::new(controller.clone());

    match args.command {
        EmailsCommand::List { interface } => {
            select(&view, interface.as_deref()).await?;
            let emails = util::loaded(view.load().await)?;
            let out = output::render_list(
                &global.output,
                emails.as_slice(),
                |e| EmailRow::from(e),
                |e| e.email.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EmailsCommand::Add { email, interface } => {
            let interface_id = select(&view, interface.as_deref()).await?;
            view.add(&email).await.into_result()?;
            output::print_status(
                &format!("Allowed {} on {interface_id}", email.trim()),
                global.quiet,
            );
            Ok(())
        }

        EmailsCommand::Remove { email, interface } => {
            let interface_id = select(&view, interface.as_deref()).await?;
            let proposal = view.propose_remove(&email)?;
            if !util::confirm(&proposal, global.yes)? {
                view.cancel();
                output::print_status("Aborted.", global.quiet);
                return Ok(());
            }
            view.confirm(&proposal).await.into_result()?;
            output::print_status(
                &format!("Revoked {} on {interface_id}", email.trim()),
                global.quiet,
            );
            Ok(())
        }
    }
}

/// Load interfaces and select `interface`, else keep the first one.
///
/// Returns the selected id, `""` when there are no interfaces at all.
async fn select(view: &AllowedEmailsView, interface: Option<&str>) -> Result<String, CliError> {
    let interfaces = util::loaded(view.load_interfaces().await)?;
    if let Some(id) = interface {
        util::require_member(interfaces.iter().map(|i| i.id.as_str()), id, "interface")?;
        view.select(id);
    }
    Ok(match view.selection() {
        Selection::Selected(id) => id,
        Selection::Unselected => String::new(),
    })
}
