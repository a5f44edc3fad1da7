//! Firewall rules handler.

use william_core::{AdminController, FirewallView};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

fn render(rules: &str, global: &GlobalOpts) -> String {
    let rules = rules.trim_end().to_owned();
    output::render_single(&global.output, &rules, Clone::clone, Clone::clone)
}

pub async fn handle(
    controller: &AdminController,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = FirewallView::new(controller.clone());
    let rules = util::loaded(view.load().await)?;
    output::print_output(&render(&rules, global), global.quiet);

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
                    None => output::print_output(&render(&snapshot.data, global), global.quiet),
                }
            }
        }
    }
}
