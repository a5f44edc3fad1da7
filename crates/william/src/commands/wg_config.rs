//! Rendered WireGuard config handler.

use william_core::{AdminController, ConfigView};

use crate::cli::{GlobalOpts, WgConfigArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &AdminController,
    args: WgConfigArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let view = ConfigView::new(controller.clone());

    let interfaces = util::loaded(view.load_interfaces().await)?;
    if let Some(ref id) = args.interface {
        util::require_member(interfaces.iter().map(|i| i.id.as_str()), id, "interface")?;
        view.select(id);
    }
    util::loaded(view.load().await)?;

    let config = view.active_config().ok_or_else(|| {
        CliError::not_found(match view.selection().id() {
            Some(id) => format!("no WireGuard config for interface '{id}'"),
            None => "no interfaces configured".to_owned(),
        })
    })?;

    let out = output::render_single(
        &global.output,
        &config,
        |c| c.config.trim_end().to_owned(),
        |c| c.config.trim_end().to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
