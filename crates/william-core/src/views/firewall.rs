// ── Firewall page ──

use crate::controller::AdminController;
use crate::store::{GLOBAL_KEY, Resource, Subscription};

/// Read-only firewall rule text, polled while the view is alive.
pub struct FirewallView {
    controller: AdminController,
    rules: Subscription<String>,
}

impl FirewallView {
    pub fn new(controller: AdminController) -> Self {
        let rules = controller.store().firewall_rules().subscribe_for("");
        Self { controller, rules }
    }

    pub async fn load(&self) -> Resource<String> {
        self.controller
            .store()
            .firewall_rules()
            .fetch(Some(GLOBAL_KEY))
            .await
    }

    pub async fn refresh(&self) -> Resource<String> {
        self.rules.revalidate().await
    }

    /// Latest rule text; `""` until the first successful fetch.
    pub fn rules(&self) -> String {
        String::clone(&self.rules.data())
    }

    pub fn watch(&self) -> Subscription<String> {
        self.controller.store().firewall_rules().subscribe_for("")
    }

    pub fn error(&self) -> Option<String> {
        self.rules.latest().error_message()
    }
}
