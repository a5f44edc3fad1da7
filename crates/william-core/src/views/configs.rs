// ── Config page ──
//
// Read-only: the rendered WireGuard config of the selected interface.

use super::{Follower, Picker, settled};
use crate::controller::AdminController;
use crate::model::{Interface, WireguardConfig};
use crate::selection::{Selection, SelectionPolicy};
use crate::store::{GLOBAL_KEY, Resource, ResourceCache, Subscription};

pub struct ConfigView {
    controller: AdminController,
    picker: Picker,
    configs: Follower<Vec<WireguardConfig>>,
    _interfaces: Subscription<Vec<Interface>>,
}

impl ConfigView {
    pub fn new(controller: AdminController) -> Self {
        let interfaces = controller.store().interfaces().subscribe_for("");
        let configs = Follower::new(controller.store().wireguard_configs());
        Self {
            controller,
            configs,
            picker: Picker::new(SelectionPolicy::FirstAvailable),
            _interfaces: interfaces,
        }
    }

    fn cache(&self) -> &ResourceCache<Vec<WireguardConfig>> {
        self.controller.store().wireguard_configs()
    }

    fn config_key(&self) -> Option<String> {
        self.cache().kind().key(&self.picker.key()).map(str::to_owned)
    }

    fn follow(&self) {
        self.configs.follow(self.config_key().as_deref());
    }

    pub async fn load_interfaces(&self) -> Resource<Vec<Interface>> {
        let resource = self
            .controller
            .store()
            .interfaces()
            .fetch(Some(GLOBAL_KEY))
            .await;
        if settled(&resource)
            && self
                .picker
                .reconcile(resource.data.iter().map(|i| i.id.as_str()))
        {
            self.follow();
        }
        resource
    }

    pub fn selection(&self) -> Selection {
        self.picker.current()
    }

    pub fn select(&self, interface_id: &str) {
        if self.picker.select(interface_id) {
            self.follow();
        }
    }

    pub async fn load(&self) -> Resource<Vec<WireguardConfig>> {
        self.configs.fetch(self.config_key().as_deref()).await
    }

    /// The config belonging to the selected interface, if loaded.
    pub fn active_config(&self) -> Option<WireguardConfig> {
        let key = self.picker.key();
        if key.is_empty() {
            return None;
        }
        self.configs
            .peek(Some(&*key))
            .data
            .iter()
            .find(|c| c.interface_id == key)
            .cloned()
    }

    pub fn error(&self) -> Option<String> {
        let interfaces = self.controller.store().interfaces().peek(Some(GLOBAL_KEY));
        let configs = self.configs.peek(self.config_key().as_deref());
        interfaces.error_message().or_else(|| configs.error_message())
    }
}
