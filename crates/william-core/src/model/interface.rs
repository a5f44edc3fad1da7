use serde::Serialize;

/// A WireGuard interface on the server.
///
/// Interfaces listed through the public service carry no `endpoint`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Interface {
    pub id: String,
    pub name: String,
    /// Interface address in CIDR notation.
    pub address: String,
    pub listen_port: u16,
    pub mtu: u32,
    pub endpoint: String,
    pub public_key: String,
}

/// Editable attributes of an interface, used for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceSpec {
    pub name: String,
    pub address: String,
    pub listen_port: u16,
    pub mtu: u32,
    pub endpoint: String,
}

impl From<&Interface> for InterfaceSpec {
    fn from(iface: &Interface) -> Self {
        Self {
            name: iface.name.clone(),
            address: iface.address.clone(),
            listen_port: iface.listen_port,
            mtu: iface.mtu,
            endpoint: iface.endpoint.clone(),
        }
    }
}
