// ── Command request types ──
//
// Payloads carried by `AdminCommand` variants. Each knows how to check
// itself before any network call is made.

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::InterfaceSpec;

/// Parse `cidr` as an IPv4 or IPv6 network.
pub fn parse_cidr(cidr: &str) -> Result<IpNet, CoreError> {
    let cidr = cidr.trim();
    if cidr.is_empty() {
        return Err(CoreError::validation("Enter a CIDR."));
    }
    cidr.parse::<IpNet>()
        .map_err(|_| CoreError::validation(format!("Invalid CIDR: {cidr}")))
}

/// Owner-scoped route: `(owner_id, cidr)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub owner_id: String,
    pub cidr: String,
}

impl RouteRequest {
    pub fn new(owner_id: impl Into<String>, cidr: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            cidr: cidr.into().trim().to_owned(),
        }
    }

    /// `missing_owner` is the message shown when nothing is selected.
    pub(crate) fn validate(&self, missing_owner: &str) -> Result<(), CoreError> {
        if self.owner_id.is_empty() {
            return Err(CoreError::validation(missing_owner));
        }
        parse_cidr(&self.cidr).map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedEmailRequest {
    pub interface_id: String,
    pub email: String,
}

impl AllowedEmailRequest {
    pub fn new(interface_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            interface_id: interface_id.into(),
            email: email.into().trim().to_owned(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), CoreError> {
        if self.interface_id.is_empty() {
            return Err(CoreError::validation(super::SELECT_INTERFACE));
        }
        if self.email.is_empty() {
            return Err(CoreError::validation("Enter an email address."));
        }
        Ok(())
    }
}

impl InterfaceSpec {
    /// Local checks on a create/update form.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("Enter an interface name."));
        }
        let address = self.address.trim();
        if address.is_empty() {
            return Err(CoreError::validation("Enter an interface address."));
        }
        address
            .parse::<IpNet>()
            .map_err(|_| CoreError::validation(format!("Invalid interface address: {address}")))?;
        if self.listen_port == 0 {
            return Err(CoreError::validation("Listen port must be between 1 and 65535."));
        }
        Ok(())
    }
}
