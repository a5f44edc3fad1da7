//! Client-side data layer between `william-api` and the consoles.
//!
//! - **Stores** ([`AdminStore`], [`UserStore`]): read-through caches, one
//!   [`ResourceCache`] per resource kind. Concurrent reads of one key share
//!   a single request, the newest response always wins, and polled kinds
//!   (firewall rules, peer stats, peer statuses) refresh only while a
//!   [`Subscription`] is held.
//!
//! - **[`AdminController`]**: runs typed [`AdminCommand`]s against the
//!   admin service and applies each command's [`Invalidation`]s.
//!   Destructive commands require a [`Confirmed`] token.
//!
//! - **[`PeerLifecycle`]**: resolves, creates, loads and deletes the
//!   calling user's own peer. Stale resolutions are dropped.
//!
//! - **Views** ([`views`]): one per console page. Each pairs the stores
//!   with a [`Selection`] that is always empty or a member of the latest
//!   list, a [`MutationGate`] and its action error.

pub mod command;
pub mod config;
pub mod controller;
mod convert;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod mutation;
pub mod selection;
pub mod store;
pub mod views;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::{AllowedEmailRequest, RouteRequest, parse_cidr};
pub use command::{AdminCommand, CommandResult};
pub use config::ServiceConfig;
pub use controller::AdminController;
pub use error::{CoreError, FALLBACK_MESSAGE};
pub use lifecycle::{PeerLifecycle, PeerPresence};
pub use mutation::{Confirmed, MutationGate, MutationOutcome, Proposal};
pub use selection::{Selection, SelectionPolicy};
pub use store::{
    AdminStore, GLOBAL_KEY, Invalidation, Resource, ResourceCache, ResourceKind, ResourceStream,
    Subscription, UserStore,
};
pub use views::{
    AllowedEmailsView, ConfigView, ConsoleView, FirewallView, InterfacesView, PeerStatRow, PeerSummary,
    PeersView, StatusView,
};

pub use model::{
    AllowedEmail, HandshakeAge, Interface, InterfaceSpec, Peer, PeerConfig, PeerStat, PeerStatus,
    Route, TrafficSummary, WireguardConfig, format_bytes,
};
