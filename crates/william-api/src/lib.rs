//! Async client for the William WireGuard management services.
//!
//! Two Connect services are exposed:
//!
//! - **Admin** (`admin.v1.WilliamAdminService`): interfaces, peers, routes,
//!   allowed emails, rendered configs, firewall rules and peer stats.
//! - **Public** (`server.v1.WilliamService`): the calling user's own peer,
//!   the interfaces they may join, and their connection status.
//!
//! Both are modelled as object-safe async traits ([`AdminService`],
//! [`UserService`]) so higher layers can substitute in-memory fakes.

pub mod admin;
pub mod connect;
pub mod error;
pub mod transport;
pub mod types;
pub mod user;

pub use admin::{ADMIN_SERVICE, AdminClient, AdminService, DEFAULT_ADMIN_BASE_URL};
pub use connect::ConnectClient;
pub use error::{Code, Error};
pub use transport::TransportConfig;
pub use user::{DEFAULT_USER_BASE_URL, IDENTITY_HEADER, USER_SERVICE, UserClient, UserService};
