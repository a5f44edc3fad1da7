//! Clap derive structures for the `william` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// william -- manage WireGuard interfaces, peers and access
#[derive(Debug, Parser)]
#[command(
    name = "william",
    version,
    about = "Manage William WireGuard servers from the command line",
    long_about = "Administer WireGuard interfaces, peers, routes and allowed emails\n\
        through the William admin service, or manage your own peer through\n\
        the public service (`william me`).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "WILLIAM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Admin service base URL (overrides profile and WILLIAM_ADMIN_API_BASE_URL)
    #[arg(long, global = true)]
    pub admin_url: Option<String>,

    /// Public service base URL (overrides profile and WILLIAM_API_BASE_URL)
    #[arg(long, global = true)]
    pub user_url: Option<String>,

    /// Your email, sent as X-Email on public-service calls
    #[arg(long, short = 'e', env = "WILLIAM_EMAIL", global = true)]
    pub email: Option<String>,

    /// Identity is injected by a proxy; allow calls without --email
    #[arg(long, global = true)]
    pub proxy_identity: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WILLIAM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "WILLIAM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage WireGuard interfaces and their routes
    #[command(alias = "if", alias = "i")]
    Interfaces(InterfacesArgs),

    /// Manage peers and their routes
    Peers(PeersArgs),

    /// Manage emails allowed to create peers
    Emails(EmailsArgs),

    /// Show the rendered WireGuard config of an interface
    WgConfig(WgConfigArgs),

    /// Show firewall rules
    #[command(alias = "fw")]
    Firewall(WatchArgs),

    /// Show live peer traffic and handshakes
    Stats(WatchArgs),

    /// Manage your own peer (public service)
    Me(MeArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Shared `--watch` flag for polled views.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Keep running and print every refresh (Ctrl-C to stop)
    #[arg(long, short = 'w')]
    pub watch: bool,
}

// ── Routes (shared by interfaces and peers) ──────────────────────────

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List allowed routes of an owner
    #[command(alias = "ls")]
    List {
        /// Owner ID (interface ID or peer ID)
        owner: String,
    },

    /// Add an allowed route
    Add {
        /// Owner ID (interface ID or peer ID)
        owner: String,
        /// Route in CIDR notation, e.g. 10.0.0.0/24
        cidr: String,
    },

    /// Remove an allowed route
    #[command(alias = "rm")]
    Remove {
        /// Owner ID (interface ID or peer ID)
        owner: String,
        /// Route in CIDR notation
        cidr: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INTERFACES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List interfaces
    #[command(alias = "ls")]
    List,

    /// Create an interface
    Create {
        /// Interface name
        #[arg(long)]
        name: String,

        /// Interface address in CIDR notation, e.g. 10.8.0.1/24
        #[arg(long)]
        address: String,

        /// UDP listen port
        #[arg(long, default_value = "51820")]
        listen_port: u16,

        /// MTU
        #[arg(long, default_value = "1420")]
        mtu: u32,

        /// Public endpoint clients connect to (host:port)
        #[arg(long, default_value = "")]
        endpoint: String,
    },

    /// Update an interface; omitted fields keep their current value
    Update {
        /// Interface ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        listen_port: Option<u16>,

        #[arg(long)]
        mtu: Option<u32>,

        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Delete an interface
    #[command(alias = "rm")]
    Delete {
        /// Interface ID
        id: String,
    },

    /// Manage interface-level allowed routes
    Routes(RoutesArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PEERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PeersArgs {
    #[command(subcommand)]
    pub command: PeersCommand,
}

#[derive(Debug, Subcommand)]
pub enum PeersCommand {
    /// List peers, optionally for one interface
    #[command(alias = "ls")]
    List {
        /// Only peers on this interface
        #[arg(long, short = 'i')]
        interface: Option<String>,
    },

    /// Delete a peer
    #[command(alias = "rm")]
    Delete {
        /// Peer ID (public key)
        peer_id: String,
    },

    /// Manage peer-level allowed routes
    Routes(RoutesArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALLOWED EMAILS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EmailsArgs {
    #[command(subcommand)]
    pub command: EmailsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EmailsCommand {
    /// List allowed emails of an interface (default: the first one)
    #[command(alias = "ls")]
    List {
        #[arg(long, short = 'i')]
        interface: Option<String>,
    },

    /// Allow an email to create a peer
    Add {
        email: String,
        #[arg(long, short = 'i')]
        interface: Option<String>,
    },

    /// Revoke an allowed email
    #[command(alias = "rm")]
    Remove {
        email: String,
        #[arg(long, short = 'i')]
        interface: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct WgConfigArgs {
    /// Interface ID (default: the first one)
    #[arg(long, short = 'i')]
    pub interface: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ME (public service)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MeArgs {
    #[command(subcommand)]
    pub command: MeCommand,
}

#[derive(Debug, Subcommand)]
pub enum MeCommand {
    /// List interfaces you may join
    Interfaces,

    /// Show your peer config on an interface
    Show(MeTarget),

    /// Load your peer from whichever interface the server picks
    Load,

    /// Create your peer on an interface
    Create(MeTarget),

    /// Delete your peer on an interface
    #[command(alias = "rm")]
    Delete(MeTarget),

    /// Show your peer's traffic and handshake status
    Status {
        #[command(flatten)]
        target: MeTarget,

        #[command(flatten)]
        watch: WatchArgs,
    },
}

#[derive(Debug, Args)]
pub struct MeTarget {
    /// Interface ID (default: the first one you may join)
    #[arg(long, short = 'i')]
    pub interface: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG & COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
