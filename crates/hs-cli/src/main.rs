//! Homestead CLI
//!
//! Provisions a homelab host step by step and manages WireGuard peers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homestead::commands::{self, AddPeerOptions, InitOptions, PskMode, RunTarget, WireGuardEnv};
use homestead::TerminalPrompter;
use hs_core::config::{default_settings_path, resolve_settings};
use hs_core::exec::SystemRunner;
use hs_core::ConfigStore;
use hs_orchestrator::StepContext;
use hs_wireguard::select_key_generator;

#[derive(Parser)]
#[command(name = "homestead")]
#[command(author, version, about = "Resumable homelab provisioning")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to settings file
    #[arg(short, long, global = true, env = "HOMESTEAD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run setup steps: a step id, `all`, or `quick` (skips optional steps)
    Run {
        #[arg(default_value = "quick")]
        target: String,
    },

    /// Show the state of every step
    Status,

    /// Clear completion markers so steps run again
    Reset {
        /// Step id (all steps when omitted)
        step: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage the WireGuard interface and its peers
    #[command(alias = "wg")]
    Wireguard {
        #[command(subcommand)]
        action: WireguardAction,
    },

    /// Inspect or edit recorded values
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum WireguardAction {
    /// Create the interface and server keys
    Init {
        /// Interface name
        #[arg(short, long)]
        interface: Option<String>,
        /// Server address with prefix, e.g. 10.253.0.1/24
        #[arg(short, long)]
        address: Option<String>,
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Public host name or address peers connect to
        #[arg(long)]
        endpoint_host: Option<String>,
        /// Comma separated DNS servers offered to peers
        #[arg(long)]
        dns: Option<String>,
        /// Use flags and settings instead of prompting
        #[arg(long)]
        non_interactive: bool,
    },

    /// Add a peer and export its client config
    AddPeer {
        #[arg(short, long)]
        interface: Option<String>,
        /// Peer name
        #[arg(short, long)]
        name: Option<String>,
        /// Server endpoint, host[:port]
        #[arg(short, long)]
        endpoint: Option<String>,
        /// Comma separated DNS servers
        #[arg(long)]
        dns: Option<String>,
        /// Comma separated CIDRs routed through the tunnel
        #[arg(long, conflicts_with = "route_all")]
        allowed_ips: Option<String>,
        /// Route all IPv4 traffic through the tunnel
        #[arg(long)]
        route_all: bool,
        /// Directory receiving the client config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Persistent keepalive in seconds (0 disables)
        #[arg(short, long)]
        keepalive: Option<u16>,
        /// Preshared key policy
        #[arg(long, value_enum, default_value_t = PskMode::Generate)]
        psk: PskMode,
        /// Preshared key for `--psk supplied`
        #[arg(long)]
        psk_value: Option<String>,
        /// Use flags and settings instead of prompting
        #[arg(long)]
        non_interactive: bool,
        /// Print the client config as a QR code
        #[arg(long)]
        qr: bool,
    },

    /// List interfaces and peers
    List {
        #[arg(short, long)]
        interface: Option<String>,
    },

    /// Remove a peer
    RemovePeer {
        /// Peer name
        name: String,
        #[arg(short, long)]
        interface: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show every recorded value
    Show,
    /// Get a recorded value
    Get { key: String },
    /// Record a value
    Set { key: String, value: String },
    /// Remove a recorded value
    Unset { key: String },
    /// Show where settings and state live
    Path,
    /// Write a settings file with every default
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);

    // The settings file may not exist yet
    if let Some(Commands::Config {
        action: ConfigAction::Init { force },
    }) = &cli.command
    {
        return commands::config_init(&settings_path, *force);
    }

    let settings = resolve_settings(cli.config.as_deref()).with_context(|| {
        format!("Failed to load settings from {:?}", settings_path)
    })?;

    let mut store = ConfigStore::open(settings.paths.state_file(), settings.paths.marker_dir());
    let runner = SystemRunner::new();
    let prompter = TerminalPrompter::new();

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Run { target } => {
            let keys = select_key_generator(settings.wireguard.key_backend, &runner);
            let mut ctx = StepContext::new(&mut store, &prompter, &runner, keys.as_ref(), &settings);
            commands::run_command(&mut ctx, RunTarget::parse(&target))?;
        }

        Commands::Status => {
            commands::status_command(&store)?;
        }

        Commands::Reset { step, yes } => {
            commands::reset_command(&store, &prompter, step.as_deref(), yes)?;
        }

        Commands::Wireguard { action } => {
            let keys = select_key_generator(settings.wireguard.key_backend, &runner);
            let mut env = WireGuardEnv {
                store: &mut store,
                settings: &settings,
                prompter: &prompter,
                keys: keys.as_ref(),
            };

            match action {
                WireguardAction::Init {
                    interface,
                    address,
                    port,
                    endpoint_host,
                    dns,
                    non_interactive,
                } => commands::init_command(
                    &mut env,
                    InitOptions {
                        interface,
                        address,
                        port,
                        endpoint_host,
                        dns,
                        non_interactive,
                    },
                )?,
                WireguardAction::AddPeer {
                    interface,
                    name,
                    endpoint,
                    dns,
                    allowed_ips,
                    route_all,
                    output_dir,
                    keepalive,
                    psk,
                    psk_value,
                    non_interactive,
                    qr,
                } => commands::add_peer_command(
                    &mut env,
                    AddPeerOptions {
                        interface,
                        name,
                        endpoint,
                        dns,
                        allowed_ips,
                        route_all,
                        output_dir,
                        keepalive,
                        psk,
                        psk_value,
                        non_interactive,
                        qr,
                    },
                )?,
                WireguardAction::List { interface } => {
                    commands::list_command(env.store, interface.as_deref())?
                }
                WireguardAction::RemovePeer {
                    name,
                    interface,
                    yes,
                } => commands::remove_peer_command(&mut env, interface.as_deref(), &name, yes)?,
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(&store)?,
            ConfigAction::Get { key } => commands::config_get(&store, &key)?,
            ConfigAction::Set { key, value } => commands::config_set(&mut store, &key, &value)?,
            ConfigAction::Unset { key } => commands::config_unset(&mut store, &key)?,
            ConfigAction::Path => commands::config_path(&store, &settings_path)?,
            ConfigAction::Init { force } => commands::config_init(&settings_path, force)?,
        },
    }

    Ok(())
}
