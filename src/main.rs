//! Lokal Command Line Client
//!
//! Starts and inspects tunnels through a locally running Lokal daemon.
//!
//! Connection settings come from command line flags, then the environment
//! (`LOKAL_URL`, `LOKAL_TOKEN`), then the config file written by
//! `lokal configure`.

#![deny(clippy::correctness)]
#![warn(clippy::suspicious)]
#![warn(clippy::style)]
#![warn(clippy::complexity)]
#![warn(clippy::perf)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lokal::client::DEFAULT_BASE_URL;
use lokal::{Lokal, LokalError, Options, TunnelId, TunnelType};

mod config;

use config::Config;

const PUBLIC_ADDRESS_ATTEMPTS: u32 = 10;

#[derive(Parser, Debug)]
#[command(name = "lokal")]
#[command(author, version, about = "Expose local services through the Lokal daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon API endpoint
    #[arg(short, long, global = true, env = "LOKAL_URL")]
    url: Option<String>,

    /// API token sent as X-Auth-Token
    #[arg(short = 'k', long, global = true, env = "LOKAL_TOKEN")]
    token: Option<String>,

    /// Basic auth username for the daemon API
    #[arg(long, global = true)]
    username: Option<String>,

    /// Basic auth password for the daemon API (`configure` stores it in
    /// plaintext, in a file readable only by the owner on unix)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a tunnel to expose a local service
    Start(StartArgs),

    /// Show the daemon's record for a tunnel
    Info {
        /// Tunnel id returned by `start`
        id: String,
    },

    /// Save connection settings to the config file
    Configure,
}

#[derive(Parser, Debug)]
struct StartArgs {
    /// Local service address, e.g. localhost:3000
    #[arg(short = 'l', long)]
    local_address: String,

    /// Tunnel type (http, tcp, udp)
    #[arg(short = 't', long = "type", default_value = "http")]
    tunnel_type: TunnelType,

    /// LAN (mDNS) name; `.local` is appended automatically
    #[arg(long)]
    lan: Option<String>,

    /// Public address to request
    #[arg(long)]
    public: Option<String>,

    /// Display name
    #[arg(short, long)]
    name: Option<String>,

    /// Enable request inspection
    #[arg(long)]
    inspect: bool,

    /// Reuse an existing tunnel holding the same address
    #[arg(long)]
    ignore_duplicate: bool,

    /// Print the startup banner
    #[arg(long)]
    banner: bool,

    /// Visitor credentials as user:password (repeatable)
    #[arg(long)]
    basic_auth: Vec<String>,

    #[arg(long)]
    cidr_allow: Vec<String>,

    #[arg(long)]
    cidr_deny: Vec<String>,

    #[arg(long)]
    request_header_add: Vec<String>,

    #[arg(long)]
    request_header_remove: Vec<String>,

    #[arg(long)]
    response_header_add: Vec<String>,

    #[arg(long)]
    response_header_remove: Vec<String>,

    #[arg(long)]
    header_key: Vec<String>,
}

impl StartArgs {
    fn options(&self) -> Options {
        Options {
            basic_auth: self.basic_auth.clone(),
            cidr_allow: self.cidr_allow.clone(),
            cidr_deny: self.cidr_deny.clone(),
            request_header_add: self.request_header_add.clone(),
            request_header_remove: self.request_header_remove.clone(),
            response_header_add: self.response_header_add.clone(),
            response_header_remove: self.response_header_remove.clone(),
            header_key: self.header_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().unwrap_or_default();

    match &cli.command {
        Commands::Start(args) => run_start(&connect(&cli, &config)?, args).await,
        Commands::Info { id } => run_info(&connect(&cli, &config)?, id).await,
        Commands::Configure => run_configure(&cli),
    }
}

/// Build a session from CLI > environment > config file > defaults
fn connect(cli: &Cli, config: &Config) -> Result<Lokal> {
    let url = cli
        .url
        .clone()
        .or(config.daemon.url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    debug!("Using daemon at {}", url);
    let lokal = Lokal::with_base_url(&url).context("Failed to create HTTP client")?;

    if let Some(token) = cli.token.as_ref().or(config.daemon.token.as_ref()) {
        lokal.set_api_token(token);
    }

    let username = cli.username.as_ref().or(config.daemon.username.as_ref());
    let password = cli.password.as_ref().or(config.daemon.password.as_ref());
    if let (Some(username), Some(password)) = (username, password) {
        lokal.set_basic_auth(username, password);
    }

    Ok(lokal)
}

async fn run_start(lokal: &Lokal, args: &StartArgs) -> Result<()> {
    let mut tunnel = lokal
        .new_tunnel()
        .set_local_address(&args.local_address)
        .set_tunnel_type(args.tunnel_type)
        .set_inspection(args.inspect)
        .set_options(args.options());

    if let Some(lan) = &args.lan {
        tunnel = tunnel.set_lan_address(lan);
    }
    if let Some(public) = &args.public {
        tunnel = tunnel.set_public_address(public);
    }
    if let Some(name) = &args.name {
        tunnel = tunnel.set_name(name);
    }
    if args.ignore_duplicate {
        tunnel = tunnel.ignore_duplicate();
    }
    if args.banner {
        tunnel = tunnel.show_startup_banner();
    }

    tunnel.create().await.context("Failed to start tunnel")?;

    if let Some(id) = tunnel.id() {
        println!("Tunnel ID\t{}", id);
    }
    if let Ok(lan) = tunnel.get_lan_address() {
        println!("LAN Address\t{}", lan);
    }

    if args.public.is_some() {
        let mut attempt = 1;
        let address = loop {
            match tunnel.get_public_address() {
                Ok(address) => break address,
                Err(e) if e.is_retryable() && attempt < PUBLIC_ADDRESS_ATTEMPTS => {
                    info!("{} (attempt {}/{})", e, attempt, PUBLIC_ADDRESS_ATTEMPTS);
                    attempt += 1;
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => return Err(e).context("Failed to resolve public address"),
            }
        };
        println!("Public Address\t{}", address);
    }

    Ok(())
}

async fn run_info(lokal: &Lokal, id: &str) -> Result<()> {
    let response = lokal
        .tunnel_info(&TunnelId::from(id))
        .await
        .context("Failed to contact daemon")?;

    if !response.success {
        return Err(LokalError::Daemon(response.message)).context("Daemon refused request");
    }

    println!("{}", serde_json::to_string_pretty(&response.data)?);
    Ok(())
}

fn run_configure(cli: &Cli) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();

    if let Some(url) = &cli.url {
        config.daemon.url = Some(url.clone());
    }
    if let Some(token) = &cli.token {
        config.daemon.token = Some(token.clone());
    }
    if let Some(username) = &cli.username {
        config.daemon.username = Some(username.clone());
    }
    if let Some(password) = &cli.password {
        config.daemon.password = Some(password.clone());
    }

    config.save()?;

    println!(
        "Settings saved to {:?}",
        Config::config_path().unwrap_or_default()
    );

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
