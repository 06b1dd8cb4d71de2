//! wallet-bridge: command-line client for a wallet backend.
//!
//! Talks to a backend serving HTTP on a local port (the development setup,
//! or a headless backend) through [`HttpTransport`]: requests over HTTP, push
//! events over the `/api/events` WebSocket.
//!
//! # Usage
//!
//! ```text
//! wallet-bridge [OPTIONS] <COMMAND>
//!
//! Commands:
//!   get <ENDPOINT>                      GET /api/ENDPOINT and print the answer
//!   post <ENDPOINT> [--body JSON]       POST /api/ENDPOINT
//!   events [--subject S] [--count N]    print push events as they arrive
//!   config show [--default]             print the stored app config
//!   config set --section S KEY=JSON...  update app-config keys
//!   init-settings                       write a default settings file
//!
//! Options:
//!   --config  <PATH>   settings file [default: platform config dir]
//!   --host    <HOST>   backend host
//!   --port    <PORT>   backend port
//!   --tls              use https/wss
//!   --token   <TOKEN>  API token
//!   --timeout <SECS>   per-request timeout, 0 waits forever
//! ```
//!
//! # Precedence
//!
//! CLI arguments override environment variables, which override the settings
//! file, which overrides the built-in defaults.
//!
//! | Variable               | Setting            |
//! |------------------------|--------------------|
//! | `WALLET_BRIDGE_CONFIG` | settings file path |
//! | `WALLET_BRIDGE_HOST`   | `backend.host`     |
//! | `WALLET_BRIDGE_PORT`   | `backend.port`     |
//! | `WALLET_BRIDGE_TOKEN`  | `backend.token`    |
//!
//! `RUST_LOG` takes precedence over `client.log_level`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallet_bridge_client::infrastructure::storage::{
    default_settings_path, load_settings, save_settings, Settings,
};
use wallet_bridge_client::infrastructure::transport::HttpTransport;
use wallet_bridge_client::{BridgeClient, ClientConfig, ConfigStore, LogReporter, WalletApi};
use wallet_bridge_core::ConfigPatch;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Command-line client for a wallet backend.
#[derive(Debug, Parser)]
#[command(name = "wallet-bridge", about = "Talk to a wallet backend over HTTP and WebSocket", version)]
struct Cli {
    /// Settings file.  A missing file means built-in defaults.
    #[arg(long, env = "WALLET_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Hostname or IP address of the backend.
    #[arg(long, env = "WALLET_BRIDGE_HOST")]
    host: Option<String>,

    /// TCP port of the backend's HTTP API.
    #[arg(long, env = "WALLET_BRIDGE_PORT")]
    port: Option<u16>,

    /// Use https and wss.
    #[arg(long)]
    tls: bool,

    /// API token, sent as `Authorization: Basic TOKEN`.
    #[arg(long, env = "WALLET_BRIDGE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Per-request timeout in seconds; 0 waits forever.
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// GET an endpoint and print the JSON answer.
    Get { endpoint: String },

    /// POST to an endpoint and print the JSON answer.
    Post {
        endpoint: String,
        /// JSON request body.
        #[arg(long)]
        body: Option<String>,
    },

    /// Print push events until interrupted.
    Events {
        /// Only events about this subject (e.g. `accounts`).
        #[arg(long)]
        subject: Option<String>,
        /// Stop after this many events.
        #[arg(long)]
        count: Option<usize>,
    },

    /// Read or update the backend's app config.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Write the current settings (defaults plus overrides) to the settings file.
    InitSettings,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the stored config.
    Show {
        /// Print the backend's default config instead.
        #[arg(long)]
        default: bool,
    },

    /// Set keys in one config section.
    Set {
        #[arg(long, value_parser = ["backend", "frontend"])]
        section: String,
        /// `KEY=VALUE` pairs.  VALUE is JSON; anything that is not valid JSON
        /// is taken as a string.
        #[arg(required = true)]
        values: Vec<String>,
    },
}

impl Cli {
    /// Applies the CLI overrides on top of `settings`.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.backend.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.backend.port = port;
        }
        if self.tls {
            settings.backend.tls = true;
        }
        if let Some(token) = &self.token {
            settings.backend.token = Some(token.clone());
        }
        if let Some(secs) = self.timeout {
            settings.client.request_timeout_secs = secs;
        }
    }

    fn settings_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| default_settings_path().ok())
    }
}

/// Splits `KEY=VALUE` and parses VALUE as JSON, falling back to a string.
fn parse_assignment(assignment: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, raw)) = assignment.split_once('=') else {
        bail!("expected KEY=VALUE, got '{assignment}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{assignment}'");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn build_patch(section: &str, values: &[String]) -> anyhow::Result<ConfigPatch> {
    let mut patch = ConfigPatch::default();
    for assignment in values {
        let (key, value) = parse_assignment(assignment)?;
        if !patch.set(section, key, value) {
            bail!("unknown config section '{section}'");
        }
    }
    Ok(patch)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run(command: Command, api: &WalletApi) -> anyhow::Result<()> {
    match command {
        Command::Get { endpoint } => {
            let value: Value = api.get(&endpoint).await?;
            print_json(&value)
        }
        Command::Post { endpoint, body } => {
            let value: Value = match body {
                Some(body) => {
                    let body: Value =
                        serde_json::from_str(&body).context("--body is not valid JSON")?;
                    api.post(&endpoint, &body).await?
                }
                None => api.post_empty(&endpoint).await?,
            };
            print_json(&value)
        }
        Command::Events { subject, count } => watch_events(api.client(), subject, count).await,
        Command::Config { action } => match action {
            ConfigCommand::Show { default } => {
                let config = if default {
                    api.get_default_config().await?
                } else {
                    api.get_config().await?
                };
                print_json(&config)
            }
            ConfigCommand::Set { section, values } => {
                let patch = build_patch(&section, &values)?;
                let store = ConfigStore::spawn(api.clone());
                let written = store.set_config(patch).await?;
                print_json(&written)
            }
        },
        // Handled before connecting.
        Command::InitSettings => Ok(()),
    }
}

async fn watch_events(
    client: &BridgeClient,
    subject: Option<String>,
    count: Option<usize>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let forward = move |event: &wallet_bridge_core::PushEvent| {
        let _ = tx.send(event.clone());
    };
    let _subscription = match subject {
        Some(subject) => client.subscribe_subject(subject, forward),
        None => client.subscribe(forward),
    };
    info!("waiting for push events (Ctrl+C to stop)");

    let mut seen = 0usize;
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                print_json(&event)?;
                seen += 1;
                if count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, stopping");
                break;
            }
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.settings_path();
    let mut settings = match &settings_path {
        Some(path) => load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    cli.apply_overrides(&mut settings);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.client.log_level)),
        )
        .init();

    if let Command::InitSettings = cli.command {
        let path = settings_path.context("no settings path; pass --config")?;
        save_settings(&path, &settings)
            .with_context(|| format!("writing settings to {}", path.display()))?;
        info!("wrote settings to {}", path.display());
        return Ok(());
    }

    let config: ClientConfig = settings.to_client_config();
    info!(
        host = %config.host,
        port = config.port,
        timeout = ?config.request_timeout,
        "wallet-bridge connecting"
    );
    let transport = Arc::new(HttpTransport::new(config.clone()).context("creating HTTP transport")?);
    let client = BridgeClient::new(transport, config);
    client
        .connect()
        .await
        .with_context(|| format!("connecting to backend at {}", client.config().events_url()))?;

    let api = WalletApi::new(client.clone()).with_reporter(Arc::new(LogReporter));
    let outcome = run(cli.command, &api).await;
    client.close().await;
    outcome
}

// ── Tests ─────────────────────────────────────────────────────────────────────
