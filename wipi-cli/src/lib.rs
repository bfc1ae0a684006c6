pub mod file_lock;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use wipi::{HubRecord, InterfaceStatus, Wipi, WipiConfig, WipiEvent};

use crate::file_lock::acquire_store_lock;

/// Wi-Fi control for headless wpa_supplicant hosts
#[derive(Parser, Debug)]
#[command(name = "wipi", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Wireless interface (overrides config file)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Log filter, e.g. `debug` or `wipi=trace` (overrides RUST_LOG)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show association, addresses and signal of the interface
    Status,

    /// Scan for access points
    Scan {
        /// List every access point instead of one per SSID
        #[arg(long)]
        details: bool,
    },

    /// Switch to a WPA-PSK network, rolling back if it never comes up
    Connect {
        ssid: String,

        /// Pre-shared key; read from stdin when omitted
        #[arg(long)]
        psk: Option<String>,
    },

    /// Remove every saved network
    Clear,

    /// Show received and transmitted bytes
    Traffic {
        /// Interface to read (defaults to the configured one)
        interface: Option<String>,
    },

    /// Check whether a host on the internet answers
    Ping {
        /// Host to probe (defaults to the configured one)
        target: Option<String>,
    },

    /// Print change notifications until interrupted
    Watch {
        /// Seconds between scans
        #[arg(long, default_value_t = 15)]
        hub_secs: u64,

        /// Seconds between reachability probes
        #[arg(long, default_value_t = 300)]
        reach_secs: u64,
    },
}

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.as_deref());

    let config = load_config(args.config.as_deref(), args.interface)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(execute(args.command, config))
}

fn init_logger(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

/// Builds the configuration: file (if any) first, then command line overrides.
pub fn load_config(path: Option<&Path>, interface: Option<String>) -> anyhow::Result<WipiConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => WipiConfig::default(),
    };

    if let Some(interface) = interface {
        config.interface = interface;
    }
    Ok(config)
}

async fn execute(command: Command, config: WipiConfig) -> anyhow::Result<()> {
    let wipi = Wipi::new(config);
    let print = |msg: &str| println!("{msg}");

    match command {
        Command::Status => {
            let status = wipi.refresh_status().await;
            if status.associated {
                wipi.check_internet_reachability(&wipi.config().probe_target)
                    .await;
            }
            print_status(&wipi.status().await);
        }
        Command::Scan { details } => {
            let hubs = wipi.refresh_hubs().await?;
            if details {
                print_hubs(&wipi.details().await);
            } else {
                print_hubs(&hubs);
            }
        }
        Command::Connect { ssid, psk } => {
            let psk = match psk {
                Some(psk) => psk,
                None => prompt(&format!("Pre-shared key for {ssid}: "))?,
            };
            let _lock = acquire_store_lock()?;
            let report = wipi.connect(&ssid, &psk, &print).await?;
            let summary = report.outcome.to_string();
            let address = report.outcome.into_result().context(summary)?;
            info!("Connected to {ssid} ({address})");
        }
        Command::Clear => {
            let _lock = acquire_store_lock()?;
            wipi.clear_all_connections(&print).await?;
        }
        Command::Traffic { interface } => {
            let interface = interface.unwrap_or_else(|| wipi.config().interface.clone());
            let traffic = wipi.get_traffic(&interface).await?;
            println!(
                "{interface}: RX bytes = {} TX bytes = {}",
                traffic.rx_bytes, traffic.tx_bytes
            );
        }
        Command::Ping { target } => {
            let target = target.unwrap_or_else(|| wipi.config().probe_target.clone());
            if wipi.check_internet_reachability(&target).await {
                println!("{target} is reachable");
            } else {
                bail!("{target} is not reachable");
            }
        }
        Command::Watch {
            hub_secs,
            reach_secs,
        } => watch(&wipi, hub_secs, reach_secs).await?,
    }

    Ok(())
}

async fn watch(wipi: &Wipi, hub_secs: u64, reach_secs: u64) -> anyhow::Result<()> {
    let mut events = wipi.subscribe();
    let printer = async {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(n)) => warn!("Missed {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        _ = wipi.monitor(
            Duration::from_secs(hub_secs.max(1)),
            Duration::from_secs(reach_secs.max(1)),
        ) => {}
        _ = printer => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read pre-shared key")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_event(event: &WipiEvent) {
    match event {
        WipiEvent::StatusChanged(status) => print_status(status),
        WipiEvent::HubListChanged(hubs) => print_hubs(hubs),
        WipiEvent::ReachabilityChanged(up) => {
            println!("internet {}", if *up { "reachable" } else { "unreachable" });
        }
    }
}

fn print_status(status: &InterfaceStatus) {
    if status.associated {
        println!("associated:  {} ({})", status.connected_ssid, status.connected_bssid);
        println!("quality:     {}", status.link_quality);
        println!("signal:      {} dBm", status.signal_level);
    } else {
        println!("associated:  no");
    }
    println!("ip:          {}", status.ip_address);
    println!("mac:         {}", status.mac_address);
    println!("hostname:    {}", status.host_name);
    match status.internet_reachable {
        Some(true) => println!("internet:    reachable"),
        Some(false) => println!("internet:    unreachable"),
        None => {}
    }
}

fn print_hubs(hubs: &[HubRecord]) {
    for hub in hubs {
        println!(
            "{:>5} dBm  {:<9} {}",
            hub.signal_level,
            hub.security.to_string(),
            hub.ssid
        );
    }
}
