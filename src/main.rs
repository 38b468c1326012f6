use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;
use pnet::datalink;
use pnet::util::MacAddr;
use tokio::sync::{mpsc, Mutex};

use mospfd::config::RouterConfig;
use mospfd::network::transport::{discover_interfaces, DatalinkTx};
use mospfd::network::Interface;
use mospfd::protocol::{ProtocolEngine, RouteEntry, RoutingTable};
use mospfd::Core;

#[derive(Parser)]
#[command(name = "mospfd", about = "Miniature link-state routing daemon")]
struct Cli {
    /// Path to a JSON router configuration.
    #[arg(long)]
    config: Option<String>,

    /// Interfaces to run on when no config file names them; defaults to
    /// every non-loopback IPv4 interface.
    #[arg(long, num_args = 1..)]
    interfaces: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig::default(),
    };

    let mut interfaces = build_interfaces(&cli, &config)?;
    for iface in &mut interfaces {
        iface.hello_interval = config.hello_interval;
    }

    let default_route = config.default_gateway.as_ref().map(|gw| RouteEntry {
        dest: Ipv4Addr::UNSPECIFIED,
        mask: Ipv4Addr::UNSPECIFIED,
        gw: u32::from(gw.via),
        iface: gw.dev.clone(),
        dist: 0,
    });

    let core = Core::new(interfaces, config.lsu_interval);
    info!(
        "router id {} in area {}, {} interface(s)",
        Ipv4Addr::from(core.router_id),
        core.area_id,
        core.interfaces.len()
    );

    let (ingress_tx, ingress_rx) = mpsc::channel(64);
    let tx = DatalinkTx::open(&core.interfaces, ingress_tx)?;

    let core = Arc::new(Mutex::new(core));
    let rtable = Arc::new(Mutex::new(RoutingTable::new(default_route)));
    let engine = ProtocolEngine::new(core, rtable, tx);

    tokio::select! {
        _ = engine.start(ingress_rx) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted, exiting"),
    }

    Ok(())
}

/// Interfaces come from the config file when it names any, otherwise
/// from host discovery. Config-declared interfaces pick up their MAC
/// from the host when present (tests and simulations run without one).
fn build_interfaces(cli: &Cli, config: &RouterConfig) -> Result<Vec<Interface>> {
    if config.interfaces.is_empty() {
        return discover_interfaces(&cli.interfaces);
    }

    let host = datalink::interfaces();
    Ok(config
        .interfaces
        .iter()
        .map(|iface| {
            let mac = host
                .iter()
                .find(|candidate| candidate.name == iface.name)
                .and_then(|candidate| candidate.mac)
                .unwrap_or_else(MacAddr::zero);
            Interface::new(
                iface.name.clone(),
                iface.network.ip(),
                iface.network.mask(),
                mac,
            )
        })
        .collect())
}
