//! Frame egress and ingress.
//!
//! The protocol engine only ever talks to [`PacketTx`]; the datalink
//! implementation below is what production wiring installs, and tests
//! substitute an in-memory capture.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::thread;

use anyhow::{anyhow, Context};
use log::{debug, warn};
use pnet::datalink::{self, Channel, DataLinkSender};
use pnet::ipnetwork::IpNetwork;
use pnet::util::MacAddr;
use tokio::sync::mpsc;

use crate::wire::ethernet::{EthernetFrame, ETHERTYPE_IPV4};
use crate::wire::ip::{Ipv4Packet, IPPROTO_MOSPF};
use crate::wire::mospf::ALL_SPF_ROUTERS;

use super::interface::Interface;

/// Egress seam for the protocol engine.
pub trait PacketTx: Send + Sync {
    /// Transmits a finished frame on an interface.
    fn send(&self, iface: &Interface, frame: &[u8]);

    /// Transmits a frame whose Ethernet destination is unresolved,
    /// filling it in for `next_hop` first. May queue or fall back while
    /// resolution is outstanding.
    fn send_by_arp(&self, iface: &Interface, next_hop: Ipv4Addr, frame: &[u8]);
}

/// One mOSPF message as delivered to the dispatcher: the receiving
/// interface plus the IP-level facts the handlers need.
#[derive(Debug, Clone)]
pub struct ReceivedPacket {
    pub iface: String,
    pub src_ip: Ipv4Addr,
    pub ip_ttl: u8,
    pub mospf: Vec<u8>,
}

/// Production transport over pnet datalink channels, one per interface.
///
/// The link-address cache is fed by the ingress path (the source MAC of
/// every valid mOSPF frame); until a peer is learned, unicast sends fall
/// back to broadcast.
pub struct DatalinkTx {
    senders: Mutex<HashMap<String, Box<dyn DataLinkSender>>>,
    mac_cache: Mutex<HashMap<Ipv4Addr, MacAddr>>,
}

impl DatalinkTx {
    /// Opens a datalink channel for each interface and spawns a reader
    /// thread per channel that feeds parsed mOSPF packets into `ingress`.
    pub fn open(
        interfaces: &[Interface],
        ingress: mpsc::Sender<ReceivedPacket>,
    ) -> anyhow::Result<std::sync::Arc<Self>> {
        let tx = std::sync::Arc::new(Self {
            senders: Mutex::new(HashMap::new()),
            mac_cache: Mutex::new(HashMap::new()),
        });

        let all = datalink::interfaces();
        for iface in interfaces {
            let pnet_iface = all
                .iter()
                .find(|candidate| candidate.name == iface.name)
                .ok_or_else(|| anyhow!("interface {} not present on this host", iface.name))?
                .clone();

            let (sender, mut receiver) =
                match datalink::channel(&pnet_iface, Default::default())
                    .with_context(|| format!("opening datalink channel on {}", iface.name))?
                {
                    Channel::Ethernet(sender, receiver) => (sender, receiver),
                    _ => return Err(anyhow!("non-ethernet channel on {}", iface.name)),
                };

            tx.senders
                .lock()
                .unwrap()
                .insert(iface.name.clone(), sender);

            let reader_tx = tx.clone();
            let reader_ingress = ingress.clone();
            let local = iface.clone();
            thread::Builder::new()
                .name(format!("mospf-rx-{}", iface.name))
                .spawn(move || loop {
                    let frame = match receiver.next() {
                        Ok(frame) => frame,
                        Err(err) => {
                            warn!("receive error on {}: {}", local.name, err);
                            continue;
                        }
                    };
                    if let Some(packet) = reader_tx.accept_frame(&local, frame) {
                        if reader_ingress.blocking_send(packet).is_err() {
                            return;
                        }
                    }
                })
                .context("spawning receive thread")?;
        }

        Ok(tx)
    }

    /// Filters a raw frame down to an mOSPF packet addressed to us, and
    /// learns the sender's link address along the way.
    fn accept_frame(&self, local: &Interface, frame: &[u8]) -> Option<ReceivedPacket> {
        let eth = EthernetFrame::from_bytes(frame).ok()?;
        if eth.ethertype != ETHERTYPE_IPV4 {
            return None;
        }

        let ip = Ipv4Packet::from_bytes(&eth.payload).ok()?;
        if ip.protocol != IPPROTO_MOSPF || ip.source == local.ip {
            return None;
        }
        if ip.destination != local.ip && ip.destination != ALL_SPF_ROUTERS {
            return None;
        }

        self.mac_cache.lock().unwrap().insert(ip.source, eth.source);

        Some(ReceivedPacket {
            iface: local.name.clone(),
            src_ip: ip.source,
            ip_ttl: ip.ttl,
            mospf: ip.payload,
        })
    }

    fn transmit(&self, iface: &Interface, frame: &[u8]) {
        let mut senders = self.senders.lock().unwrap();
        let Some(sender) = senders.get_mut(&iface.name) else {
            warn!("no datalink channel for {}", iface.name);
            return;
        };
        match sender.send_to(frame, None) {
            Some(Ok(())) => {}
            Some(Err(err)) => warn!("send failed on {}: {}", iface.name, err),
            None => warn!("send not attempted on {}", iface.name),
        }
    }
}

impl PacketTx for DatalinkTx {
    fn send(&self, iface: &Interface, frame: &[u8]) {
        self.transmit(iface, frame);
    }

    fn send_by_arp(&self, iface: &Interface, next_hop: Ipv4Addr, frame: &[u8]) {
        let resolved = self.mac_cache.lock().unwrap().get(&next_hop).copied();
        let dst = resolved.unwrap_or_else(|| {
            debug!("{} unresolved, broadcasting on {}", next_hop, iface.name);
            MacAddr::broadcast()
        });

        let mut frame = frame.to_vec();
        frame[0..6].copy_from_slice(&dst.octets());
        self.transmit(iface, &frame);
    }
}

/// Walks the host's interfaces and builds [`Interface`] records for the
/// requested names, or for every non-loopback IPv4 interface when no
/// names are given.
pub fn discover_interfaces(names: &[String]) -> anyhow::Result<Vec<Interface>> {
    let mut found = Vec::new();

    for iface in datalink::interfaces() {
        if iface.is_loopback() || (!names.is_empty() && !names.contains(&iface.name)) {
            continue;
        }
        let Some(IpNetwork::V4(net)) = iface.ips.iter().find(|net| net.is_ipv4()).copied() else {
            continue;
        };
        found.push(Interface::new(
            iface.name.clone(),
            net.ip(),
            net.mask(),
            iface.mac.unwrap_or_else(MacAddr::zero),
        ));
    }

    if found.is_empty() {
        return Err(anyhow!("no usable IPv4 interfaces found"));
    }
    Ok(found)
}
