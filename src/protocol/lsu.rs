//! LSU origination, acceptance, and flooding.

use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{debug, info};
use pnet::util::MacAddr;
use tokio::sync::Mutex;

use crate::algorithms::dijkstra;
use crate::network::{subnet_of, PacketTx};
use crate::wire::builder::MospfFrame;
use crate::wire::mospf::{Lsa, Lsu, MospfPacket};
use crate::{Core, RouterId, SharedCore};

use super::routing_table::RoutingTable;
use super::MAX_LSU_TTL;

/// The local router's advertisements: one stub LSA per neighborless
/// interface, otherwise one LSA per neighbor.
pub fn build_self_lsas(core: &Core) -> Vec<Lsa> {
    let mut lsas = Vec::new();
    for iface in &core.interfaces {
        if iface.neighbors.is_empty() {
            lsas.push(Lsa {
                subnet: iface.subnet(),
                mask: iface.mask,
                rid: 0,
            });
        } else {
            for nbr in &iface.neighbors {
                lsas.push(Lsa {
                    subnet: subnet_of(nbr.ip, nbr.mask),
                    mask: nbr.mask,
                    rid: nbr.rid,
                });
            }
        }
    }
    lsas
}

/// Unicasts `packet` to every neighbor, one copy per neighbor with the
/// egress interface as IP source. The Ethernet destination is left for
/// ARP resolution. `skip_iface` omits the interface an LSU arrived on.
fn flood(core: &Core, tx: &dyn PacketTx, packet: &MospfPacket, ip_ttl: u8, skip_iface: Option<&str>) {
    for iface in &core.interfaces {
        if skip_iface == Some(iface.name.as_str()) {
            continue;
        }
        for nbr in &iface.neighbors {
            let frame = MospfFrame {
                src_mac: iface.mac,
                dst_mac: MacAddr::zero(),
                src_ip: iface.ip,
                dst_ip: nbr.ip,
                ip_ttl,
                packet,
            }
            .build();
            tx.send_by_arp(iface, nbr.ip, &frame);
        }
    }
}

/// Originates a fresh LSU: consumes the dirty flag, rebuilds the self
/// entry under a new sequence number, and floods it to every neighbor.
pub fn originate(core: &mut Core, tx: &dyn PacketTx) {
    core.topology_dirty = false;
    core.left_interval = core.lsuint;

    let lsas = build_self_lsas(core);
    core.sequence_num = core.sequence_num.wrapping_add(1);
    core.lsdb
        .install_self(core.router_id, core.sequence_num, lsas.clone());

    info!(
        "originating LSU seq {} with {} advertisement(s)",
        core.sequence_num,
        lsas.len()
    );

    let packet = MospfPacket::lsu(
        core.router_id,
        core.area_id,
        core.sequence_num,
        MAX_LSU_TTL,
        lsas,
    );
    flood(core, tx, &packet, MAX_LSU_TTL, None);
}

/// An LSU from `rid` received on `recv_iface`. Returns whether the
/// database changed (the caller then recomputes routes). Accepted LSUs
/// are re-flooded on every other interface with both TTLs decremented,
/// unless the flooding budget is exhausted.
pub fn handle_lsu(
    core: &mut Core,
    recv_iface: &str,
    ip_ttl: u8,
    rid: RouterId,
    lsu: &Lsu,
    tx: &dyn PacketTx,
) -> bool {
    if !core.lsdb.accept(rid, lsu.seq, &lsu.lsas) {
        return false;
    }
    info!(
        "accepted LSU from {} seq {} ({} advertisement(s))",
        Ipv4Addr::from(rid),
        lsu.seq,
        lsu.lsas.len()
    );

    if lsu.ttl <= 1 {
        debug!("LSU from {} exhausted its TTL, not re-flooding", Ipv4Addr::from(rid));
        return true;
    }

    let packet = MospfPacket::lsu(rid, core.area_id, lsu.seq, lsu.ttl - 1, lsu.lsas.clone());
    flood(core, tx, &packet, ip_ttl.saturating_sub(1), Some(recv_iface));
    true
}

/// Once a second, under the core lock: flood when the topology is dirty
/// or the refresh countdown runs out, then rebuild the routing table.
pub async fn lsu_task(core: SharedCore, rtable: Arc<Mutex<RoutingTable>>, tx: Arc<dyn PacketTx>) {
    loop {
        super::tick().await;

        let mut core = core.lock().await;
        let refresh_due = {
            core.left_interval = core.left_interval.saturating_sub(1);
            core.left_interval == 0
        };
        if !core.topology_dirty && !refresh_due {
            continue;
        }

        originate(&mut core, tx.as_ref());

        let mut rtable = rtable.lock().await;
        dijkstra::recompute(&core, &mut rtable);
    }
}
