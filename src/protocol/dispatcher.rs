//! Entry point for every received mOSPF packet: validate, dispatch,
//! and trigger a route recomputation when the database changed.

use std::sync::Arc;

use log::error;
use tokio::sync::{mpsc, Mutex};

use crate::algorithms::dijkstra;
use crate::network::{PacketTx, ReceivedPacket};
use crate::wire::mospf::{MospfBody, MospfPacket};
use crate::{Core, SharedCore};

use super::routing_table::RoutingTable;
use super::{hello, lsu};

/// Validates and dispatches one packet under the core lock. Returns
/// whether the LSDB changed. Validation failures are logged and the
/// packet dropped; they never touch protocol state.
pub fn handle_packet(core: &mut Core, tx: &dyn PacketTx, received: &ReceivedPacket) -> bool {
    let packet = match MospfPacket::from_bytes(&received.mospf) {
        Ok(packet) => packet,
        Err(err) => {
            error!(
                "dropping packet from {} on {}: {}",
                received.src_ip, received.iface, err
            );
            return false;
        }
    };

    if packet.aid != core.area_id {
        error!(
            "dropping packet from {} with foreign area id {}",
            received.src_ip, packet.aid
        );
        return false;
    }

    match &packet.body {
        MospfBody::Hello(body) => {
            hello::handle_hello(core, &received.iface, received.src_ip, packet.rid, body);
            false
        }
        MospfBody::Lsu(body) => lsu::handle_lsu(
            core,
            &received.iface,
            received.ip_ttl,
            packet.rid,
            body,
            tx,
        ),
    }
}

/// Drains the ingress channel for the life of the process. Every LSDB
/// acceptance is followed by a shortest-path run, core lock first, then
/// the routing-table lock.
pub async fn dispatch_loop(
    core: SharedCore,
    rtable: Arc<Mutex<RoutingTable>>,
    tx: Arc<dyn PacketTx>,
    mut ingress: mpsc::Receiver<ReceivedPacket>,
) {
    while let Some(received) = ingress.recv().await {
        let mut core = core.lock().await;
        if handle_packet(&mut core, tx.as_ref(), &received) {
            let mut rtable = rtable.lock().await;
            dijkstra::recompute(&core, &mut rtable);
        }
    }
}
